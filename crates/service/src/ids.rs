use uuid::Uuid;

/// Fresh random (version 4) identifier for a new recording.
pub fn generate_uuid() -> Uuid {
    Uuid::new_v4()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v4_shape() {
        for _ in 0..64 {
            let s = generate_uuid().to_string();
            assert_eq!(s.len(), 36);
            let bytes = s.as_bytes();
            for i in [8, 13, 18, 23] {
                assert_eq!(bytes[i], b'-');
            }
            assert_eq!(bytes[14], b'4');
            assert!(matches!(bytes[19], b'8' | b'9' | b'a' | b'b'), "{s}");
            assert!(s.chars().all(|c| c == '-' || c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn ids_differ() {
        assert_ne!(generate_uuid(), generate_uuid());
    }
}
