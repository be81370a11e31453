//! Built-in dataset served when the store is unreachable.

use crate::training_day::TrainingDay;

pub const FALLBACK_TITLES: [&str; 12] = [
    "Introduction to Power BI & Data Connectivity",
    "Power Query & Data Transformation",
    "Data Modeling & Relationships",
    "Introduction to DAX",
    "Essential DAX Functions Part 1",
    "Essential DAX Functions Part 2",
    "Advanced DAX Patterns",
    "Time Intelligence & Date Functions",
    "Power BI Visualizations",
    "Advanced Analytics & AI Features",
    "Power BI Service & Collaboration",
    "Performance Optimization & Best Practices",
];

/// Twelve locked days in dayNumber order.
pub fn training_days() -> Vec<TrainingDay> {
    FALLBACK_TITLES
        .iter()
        .zip(1u32..)
        .map(|(title, n)| TrainingDay::locked(n, *title))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_locked_days_in_order() {
        let days = training_days();
        assert_eq!(days.len(), 12);
        for (i, day) in days.iter().enumerate() {
            assert_eq!(day.day_number as usize, i + 1);
            assert_eq!(day.title, FALLBACK_TITLES[i]);
            assert!(!day.is_unlocked);
            assert!(day.unlocked_at.is_none());
            assert!(day.unlocked_by.is_none());
        }
        assert!(crate::training_day::validate_days(&days).is_ok());
    }
}
