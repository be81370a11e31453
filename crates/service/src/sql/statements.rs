//! Statement text for the query-backed pathway. Column aliases match the
//! camelCase JSON field names so rows decode straight into the models.

pub const LIST_USERS: &str = "SELECT user_id AS userId, email, role, created_at AS createdAt, \
     last_login AS lastLogin FROM users ORDER BY created_at";

pub const FIND_USER_BY_EMAIL: &str = "SELECT user_id AS userId, email, role, created_at AS createdAt, \
     last_login AS lastLogin FROM users WHERE LOWER(email) = @email";

pub const ACTIVE_RECORDINGS: &str = "SELECT recording_id AS recordingId, day_number AS dayNumber, title, \
     video_url AS videoUrl, embed_url AS embedUrl, platform, duration, uploaded_at AS uploadedAt, \
     uploaded_by AS uploadedBy, view_count AS viewCount, is_active AS isActive \
     FROM recordings WHERE is_active = 1 ORDER BY day_number";

pub const UNLOCK_DAY: &str = "UPDATE training_days SET is_unlocked = 1, unlocked_at = @unlockedAt, \
     unlocked_by = @unlockedBy OUTPUT inserted.day_number AS dayNumber, inserted.title, inserted.description, \
     inserted.is_unlocked AS isUnlocked, inserted.unlocked_at AS unlockedAt, \
     inserted.unlocked_by AS unlockedBy, inserted.presentation_url AS presentationUrl, \
     inserted.resources_url AS resourcesUrl WHERE day_number = @dayNumber";

pub const LOCK_DAY: &str = "UPDATE training_days SET is_unlocked = 0, unlocked_at = NULL, unlocked_by = NULL \
     OUTPUT inserted.day_number AS dayNumber, inserted.title, inserted.description, \
     inserted.is_unlocked AS isUnlocked, inserted.unlocked_at AS unlockedAt, \
     inserted.unlocked_by AS unlockedBy, inserted.presentation_url AS presentationUrl, \
     inserted.resources_url AS resourcesUrl WHERE day_number = @dayNumber";

pub const DEACTIVATE_RECORDING: &str = "UPDATE recordings SET is_active = 0 \
     OUTPUT inserted.recording_id AS recordingId WHERE recording_id = @recordingId";
