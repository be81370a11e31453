//! Data model for the training portal documents.
//!
//! Wire shapes are camelCase JSON, matching the documents kept in the
//! data-lake file store. Every collection read from the store goes through
//! the `validate_*` helpers before it is trusted.

pub mod errors;
pub mod training_day;
pub mod recording;
pub mod user;
pub mod stats;
pub mod fallback;

pub use errors::ModelError;
pub use recording::{Recording, RecordingInput, VideoPlatform};
pub use stats::DashboardStats;
pub use training_day::TrainingDay;
pub use user::{User, UserRole};
