pub mod admin;
pub mod errors;
pub mod routes;
pub mod startup;
pub mod state;

pub use startup::run;
pub use state::AppState;
