pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod state;

pub use backend::registry::BackendRegistry;
pub use config::PlateServiceConfig;
pub use error::ApiError;
pub use state::PlateServiceState;
