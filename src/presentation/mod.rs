pub mod config;
mod cors;
pub mod handlers;
pub mod router;
pub mod state;

pub use config::{Environment, Settings, TranscriptionProviderSetting};
pub use cors::{CorsConfigError, build_cors_layer};
pub use router::create_router;
pub use state::AppState;
