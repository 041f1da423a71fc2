pub mod config;
pub mod format;
pub mod http;
pub mod logging;
pub mod register;
pub mod router;

pub use config::{Config, ConfigError};
pub use http::{app, AppState};
pub use router::{InteractionRouter, RouteOutcome};
