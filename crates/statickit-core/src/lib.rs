pub mod actions;
pub mod config;
pub mod error;
pub mod navigation;
pub mod orchestrator;
pub mod presets;
pub mod reducer;
pub mod request;
pub mod state;
pub mod views;

pub use actions::*;
pub use error::*;
pub use navigation::*;
pub use orchestrator::*;
pub use reducer::*;
pub use request::*;
pub use state::*;
pub use views::*;

pub use config::Config;
pub use config::ConfigError;
