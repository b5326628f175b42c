pub mod settings;

pub use settings::{ConfigError, PortalConfig};
