// First, declare the modules folder itself
mod modules;

use std::time::Duration;

// Re-export everything from modules for easier access
pub use modules::{auth, chat, client, config, face, utils};

// Re-export commonly used types
pub use modules::auth::recovery::{PasswordResetFlow, UsernameRecoveryFlow};
pub use modules::client::{PortalClient, RequestOutcome};
pub use modules::config::PortalConfig;

// Constants
pub const DEFAULT_OTP_ATTEMPTS: u32 = 5;
pub const OTP_COOLDOWN_SECONDS: u32 = 60;
pub const MESSAGE_TTL: Duration = Duration::from_secs(10);
pub const MAX_USERNAME_LEN: usize = 20;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 99;
pub const SESSION_TOKEN_LEN: usize = 32;
pub const RESERVED_USERNAMES: &[&str] = &[
    "administrator",
    "uxlivinglab",
    "dowellresearch",
    "dowellteam",
    "admin",
];
