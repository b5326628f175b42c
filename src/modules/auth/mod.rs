pub mod countdown;
pub mod login;
pub mod otp;
pub mod recovery;
pub mod user_interface;
pub mod validation;

// Re-export the main types and functions
pub use countdown::CooldownTicker;
pub use login::{login, LoginForm, LoginResult};
pub use otp::{OtpLimits, OtpState};
pub use recovery::{
    CooldownFlow, FlowError, FlowSettings, FlowState, PasswordResetFlow, RecoveryRequest,
    UsernameRecoveryFlow,
};
pub use validation::{Field, FieldError, OtpFormat, PasswordPolicy};
