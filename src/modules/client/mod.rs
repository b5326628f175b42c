pub mod api;
pub mod context;
pub mod error;

pub use api::{
    LoginRequest, LoginService, OtpPurpose, PortalClient, RecoveryService, ResetPasswordRequest,
    SendOtpRequest, Session, UsernameOtpRequest,
};
pub use context::ClientContext;
pub use error::{PortalError, RequestOutcome, GENERIC_FAILURE};
