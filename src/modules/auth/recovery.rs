// src/modules/auth/recovery.rs
//
// OTP-gated credential recovery. Each flow owns its state; the caller drives
// it one transition at a time and feeds it cooldown ticks.
use log::{debug, info};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use super::countdown::CooldownTicker;
use super::otp::{OtpLimits, OtpState};
use super::validation::{
    validate_confirmation, validate_email, validate_otp, validate_password, validate_username,
    Field, FieldError, OtpFormat, PasswordPolicy,
};
use crate::modules::client::{
    OtpPurpose, PortalError, RecoveryService, RequestOutcome, ResetPasswordRequest,
    SendOtpRequest, UsernameOtpRequest,
};
use crate::modules::config::PortalConfig;
use crate::modules::utils::logging::log_auth_event;
use crate::modules::utils::messages::MessageBoard;

pub const LOCKED_OUT_MESSAGE: &str = "No OTP attempts left. Restart the recovery to try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    OtpRequested,
    /// A verify call is in flight
    OtpVerifiedPending,
    Completed,
    /// Attempts exhausted; only a fresh flow gets out of here
    Locked,
}

impl FlowState {
    pub fn is_terminal(self) -> bool {
        matches!(self, FlowState::Completed | FlowState::Locked)
    }
}

/// Why a transition was refused. None of these touch the flow's counters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error(transparent)]
    Validation(#[from] FieldError),

    #[error("Resend OTP in: {seconds}s")]
    CoolingDown { seconds: u32 },

    #[error("{}", LOCKED_OUT_MESSAGE)]
    LockedOut,

    #[error("Request an OTP first")]
    OtpNotRequested,

    #[error("Recovery already completed")]
    AlreadyCompleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowSettings {
    pub limits: OtpLimits,
    pub otp_format: OtpFormat,
    pub password_policy: PasswordPolicy,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            limits: OtpLimits::default(),
            otp_format: OtpFormat::Numeric,
            password_policy: PasswordPolicy::Standard,
        }
    }
}

impl FlowSettings {
    pub fn from_config(config: &PortalConfig) -> Self {
        Self {
            limits: config.otp_limits(),
            otp_format: config.otp_format,
            password_policy: config.reset_password_policy,
        }
    }
}

/// Form data gathered as the user moves through a recovery
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RecoveryRequest {
    pub username: String,
    pub email: String,
    pub otp: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

impl fmt::Debug for RecoveryRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoveryRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("otp", &self.otp.as_ref().map(|_| "***"))
            .finish_non_exhaustive()
    }
}

/// State machine shared by both journeys
#[derive(Debug)]
struct RecoveryCore {
    state: FlowState,
    otp: OtpState,
    messages: MessageBoard,
    settings: FlowSettings,
    cooldown_deadline: Option<Instant>,
}

impl RecoveryCore {
    fn new(settings: FlowSettings) -> Self {
        Self {
            state: FlowState::Idle,
            otp: OtpState::new(settings.limits),
            messages: MessageBoard::default(),
            settings,
            cooldown_deadline: None,
        }
    }

    fn ensure_open(&self) -> Result<(), FlowError> {
        match self.state {
            FlowState::Locked => Err(FlowError::LockedOut),
            FlowState::Completed => Err(FlowError::AlreadyCompleted),
            _ => Ok(()),
        }
    }

    /// Check the attempt/cooldown gate before a send-OTP call
    fn check_send_gate(&mut self) -> Result<(), FlowError> {
        self.ensure_open()?;
        if self.otp.is_cooling_down() {
            return Err(FlowError::CoolingDown {
                seconds: self.otp.cooldown_seconds_remaining,
            });
        }
        if self.otp.attempts_remaining == 0 {
            self.lock();
            return Err(FlowError::LockedOut);
        }
        Ok(())
    }

    /// Spend an attempt and start the cooldown; happens before the call goes out
    fn begin_send(&mut self) {
        self.otp.consume_attempt();
        self.cooldown_deadline = Some(
            Instant::now() + Duration::from_secs(u64::from(self.otp.cooldown_seconds_remaining)),
        );
        self.state = FlowState::OtpRequested;
        debug!(
            "OTP requested, {} attempts remaining",
            self.otp.attempts_remaining
        );
    }

    fn finish_send(&mut self, result: Result<String, PortalError>) -> RequestOutcome {
        let outcome = RequestOutcome::from_result(result);
        match &outcome {
            RequestOutcome::Success(message) => {
                self.otp.record_issued(message.clone());
                self.messages.info(message.clone());
            }
            RequestOutcome::Failure(message) => {
                self.otp.record_message(message.clone());
                self.messages.error(message.clone());
            }
        }
        outcome
    }

    fn begin_verify(&mut self) -> Result<(), FlowError> {
        self.ensure_open()?;
        if self.state == FlowState::Idle {
            return Err(FlowError::OtpNotRequested);
        }
        Ok(())
    }

    fn finish_verify(&mut self, outcome: RequestOutcome) -> RequestOutcome {
        match &outcome {
            RequestOutcome::Success(message) => {
                self.state = FlowState::Completed;
                self.messages.info(message.clone());
            }
            RequestOutcome::Failure(message) => {
                // A failed verify never costs an attempt
                self.state = FlowState::OtpRequested;
                self.messages.error(message.clone());
            }
        }
        outcome
    }

    fn tick(&mut self) -> FlowState {
        if self.state.is_terminal() {
            return self.state;
        }
        if self.otp.tick() && self.otp.is_exhausted() {
            self.lock();
        }
        self.state
    }

    fn lock(&mut self) {
        if self.state != FlowState::Locked {
            info!("Recovery flow locked: OTP attempts exhausted");
            self.state = FlowState::Locked;
            self.messages.error(LOCKED_OUT_MESSAGE);
        }
    }
}

/// What a front end needs to drive the countdown and show status for any journey
pub trait CooldownFlow {
    fn state(&self) -> FlowState;
    fn otp(&self) -> &OtpState;
    fn messages(&mut self) -> &mut MessageBoard;
    /// Advance the cooldown by one second
    fn tick(&mut self) -> FlowState;
    /// When the running cooldown ends, measured from the moment the attempt was spent
    fn cooldown_deadline(&self) -> Option<Instant>;

    /// Advance the cooldown by `seconds` ticks at once
    fn advance(&mut self, seconds: u32) -> FlowState {
        let mut state = self.state();
        for _ in 0..seconds {
            state = self.tick();
        }
        state
    }

    /// A ticker for the cooldown still to run, or `None` if there is none
    fn cooldown_ticker(&self) -> Option<CooldownTicker> {
        let remaining = self.otp().cooldown_seconds_remaining;
        match self.cooldown_deadline() {
            Some(deadline) if remaining > 0 => Some(CooldownTicker::until(deadline, remaining)),
            _ => None,
        }
    }
}

impl CooldownFlow for PasswordResetFlow {
    fn state(&self) -> FlowState {
        self.core.state
    }

    fn otp(&self) -> &OtpState {
        &self.core.otp
    }

    fn messages(&mut self) -> &mut MessageBoard {
        &mut self.core.messages
    }

    fn tick(&mut self) -> FlowState {
        self.core.tick()
    }

    fn cooldown_deadline(&self) -> Option<Instant> {
        self.core.cooldown_deadline
    }
}

impl CooldownFlow for UsernameRecoveryFlow {
    fn state(&self) -> FlowState {
        self.core.state
    }

    fn otp(&self) -> &OtpState {
        &self.core.otp
    }

    fn messages(&mut self) -> &mut MessageBoard {
        &mut self.core.messages
    }

    fn tick(&mut self) -> FlowState {
        self.core.tick()
    }

    fn cooldown_deadline(&self) -> Option<Instant> {
        self.core.cooldown_deadline
    }
}

/// Forgot-password journey: username + email, OTP, new password
#[derive(Debug)]
pub struct PasswordResetFlow {
    core: RecoveryCore,
    request: RecoveryRequest,
}

impl PasswordResetFlow {
    pub fn new(settings: FlowSettings) -> Self {
        Self {
            core: RecoveryCore::new(settings),
            request: RecoveryRequest::default(),
        }
    }

    pub fn request(&self) -> &RecoveryRequest {
        &self.request
    }

    /// Send an OTP to `email`. The attempt is spent whether or not the call succeeds.
    pub async fn request_otp<S>(
        &mut self,
        service: &S,
        username: &str,
        email: &str,
    ) -> Result<RequestOutcome, FlowError>
    where
        S: RecoveryService + ?Sized,
    {
        self.core.check_send_gate()?;
        validate_username(username)?;
        validate_email(email)?;

        self.request.username = username.to_string();
        self.request.email = email.to_string();
        self.core.begin_send();

        let result = service
            .send_otp(&SendOtpRequest {
                username: self.request.username.clone(),
                email: self.request.email.clone(),
                usage: OtpPurpose::ForgotPassword,
            })
            .await;
        let outcome = self.core.finish_send(result);
        log_auth_event(
            "password_reset_otp",
            &self.request.username,
            outcome.is_success(),
            Some(outcome.message()),
        );
        Ok(outcome)
    }

    /// Check the new password locally, then verify the OTP and reset remotely
    pub async fn submit_reset<S>(
        &mut self,
        service: &S,
        otp: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<RequestOutcome, FlowError>
    where
        S: RecoveryService + ?Sized,
    {
        self.core.begin_verify()?;
        validate_otp(otp, self.core.settings.otp_format)?;
        validate_password(
            new_password,
            self.core.settings.password_policy,
            Field::NewPassword,
        )?;
        validate_confirmation(new_password, confirm_password)?;

        self.request.otp = Some(otp.to_string());
        self.request.new_password = Some(new_password.to_string());
        self.request.confirm_password = Some(confirm_password.to_string());
        self.core.state = FlowState::OtpVerifiedPending;

        let result = service
            .reset_password(&ResetPasswordRequest {
                username: self.request.username.clone(),
                email: self.request.email.clone(),
                otp: otp.to_string(),
                new_password: new_password.to_string(),
                confirm_password: confirm_password.to_string(),
            })
            .await;
        let outcome = self.core.finish_verify(RequestOutcome::from_result(result));
        log_auth_event(
            "password_reset",
            &self.request.username,
            outcome.is_success(),
            Some(outcome.message()),
        );
        if outcome.is_success() {
            // Secrets are no longer needed once the reset went through
            self.request.new_password = None;
            self.request.confirm_password = None;
        }
        Ok(outcome)
    }
}

/// Forgot-username journey: email, OTP, list of usernames
#[derive(Debug)]
pub struct UsernameRecoveryFlow {
    core: RecoveryCore,
    email: String,
    usernames: Vec<String>,
}

impl UsernameRecoveryFlow {
    pub fn new(settings: FlowSettings) -> Self {
        Self {
            core: RecoveryCore::new(settings),
            email: String::new(),
            usernames: Vec::new(),
        }
    }

    /// Usernames found by a successful verification
    pub fn usernames(&self) -> &[String] {
        &self.usernames
    }

    pub async fn request_otp<S>(
        &mut self,
        service: &S,
        email: &str,
    ) -> Result<RequestOutcome, FlowError>
    where
        S: RecoveryService + ?Sized,
    {
        self.core.check_send_gate()?;
        validate_email(email)?;

        self.email = email.to_string();
        self.core.begin_send();

        let result = service
            .send_username_otp(&UsernameOtpRequest {
                email: self.email.clone(),
                otp: None,
            })
            .await;
        let outcome = self.core.finish_send(result);
        log_auth_event(
            "username_recovery_otp",
            &self.email,
            outcome.is_success(),
            Some(outcome.message()),
        );
        Ok(outcome)
    }

    pub async fn verify<S>(&mut self, service: &S, otp: &str) -> Result<RequestOutcome, FlowError>
    where
        S: RecoveryService + ?Sized,
    {
        self.core.begin_verify()?;
        validate_otp(otp, self.core.settings.otp_format)?;
        self.core.state = FlowState::OtpVerifiedPending;

        let result = service
            .recover_username(&UsernameOtpRequest {
                email: self.email.clone(),
                otp: Some(otp.to_string()),
            })
            .await;

        let outcome = match result {
            Ok(usernames) => {
                let message = if usernames.is_empty() {
                    "No username is linked to this email".to_string()
                } else {
                    format!("Your username(s): {}", usernames.join(", "))
                };
                self.usernames = usernames;
                RequestOutcome::Success(message)
            }
            Err(e) => RequestOutcome::Failure(e.user_message()),
        };
        let outcome = self.core.finish_verify(outcome);
        log_auth_event(
            "username_recovery",
            &self.email,
            outcome.is_success(),
            None,
        );
        Ok(outcome)
    }
}
