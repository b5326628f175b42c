use crate::{DEFAULT_OTP_ATTEMPTS, OTP_COOLDOWN_SECONDS};

/// How many OTPs a flow may request and how long it waits between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpLimits {
    pub max_attempts: u32,
    pub cooldown_secs: u32,
}

impl Default for OtpLimits {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_OTP_ATTEMPTS,
            cooldown_secs: OTP_COOLDOWN_SECONDS,
        }
    }
}

/// Attempt and cooldown bookkeeping for OTP issuance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpState {
    pub issued: bool,
    pub attempts_remaining: u32,
    pub cooldown_seconds_remaining: u32,
    pub last_server_message: Option<String>,
    cooldown_secs: u32,
}

impl Default for OtpState {
    fn default() -> Self {
        Self::new(OtpLimits::default())
    }
}

impl OtpState {
    pub fn new(limits: OtpLimits) -> Self {
        Self {
            issued: false,
            attempts_remaining: limits.max_attempts,
            cooldown_seconds_remaining: 0,
            last_server_message: None,
            cooldown_secs: limits.cooldown_secs,
        }
    }

    /// An OTP may be requested only with attempts left and no cooldown running
    pub fn can_request(&self) -> bool {
        self.attempts_remaining > 0 && self.cooldown_seconds_remaining == 0
    }

    /// No attempts left and the last cooldown has run out
    pub fn is_exhausted(&self) -> bool {
        self.attempts_remaining == 0 && self.cooldown_seconds_remaining == 0
    }

    pub fn is_cooling_down(&self) -> bool {
        self.cooldown_seconds_remaining > 0
    }

    /// Spend one attempt and start the cooldown. Returns false if the gate is closed.
    pub fn consume_attempt(&mut self) -> bool {
        if !self.can_request() {
            return false;
        }
        self.attempts_remaining -= 1;
        self.cooldown_seconds_remaining = self.cooldown_secs;
        true
    }

    /// Advance the cooldown by one second. Returns true if the counter moved.
    pub fn tick(&mut self) -> bool {
        if self.cooldown_seconds_remaining == 0 {
            return false;
        }
        self.cooldown_seconds_remaining -= 1;
        true
    }

    /// Record a confirmation from the send-OTP call
    pub fn record_issued(&mut self, message: impl Into<String>) {
        self.issued = true;
        self.last_server_message = Some(message.into());
    }

    pub fn record_message(&mut self, message: impl Into<String>) {
        self.last_server_message = Some(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = OtpState::default();
        assert!(!state.issued);
        assert_eq!(state.attempts_remaining, 5);
        assert_eq!(state.cooldown_seconds_remaining, 0);
        assert!(state.can_request());
        assert!(!state.is_exhausted());
    }

    #[test]
    fn test_consume_attempt_starts_cooldown() {
        let mut state = OtpState::default();
        assert!(state.consume_attempt());
        assert_eq!(state.attempts_remaining, 4);
        assert_eq!(state.cooldown_seconds_remaining, 60);
        assert!(!state.can_request());

        // Closed gate leaves the counters alone
        assert!(!state.consume_attempt());
        assert_eq!(state.attempts_remaining, 4);
        assert_eq!(state.cooldown_seconds_remaining, 60);
    }

    #[test]
    fn test_countdown_reaches_zero() {
        let mut state = OtpState::default();
        state.consume_attempt();

        for expected in (0..60).rev() {
            assert!(state.tick());
            assert_eq!(state.cooldown_seconds_remaining, expected);
        }
        assert!(!state.tick());
        assert_eq!(state.cooldown_seconds_remaining, 0);
        assert!(state.can_request());
    }

    #[test]
    fn test_exhaustion() {
        let mut state = OtpState::new(OtpLimits {
            max_attempts: 1,
            cooldown_secs: 2,
        });
        assert!(state.consume_attempt());
        assert_eq!(state.attempts_remaining, 0);
        // Still cooling down, so not yet exhausted
        assert!(!state.is_exhausted());
        state.tick();
        state.tick();
        assert!(state.is_exhausted());
        assert!(!state.can_request());
    }

    #[test]
    fn test_record_issued() {
        let mut state = OtpState::default();
        state.record_issued("OTP sent to your email");
        assert!(state.issued);
        assert_eq!(
            state.last_server_message.as_deref(),
            Some("OTP sent to your email")
        );
    }
}
