use std::fmt;

use super::validation::{validate_password, validate_username, Field, FieldError, PasswordPolicy};
use crate::modules::client::{ClientContext, LoginRequest, LoginService, PortalError, Session};
use crate::modules::utils::logging::log_auth_event;

#[derive(Clone)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl LoginForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self, policy: PasswordPolicy) -> Result<(), FieldError> {
        validate_username(&self.username)?;
        validate_password(&self.password, policy, Field::Password)
    }
}

/// Result of a login attempt
#[derive(Debug)]
pub enum LoginResult {
    Success(Session),
    Invalid(FieldError),
    Failed(String),
}

/// Validate the form, then log in with the client context attached
pub async fn login<S>(
    service: &S,
    form: &LoginForm,
    context: ClientContext,
    policy: PasswordPolicy,
) -> LoginResult
where
    S: LoginService + ?Sized,
{
    if let Err(e) = form.validate(policy) {
        return LoginResult::Invalid(e);
    }

    let request = LoginRequest {
        username: form.username.clone(),
        password: form.password.clone(),
        context,
    };

    match service.login(&request).await {
        Ok(session) => {
            log_auth_event("login", &form.username, true, None);
            LoginResult::Success(session)
        }
        Err(e) => {
            let message = e.user_message();
            log_auth_event("login", &form.username, false, Some(&describe(&e)));
            LoginResult::Failed(message)
        }
    }
}

fn describe(error: &PortalError) -> String {
    if error.is_transport() {
        "transport failure".to_string()
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeLogin {
        calls: AtomicUsize,
        accept: bool,
    }

    #[async_trait]
    impl LoginService for FakeLogin {
        async fn login(&self, request: &LoginRequest) -> Result<Session, PortalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.accept {
                Ok(Session {
                    session_id: format!("sess-{}", request.username),
                    profile: json!({ "username": request.username }),
                })
            } else {
                Err(PortalError::Rejected(Some("Invalid credentials".to_string())))
            }
        }
    }

    fn fake(accept: bool) -> FakeLogin {
        FakeLogin {
            calls: AtomicUsize::new(0),
            accept,
        }
    }

    #[tokio::test]
    async fn test_login_success() {
        let service = fake(true);
        let form = LoginForm::new("member01", "Abcdefg1!");
        let result = login(&service, &form, ClientContext::default(), PasswordPolicy::WithSymbol).await;
        match result {
            LoginResult::Success(session) => assert_eq!(session.session_id, "sess-member01"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_form_skips_remote() {
        let service = fake(true);

        let form = LoginForm::new("admin", "Abcdefg1!");
        let result = login(&service, &form, ClientContext::default(), PasswordPolicy::WithSymbol).await;
        assert!(matches!(result, LoginResult::Invalid(ref e) if e.field == Field::Username));

        let form = LoginForm::new("member01", "Abcdefg1");
        let result = login(&service, &form, ClientContext::default(), PasswordPolicy::WithSymbol).await;
        assert!(matches!(result, LoginResult::Invalid(ref e) if e.field == Field::Password));

        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_remote_rejection() {
        let service = fake(false);
        let form = LoginForm::new("member01", "Abcdefg1!");
        let result = login(&service, &form, ClientContext::default(), PasswordPolicy::WithSymbol).await;
        assert!(matches!(result, LoginResult::Failed(ref m) if m == "Invalid credentials"));
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_debug_hides_password() {
        let form = LoginForm::new("member01", "Abcdefg1!");
        assert!(!format!("{:?}", form).contains("Abcdefg1!"));
    }
}
