// src/modules/auth/user_interface.rs
use std::io;
use std::path::Path;
use std::time::Instant;

use super::countdown::CooldownTicker;
use super::login::{login, LoginForm, LoginResult};
use super::recovery::{
    CooldownFlow, FlowError, FlowSettings, FlowState, PasswordResetFlow, UsernameRecoveryFlow,
    LOCKED_OUT_MESSAGE,
};
use crate::modules::chat::chat_url;
use crate::modules::client::{ClientContext, PortalClient};
use crate::modules::config::PortalConfig;
use crate::modules::face::{upload_face, FaceCapture};
use crate::modules::utils::io::{print_prompt, read_secret, InputReader};
use crate::modules::utils::messages::MessageKind;
use crate::modules::utils::time::format_countdown;

/// Result type for each journey
#[derive(Debug)]
pub enum AuthFlowResult {
    Back,            // Return to main menu
    Success(String), // Journey finished with a message
    Error(String),   // Journey ended with an error
}

impl From<io::Error> for AuthFlowResult {
    fn from(e: io::Error) -> Self {
        AuthFlowResult::Error(format!("Error reading input: {}", e))
    }
}

/// Function to show initial options when starting the program
pub fn show_initial_options() {
    println!("\n=== Member Portal ===");
    println!("1. Login                  (or type 'login')");
    println!("2. Forgot password        (or type 'forgot')");
    println!("3. Forgot username        (or type 'username')");
    println!("4. Face login             (or type 'face')");
    println!("5. Exit                   (or type 'exit')");
    println!("\nEnter your choice         (1-5 or command):");
}

/// Main menu loop; returns when the user exits or stdin closes
pub async fn main_auth_flow(client: &PortalClient, config: &PortalConfig) {
    let mut input = InputReader::new();
    loop {
        show_initial_options();

        let choice = match input.next_line().await {
            Ok(line) => line.to_lowercase(),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return,
            Err(e) => {
                println!("Error reading input: {}", e);
                continue;
            }
        };

        let result = match choice.as_str() {
            "1" | "login" => handle_login(&mut input, client, config).await,
            "2" | "forgot" => handle_forgot_password(&mut input, client, config).await,
            "3" | "username" => handle_forgot_username(&mut input, client, config).await,
            "4" | "face" => match input.prompt("Path to face image: ").await {
                Ok(path) => handle_face_login(client, config, Path::new(&path)).await,
                Err(e) => e.into(),
            },
            "5" | "exit" | "quit" => {
                println!("Goodbye!");
                return;
            }
            _ => AuthFlowResult::Error(
                "Invalid choice. Please enter a number (1-5) or command (login/forgot/username/face/exit)."
                    .to_string(),
            ),
        };

        match result {
            AuthFlowResult::Back => println!("Returning to main menu..."),
            AuthFlowResult::Success(msg) => println!("\n{}", msg),
            AuthFlowResult::Error(msg) => println!("\nError: {}", msg),
        }
    }
}

pub async fn handle_login(
    input: &mut InputReader,
    client: &PortalClient,
    config: &PortalConfig,
) -> AuthFlowResult {
    println!("\n=== Member Login ===");
    let username = match input.prompt("Username: ").await {
        Ok(u) => u,
        Err(e) => return e.into(),
    };
    let password = match read_secret("Password: ").await {
        Ok(p) => p,
        Err(e) => return e.into(),
    };

    let form = LoginForm::new(username, password);
    let context = ClientContext::collect(config.redirect_url.clone());
    match login(client, &form, context, config.login_password_policy).await {
        LoginResult::Success(session) => {
            let mut message = format!("Welcome, {}!", form.username);
            if let Ok(url) = chat_url(&config.chat_url, &session.session_id) {
                message.push_str(&format!("\nChat with us at: {}", url));
            }
            AuthFlowResult::Success(message)
        }
        LoginResult::Invalid(e) => AuthFlowResult::Error(format!("{}: {}", e.field, e)),
        LoginResult::Failed(message) => AuthFlowResult::Error(message),
    }
}

pub async fn handle_face_login(
    client: &PortalClient,
    config: &PortalConfig,
    image: &Path,
) -> AuthFlowResult {
    let capture = match FaceCapture::from_file(image) {
        Ok(capture) => capture,
        Err(e) => return AuthFlowResult::Error(e.to_string()),
    };
    let context = ClientContext::collect(config.redirect_url.clone());
    let outcome = upload_face(client, &capture, &context).await;
    if outcome.is_success() {
        AuthFlowResult::Success(outcome.message().to_string())
    } else {
        AuthFlowResult::Error(outcome.message().to_string())
    }
}

/// Forgot-password journey with a live OTP cooldown
pub async fn handle_forgot_password(
    input: &mut InputReader,
    client: &PortalClient,
    config: &PortalConfig,
) -> AuthFlowResult {
    println!("\n=== Forgot Password ===");
    let mut flow = PasswordResetFlow::new(FlowSettings::from_config(config));
    let mut ticker: Option<CooldownTicker> = None;
    let mut contact: Option<(String, String)> = None;

    loop {
        catch_up(&mut flow, &mut ticker);
        print_status(&flow);
        println!("1. Get OTP   2. Change password   3. Back");
        if let Err(e) = print_prompt("> ") {
            return e.into();
        }

        let choice = match wait_for_input(input, &mut flow, &mut ticker).await {
            Ok(choice) => choice,
            Err(e) => return e.into(),
        };

        match choice.as_str() {
            "1" | "otp" => {
                let (username, email) = match &contact {
                    Some(known) => known.clone(),
                    None => {
                        let username = match input.prompt("Username: ").await {
                            Ok(u) => u,
                            Err(e) => return e.into(),
                        };
                        let email = match input.prompt("Email: ").await {
                            Ok(e) => e,
                            Err(e) => return e.into(),
                        };
                        (username, email)
                    }
                };
                catch_up(&mut flow, &mut ticker);
                match flow.request_otp(client, &username, &email).await {
                    Ok(outcome) => {
                        if outcome.is_success() {
                            contact = Some((username, email));
                        }
                        ticker = flow.cooldown_ticker();
                    }
                    Err(e) => print_flow_error(&e),
                }
            }
            "2" | "change" => {
                let otp = match input.prompt("Enter OTP from Email: ").await {
                    Ok(o) => o,
                    Err(e) => return e.into(),
                };
                let new_password = match read_secret("New password: ").await {
                    Ok(p) => p,
                    Err(e) => return e.into(),
                };
                let confirm_password = match read_secret("Confirm password: ").await {
                    Ok(p) => p,
                    Err(e) => return e.into(),
                };
                catch_up(&mut flow, &mut ticker);
                if let Err(e) = flow
                    .submit_reset(client, &otp, &new_password, &confirm_password)
                    .await
                {
                    print_flow_error(&e);
                }
            }
            "3" | "back" => return AuthFlowResult::Back,
            _ => println!("Invalid choice."),
        }

        flush_messages(&mut flow);
        match flow.state() {
            FlowState::Completed => {
                return AuthFlowResult::Success("You can now log in with your new password.".to_string())
            }
            FlowState::Locked => return AuthFlowResult::Error(LOCKED_OUT_MESSAGE.to_string()),
            _ => {}
        }
    }
}

/// Forgot-username journey
pub async fn handle_forgot_username(
    input: &mut InputReader,
    client: &PortalClient,
    config: &PortalConfig,
) -> AuthFlowResult {
    println!("\n=== Forgot Username ===");
    let mut flow = UsernameRecoveryFlow::new(FlowSettings::from_config(config));
    let mut ticker: Option<CooldownTicker> = None;
    let mut email: Option<String> = None;

    loop {
        catch_up(&mut flow, &mut ticker);
        print_status(&flow);
        println!("1. Get OTP   2. Verify   3. Back");
        if let Err(e) = print_prompt("> ") {
            return e.into();
        }

        let choice = match wait_for_input(input, &mut flow, &mut ticker).await {
            Ok(choice) => choice,
            Err(e) => return e.into(),
        };

        match choice.as_str() {
            "1" | "otp" => {
                let address = match &email {
                    Some(known) => known.clone(),
                    None => match input.prompt("Email: ").await {
                        Ok(e) => e,
                        Err(e) => return e.into(),
                    },
                };
                catch_up(&mut flow, &mut ticker);
                match flow.request_otp(client, &address).await {
                    Ok(outcome) => {
                        if outcome.is_success() {
                            email = Some(address);
                        }
                        ticker = flow.cooldown_ticker();
                    }
                    Err(e) => print_flow_error(&e),
                }
            }
            "2" | "verify" => {
                let otp = match input.prompt("Enter OTP from email: ").await {
                    Ok(o) => o,
                    Err(e) => return e.into(),
                };
                catch_up(&mut flow, &mut ticker);
                if let Err(e) = flow.verify(client, &otp).await {
                    print_flow_error(&e);
                }
            }
            "3" | "back" => return AuthFlowResult::Back,
            _ => println!("Invalid choice."),
        }

        flush_messages(&mut flow);
        match flow.state() {
            FlowState::Completed => {
                return AuthFlowResult::Success(format!(
                    "Your username(s): {}",
                    flow.usernames().join(", ")
                ))
            }
            FlowState::Locked => return AuthFlowResult::Error(LOCKED_OUT_MESSAGE.to_string()),
            _ => {}
        }
    }
}

/// Wait for a line of input while feeding cooldown ticks into the flow
async fn wait_for_input<F: CooldownFlow>(
    input: &mut InputReader,
    flow: &mut F,
    ticker: &mut Option<CooldownTicker>,
) -> io::Result<String> {
    loop {
        tokio::select! {
            line = input.next_line() => {
                catch_up(flow, ticker);
                return line.map(|l| l.to_lowercase());
            }
            Some(due) = next_tick(ticker) => {
                if apply_ticks(flow, ticker, due) {
                    print_prompt("> ")?;
                }
            }
        }
    }
}

/// Apply every tick that came due while the terminal was busy elsewhere
fn catch_up<F: CooldownFlow>(flow: &mut F, ticker: &mut Option<CooldownTicker>) {
    let due = ticker.as_mut().map_or(0, CooldownTicker::take_due);
    if due > 0 {
        apply_ticks(flow, ticker, due);
    }
}

/// Returns true once the cooldown has run out, after telling the user
fn apply_ticks<F: CooldownFlow>(flow: &mut F, ticker: &mut Option<CooldownTicker>, due: u32) -> bool {
    let state = flow.advance(due);
    if flow.otp().cooldown_seconds_remaining > 0 {
        return false;
    }
    *ticker = None;
    if state == FlowState::Locked {
        println!("\n{}", LOCKED_OUT_MESSAGE);
    } else if flow.otp().can_request() {
        println!("\nYou can request a new OTP now.");
    }
    true
}

async fn next_tick(ticker: &mut Option<CooldownTicker>) -> Option<u32> {
    match ticker {
        Some(ticker) => ticker.next_tick().await,
        None => std::future::pending().await,
    }
}

fn print_status<F: CooldownFlow>(flow: &F) {
    let otp = flow.otp();
    if otp.issued && otp.is_cooling_down() {
        println!("Resend OTP in: {}", format_countdown(otp.cooldown_seconds_remaining));
    }
    if otp.issued && otp.attempts_remaining > 0 {
        println!("Attempts remaining: {}", otp.attempts_remaining);
    }
}

fn print_flow_error(error: &FlowError) {
    match error {
        FlowError::Validation(e) => println!("{}: {}", e.field, e),
        other => println!("{}", other),
    }
}

fn flush_messages<F: CooldownFlow>(flow: &mut F) {
    for message in flow.messages().drain(Instant::now()) {
        match message.kind {
            MessageKind::Info => println!("{}", message.text),
            MessageKind::Error => println!("Error: {}", message.text),
        }
    }
}
