use clap::{Arg, Command};
use log::error;
use std::path::{Path, PathBuf};
use std::process;

use member_portal::auth::user_interface::{
    handle_face_login, handle_forgot_password, handle_forgot_username, handle_login,
    main_auth_flow, AuthFlowResult,
};
use member_portal::chat::chat_url;
use member_portal::config::settings::ENV_CONFIG_FILE;
use member_portal::utils::io::InputReader;
use member_portal::utils::logging::initialize_logging;
use member_portal::{PortalClient, PortalConfig};

fn cli() -> Command {
    Command::new("member-portal")
        .about("Member portal login and account recovery")
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("FILE")
                .help("JSON file with portal endpoints and policies"),
        )
        .subcommand(Command::new("login").about("Log in with username and password"))
        .subcommand(Command::new("forgot-password").about("Reset a password with an email OTP"))
        .subcommand(Command::new("forgot-username").about("Recover usernames with an email OTP"))
        .subcommand(
            Command::new("face-login")
                .about("Log in by uploading a face capture")
                .arg(
                    Arg::new("image")
                        .help("JPEG or PNG image of your face")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("chat-url")
                .about("Print the chat address for a session")
                .arg(
                    Arg::new("session_id")
                        .help("Session id returned by login")
                        .required(true),
                ),
        )
}

#[tokio::main]
async fn main() {
    if let Err(e) = initialize_logging() {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }

    let matches = cli().get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .cloned()
        .or_else(|| std::env::var(ENV_CONFIG_FILE).ok())
        .map(PathBuf::from);
    let config = match PortalConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if let Some(sub_matches) = matches.subcommand_matches("chat-url") {
        if let Some(session_id) = sub_matches.get_one::<String>("session_id") {
            match chat_url(&config.chat_url, session_id) {
                Ok(url) => println!("{}", url),
                Err(e) => {
                    eprintln!("Error: invalid chat url: {}", e);
                    process::exit(1);
                }
            }
        }
        return;
    }

    let client = match PortalClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let mut input = InputReader::new();
    let result = match matches.subcommand() {
        Some(("login", _)) => handle_login(&mut input, &client, &config).await,
        Some(("forgot-password", _)) => handle_forgot_password(&mut input, &client, &config).await,
        Some(("forgot-username", _)) => handle_forgot_username(&mut input, &client, &config).await,
        Some(("face-login", sub_matches)) => match sub_matches.get_one::<String>("image") {
            Some(image) => handle_face_login(&client, &config, Path::new(image)).await,
            None => AuthFlowResult::Error("An image path is required".to_string()),
        },
        _ => {
            main_auth_flow(&client, &config).await;
            return;
        }
    };

    match result {
        AuthFlowResult::Success(message) => println!("{}", message),
        AuthFlowResult::Back => {}
        AuthFlowResult::Error(message) => {
            eprintln!("Error: {}", message);
            process::exit(1);
        }
    }
}
