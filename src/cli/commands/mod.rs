use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    Command::new("kawal")
        .about("Session, identity and navigation guarding client")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("api-key")
                .short('k')
                .long("api-key")
                .help("Provider API key, sent with every identity request")
                .env("KAWAL_API_KEY")
                .required(true),
        )
        .arg(
            Arg::new("identity-url")
                .long("identity-url")
                .help("Identity provider base URL, example: https://identity.example.dev")
                .env("KAWAL_IDENTITY_URL")
                .required(true),
        )
        .arg(
            Arg::new("token-url")
                .long("token-url")
                .help("Token exchange base URL (defaults to the identity URL)")
                .env("KAWAL_TOKEN_URL"),
        )
        .arg(
            Arg::new("store-url")
                .long("store-url")
                .help("Document store base URL")
                .env("KAWAL_STORE_URL")
                .required(true),
        )
        .arg(
            Arg::new("project-id")
                .long("project-id")
                .help("Provider project id, namespaces document store records")
                .env("KAWAL_PROJECT_ID")
                .required(true),
        )
        .arg(
            Arg::new("app-id")
                .long("app-id")
                .help("Application id, namespaces the persisted session file")
                .env("KAWAL_APP_ID")
                .default_value("default"),
        )
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .help("Backend API base URL")
                .env("KAWAL_API_URL")
                .required(true),
        )
        .arg(
            Arg::new("session-file")
                .long("session-file")
                .help("Persisted session path (defaults to .kawal-<app-id>.json)")
                .env("KAWAL_SESSION_FILE"),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("KAWAL_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .subcommand(
            Command::new("register")
                .about("Create a principal and write its profile record")
                .arg(
                    Arg::new("email")
                        .long("email")
                        .help("Email address for the new principal")
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .long("password")
                        .help("Password for the new principal")
                        .env("KAWAL_PASSWORD")
                        .required(true),
                )
                .arg(
                    Arg::new("username")
                        .long("username")
                        .help("Display name stored in the profile record")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in with email and password, persisting the session")
                .arg(
                    Arg::new("email")
                        .long("email")
                        .help("Email address of the principal")
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .long("password")
                        .help("Password of the principal")
                        .env("KAWAL_PASSWORD")
                        .required(true),
                ),
        )
        .subcommand(Command::new("users").about("List users via the backend API"))
        .subcommand(
            Command::new("delete-user")
                .about("Delete a user by id, then resynchronize the list")
                .arg(
                    Arg::new("id")
                        .help("User id to delete")
                        .required(true),
                ),
        )
        .subcommand(Command::new("logout").about("Sign out and drop the persisted session"))
}
