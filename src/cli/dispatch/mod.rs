use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::{bail, Context, Result};
use secrecy::SecretString;
use std::path::PathBuf;

/// # Errors
/// Returns an error if required arguments are missing or no subcommand was given.
pub fn handler(matches: &clap::ArgMatches) -> Result<(GlobalArgs, Action)> {
    let globals = globals(matches)?;

    let action = match matches.subcommand() {
        Some(("register", sub)) => Action::Register {
            email: required(sub, "email")?,
            password: SecretString::from(required(sub, "password")?),
            username: required(sub, "username")?,
        },
        Some(("login", sub)) => Action::Login {
            email: required(sub, "email")?,
            password: SecretString::from(required(sub, "password")?),
        },
        Some(("users", _)) => Action::Users,
        Some(("delete-user", sub)) => Action::DeleteUser {
            id: required(sub, "id")?,
        },
        Some(("logout", _)) => Action::Logout,
        _ => bail!("missing subcommand"),
    };

    Ok((globals, action))
}

fn required(matches: &clap::ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .with_context(|| format!("missing required argument: --{name}"))
}

fn globals(matches: &clap::ArgMatches) -> Result<GlobalArgs> {
    let identity_url = required(matches, "identity-url")?;
    let token_url = matches
        .get_one::<String>("token-url")
        .cloned()
        .unwrap_or_else(|| identity_url.clone());
    let app_id = matches
        .get_one::<String>("app-id")
        .cloned()
        .unwrap_or_else(|| "default".to_string());
    let session_file = matches
        .get_one::<String>("session-file")
        .map_or_else(|| PathBuf::from(format!(".kawal-{app_id}.json")), PathBuf::from);

    Ok(GlobalArgs {
        api_key: SecretString::from(required(matches, "api-key")?),
        identity_url,
        token_url,
        store_url: required(matches, "store-url")?,
        project_id: required(matches, "project-id")?,
        app_id,
        api_url: required(matches, "api-url")?,
        session_file,
    })
}
