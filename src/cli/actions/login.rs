use crate::{cli::globals::GlobalArgs, identity::RestIdentity};
use anyhow::Result;
use secrecy::SecretString;

pub async fn handle(globals: &GlobalArgs, email: &str, password: &SecretString) -> Result<()> {
    let identity = RestIdentity::new(globals)?;

    let principal = identity.sign_in(email, password).await?;

    println!("signed in as {} ({})", principal.email, principal.uid);

    Ok(())
}
