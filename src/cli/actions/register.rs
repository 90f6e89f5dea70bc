use crate::{account, cli::globals::GlobalArgs, identity::RestIdentity, store::DocumentStore};
use anyhow::Result;
use secrecy::SecretString;

pub async fn handle(
    globals: &GlobalArgs,
    email: &str,
    password: &SecretString,
    username: &str,
) -> Result<()> {
    let identity = RestIdentity::new(globals)?;
    let store = DocumentStore::new(globals)?;

    let principal = account::register_user(&identity, &store, email, password, username).await?;

    println!("registered {} ({})", principal.email, principal.uid);

    Ok(())
}
