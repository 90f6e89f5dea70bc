use crate::{
    api::ApiClient, cli::globals::GlobalArgs, identity::RestIdentity, session::SessionStore,
};
use anyhow::Result;
use std::sync::Arc;

pub async fn handle(globals: &GlobalArgs) -> Result<()> {
    let identity = Arc::new(RestIdentity::new(globals)?);
    identity.restore().await?;

    let api = ApiClient::new(globals, identity.clone())?;
    let session = SessionStore::new(api, identity);

    let users = session.fetch_all().await?;

    if users.is_empty() {
        println!("no users");
    } else {
        for user in &users {
            println!("{}\t{}\t{}", user.id, user.username, user.email);
        }
    }

    Ok(())
}
