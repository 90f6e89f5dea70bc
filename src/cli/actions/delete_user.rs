use crate::{
    api::ApiClient, cli::globals::GlobalArgs, identity::RestIdentity, session::SessionStore,
};
use anyhow::Result;
use std::sync::Arc;

pub async fn handle(globals: &GlobalArgs, id: &str) -> Result<()> {
    let identity = Arc::new(RestIdentity::new(globals)?);
    identity.restore().await?;

    let api = ApiClient::new(globals, identity.clone())?;
    let session = SessionStore::new(api, identity);

    let remaining = session.delete_user(id).await?;

    println!("deleted {id}, {} users remaining", remaining.len());

    Ok(())
}
