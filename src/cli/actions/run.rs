use crate::cli::{
    actions::{delete_user, login, logout, register, users, Action},
    globals::GlobalArgs,
};
use anyhow::Result;

pub async fn execute(globals: &GlobalArgs, action: Action) -> Result<()> {
    match action {
        Action::Register {
            email,
            password,
            username,
        } => register::handle(globals, &email, &password, &username).await,
        Action::Login { email, password } => login::handle(globals, &email, &password).await,
        Action::Users => users::handle(globals).await,
        Action::DeleteUser { id } => delete_user::handle(globals, &id).await,
        Action::Logout => logout::handle(globals).await,
    }
}
