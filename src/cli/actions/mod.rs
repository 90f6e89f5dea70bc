pub mod delete_user;
pub mod login;
pub mod logout;
pub mod register;
pub mod users;

// Internal "interpreter" for `Action`.
// We keep the match in a separate module so `mod.rs` stays small as more actions are added.
mod run;

use crate::cli::globals::GlobalArgs;
use secrecy::SecretString;

#[derive(Debug)]
pub enum Action {
    Register {
        email: String,
        password: SecretString,
        username: String,
    },
    Login {
        email: String,
        password: SecretString,
    },
    Users,
    DeleteUser {
        id: String,
    },
    Logout,
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self, globals: &GlobalArgs) -> anyhow::Result<()> {
        run::execute(globals, self).await
    }
}
