use secrecy::SecretString;
use std::path::PathBuf;

/// Connection parameters shared by every action. All values come from the
/// process environment or flags at startup and are treated as opaque.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub api_key: SecretString,
    pub identity_url: String,
    pub token_url: String,
    pub store_url: String,
    pub project_id: String,
    pub app_id: String,
    pub api_url: String,
    pub session_file: PathBuf,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(identity_url: String) -> Self {
        Self {
            api_key: SecretString::default(),
            identity_url,
            token_url: String::new(),
            store_url: String::new(),
            project_id: String::new(),
            app_id: "default".to_string(),
            api_url: String::new(),
            session_file: PathBuf::from(".kawal-default.json"),
        }
    }

    pub fn set_api_key(&mut self, api_key: SecretString) {
        self.api_key = api_key;
    }
}
