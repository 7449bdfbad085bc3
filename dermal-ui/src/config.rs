//! Client settings: CLI → ENV → TOML → default

use dermal_common::config::{default_data_folder, resolve, TomlConfig};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5780";
pub const DEFAULT_LOG_FILTER: &str = "dermal_ui=info";
pub const PAYMENT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub server_url: String,
    pub session_file: PathBuf,
}

impl ClientConfig {
    /// `server_url` and `session_file` arrive already merged from CLI and ENV
    pub fn resolve(server_url: Option<String>, session_file: Option<PathBuf>, toml: &TomlConfig) -> Self {
        Self {
            server_url: resolve(
                server_url,
                toml.client.server_url.clone(),
                DEFAULT_SERVER_URL.to_string(),
            ),
            session_file: resolve(
                session_file,
                toml.client.session_file.clone(),
                default_data_folder().join("session.json"),
            ),
        }
    }
}
