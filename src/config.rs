use std::path::PathBuf;

use config::{Config as ConfigBuilder, File};
use serde::Deserialize;

use crate::session::ThemeStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub tmdb_api_key: String,
    pub login_username: String,
    pub login_password: String,
    pub theme_path: PathBuf,
}

impl Config {
    pub fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = ConfigBuilder::builder()
            .add_source(File::with_name("config").required(false))
            .set_default("login_username", "admin")?
            .set_default("login_password", "1234")?
            .build()?;

        let login_username = std::env::var("LOGIN_USERNAME").unwrap_or_else(|_| {
            config
                .get_string("login_username")
                .unwrap_or_else(|_| "admin".to_string())
        });

        let login_password = std::env::var("LOGIN_PASSWORD").unwrap_or_else(|_| {
            config
                .get_string("login_password")
                .unwrap_or_else(|_| "1234".to_string())
        });

        let theme_path = std::env::var("THEME_PATH")
            .map(PathBuf::from)
            .ok()
            .or_else(|| config.get_string("theme_path").ok().map(PathBuf::from))
            .unwrap_or_else(ThemeStore::default_path);

        Ok(Config {
            tmdb_api_key: std::env::var("TMDB_API_KEY")
                .map_err(|_| anyhow::anyhow!("TMDB_API_KEY environment variable not set"))?,
            login_username,
            login_password,
            theme_path,
        })
    }
}
