use serde::{Deserialize, Serialize};
use std::env;

const DEFAULT_DATABASE_URL: &str = "sqlite://holodex.db?mode=rwc";

#[derive(Deserialize, Serialize, Default, Debug)]
pub struct Configuration {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub seed: SeedData,
}

impl Configuration {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let config = std::fs::read_to_string(path)?;
        let cfg: Self = toml::from_str(&config)?;
        Ok(cfg)
    }

    /// DATABASE_URL wins over the file; falls back to a local sqlite file.
    pub fn database_url(&self) -> String {
        env::var("DATABASE_URL")
            .ok()
            .or_else(|| self.database.url.clone())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
    }
}

#[derive(Deserialize, Serialize, Default, Debug)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ServerSettings {
    /// The caller's identity. There is no session mechanism; every request
    /// mutates the favorites of this one user.
    #[serde(default = "default_user_id")]
    pub current_user_id: i32,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            current_user_id: default_user_id(),
        }
    }
}

fn default_user_id() -> i32 {
    1
}

#[derive(Deserialize, Serialize, Default, Debug)]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub planets: Vec<SeedPlanet>,
    #[serde(default)]
    pub characters: Vec<SeedCharacter>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SeedUser {
    pub id: i32,
    pub email: String,
    pub password: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SeedPlanet {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub climate: Option<String>,
    #[serde(default)]
    pub terrain: Option<String>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SeedCharacter {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub height: Option<String>,
    #[serde(default)]
    pub mass: Option<String>,
}
