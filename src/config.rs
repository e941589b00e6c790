use rocket::figment::Figment;
use rocket::figment::providers::Serialized;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://travel_tracker.db";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_url: String,
    pub default_user_id: i64,
    pub static_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            default_user_id: 1,
            static_dir: "public".to_string(),
        }
    }
}

/// Rocket's own figment layered over our defaults, with `DATABASE_URL` taking precedence.
pub fn figment() -> Figment {
    let figment = rocket::Config::figment().join(Serialized::defaults(AppConfig::default()));

    match dotenvy::var("DATABASE_URL") {
        Ok(url) if !url.is_empty() => figment.merge(Serialized::global("database_url", url)),
        _ => figment,
    }
}

impl AppConfig {
    pub fn from_figment(figment: &Figment) -> Result<Self, rocket::figment::Error> {
        figment.extract()
    }
}
