#[macro_use]
extern crate rocket;

mod config;
mod db;
mod env;
mod error;
mod models;
mod routes;
mod session;
mod telemetry;
#[cfg(test)]
mod test;

use config::AppConfig;
use error::AppError;
use rocket::fs::FileServer;
use rocket::{Build, Rocket};
use rocket_dyn_templates::Template;
use routes::{add_country, home, new_user, not_found, server_error, switch_user, unprocessable};
use sqlx::{Pool, Sqlite};
use telemetry::{TelemetryFairing, init_tracing};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Env(#[from] dotenvy::Error),
    #[error("{0}")]
    Figment(#[from] rocket::figment::Error),
    #[error("Application error: {0}")]
    App(#[from] AppError),
}

#[launch]
async fn rocket() -> _ {
    let loaded_env_files = env::load_environment();

    init_tracing();

    match build(loaded_env_files).await {
        Ok(rocket) => rocket,
        Err(e) => {
            error!("Failed to start travel tracker: {}", e);
            panic!("Startup failed: {}", e);
        }
    }
}

async fn build(
    loaded_env_files: Result<Vec<&'static str>, dotenvy::Error>,
) -> Result<Rocket<Build>, Error> {
    for file in loaded_env_files? {
        info!("Loaded environment from: {}", file);
    }

    let config = AppConfig::from_figment(&config::figment())?;
    let pool = db::connect(&config.database_url).await?;

    Ok(init_rocket(pool, config))
}

pub fn init_rocket(pool: Pool<Sqlite>, config: AppConfig) -> Rocket<Build> {
    info!("Starting travel tracker");

    let static_files = FileServer::from(&config.static_dir);

    rocket::custom(config::figment())
        .manage(pool)
        .manage(config)
        .mount("/", routes![home, add_country, switch_user, new_user])
        .mount("/", static_files)
        .register("/", catchers![not_found, unprocessable, server_error])
        .attach(Template::fairing())
        .attach(TelemetryFairing)
}
