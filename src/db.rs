use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{CountryPosition, DbUser, User};

/// Opens the store behind a single long-lived connection and brings the schema up to date.
#[instrument]
pub async fn connect(database_url: &str) -> Result<Pool<Sqlite>, AppError> {
    info!("Connecting to database");
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations completed successfully");

    Ok(pool)
}

#[instrument]
pub async fn list_users(pool: &Pool<Sqlite>) -> Result<Vec<User>, AppError> {
    info!("Listing users");
    let rows = sqlx::query_as::<_, DbUser>("SELECT id, name, color FROM users ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(User::from).collect())
}

#[instrument]
pub async fn list_visited_countries(
    pool: &Pool<Sqlite>,
    user_id: i64,
) -> Result<Vec<String>, AppError> {
    info!("Listing visited countries");
    let codes = sqlx::query_scalar::<_, String>(
        "SELECT country_code FROM visited_countries
         WHERE user_id = ?
         ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(codes)
}

#[instrument]
pub async fn get_user(pool: &Pool<Sqlite>, user_id: i64) -> Result<Option<User>, AppError> {
    info!("Fetching user by ID");
    let row = sqlx::query_as::<_, DbUser>("SELECT id, name, color FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(User::from))
}

#[instrument]
pub async fn resolve_country_code(
    pool: &Pool<Sqlite>,
    country_name: &str,
) -> Result<Option<String>, AppError> {
    info!("Resolving country code");
    let code = sqlx::query_scalar::<_, String>(
        "SELECT country_code FROM countries WHERE country_name = ?",
    )
    .bind(country_name)
    .fetch_optional(pool)
    .await?;

    Ok(code)
}

/// Every country with a known map position, ordered by code.
#[instrument]
pub async fn list_country_positions(pool: &Pool<Sqlite>) -> Result<Vec<CountryPosition>, AppError> {
    info!("Listing country positions");
    let positions = sqlx::query_as::<_, CountryPosition>(
        "SELECT country_code AS code, country_name AS name, latitude, longitude
         FROM countries
         WHERE latitude IS NOT NULL AND longitude IS NOT NULL
         ORDER BY country_code",
    )
    .fetch_all(pool)
    .await?;

    Ok(positions)
}

#[instrument]
pub async fn insert_visited_country(
    pool: &Pool<Sqlite>,
    country_code: &str,
    user_id: i64,
) -> Result<i64, AppError> {
    info!("Inserting visited country");
    let res = sqlx::query("INSERT INTO visited_countries (country_code, user_id) VALUES (?, ?)")
        .bind(country_code)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument]
pub async fn insert_user(pool: &Pool<Sqlite>, name: &str, color: &str) -> Result<i64, AppError> {
    info!("Creating new user");
    let res = sqlx::query("INSERT INTO users (name, color) VALUES (?, ?)")
        .bind(name)
        .bind(color)
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}
