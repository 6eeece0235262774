pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod routes;
pub mod structs;
pub mod uploads;

use sqlx::SqlitePool;

use config::AppConfig;

#[derive(Debug, Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: AppConfig,
}
