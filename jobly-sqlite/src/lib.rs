mod config;
mod database;
mod schema;

pub use config::SqliteConfig;
pub use database::SqliteDatabase;
