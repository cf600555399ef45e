use api::configuration::DatabaseSettings;
use sqlx::{Connection, Executor, PgConnection, PgPool};

/// Creates the database named in `settings`, runs all migrations from the
/// "./migrations" directory, and returns a [`PgPool`] connected to it.
/// Panics if database creation or migration fails.
pub async fn create_campus_api_database(settings: &DatabaseSettings) -> PgPool {
    // Create the database via a single connection.
    let mut connection = PgConnection::connect_with(&settings.without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, settings.name))
        .await
        .expect("Failed to create database");

    // Create a connection pool to the database.
    let connection_pool = PgPool::connect_with(settings.with_db())
        .await
        .expect("Failed to connect to Postgres");

    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database");

    connection_pool
}
