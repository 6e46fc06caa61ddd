use crate::entities::photos;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Schema};
use std::time::Duration;
use tracing::info;

pub async fn setup_database(database_url: &str) -> anyhow::Result<DatabaseConnection> {
    info!("📂 Database: {}", redact_password(database_url));

    // Every connection to `sqlite::memory:` opens its own empty database.
    let max_connections = if database_url.starts_with("sqlite") { 1 } else { 20 };

    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db, database_url).await?;

    Ok(db)
}

/// Postgres gets the versioned SQL migrations; every other backend (SQLite
/// in tests and local runs) gets the schema derived from the entities.
pub async fn run_migrations(db: &DatabaseConnection, database_url: &str) -> anyhow::Result<()> {
    let builder = db.get_database_backend();

    if builder == DatabaseBackend::Postgres {
        info!("🔄 Running SQLx migrations for PostgreSQL...");
        let pool = sqlx::PgPool::connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        pool.close().await;
    } else {
        info!("🔄 Running SeaORM auto-migrations...");
        let schema = Schema::new(builder);
        let stmt = schema
            .create_table_from_entity(photos::Entity)
            .if_not_exists()
            .to_owned();
        db.execute(builder.build(&stmt)).await?;
    }

    Ok(())
}

fn redact_password(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((userinfo, host)) = rest.rsplit_once('@') else {
        return url.to_string();
    };
    match userinfo.split_once(':') {
        Some((user, _)) => format!("{}://{}:***@{}", scheme, user, host),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_password() {
        assert_eq!(
            redact_password("postgres://app:s3cret@db:5432/photos"),
            "postgres://app:***@db:5432/photos"
        );
        assert_eq!(
            redact_password("postgres://app@db:5432/photos"),
            "postgres://app@db:5432/photos"
        );
        assert_eq!(redact_password("sqlite::memory:"), "sqlite::memory:");
    }

    #[tokio::test]
    async fn test_sqlite_migrations_are_idempotent() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        run_migrations(&db, "sqlite::memory:").await.unwrap();
        run_migrations(&db, "sqlite::memory:").await.unwrap();
    }
}
