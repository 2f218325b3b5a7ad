use std::time::Duration;

use sea_orm::sea_query::{Index, PostgresQueryBuilder, SqliteQueryBuilder};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::entity::collection;

pub async fn init_db(config: &DatabaseConfig, url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(url.to_owned());

    // Set connection pool options
    opt.max_connections(config.max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("server::entity::*")
        .sync(&db)
        .await?;
    ensure_indexes(&db).await?;

    Ok(db)
}

/// Natural keys are unique per family. The store checks this before writing;
/// the index catches writers racing past that check.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let index = Index::create()
        .if_not_exists()
        .unique()
        .name("idx_collection_family_key")
        .table(collection::Entity)
        .col(collection::Column::Family)
        .col(collection::Column::NaturalKey)
        .to_owned();

    let stmt = match db.get_database_backend() {
        DbBackend::Sqlite => index.to_string(SqliteQueryBuilder),
        _ => index.to_string(PostgresQueryBuilder),
    };
    db.execute_unprepared(&stmt).await?;
    info!("Ensured index idx_collection_family_key exists");

    Ok(())
}
