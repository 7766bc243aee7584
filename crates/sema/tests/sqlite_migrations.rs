use std::collections::HashSet;

use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
use sema::{SemaConfig, SemaResult, SemaStore};
use tempfile::tempdir;

async fn list_tables(store: &SemaStore) -> SemaResult<HashSet<String>> {
    let rows = store
        .connection()
        .query_all(Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT name FROM sqlite_master WHERE type = 'table'",
        ))
        .await
        .map_err(sema::SemaError::from)?;
    let mut tables = HashSet::new();
    for row in rows {
        let name: String = row.try_get("", "name").map_err(sema::SemaError::from)?;
        tables.insert(name);
    }
    Ok(tables)
}

#[tokio::test]
async fn sqlite_migrations_create_the_metadata_table() -> SemaResult<()> {
    let dir = tempdir().expect("tempdir");
    let base = dir.path();
    let config = SemaConfig::default_sqlite(base.join("sema.sqlite").to_string_lossy());
    let store = SemaStore::connect(&config, base).await?;
    let tables = list_tables(&store).await?;
    assert!(
        tables.contains("sema_metadata"),
        "expected table 'sema_metadata' to exist"
    );
    // Idempotency check.
    let _store = SemaStore::connect(&config, base).await?;
    Ok(())
}
