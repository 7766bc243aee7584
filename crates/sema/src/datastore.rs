use std::path::{Path, PathBuf};

use crate::{SemaConfig, SemaResult, SemaStore};

const DEFAULT_DB_NAME: &str = "sema.sqlite";

pub fn load_or_init_config(base: &Path) -> SemaResult<SemaConfig> {
    let default_sqlite = base.join(DEFAULT_DB_NAME);
    SemaConfig::load_or_init(base, &default_sqlite)
}

pub async fn open_store(base: &Path) -> SemaResult<SemaStore> {
    let config = load_or_init_config(base)?;
    SemaStore::connect(&config, base).await
}

pub fn default_sqlite_path(base: &Path) -> PathBuf {
    base.join(DEFAULT_DB_NAME)
}

#[cfg(test)]
mod tests {
    use super::{default_sqlite_path, load_or_init_config, open_store};
    use tempfile::tempdir;

    #[tokio::test]
    async fn opens_store_with_default_config() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path();
        let config = load_or_init_config(base).expect("config");
        assert_eq!(config.backend_name(), "sqlite");
        let store = open_store(base).await.expect("open store");
        assert!(default_sqlite_path(base).exists());
        let _ = store;
    }
}
