//! Relational metadata store: owner-scoped CRUD plus attribute-filtered
//! owner retrieval.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::sea_query;
use sea_orm::sea_query::{
    Expr, ExprTrait, MysqlQueryBuilder, PostgresQueryBuilder, Query, QueryStatementWriter,
    SqliteQueryBuilder, Value as SeaValue,
};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, QueryResult,
    Statement, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use serde_json::Value as JsonValue;
use tracing::debug;
use uuid::Uuid;

use crate::api::{MetaQueryApi, MetaRecord, MetadataApi};
use crate::db::SemaMetadata;
use crate::ids::Id;
use crate::migration::Migrator;
use crate::owner::{DeletionHook, OwnerRef};
use crate::query::apply_meta_filters;
use crate::value::MetaValue;
use crate::{SemaConfig, SemaError, SemaResult};

#[derive(Clone)]
pub struct SemaStore {
    conn: DatabaseConnection,
    backend: DatabaseBackend,
}

impl SemaStore {
    /// Connect per config and bring the schema up to date.
    pub async fn connect(config: &SemaConfig, base_dir: &Path) -> SemaResult<Self> {
        let url = build_connection_url(config, base_dir)?;
        let mut options = ConnectOptions::new(url);
        if let Some(pool) = &config.pool {
            if let Some(max) = pool.max_connections {
                options.max_connections(max);
            }
            if let Some(timeout_ms) = pool.connect_timeout_ms {
                options.connect_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(timeout_ms) = pool.idle_timeout_ms {
                options.idle_timeout(Duration::from_millis(timeout_ms));
            }
        }
        let conn = Database::connect(options).await.map_err(SemaError::from)?;
        let backend = conn.get_database_backend();
        let store = Self { conn, backend };
        Migrator::up(&store.conn, None)
            .await
            .map_err(SemaError::from)?;
        debug!(backend = config.backend_name(), "sema store connected");
        Ok(store)
    }

    pub async fn connect_sqlite(path: &Path) -> SemaResult<Self> {
        let config = SemaConfig::default_sqlite(path.to_string_lossy());
        Self::connect(&config, path.parent().unwrap_or_else(|| Path::new("."))).await
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Cascade handle for the host's entity-deletion lifecycle; see
    /// [`DeletionHook`].
    pub fn deletion_hook(&self) -> DeletionHook {
        DeletionHook::new(self.clone())
    }

    async fn fetch_record<C: ConnectionTrait>(
        &self,
        conn: &C,
        owner: &OwnerRef,
        key: &str,
    ) -> SemaResult<Option<MetaRecord>> {
        let select = Query::select()
            .from(SemaMetadata::Table)
            .columns([
                SemaMetadata::Id,
                SemaMetadata::OwnerId,
                SemaMetadata::OwnerType,
                SemaMetadata::Key,
                SemaMetadata::Value,
            ])
            .and_where(Expr::col(SemaMetadata::OwnerType).eq(owner.owner_type.as_str()))
            .and_where(Expr::col(SemaMetadata::OwnerId).eq(id_value(self.backend, owner.owner_id)))
            .and_where(Expr::col(SemaMetadata::Key).eq(key))
            .limit(1)
            .to_owned();
        let row = query_one(conn, &select).await?;
        row.map(|row| read_record(&row)).transpose()
    }
}

#[async_trait]
impl MetadataApi for SemaStore {
    async fn get_meta(&self, owner: &OwnerRef, key: &str) -> SemaResult<Option<MetaRecord>> {
        if key.is_empty() {
            return Ok(None);
        }
        self.fetch_record(&self.conn, owner, key).await
    }

    async fn get_meta_value(&self, owner: &OwnerRef, key: &str) -> SemaResult<Option<String>> {
        Ok(self.get_meta(owner, key).await?.map(|record| record.value))
    }

    async fn set_meta(
        &self,
        owner: &OwnerRef,
        key: &str,
        value: MetaValue,
    ) -> SemaResult<Option<MetaRecord>> {
        if key.is_empty() {
            return Ok(None);
        }
        let text = value.as_text();
        let tx = self.conn.begin().await?;
        // Uniqueness per (owner, key) is an application invariant: check
        // before insert, update in place on a hit.
        let record = match self.fetch_record(&tx, owner, key).await? {
            Some(mut record) => {
                let update = Query::update()
                    .table(SemaMetadata::Table)
                    .values([(SemaMetadata::Value, text.clone().into())])
                    .and_where(Expr::col(SemaMetadata::Id).eq(id_value(self.backend, record.id)))
                    .to_owned();
                exec(&tx, &update).await?;
                record.value = text;
                record
            }
            None => {
                let id = Id::new();
                let insert = Query::insert()
                    .into_table(SemaMetadata::Table)
                    .columns([
                        SemaMetadata::Id,
                        SemaMetadata::OwnerId,
                        SemaMetadata::OwnerType,
                        SemaMetadata::Key,
                        SemaMetadata::Value,
                    ])
                    .values_panic([
                        id_value(self.backend, id).into(),
                        id_value(self.backend, owner.owner_id).into(),
                        owner.owner_type.clone().into(),
                        key.to_string().into(),
                        text.clone().into(),
                    ])
                    .to_owned();
                exec(&tx, &insert).await?;
                MetaRecord {
                    id,
                    owner_type: owner.owner_type.clone(),
                    owner_id: owner.owner_id,
                    key: key.to_string(),
                    value: text,
                }
            }
        };
        tx.commit().await?;
        Ok(Some(record))
    }

    async fn set_meta_many(
        &self,
        owner: &OwnerRef,
        entries: HashMap<String, MetaValue>,
    ) -> SemaResult<Vec<MetaRecord>> {
        let mut records = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            if let Some(record) = self.set_meta(owner, &key, value).await? {
                records.push(record);
            }
        }
        Ok(records)
    }

    async fn delete_meta(&self, owner: &OwnerRef, key: &str) -> SemaResult<bool> {
        let Some(record) = self.get_meta(owner, key).await? else {
            return Ok(false);
        };
        let delete = Query::delete()
            .from_table(SemaMetadata::Table)
            .and_where(Expr::col(SemaMetadata::Id).eq(id_value(self.backend, record.id)))
            .to_owned();
        exec(&self.conn, &delete).await?;
        Ok(true)
    }

    async fn delete_all_metas(&self, owner: &OwnerRef) -> SemaResult<()> {
        let delete = Query::delete()
            .from_table(SemaMetadata::Table)
            .and_where(Expr::col(SemaMetadata::OwnerType).eq(owner.owner_type.as_str()))
            .and_where(Expr::col(SemaMetadata::OwnerId).eq(id_value(self.backend, owner.owner_id)))
            .to_owned();
        exec(&self.conn, &delete).await?;
        debug!(
            owner_type = %owner.owner_type,
            owner_id = %owner.owner_id,
            "metadata cascade delete"
        );
        Ok(())
    }
}

#[async_trait]
impl MetaQueryApi for SemaStore {
    async fn find_owner_ids(
        &self,
        owner_type: &str,
        filters: &[JsonValue],
        relation: &str,
    ) -> SemaResult<Vec<Id>> {
        let mut select = Query::select()
            .distinct()
            .column(SemaMetadata::OwnerId)
            .from(SemaMetadata::Table)
            .and_where(Expr::col(SemaMetadata::OwnerType).eq(owner_type))
            .to_owned();
        apply_meta_filters(&mut select, SemaMetadata::OwnerId, owner_type, filters, relation);
        let rows = query_all(&self.conn, &select).await?;
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            ids.push(read_id(&row, SemaMetadata::OwnerId)?);
        }
        Ok(ids)
    }
}

fn read_record(row: &QueryResult) -> SemaResult<MetaRecord> {
    Ok(MetaRecord {
        id: read_id(row, SemaMetadata::Id)?,
        owner_id: read_id(row, SemaMetadata::OwnerId)?,
        owner_type: row.try_get("", &col_name(SemaMetadata::OwnerType))?,
        key: row.try_get("", &col_name(SemaMetadata::Key))?,
        value: row.try_get("", &col_name(SemaMetadata::Value))?,
    })
}

fn id_value(backend: DatabaseBackend, id: Id) -> SeaValue {
    match backend {
        DatabaseBackend::Postgres => Uuid::from_bytes(id.as_bytes()).into(),
        DatabaseBackend::MySql => id.as_vec().into(),
        _ => id.to_uuid_string().into(),
    }
}

fn bytes_to_id(bytes: Vec<u8>) -> Option<Id> {
    if bytes.len() == 16 {
        let mut buf = [0u8; 16];
        buf.copy_from_slice(&bytes);
        Some(Id::from_bytes(buf))
    } else {
        None
    }
}

fn read_id(row: &QueryResult, column: impl sea_query::Iden) -> SemaResult<Id> {
    let name = col_name(column);
    if let Ok(value) = row.try_get::<String>("", &name) {
        return Id::from_uuid_str(&value);
    }
    if let Ok(value) = row.try_get::<Uuid>("", &name) {
        return Ok(Id::from_bytes(*value.as_bytes()));
    }
    if let Ok(value) = row.try_get::<Vec<u8>>("", &name) {
        return bytes_to_id(value).ok_or_else(|| SemaError::storage("invalid id length"));
    }
    Err(SemaError::storage("unsupported id format"))
}

fn col_name(column: impl sea_query::Iden) -> String {
    column.to_string()
}

fn build_stmt<S: QueryStatementWriter>(
    backend: DatabaseBackend,
    stmt: &S,
) -> (String, sea_orm::sea_query::Values) {
    match backend {
        DatabaseBackend::Postgres => stmt.build(PostgresQueryBuilder),
        DatabaseBackend::MySql => stmt.build(MysqlQueryBuilder),
        _ => stmt.build(SqliteQueryBuilder),
    }
}

async fn exec<C, S>(conn: &C, stmt: &S) -> SemaResult<()>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    conn.execute(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(())
}

async fn query_all<C, S>(conn: &C, stmt: &S) -> SemaResult<Vec<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let rows = conn
        .query_all(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(rows)
}

async fn query_one<C, S>(conn: &C, stmt: &S) -> SemaResult<Option<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let row = conn
        .query_one(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(row)
}

fn build_connection_url(config: &SemaConfig, base_dir: &Path) -> SemaResult<String> {
    match &config.database {
        crate::DatabaseConfig::Sqlite { .. } => {
            let path = config.sqlite_path(base_dir)?;
            Ok(format!("sqlite://{}?mode=rwc", path.display()))
        }
        crate::DatabaseConfig::Postgres { url } => Ok(url.clone()),
        crate::DatabaseConfig::Mysql { url } => Ok(url.clone()),
    }
}
