use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

use crate::db::SemaMetadata;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();

        manager
            .create_table(
                Table::create()
                    .table(SemaMetadata::Table)
                    .if_not_exists()
                    .col(id_col(backend, SemaMetadata::Id, false))
                    .col(id_col(backend, SemaMetadata::OwnerId, false))
                    .col(
                        ColumnDef::new(SemaMetadata::OwnerType)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(SemaMetadata::Key).text().not_null())
                    .col(ColumnDef::new(SemaMetadata::Value).text().not_null())
                    .primary_key(
                        Index::create()
                            .name("pk_sema_metadata")
                            .col(SemaMetadata::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Key uniqueness per owner is enforced by the store, not here; the
        // index only serves owner-scoped lookups and the cascade delete.
        manager
            .create_index(
                Index::create()
                    .name("idx_sema_metadata_owner")
                    .table(SemaMetadata::Table)
                    .col(SemaMetadata::OwnerType)
                    .col(SemaMetadata::OwnerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SemaMetadata::Table).to_owned())
            .await
    }
}

fn id_col(backend: DatabaseBackend, col: impl Iden + 'static, nullable: bool) -> ColumnDef {
    let mut col_def = ColumnDef::new(col);
    match backend {
        DatabaseBackend::Postgres => {
            col_def.uuid();
        }
        DatabaseBackend::MySql => {
            col_def.binary_len(16);
        }
        DatabaseBackend::Sqlite => {
            col_def.string_len(36);
        }
        _ => {
            col_def.string_len(36);
        }
    }
    if nullable {
        col_def.null();
    } else {
        col_def.not_null();
    }
    col_def.to_owned()
}
