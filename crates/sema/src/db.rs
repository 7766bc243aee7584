use sea_orm::sea_query;
use sea_orm_migration::prelude::Iden;

#[derive(Iden, Clone, Copy)]
pub enum SemaMetadata {
    Table,
    Id,
    OwnerId,
    OwnerType,
    Key,
    Value,
}
