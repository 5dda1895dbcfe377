//! Schema of the persisted key-value graph.
//!
//! - `graph_nodes`: one row per (collection, key). A `NULL` value is a
//!   tombstone; the row stays so the deletion keeps its version.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum GraphNodes {
    Table,
    Collection,
    NodeKey,
    Value,
    VersionAt,
    VersionPeer,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GraphNodes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(GraphNodes::Collection).string().not_null())
                    .col(ColumnDef::new(GraphNodes::NodeKey).string().not_null())
                    .col(ColumnDef::new(GraphNodes::Value).text())
                    .col(
                        ColumnDef::new(GraphNodes::VersionAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GraphNodes::VersionPeer).uuid().not_null())
                    .primary_key(
                        Index::create()
                            .col(GraphNodes::Collection)
                            .col(GraphNodes::NodeKey),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-graph_nodes-collection-version_at")
                    .table(GraphNodes::Table)
                    .col(GraphNodes::Collection)
                    .col(GraphNodes::VersionAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx-graph_nodes-collection-version_at")
                    .table(GraphNodes::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(GraphNodes::Table).to_owned())
            .await?;

        Ok(())
    }
}
