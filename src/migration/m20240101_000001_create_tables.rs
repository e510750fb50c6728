use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{EntityName, Schema};

use crate::entity::{OrderItems, Orders, PickupPoints, Products, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Tables are built from the entity definitions, so the foreign keys carry the
/// delete policies declared on the relations.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        // Parents before children.
        manager
            .create_table(schema.create_table_from_entity(Users))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(PickupPoints))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(Products))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(Orders))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(OrderItems))
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_order_items_product_sku")
                    .table(Alias::new(OrderItems.table_name()))
                    .col(Alias::new("product_sku"))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let tables = [
            OrderItems.table_name(),
            Orders.table_name(),
            Products.table_name(),
            PickupPoints.table_name(),
            Users.table_name(),
        ];
        for table in tables {
            manager
                .drop_table(Table::drop().table(Alias::new(table)).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}
