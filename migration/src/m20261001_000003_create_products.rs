use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Products::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Products::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Products::Name).string().not_null())
          .col(ColumnDef::new(Products::Price).big_integer().not_null())
          .col(ColumnDef::new(Products::DiscountPrice).big_integer().null())
          .col(ColumnDef::new(Products::Tier1Price).big_integer().null())
          .col(ColumnDef::new(Products::Tier2Price).big_integer().null())
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Products::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Products {
  Table,
  Id,
  Name,
  Price,
  DiscountPrice,
  Tier1Price,
  Tier2Price,
}
