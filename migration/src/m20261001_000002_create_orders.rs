use sea_orm_migration::prelude::*;

use super::m20261001_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Orders::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Orders::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Orders::UserId).big_integer().not_null())
          .col(ColumnDef::new(Orders::Total).big_integer().not_null())
          .col(
            ColumnDef::new(Orders::Status)
              .string()
              .not_null()
              .default("pending"),
          )
          .col(ColumnDef::new(Orders::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_orders_user")
              .from(Orders::Table, Orders::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_orders_user_created")
          .table(Orders::Table)
          .col(Orders::UserId)
          .col(Orders::CreatedAt)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Orders::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Orders {
  Table,
  Id,
  UserId,
  Total,
  Status,
  CreatedAt,
}
