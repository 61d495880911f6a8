use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Users::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Users::Id)
              .big_integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Users::Name).string().null())
          .col(ColumnDef::new(Users::Email).string().null().unique_key())
          .col(
            ColumnDef::new(Users::Role)
              .string()
              .not_null()
              .default("member"),
          )
          .col(
            ColumnDef::new(Users::MonthlySales)
              .big_integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Users::DiscountPercent)
              .integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(Users::ReferredBy).big_integer().null())
          .col(ColumnDef::new(Users::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_users_referred_by")
              .from(Users::Table, Users::ReferredBy)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::SetNull),
          )
          .to_owned(),
      )
      .await?;

    // Walks fetch children by referrer on every level
    manager
      .create_index(
        Index::create()
          .name("idx_users_referred_by")
          .table(Users::Table)
          .col(Users::ReferredBy)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Users::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Users {
  Table,
  Id,
  Name,
  Email,
  Role,
  MonthlySales,
  DiscountPercent,
  ReferredBy,
  CreatedAt,
}
