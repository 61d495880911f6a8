use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::order;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
  #[sea_orm(string_value = "member")]
  #[default]
  Member,
  #[sea_orm(string_value = "admin")]
  Admin,
  #[sea_orm(string_value = "super_admin")]
  SuperAdmin,
}

impl UserRole {
  pub fn is_admin(self) -> bool {
    matches!(self, UserRole::Admin | UserRole::SuperAdmin)
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i64,
  pub name: Option<String>,
  #[sea_orm(unique)]
  pub email: Option<String>,
  pub role: UserRole,
  /// Denormalized, refreshed in the background. Never authoritative.
  pub monthly_sales: i64,
  pub discount_percent: i32,
  pub referred_by: Option<i64>,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "Entity",
    from = "Column::ReferredBy",
    to = "Column::Id"
  )]
  Referrer,
  #[sea_orm(has_many = "order::Entity")]
  Orders,
}

impl Related<order::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Orders.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
