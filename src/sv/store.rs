//! Read access to users and orders, plus the single order status write the
//! engine performs. Transactions and connection scoping stay with the
//! implementor.

use async_trait::async_trait;

use crate::{
  entity::{OrderStatus, order, user},
  prelude::*,
};

/// Ids bound per `IN (...)` query, kept under the smallest SQLite
/// bind-variable limit.
const IN_CHUNK: usize = 900;

#[async_trait]
pub trait Store: Send + Sync {
  async fn user(&self, id: i64) -> Result<Option<user::Model>>;

  /// Direct referrals of `referrer_id`, in the store's stable order.
  async fn users_by_referrer(
    &self,
    referrer_id: i64,
  ) -> Result<Vec<user::Model>>;

  async fn count_by_referrer(&self, referrer_id: i64) -> Result<u64>;

  /// Users without a referrer.
  async fn root_users(&self) -> Result<Vec<user::Model>>;

  async fn orders_by_user(
    &self,
    user_id: i64,
    since: Option<DateTime>,
  ) -> Result<Vec<order::Model>>;

  async fn orders_by_users(
    &self,
    user_ids: &[i64],
  ) -> Result<Vec<order::Model>>;

  async fn all_orders(&self) -> Result<Vec<order::Model>>;

  async fn order(&self, id: i32) -> Result<Option<order::Model>>;

  async fn update_order_status(
    &self,
    id: i32,
    status: OrderStatus,
  ) -> Result<order::Model>;
}

#[async_trait]
impl Store for DatabaseConnection {
  async fn user(&self, id: i64) -> Result<Option<user::Model>> {
    Ok(user::Entity::find_by_id(id).one(self).await?)
  }

  async fn users_by_referrer(
    &self,
    referrer_id: i64,
  ) -> Result<Vec<user::Model>> {
    Ok(
      user::Entity::find()
        .filter(user::Column::ReferredBy.eq(referrer_id))
        .order_by_asc(user::Column::CreatedAt)
        .order_by_asc(user::Column::Id)
        .all(self)
        .await?,
    )
  }

  async fn count_by_referrer(&self, referrer_id: i64) -> Result<u64> {
    Ok(
      user::Entity::find()
        .filter(user::Column::ReferredBy.eq(referrer_id))
        .count(self)
        .await?,
    )
  }

  async fn root_users(&self) -> Result<Vec<user::Model>> {
    Ok(
      user::Entity::find()
        .filter(user::Column::ReferredBy.is_null())
        .order_by_asc(user::Column::CreatedAt)
        .order_by_asc(user::Column::Id)
        .all(self)
        .await?,
    )
  }

  async fn orders_by_user(
    &self,
    user_id: i64,
    since: Option<DateTime>,
  ) -> Result<Vec<order::Model>> {
    let mut query =
      order::Entity::find().filter(order::Column::UserId.eq(user_id));

    if let Some(since) = since {
      query = query.filter(order::Column::CreatedAt.gte(since));
    }

    Ok(query.order_by_desc(order::Column::CreatedAt).all(self).await?)
  }

  async fn orders_by_users(
    &self,
    user_ids: &[i64],
  ) -> Result<Vec<order::Model>> {
    let mut orders = Vec::new();
    for chunk in user_ids.chunks(IN_CHUNK) {
      orders.extend(
        order::Entity::find()
          .filter(order::Column::UserId.is_in(chunk.iter().copied()))
          .all(self)
          .await?,
      );
    }

    orders.sort_by(|a, b| {
      b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id))
    });
    Ok(orders)
  }

  async fn all_orders(&self) -> Result<Vec<order::Model>> {
    Ok(
      order::Entity::find()
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .all(self)
        .await?,
    )
  }

  async fn order(&self, id: i32) -> Result<Option<order::Model>> {
    Ok(order::Entity::find_by_id(id).one(self).await?)
  }

  async fn update_order_status(
    &self,
    id: i32,
    status: OrderStatus,
  ) -> Result<order::Model> {
    let order = order::Entity::find_by_id(id)
      .one(self)
      .await?
      .ok_or(Error::OrderNotFound)?;

    Ok(order::ActiveModel { status: Set(status), ..order.into() }
      .update(self)
      .await?)
  }
}
