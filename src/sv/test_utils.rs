//! Shared test utilities for database setup

#[cfg(test)]
pub mod test_db {
  use chrono::{NaiveDate, NaiveDateTime};
  use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection,
    DbBackend, NotSet, Schema, Set,
  };

  use crate::entity::*;

  /// Creates an in-memory SQLite database with all required tables
  pub async fn setup() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let schema = Schema::new(DbBackend::Sqlite);

    let stmt = schema.create_table_from_entity(user::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(order::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(product::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    db
  }

  pub fn at(
    y: i32,
    m: u32,
    d: u32,
    h: u32,
    min: u32,
    s: u32,
  ) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, s).unwrap()
  }

  /// A fixed "now" so month windows never straddle a real boundary.
  pub fn now() -> NaiveDateTime {
    at(2026, 10, 16, 12, 0, 0)
  }

  pub async fn user(
    db: &DatabaseConnection,
    id: i64,
    referred_by: Option<i64>,
  ) -> user::Model {
    user_with(db, id, referred_by, UserRole::Member, 0).await
  }

  pub async fn user_with(
    db: &DatabaseConnection,
    id: i64,
    referred_by: Option<i64>,
    role: UserRole,
    discount_percent: i32,
  ) -> user::Model {
    user::ActiveModel {
      id: Set(id),
      name: Set(Some(format!("user{id}"))),
      email: Set(Some(format!("user{id}@example.com"))),
      role: Set(role),
      monthly_sales: Set(0),
      discount_percent: Set(discount_percent),
      referred_by: Set(referred_by),
      created_at: Set(at(2026, 1, 1, 0, 0, 0)),
    }
    .insert(db)
    .await
    .unwrap()
  }

  pub async fn order(
    db: &DatabaseConnection,
    user_id: i64,
    total: i64,
    created_at: NaiveDateTime,
  ) -> order::Model {
    order::ActiveModel {
      id: NotSet,
      user_id: Set(user_id),
      total: Set(total),
      status: Set(OrderStatus::Pending),
      created_at: Set(created_at),
    }
    .insert(db)
    .await
    .unwrap()
  }

  /// Single line of descent: each id is referred by the one before it.
  pub async fn chain(db: &DatabaseConnection, ids: &[i64]) {
    let mut parent = None;
    for &id in ids {
      user(db, id, parent).await;
      parent = Some(id);
    }
  }
}

/// Store that answers from a real database but fails the reads touching one
/// chosen user, counting how often that user was asked for.
#[cfg(test)]
pub mod failing {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use async_trait::async_trait;
  use sea_orm::DbErr;

  use crate::{
    entity::{OrderStatus, order, user},
    prelude::*,
    sv::Store,
  };

  pub const MESSAGE: &str = "store unavailable";

  pub struct FailingStore<'a> {
    db: &'a DatabaseConnection,
    referrals_of: Option<i64>,
    orders_of: Option<i64>,
    hits: AtomicUsize,
  }

  impl<'a> FailingStore<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
      Self {
        db,
        referrals_of: None,
        orders_of: None,
        hits: AtomicUsize::new(0),
      }
    }

    /// Fail `users_by_referrer(user_id)`.
    pub fn referrals_of(mut self, user_id: i64) -> Self {
      self.referrals_of = Some(user_id);
      self
    }

    /// Fail `orders_by_user(user_id, ..)`.
    pub fn orders_of(mut self, user_id: i64) -> Self {
      self.orders_of = Some(user_id);
      self
    }

    pub fn hits(&self) -> usize {
      self.hits.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T> {
      self.hits.fetch_add(1, Ordering::SeqCst);
      Err(Error::Database(DbErr::Custom(MESSAGE.into())))
    }
  }

  pub fn is_failure(err: &Error) -> bool {
    matches!(err, Error::Database(DbErr::Custom(msg)) if msg == MESSAGE)
  }

  #[async_trait]
  impl Store for FailingStore<'_> {
    async fn user(&self, id: i64) -> Result<Option<user::Model>> {
      self.db.user(id).await
    }

    async fn users_by_referrer(
      &self,
      referrer_id: i64,
    ) -> Result<Vec<user::Model>> {
      if self.referrals_of == Some(referrer_id) {
        return self.fail();
      }
      self.db.users_by_referrer(referrer_id).await
    }

    async fn count_by_referrer(&self, referrer_id: i64) -> Result<u64> {
      if self.referrals_of == Some(referrer_id) {
        return self.fail();
      }
      self.db.count_by_referrer(referrer_id).await
    }

    async fn root_users(&self) -> Result<Vec<user::Model>> {
      self.db.root_users().await
    }

    async fn orders_by_user(
      &self,
      user_id: i64,
      since: Option<DateTime>,
    ) -> Result<Vec<order::Model>> {
      if self.orders_of == Some(user_id) {
        return self.fail();
      }
      self.db.orders_by_user(user_id, since).await
    }

    async fn orders_by_users(
      &self,
      user_ids: &[i64],
    ) -> Result<Vec<order::Model>> {
      self.db.orders_by_users(user_ids).await
    }

    async fn all_orders(&self) -> Result<Vec<order::Model>> {
      self.db.all_orders().await
    }

    async fn order(&self, id: i32) -> Result<Option<order::Model>> {
      self.db.order(id).await
    }

    async fn update_order_status(
      &self,
      id: i32,
      status: OrderStatus,
    ) -> Result<order::Model> {
      self.db.update_order_status(id, status).await
    }
  }
}
