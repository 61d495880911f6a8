use sea_orm::{DbErr, NotSet, SqlErr};

use crate::{
  entity::{user, user::UserRole},
  prelude::*,
  sv::pricing::Tier,
};

pub struct User<'a> {
  db: &'a DatabaseConnection,
  fallback_referrer: Option<i64>,
}

impl<'a> User<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db, fallback_referrer: None }
  }

  /// Account that adopts registrations arriving without a referrer.
  pub fn with_fallback_referrer(mut self, referrer_id: Option<i64>) -> Self {
    self.fallback_referrer = referrer_id;
    self
  }

  /// Create a member. An explicit referrer must exist; without one the
  /// fallback account is used when configured and present, otherwise the new
  /// user starts a tree of their own. The link is never changed afterwards.
  pub async fn register(
    &self,
    name: Option<String>,
    email: Option<String>,
    referrer_id: Option<i64>,
  ) -> Result<user::Model> {
    if let Some(email) = &email
      && user::Entity::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(self.db)
        .await?
        .is_some()
    {
      return Err(Error::EmailTaken);
    }

    let referred_by = match referrer_id {
      Some(id) => {
        user::Entity::find_by_id(id)
          .one(self.db)
          .await?
          .ok_or(Error::UserNotFound)?;
        Some(id)
      }
      None => self.fallback().await?,
    };

    let now = Utc::now().naive_utc();
    let user = user::ActiveModel {
      id: NotSet,
      name: Set(name),
      email: Set(email),
      role: Set(UserRole::Member),
      monthly_sales: Set(0),
      discount_percent: Set(0),
      referred_by: Set(referred_by),
      created_at: Set(now),
    }
    .insert(self.db)
    .await
    .map_err(insert_error)?;

    info!(
      user_id = user.id,
      referred_by = ?user.referred_by,
      "user registered"
    );
    Ok(user)
  }

  pub async fn by_id(&self, id: i64) -> Result<Option<user::Model>> {
    let user = user::Entity::find_by_id(id).one(self.db).await?;
    Ok(user)
  }

  pub async fn set_role(&self, id: i64, role: UserRole) -> Result<()> {
    let user = user::Entity::find_by_id(id)
      .one(self.db)
      .await?
      .ok_or(Error::UserNotFound)?;

    user::ActiveModel { role: Set(role), ..user.into() }
      .update(self.db)
      .await?;

    Ok(())
  }

  /// Only the tier percentages are accepted here; anything else already in
  /// the store is read back as the base tier.
  pub async fn set_discount_percent(
    &self,
    id: i64,
    percent: i32,
  ) -> Result<()> {
    if !Tier::ALLOWED_PERCENTS.contains(&percent) {
      return Err(Error::InvalidArgs(format!(
        "Discount must be one of {:?}, got {percent}",
        Tier::ALLOWED_PERCENTS
      )));
    }

    let user = user::Entity::find_by_id(id)
      .one(self.db)
      .await?
      .ok_or(Error::UserNotFound)?;

    user::ActiveModel { discount_percent: Set(percent), ..user.into() }
      .update(self.db)
      .await?;

    Ok(())
  }

  /// Store a freshly computed figure in the advisory sales column.
  pub async fn cache_monthly_sales(&self, id: i64, sales: i64) -> Result<()> {
    use sea_orm::sea_query::Expr;

    user::Entity::update_many()
      .col_expr(user::Column::MonthlySales, Expr::value(sales))
      .filter(user::Column::Id.eq(id))
      .exec(self.db)
      .await?;

    Ok(())
  }

  pub async fn all(&self) -> Result<Vec<user::Model>> {
    let users = user::Entity::find()
      .order_by_asc(user::Column::CreatedAt)
      .order_by_asc(user::Column::Id)
      .all(self.db)
      .await?;
    Ok(users)
  }

  async fn fallback(&self) -> Result<Option<i64>> {
    let Some(id) = self.fallback_referrer else {
      return Ok(None);
    };

    if user::Entity::find_by_id(id).one(self.db).await?.is_some() {
      Ok(Some(id))
    } else {
      warn!(fallback_id = id, "fallback referrer missing, registering a root");
      Ok(None)
    }
  }
}

/// Email is the only unique column written on insert, so a violation means
/// a concurrent registration won the race for the address.
fn insert_error(err: DbErr) -> Error {
  match err.sql_err() {
    Some(SqlErr::UniqueConstraintViolation(_)) => Error::EmailTaken,
    _ => Error::Database(err),
  }
}
