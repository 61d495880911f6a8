use chrono::NaiveDate;

use crate::{prelude::*, sv::Store};

/// First instant of the calendar month containing `as_of`.
pub fn month_start(as_of: DateTime) -> DateTime {
  NaiveDate::from_ymd_opt(as_of.year(), as_of.month(), 1)
    .and_then(|date| date.and_hms_opt(0, 0, 0))
    .unwrap_or(as_of)
}

pub struct Sales<'a, S: ?Sized = DatabaseConnection> {
  store: &'a S,
}

impl<'a, S: Store + ?Sized> Sales<'a, S> {
  pub fn new(store: &'a S) -> Self {
    Self { store }
  }

  /// Sum of the user's order totals since the start of the month of `as_of`.
  /// Own orders only, descendants are never rolled in.
  pub async fn monthly(&self, user_id: i64, as_of: DateTime) -> Result<i64> {
    let orders =
      self.store.orders_by_user(user_id, Some(month_start(as_of))).await?;
    Ok(orders.iter().map(|order| order.total).sum())
  }
}
