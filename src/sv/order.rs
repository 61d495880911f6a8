use crate::{
  entity::{OrderStatus, order},
  prelude::*,
  sv::{
    Access, Store,
    access::{Actor, Reach},
  },
};

pub struct Orders<'a, S: ?Sized = DatabaseConnection> {
  store: &'a S,
  access: Access<'a, S>,
}

impl<'a, S: Store + ?Sized> Orders<'a, S> {
  pub fn new(store: &'a S) -> Self {
    Self { store, access: Access::new(store) }
  }

  pub fn with_fan_out(mut self, fan_out: usize) -> Self {
    self.access = self.access.with_fan_out(fan_out);
    self
  }

  /// Orders of the actor and of everyone below them; every order for
  /// administrators. Newest first.
  pub async fn visible(&self, actor: &Actor) -> Result<Vec<order::Model>> {
    match self.access.reach(actor).await? {
      Reach::All => self.store.all_orders().await,
      Reach::Members(ids) => {
        let mut ids: Vec<i64> = ids.into_iter().collect();
        ids.sort_unstable();
        self.store.orders_by_users(&ids).await
      }
    }
  }

  pub async fn by_id(&self, actor: &Actor, id: i32) -> Result<order::Model> {
    let order = self.store.order(id).await?.ok_or(Error::OrderNotFound)?;

    if !self.access.can_mutate_order(actor, &order).await? {
      return Err(Error::AccessDenied);
    }

    Ok(order)
  }

  /// Last write wins; transitions are not checked.
  pub async fn set_status(
    &self,
    actor: &Actor,
    id: i32,
    status: OrderStatus,
  ) -> Result<order::Model> {
    let order = self.by_id(actor, id).await?;

    let updated = self.store.update_order_status(order.id, status).await?;
    info!(
      order_id = id,
      actor_id = actor.id,
      from = ?order.status,
      to = ?status,
      "order status changed"
    );
    Ok(updated)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::UserRole,
    sv::test_utils::test_db::{self, at},
  };

  fn member(id: i64) -> Actor {
    Actor { id, role: UserRole::Member, discount_percent: 0 }
  }

  #[tokio::test]
  async fn test_visible_orders() {
    let db = test_db::setup().await;
    test_db::chain(&db, &[1, 2, 3]).await;
    test_db::user(&db, 4, None).await;
    test_db::user_with(&db, 5, None, UserRole::Admin, 0).await;

    let o1 = test_db::order(&db, 1, 10, at(2026, 10, 1, 0, 0, 0)).await;
    let o2 = test_db::order(&db, 2, 20, at(2026, 10, 2, 0, 0, 0)).await;
    let o3 = test_db::order(&db, 3, 30, at(2026, 10, 3, 0, 0, 0)).await;
    let o4 = test_db::order(&db, 4, 40, at(2026, 10, 4, 0, 0, 0)).await;

    let orders = Orders::new(&db);
    let ids = |list: Vec<order::Model>| {
      list.into_iter().map(|o| o.id).collect::<Vec<_>>()
    };

    assert_eq!(
      ids(orders.visible(&member(1)).await.unwrap()),
      [o3.id, o2.id, o1.id]
    );
    assert_eq!(ids(orders.visible(&member(2)).await.unwrap()), [o3.id, o2.id]);
    assert_eq!(ids(orders.visible(&member(4)).await.unwrap()), [o4.id]);

    let admin = Actor { id: 5, role: UserRole::Admin, discount_percent: 0 };
    assert_eq!(
      ids(orders.visible(&admin).await.unwrap()),
      [o4.id, o3.id, o2.id, o1.id]
    );
  }

  #[tokio::test]
  async fn test_set_status_by_ancestor() {
    let db = test_db::setup().await;
    test_db::chain(&db, &[1, 2]).await;
    let order = test_db::order(&db, 2, 100, test_db::now()).await;

    let updated = Orders::new(&db)
      .set_status(&member(1), order.id, OrderStatus::Shipped)
      .await
      .unwrap();
    assert_eq!(updated.status, OrderStatus::Shipped);
    assert_eq!(updated.total, 100);

    let stored =
      order::Entity::find_by_id(order.id).one(&db).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Shipped);
  }

  #[tokio::test]
  async fn test_set_status_denied() {
    let db = test_db::setup().await;
    test_db::chain(&db, &[1, 2]).await;
    test_db::user(&db, 3, None).await;
    let order = test_db::order(&db, 1, 100, test_db::now()).await;

    let orders = Orders::new(&db);
    for stranger in [2, 3] {
      let result = orders
        .set_status(&member(stranger), order.id, OrderStatus::Cancelled)
        .await;
      assert!(matches!(result, Err(Error::AccessDenied)));
    }

    let stored =
      order::Entity::find_by_id(order.id).one(&db).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
  }

  #[tokio::test]
  async fn test_set_status_missing_order() {
    let db = test_db::setup().await;
    test_db::user(&db, 1, None).await;

    let result =
      Orders::new(&db).set_status(&member(1), 404, OrderStatus::Shipped).await;
    assert!(matches!(result, Err(Error::OrderNotFound)));
  }

  #[tokio::test]
  async fn test_last_write_wins() {
    let db = test_db::setup().await;
    test_db::user(&db, 1, None).await;
    let order = test_db::order(&db, 1, 100, test_db::now()).await;

    let orders = Orders::new(&db);
    let owner = member(1);
    orders.set_status(&owner, order.id, OrderStatus::Delivered).await.unwrap();
    let updated =
      orders.set_status(&owner, order.id, OrderStatus::Pending).await.unwrap();
    assert_eq!(updated.status, OrderStatus::Pending);
  }
}
