use crate::{
  entity::{UserRole, order, user},
  prelude::*,
  sv::{Network, Store},
};

/// Identity and role of whoever is asking, as established by the
/// authentication layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
  pub id: i64,
  pub role: UserRole,
  pub discount_percent: i32,
}

impl Actor {
  pub fn is_admin(&self) -> bool {
    self.role.is_admin()
  }
}

impl From<&user::Model> for Actor {
  fn from(user: &user::Model) -> Self {
    Self {
      id: user.id,
      role: user.role,
      discount_percent: user.discount_percent,
    }
  }
}

/// Whose orders an actor may see and change. Compute once per request and
/// test every order against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reach {
  All,
  /// The actor plus all of their descendants.
  Members(HashSet<i64>),
}

impl Reach {
  pub fn permits(&self, owner_id: i64) -> bool {
    match self {
      Reach::All => true,
      Reach::Members(ids) => ids.contains(&owner_id),
    }
  }
}

pub struct Access<'a, S: ?Sized = DatabaseConnection> {
  network: Network<'a, S>,
}

impl<'a, S: Store + ?Sized> Access<'a, S> {
  pub fn new(store: &'a S) -> Self {
    Self { network: Network::new(store) }
  }

  pub fn with_fan_out(mut self, fan_out: usize) -> Self {
    self.network = self.network.with_fan_out(fan_out);
    self
  }

  pub async fn reach(&self, actor: &Actor) -> Result<Reach> {
    if actor.is_admin() {
      return Ok(Reach::All);
    }

    let mut members = self.network.descendants(actor.id).await?;
    members.insert(actor.id);
    Ok(Reach::Members(members))
  }

  pub async fn can_mutate_order(
    &self,
    actor: &Actor,
    order: &order::Model,
  ) -> Result<bool> {
    if actor.is_admin() || actor.id == order.user_id {
      return Ok(true);
    }

    Ok(self.reach(actor).await?.permits(order.user_id))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::{
    failing::{self, FailingStore},
    test_db::{self, at},
  };

  fn member(id: i64) -> Actor {
    Actor { id, role: UserRole::Member, discount_percent: 0 }
  }

  #[tokio::test]
  async fn test_can_mutate_order() {
    let db = test_db::setup().await;
    // 1 -> 2 -> 3, and 4 on its own
    test_db::chain(&db, &[1, 2, 3]).await;
    test_db::user(&db, 4, None).await;
    test_db::user_with(&db, 5, Some(4), UserRole::Admin, 0).await;
    test_db::user_with(&db, 6, None, UserRole::SuperAdmin, 0).await;

    let order = test_db::order(&db, 3, 100, at(2026, 10, 1, 0, 0, 0)).await;
    let access = Access::new(&db);

    // owner
    assert!(access.can_mutate_order(&member(3), &order).await.unwrap());
    // ancestors at any depth
    assert!(access.can_mutate_order(&member(2), &order).await.unwrap());
    assert!(access.can_mutate_order(&member(1), &order).await.unwrap());
    // strangers
    assert!(!access.can_mutate_order(&member(4), &order).await.unwrap());
    // admins regardless of hierarchy
    let admin = Actor { id: 5, role: UserRole::Admin, discount_percent: 0 };
    let sudo = Actor { id: 6, role: UserRole::SuperAdmin, discount_percent: 0 };
    assert!(access.can_mutate_order(&admin, &order).await.unwrap());
    assert!(access.can_mutate_order(&sudo, &order).await.unwrap());
  }

  #[tokio::test]
  async fn test_owner_is_allowed_whatever_the_role() {
    let db = test_db::setup().await;
    test_db::user(&db, 1, None).await;
    let order = test_db::order(&db, 1, 100, test_db::now()).await;

    let owner = Actor { id: 1, role: UserRole::Member, discount_percent: 30 };
    assert!(Access::new(&db).can_mutate_order(&owner, &order).await.unwrap());
  }

  #[tokio::test]
  async fn test_descendant_is_not_an_ancestor() {
    let db = test_db::setup().await;
    test_db::chain(&db, &[1, 2]).await;
    let order = test_db::order(&db, 1, 100, test_db::now()).await;

    let access = Access::new(&db);
    assert!(!access.can_mutate_order(&member(2), &order).await.unwrap());
  }

  #[tokio::test]
  async fn test_deep_networks_are_not_truncated() {
    let db = test_db::setup().await;
    let ids: Vec<i64> = (1..=20).collect();
    test_db::chain(&db, &ids).await;
    let order = test_db::order(&db, 20, 100, test_db::now()).await;

    let access = Access::new(&db);
    assert!(access.can_mutate_order(&member(1), &order).await.unwrap());
  }

  #[tokio::test]
  async fn test_reach() {
    let db = test_db::setup().await;
    test_db::chain(&db, &[1, 2, 3]).await;
    test_db::user(&db, 9, None).await;

    let access = Access::new(&db);
    let reach = access.reach(&member(2)).await.unwrap();
    assert_eq!(reach, Reach::Members(HashSet::from([2, 3])));
    assert!(reach.permits(2));
    assert!(reach.permits(3));
    assert!(!reach.permits(1));
    assert!(!reach.permits(9));

    let admin = Actor { id: 9, role: UserRole::Admin, discount_percent: 0 };
    assert_eq!(access.reach(&admin).await.unwrap(), Reach::All);
    assert!(Reach::All.permits(12345));
  }

  #[tokio::test]
  async fn test_store_failure_is_not_a_denial() {
    let db = test_db::setup().await;
    test_db::chain(&db, &[1, 2, 3]).await;
    let order = test_db::order(&db, 3, 100, test_db::now()).await;

    let store = FailingStore::new(&db).referrals_of(2);
    let access = Access::new(&store);

    let err = access.can_mutate_order(&member(1), &order).await.unwrap_err();
    assert!(failing::is_failure(&err), "{err:?}");
    assert_eq!(store.hits(), 1);

    let err = access.reach(&member(1)).await.unwrap_err();
    assert!(failing::is_failure(&err), "{err:?}");

    // owner and admin never touch the hierarchy
    assert!(access.can_mutate_order(&member(3), &order).await.unwrap());
    let admin = Actor { id: 9, role: UserRole::Admin, discount_percent: 0 };
    assert!(access.can_mutate_order(&admin, &order).await.unwrap());
    assert_eq!(store.hits(), 2);
  }
}
