use futures::{StreamExt, TryStreamExt, stream};
use serde::Serialize;

use crate::{
  entity::{UserRole, user},
  prelude::*,
  sv::{Sales, Store, access::Actor},
};

pub const DEFAULT_MAX_DEPTH: usize = 10;
pub const DEFAULT_FAN_OUT: usize = 8;

/// Which roots a network listing starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
  /// Descendants of a single user, the user itself excluded.
  Own(i64),
  /// Trees of every root user, concatenated.
  All,
}

impl Scope {
  pub fn for_actor(actor: &Actor) -> Self {
    if actor.is_admin() { Scope::All } else { Scope::Own(actor.id) }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkNode {
  pub id: i64,
  pub name: Option<String>,
  pub email: Option<String>,
  pub monthly_sales: i64,
  pub joined_at: DateTime,
  pub role: UserRole,
  pub referral_count: u64,
  pub children: Vec<NetworkNode>,
}

/// Sum of `monthly_sales` over every node of the given trees.
pub fn total_sales(nodes: &[NetworkNode]) -> i64 {
  let mut stack: Vec<&NetworkNode> = nodes.iter().collect();
  let mut total = 0;
  while let Some(node) = stack.pop() {
    total += node.monthly_sales;
    stack.extend(node.children.iter());
  }
  total
}

pub fn member_count(nodes: &[NetworkNode]) -> usize {
  let mut stack: Vec<&NetworkNode> = nodes.iter().collect();
  let mut count = 0;
  while let Some(node) = stack.pop() {
    count += 1;
    stack.extend(node.children.iter());
  }
  count
}

struct Slot {
  user: user::Model,
  depth: usize,
  monthly_sales: i64,
  referral_count: u64,
  children: Vec<usize>,
}

impl Slot {
  fn new(user: user::Model, depth: usize) -> Self {
    Self { user, depth, monthly_sales: 0, referral_count: 0, children: vec![] }
  }
}

struct Visit {
  monthly_sales: i64,
  referral_count: u64,
  children: Vec<user::Model>,
}

pub struct Network<'a, S: ?Sized = DatabaseConnection> {
  store: &'a S,
  fan_out: usize,
}

impl<'a, S: Store + ?Sized> Network<'a, S> {
  pub fn new(store: &'a S) -> Self {
    Self { store, fan_out: DEFAULT_FAN_OUT }
  }

  pub fn with_fan_out(mut self, fan_out: usize) -> Self {
    self.fan_out = fan_out.max(1);
    self
  }

  pub async fn scoped(
    &self,
    scope: Scope,
    max_depth: usize,
    as_of: DateTime,
  ) -> Result<Vec<NetworkNode>> {
    match scope {
      Scope::Own(id) => self.build(id, max_depth, as_of).await,
      Scope::All => {
        let mut nodes = Vec::new();
        for root in self.store.root_users().await? {
          nodes.extend(self.build(root.id, max_depth, as_of).await?);
        }
        Ok(nodes)
      }
    }
  }

  /// Tree of users below `root_id`, at most `max_depth` levels deep.
  ///
  /// Direct referrals sit at depth 1. Nodes at `max_depth` come back with no
  /// children whatever the store holds below them, and an unknown root yields
  /// an empty list. The walk goes level by level over an arena so deep
  /// networks never grow the call stack; siblings on one level are visited
  /// concurrently, up to `fan_out` at a time, with port order preserved.
  pub async fn build(
    &self,
    root_id: i64,
    max_depth: usize,
    as_of: DateTime,
  ) -> Result<Vec<NetworkNode>> {
    if max_depth == 0 {
      return Ok(Vec::new());
    }

    let mut arena: Vec<Slot> = Vec::new();
    let mut placed = HashSet::from([root_id]);
    let mut frontier = Vec::new();

    for user in self.store.users_by_referrer(root_id).await? {
      if self.place(&mut placed, root_id, &user) {
        frontier.push(arena.len());
        arena.push(Slot::new(user, 1));
      }
    }
    let top = frontier.clone();

    while !frontier.is_empty() {
      let jobs: Vec<(i64, bool)> = frontier
        .iter()
        .map(|&idx| (arena[idx].user.id, arena[idx].depth < max_depth))
        .collect();

      let visits: Vec<Visit> = stream::iter(jobs)
        .map(|(id, expand)| self.visit(id, expand, as_of))
        .buffered(self.fan_out)
        .try_collect()
        .await?;

      let mut next = Vec::new();
      for (idx, visit) in frontier.into_iter().zip(visits) {
        let depth = arena[idx].depth + 1;
        let parent_id = arena[idx].user.id;
        arena[idx].monthly_sales = visit.monthly_sales;
        arena[idx].referral_count = visit.referral_count;

        for child in visit.children {
          if self.place(&mut placed, parent_id, &child) {
            let child_idx = arena.len();
            arena.push(Slot::new(child, depth));
            arena[idx].children.push(child_idx);
            next.push(child_idx);
          }
        }
      }
      frontier = next;
    }

    debug!(root_id, max_depth, members = arena.len(), "network built");
    Ok(assemble(arena, &top))
  }

  /// Every user below `root_id`, any number of hops down. Not depth capped.
  pub async fn descendants(&self, root_id: i64) -> Result<HashSet<i64>> {
    let mut seen = HashSet::new();
    let mut frontier = vec![root_id];

    while !frontier.is_empty() {
      let levels: Vec<Vec<user::Model>> = stream::iter(frontier)
        .map(|id| self.store.users_by_referrer(id))
        .buffered(self.fan_out)
        .try_collect()
        .await?;

      frontier = levels
        .into_iter()
        .flatten()
        .map(|user| user.id)
        .filter(|&id| id != root_id && seen.insert(id))
        .collect();
    }

    Ok(seen)
  }

  async fn visit(
    &self,
    user_id: i64,
    expand: bool,
    as_of: DateTime,
  ) -> Result<Visit> {
    let sales = Sales::new(self.store);

    if expand {
      let (monthly_sales, children) = futures::try_join!(
        sales.monthly(user_id, as_of),
        self.store.users_by_referrer(user_id),
      )?;
      Ok(Visit {
        monthly_sales,
        referral_count: children.len() as u64,
        children,
      })
    } else {
      let (monthly_sales, referral_count) = futures::try_join!(
        sales.monthly(user_id, as_of),
        self.store.count_by_referrer(user_id),
      )?;
      Ok(Visit { monthly_sales, referral_count, children: Vec::new() })
    }
  }

  fn place(
    &self,
    placed: &mut HashSet<i64>,
    parent_id: i64,
    user: &user::Model,
  ) -> bool {
    let fresh = placed.insert(user.id);
    if !fresh {
      warn!(
        user_id = user.id,
        parent_id, "referral cycle detected, user already in this network"
      );
    }
    fresh
  }
}

/// Children always live at higher arena indices than their parent, so a
/// reverse sweep finishes every subtree before its parent needs it.
fn assemble(arena: Vec<Slot>, top: &[usize]) -> Vec<NetworkNode> {
  let mut built: Vec<Option<NetworkNode>> = Vec::with_capacity(arena.len());
  built.resize_with(arena.len(), || None);

  for (idx, slot) in arena.into_iter().enumerate().rev() {
    let children =
      slot.children.iter().filter_map(|&child| built[child].take()).collect();
    built[idx] = Some(NetworkNode {
      id: slot.user.id,
      name: slot.user.name,
      email: slot.user.email,
      monthly_sales: slot.monthly_sales,
      joined_at: slot.user.created_at,
      role: slot.user.role,
      referral_count: slot.referral_count,
      children,
    });
  }

  top.iter().filter_map(|&idx| built[idx].take()).collect()
}
