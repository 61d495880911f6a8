use serde::Serialize;

use crate::{entity::product, prelude::*, sv::access::Actor};

/// Discount level derived from the stored discount percentage.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
  #[default]
  Base,
  Tier1,
  Tier2,
}

impl Tier {
  pub const ALLOWED_PERCENTS: [i32; 3] = [0, 15, 30];

  /// Unknown percentages fall back to `Base` rather than failing.
  pub fn from_discount_percent(percent: i32) -> Self {
    match percent {
      15 => Tier::Tier1,
      30 => Tier::Tier2,
      _ => Tier::Base,
    }
  }
}

/// Unit price shown to a caller of the given tier. A configured price that
/// does not undercut `base` is treated as absent, and callers without a tier
/// always pay `base`: the flat discount is the last fallback for tiered
/// callers, not a public sale price.
pub fn effective_price(
  base: i64,
  flat: Option<i64>,
  tier1: Option<i64>,
  tier2: Option<i64>,
  tier: Tier,
) -> i64 {
  let below_base = |price: Option<i64>| price.filter(|&p| p < base);

  if tier == Tier::Tier2
    && let Some(price) = below_base(tier2)
  {
    return price;
  }

  if tier == Tier::Base {
    return base;
  }

  below_base(tier1).or(below_base(flat)).unwrap_or(base)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedProduct {
  pub id: i32,
  pub name: String,
  pub base_price: i64,
  pub price: i64,
  pub tier: Tier,
}

impl PricedProduct {
  pub fn new(product: product::Model, tier: Tier) -> Self {
    let price = effective_price(
      product.price,
      product.discount_price,
      product.tier1_price,
      product.tier2_price,
      tier,
    );
    Self {
      id: product.id,
      name: product.name,
      base_price: product.price,
      price,
      tier,
    }
  }
}

pub struct Catalog<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Catalog<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// All products priced for the actor's tier as of this call.
  pub async fn priced(&self, actor: &Actor) -> Result<Vec<PricedProduct>> {
    let tier = Tier::from_discount_percent(actor.discount_percent);
    let products = product::Entity::find()
      .order_by_asc(product::Column::Id)
      .all(self.db)
      .await?;

    Ok(products.into_iter().map(|p| PricedProduct::new(p, tier)).collect())
  }
}
