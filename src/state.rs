use anyhow::Context;
use migration::{Migrator, MigratorTrait};

use crate::{config::Config, prelude::*, sv};

pub struct AppState {
  pub db: DatabaseConnection,
  pub config: Config,
}

/// Per-request bundle of services wired with the configured limits.
pub struct Services<'a> {
  pub user: sv::User<'a>,
  pub network: sv::Network<'a>,
  pub orders: sv::Orders<'a>,
  pub catalog: sv::Catalog<'a>,
  pub sales: sv::Sales<'a>,
}

impl AppState {
  pub async fn new(config: Config) -> anyhow::Result<Self> {
    let db = Database::connect(&config.database_url)
      .await
      .with_context(|| {
        format!("Failed to connect to {}", config.database_url)
      })?;

    Migrator::up(&db, None).await.context("Failed to run migrations")?;
    info!("Database ready");

    Ok(Self::with_db(db, config))
  }

  pub fn with_db(db: DatabaseConnection, config: Config) -> Self {
    Self { db, config }
  }

  pub fn sv(&self) -> Services<'_> {
    let fan_out = self.config.fan_out;
    Services {
      user: sv::User::new(&self.db)
        .with_fallback_referrer(self.config.fallback_referrer_id),
      network: sv::Network::new(&self.db).with_fan_out(fan_out),
      orders: sv::Orders::new(&self.db).with_fan_out(fan_out),
      catalog: sv::Catalog::new(&self.db),
      sales: sv::Sales::new(&self.db),
    }
  }
}
