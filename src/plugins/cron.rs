use std::sync::Arc;

use async_trait::async_trait;
use tokio::time;

use crate::{plugins::Plugin, prelude::*, state::AppState};

/// Keeps the advisory `monthly_sales` column roughly current for screens that
/// read it directly. The engine itself always recomputes.
pub struct SalesCache;

#[async_trait]
impl Plugin for SalesCache {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let every = app.config.sales_refresh;
    if every.is_zero() {
      info!("Sales cache refresh disabled via config (0 interval)");
      return Ok(());
    }

    info!("Sales cache refresher started (interval: {:?})", every);

    let mut interval = time::interval(every);
    loop {
      interval.tick().await;

      let now = Utc::now().naive_utc();
      match refresh_sales_cache(&app, now).await {
        Ok(count) => debug!("Refreshed monthly sales for {} users", count),
        Err(e) => error!("Sales cache refresh failed: {}", e),
      }
    }
  }
}

pub async fn refresh_sales_cache(
  app: &AppState,
  as_of: DateTime,
) -> Result<usize> {
  let sv = app.sv();
  let users = sv.user.all().await?;

  for user in &users {
    let sales = sv.sales.monthly(user.id, as_of).await?;
    if sales != user.monthly_sales {
      sv.user.cache_monthly_sales(user.id, sales).await?;
    }
  }

  Ok(users.len())
}
