mod config;
mod entity;
mod error;
mod plugins;
mod prelude;
mod state;
mod sv;

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{config::Config, plugins::App, prelude::*, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "refnet=debug,tower_http=debug,axum=trace,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = Config::from_env()?;

  // `refnet token <user_id>` prints a caller token for operators
  let mut args = std::env::args().skip(1);
  if args.next().as_deref() == Some("token") {
    let user_id: i64 = args
      .next()
      .ok_or_else(|| anyhow::anyhow!("Usage: refnet token <user_id>"))?
      .parse()?;
    let token = plugins::server::auth::sign(&config.server_secret, user_id)?;
    println!("{token}");
    return Ok(());
  }

  info!("Starting referral network server v{}", env!("CARGO_PKG_VERSION"));

  let app_state = Arc::new(AppState::new(config).await?);

  App::new()
    .register(plugins::server::Plugin)
    .register(plugins::cron::SalesCache)
    .run(app_state)
    .await;

  Ok(())
}
