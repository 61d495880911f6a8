use std::env;

use anyhow::Context;

use crate::{
  prelude::*,
  sv::network::{DEFAULT_FAN_OUT, DEFAULT_MAX_DEPTH},
};

#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  pub server_secret: String,
  pub port: u16,
  /// Depth cap for network listings. Authorization walks ignore it.
  pub max_depth: usize,
  /// Sibling visits in flight while building one network.
  pub fan_out: usize,
  pub request_timeout: Duration,
  /// Zero disables the monthly sales cache refresher.
  pub sales_refresh: Duration,
  pub fallback_referrer_id: Option<i64>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      database_url: "sqlite:refnet.db?mode=rwc".into(),
      server_secret: String::new(),
      port: 3000,
      max_depth: DEFAULT_MAX_DEPTH,
      fan_out: DEFAULT_FAN_OUT,
      request_timeout: Duration::from_secs(30),
      sales_refresh: Duration::from_secs(3600),
      fallback_referrer_id: None,
    }
  }
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    let defaults = Self::default();

    let server_secret =
      env::var("SERVER_SECRET").context("SERVER_SECRET not set")?;
    if server_secret.is_empty() {
      anyhow::bail!("SERVER_SECRET must not be empty");
    }

    let fan_out = parse_var("NETWORK_FAN_OUT")?.unwrap_or(defaults.fan_out);
    if fan_out == 0 {
      anyhow::bail!("NETWORK_FAN_OUT must be at least 1");
    }

    Ok(Self {
      database_url: env::var("DATABASE_URL")
        .unwrap_or(defaults.database_url),
      server_secret,
      port: parse_var("PORT")?.unwrap_or(defaults.port),
      max_depth: parse_var("NETWORK_MAX_DEPTH")?
        .unwrap_or(defaults.max_depth),
      fan_out,
      request_timeout: duration_var("REQUEST_TIMEOUT")?
        .unwrap_or(defaults.request_timeout),
      sales_refresh: duration_var("SALES_REFRESH")?
        .unwrap_or(defaults.sales_refresh),
      fallback_referrer_id: parse_var("FALLBACK_REFERRER_ID")?,
    })
  }
}

fn parse_var<T>(key: &str) -> anyhow::Result<Option<T>>
where
  T: std::str::FromStr,
  T::Err: std::error::Error + Send + Sync + 'static,
{
  match env::var(key) {
    Ok(raw) if !raw.trim().is_empty() => raw
      .trim()
      .parse()
      .map(Some)
      .with_context(|| format!("Invalid {key}: '{raw}'")),
    _ => Ok(None),
  }
}

fn duration_var(key: &str) -> anyhow::Result<Option<Duration>> {
  match env::var(key) {
    Ok(raw) if !raw.trim().is_empty() => humantime::parse_duration(raw.trim())
      .map(Some)
      .with_context(|| format!("Invalid {key}: '{raw}' (e.g. 30s, 5m, 1h)")),
    _ => Ok(None),
  }
}
