//! Caller identity. Tokens are issued by the authentication service that
//! shares `SERVER_SECRET`: `<user_id>.<hex hmac-sha256(user_id)>`.

use std::sync::Arc;

use axum::{
  extract::FromRequestParts,
  http::{header::AUTHORIZATION, request::Parts},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{prelude::*, state::AppState, sv::access::Actor};

type HmacSha256 = Hmac<Sha256>;

fn mac(secret: &str, user_id: i64) -> Result<HmacSha256> {
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
    .map_err(|e| Error::Internal(format!("Invalid HMAC key: {e}")))?;
  mac.update(user_id.to_string().as_bytes());
  Ok(mac)
}

pub fn sign(secret: &str, user_id: i64) -> Result<String> {
  let tag = mac(secret, user_id)?.finalize().into_bytes();
  Ok(format!("{user_id}.{}", hex::encode(tag)))
}

/// User id carried by a valid token.
pub fn verify(secret: &str, token: &str) -> Result<i64> {
  let (id, tag) = token.split_once('.').ok_or(Error::Unauthorized)?;
  let user_id: i64 = id.parse().map_err(|_| Error::Unauthorized)?;
  let tag = hex::decode(tag).map_err(|_| Error::Unauthorized)?;

  mac(secret, user_id)?.verify_slice(&tag).map_err(|_| Error::Unauthorized)?;
  Ok(user_id)
}

/// Authenticated caller, with role and discount read fresh from the store.
pub struct Caller(pub Actor);

impl FromRequestParts<Arc<AppState>> for Caller {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    app: &Arc<AppState>,
  ) -> Result<Self, Self::Rejection> {
    let token = parts
      .headers
      .get(AUTHORIZATION)
      .and_then(|value| value.to_str().ok())
      .and_then(|value| value.strip_prefix("Bearer "))
      .ok_or(Error::Unauthorized)?;

    let user_id = verify(&app.config.server_secret, token.trim())?;
    let user =
      app.sv().user.by_id(user_id).await?.ok_or(Error::Unauthorized)?;

    trace!(user_id, role = ?user.role, "caller authenticated");
    Ok(Caller(Actor::from(&user)))
  }
}
