use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::auth::{self, Caller};
use crate::{
  entity::{OrderStatus, UserRole, order, user},
  prelude::*,
  state::AppState,
  sv::{
    network::{self, NetworkNode, Scope},
    pricing::PricedProduct,
  },
};

#[derive(Serialize)]
pub struct Status {
  success: bool,
  msg: Option<String>,
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = match &self {
      Error::UserNotFound | Error::OrderNotFound => StatusCode::NOT_FOUND,
      Error::AccessDenied => StatusCode::FORBIDDEN,
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::InvalidArgs(_) | Error::EmailTaken => StatusCode::BAD_REQUEST,
      Error::Database(_) | Error::Internal(_) => {
        error!("request failed: {}", self);
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };

    let body = Status { success: false, msg: Some(self.user_message()) };
    (status, Json(body)).into_response()
  }
}

pub async fn health() -> &'static str {
  "OK"
}

pub async fn network(
  State(app): State<Arc<AppState>>,
  Caller(actor): Caller,
) -> Result<Json<Vec<NetworkNode>>> {
  let now = Utc::now().naive_utc();
  let nodes = app
    .sv()
    .network
    .scoped(Scope::for_actor(&actor), app.config.max_depth, now)
    .await?;

  debug!(
    actor_id = actor.id,
    members = network::member_count(&nodes),
    sales = network::total_sales(&nodes),
    "network served"
  );
  Ok(Json(nodes))
}

pub async fn orders(
  State(app): State<Arc<AppState>>,
  Caller(actor): Caller,
) -> Result<Json<Vec<order::Model>>> {
  Ok(Json(app.sv().orders.visible(&actor).await?))
}

#[derive(Deserialize)]
pub struct StatusReq {
  pub status: OrderStatus,
}

pub async fn order_status(
  State(app): State<Arc<AppState>>,
  Caller(actor): Caller,
  Path(id): Path<i32>,
  Json(req): Json<StatusReq>,
) -> Result<Json<order::Model>> {
  Ok(Json(app.sv().orders.set_status(&actor, id, req.status).await?))
}

pub async fn products(
  State(app): State<Arc<AppState>>,
  Caller(actor): Caller,
) -> Result<Json<Vec<PricedProduct>>> {
  Ok(Json(app.sv().catalog.priced(&actor).await?))
}

#[derive(Deserialize)]
pub struct RegisterReq {
  pub name: Option<String>,
  pub email: Option<String>,
  pub referrer_id: Option<i64>,
}

#[derive(Serialize)]
pub struct Registered {
  pub user: user::Model,
  pub token: String,
}

pub async fn register(
  State(app): State<Arc<AppState>>,
  Json(req): Json<RegisterReq>,
) -> Result<(StatusCode, Json<Registered>)> {
  let user =
    app.sv().user.register(req.name, req.email, req.referrer_id).await?;
  let token = auth::sign(&app.config.server_secret, user.id)?;
  Ok((StatusCode::CREATED, Json(Registered { user, token })))
}

#[derive(Deserialize)]
pub struct RoleReq {
  pub role: UserRole,
}

pub async fn set_role(
  State(app): State<Arc<AppState>>,
  Caller(actor): Caller,
  Path(id): Path<i64>,
  Json(req): Json<RoleReq>,
) -> Result<StatusCode> {
  if actor.role != UserRole::SuperAdmin {
    return Err(Error::AccessDenied);
  }

  app.sv().user.set_role(id, req.role).await?;
  info!(user_id = id, role = ?req.role, by = actor.id, "role changed");
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct DiscountReq {
  pub discount_percent: i32,
}

pub async fn set_discount(
  State(app): State<Arc<AppState>>,
  Caller(actor): Caller,
  Path(id): Path<i64>,
  Json(req): Json<DiscountReq>,
) -> Result<StatusCode> {
  if !actor.is_admin() {
    return Err(Error::AccessDenied);
  }

  app.sv().user.set_discount_percent(id, req.discount_percent).await?;
  info!(
    user_id = id,
    discount = req.discount_percent,
    by = actor.id,
    "discount changed"
  );
  Ok(StatusCode::NO_CONTENT)
}
