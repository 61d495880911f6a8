use sea_orm::DbErr;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] DbErr),
  #[error("user not found")]
  UserNotFound,
  #[error("order not found")]
  OrderNotFound,
  #[error("email already registered")]
  EmailTaken,
  #[error("access denied")]
  AccessDenied,
  #[error("missing or invalid credentials")]
  Unauthorized,
  #[error("invalid arguments: {0}")]
  InvalidArgs(String),
  #[error("internal error: {0}")]
  Internal(String),
}

impl Error {
  /// Message safe to hand back to a caller. Store and internal failures are
  /// collapsed so no backend detail leaks.
  pub fn user_message(&self) -> String {
    match self {
      Error::Database(_) | Error::Internal(_) => {
        "Something went wrong, try again later".into()
      }
      Error::InvalidArgs(msg) => msg.clone(),
      other => {
        let msg = other.to_string();
        let mut chars = msg.chars();
        match chars.next() {
          Some(first) => first.to_uppercase().chain(chars).collect(),
          None => msg,
        }
      }
    }
  }
}
