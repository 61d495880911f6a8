pub use std::{collections::HashSet, sync::Arc, time::Duration};

pub use chrono::{Datelike, NaiveDateTime as DateTime, TimeDelta, Utc};
pub use sea_orm::{
  ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait,
  PaginatorTrait, QueryFilter, QueryOrder, Set,
};
pub use tracing::{debug, error, info, trace, warn};

pub use crate::error::{Error, Result};
