pub mod order;
pub mod product;
pub mod user;

pub use order::OrderStatus;
pub use user::UserRole;
