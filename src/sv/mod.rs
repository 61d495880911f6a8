pub mod access;
pub mod network;
pub mod order;
pub mod pricing;
pub mod sales;
pub mod store;
#[cfg(test)]
pub mod test_utils;
pub mod user;

pub use access::Access;
pub use network::Network;
pub use order::Orders;
pub use pricing::Catalog;
pub use sales::Sales;
pub use store::Store;
pub use user::User;
