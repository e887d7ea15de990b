pub mod catalog;
pub mod customer;
pub mod material;
pub mod order;
pub mod session;
