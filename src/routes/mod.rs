pub mod assignments;
pub mod auth;
pub mod contacts;
pub mod customers;
pub mod deals;
pub mod health;
pub mod users;
