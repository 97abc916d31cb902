pub mod assignment;
pub mod contact;
pub mod customer;
pub mod deal;
pub mod user;
