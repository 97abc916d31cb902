pub mod activity_log;
pub mod assignment_service;
pub mod auth_service;
pub mod contact_service;
pub mod customer_service;
pub mod deal_service;
pub mod user_service;
