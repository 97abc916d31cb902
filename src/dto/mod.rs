pub mod assignment_dto;
pub mod auth_dto;
pub mod contact_dto;
pub mod customer_dto;
pub mod deal_dto;
pub mod user_dto;
