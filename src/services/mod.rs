pub mod auth_service;
pub mod presence_service;
