pub mod broadcast;
pub mod chat_service;
pub mod gateway;
pub mod health_service;
pub mod identity_service;
pub mod registry;
pub mod room_service;
pub mod user_service;
