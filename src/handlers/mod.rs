pub mod health_handlers;
pub mod image_handlers;
pub mod owner_handlers;
pub mod visibility_handlers;
