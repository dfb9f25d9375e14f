pub mod batch_image_service;
pub mod catalog_service;
pub mod error;
pub mod image_service;
pub mod owner_adapter;
pub mod registry;
pub mod validation;
pub mod visibility_service;
