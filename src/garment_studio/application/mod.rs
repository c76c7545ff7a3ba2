pub mod catalog_service;
pub mod design_service;
pub mod error;
pub mod try_on_service;
