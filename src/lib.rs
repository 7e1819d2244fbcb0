pub mod app;
pub mod barcode;
pub mod document;
pub mod form;
pub mod product;
pub mod router;
pub mod settings;
pub mod template;
