//! Business services shared by the route handlers

pub mod images;

pub use images::{ImageService, ImageSettings, ImageUpload};
