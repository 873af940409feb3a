//! Shared domain types for raiz (plant images, load states, catalog items).

pub mod catalog;
pub mod image;

pub use catalog::CatalogItem;
pub use image::{ApiImage, ImageRef, LoadState, PlantImagesResponse};
