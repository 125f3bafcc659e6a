//! API models for request and response payloads

pub mod address;
pub mod category;
pub mod product;
pub mod profile;

pub use address::{Address, AddressInput};
pub use category::Category;
pub use product::{
    CreateProductRequest, ListedProduct, NewProduct, Product, ProductChanges, ProductFilter,
    ProductListResponse, ProductQuery, ProductView, UpdateProductRequest,
};
pub use profile::{CreateProfileRequest, Profile, UpdateProfileRequest};
