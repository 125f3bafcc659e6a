//! Repositories for database operations
//!
//! One repository per table. Every mutation on user-owned rows is scoped by
//! the owner ID in the WHERE clause, so another user's row simply matches
//! nothing.

pub mod address;
pub mod category;
pub mod product;
pub mod profile;

pub use address::AddressRepository;
pub use category::CategoryRepository;
pub use product::ProductRepository;
pub use profile::ProfileRepository;
