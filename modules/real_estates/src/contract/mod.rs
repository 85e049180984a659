pub mod client;
pub mod error;
pub mod model;

pub use client::RealEstateService;
pub use error::RealEstatesError;
pub use model::{FilterCriteria, RealEstate};
