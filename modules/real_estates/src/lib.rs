// === PUBLIC CONTRACT ===
pub mod contract;
pub use contract::{client, error, model};

// === MODULE DEFINITION ===
pub mod module;
pub use module::{register, RealEstates, MODULE_NAME};

// === INTERNAL MODULES ===
// Exposed for tests; other modules should depend on `contract` only.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;
