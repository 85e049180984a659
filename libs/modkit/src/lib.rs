//! Module kit: the pieces a server is assembled from.
//!
//! A module implements [`Module`] and optionally [`RestfulModule`],
//! [`RestHostModule`] or [`StatefulModule`]. Modules are added to a
//! [`RegistryBuilder`], ordered by their dependencies and driven through
//! init, REST mounting, start and stop by [`run`].
//!
//! ```rust,ignore
//! let mut builder = modkit::RegistryBuilder::default();
//! builder.add_module("real_estates", &["api_ingress"], module.clone());
//! builder.add_rest("real_estates", module);
//! let registry = builder.build()?;
//! ```

pub use async_trait::async_trait;

pub mod api;
pub mod context;
pub mod contracts;
pub mod registry;
pub mod runtime;

pub use api::problem::Problem;
pub use api::{OpenApiRegistry, OperationBuilder};
pub use context::{ConfigProvider, ModuleCtx, ModuleCtxBuilder};
pub use contracts::{Module, RestHostModule, RestfulModule, StatefulModule};
pub use registry::{ModuleRegistry, Phase, RegistryBuilder, RegistryError};
pub use runtime::{run, RunOptions, StopOn};
