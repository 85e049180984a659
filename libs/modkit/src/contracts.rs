//! What a module can plug into the runtime. Every module implements
//! [`Module`]; the other traits are optional capabilities registered
//! alongside it.

use async_trait::async_trait;
use axum::Router;
use tokio_util::sync::CancellationToken;

use crate::api::OpenApiRegistry;
use crate::context::ModuleCtx;

#[async_trait]
pub trait Module: Send + Sync + 'static {
    /// Build services and read config. Dependencies are already initialised.
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()>;
}

/// A module that serves HTTP routes through the host.
pub trait RestfulModule: Send + Sync {
    fn register_rest(
        &self,
        ctx: &ModuleCtx,
        router: Router,
        openapi: &dyn OpenApiRegistry,
    ) -> anyhow::Result<Router>;
}

/// Owner of the shared router. At most one per process.
pub trait RestHostModule: Send + Sync + 'static {
    /// Routes that exist before any module mounts its own.
    fn prepare_router(&self, ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router>;

    /// Wrap the complete router in global middleware and keep it for serving.
    fn finish_router(&self, ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router>;

    fn openapi(&self) -> &dyn OpenApiRegistry;
}

/// A module with background work between `start` and `stop`.
#[async_trait]
pub trait StatefulModule: Send + Sync {
    async fn start(&self, cancel: CancellationToken) -> anyhow::Result<()>;
    async fn stop(&self, cancel: CancellationToken) -> anyhow::Result<()>;
}
