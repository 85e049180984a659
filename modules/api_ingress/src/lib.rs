//! The REST host. It owns the one router every REST module mounts on,
//! collects their OpenAPI descriptions and serves HTTP between the start and
//! stop phases.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use async_trait::async_trait;
use axum::http::header;
use axum::response::IntoResponse;
use axum::{routing::get, Json, Router};
use dashmap::{DashMap, DashSet};
use modkit::api::{OpenApiRegistry, OperationSpec, SchemaList};
use modkit::{Module, ModuleCtx, RegistryBuilder, RestHostModule, StatefulModule};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer};

mod config;
mod openapi;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;

pub const MODULE_NAME: &str = "api_ingress";

const STOP_TIMEOUT: Duration = Duration::from_secs(30);

struct Server {
    shutdown: CancellationToken,
    task: JoinHandle<Result<()>>,
}

pub struct ApiIngress {
    config: ArcSwap<ApiIngressConfig>,
    schemas: ArcSwap<openapi::Components>,
    /// Keyed by `METHOD path`; the first registration of a route wins.
    operations: DashMap<String, OperationSpec>,
    handler_ids: DashSet<String>,
    router: Mutex<Option<Router>>,
    server: Mutex<Option<Server>>,
    bound: Mutex<Option<SocketAddr>>,
}

impl Default for ApiIngress {
    fn default() -> Self {
        Self {
            config: ArcSwap::from_pointee(ApiIngressConfig::default()),
            schemas: ArcSwap::from_pointee(openapi::Components::new()),
            operations: DashMap::new(),
            handler_ids: DashSet::new(),
            router: Mutex::new(None),
            server: Mutex::new(None),
            bound: Mutex::new(None),
        }
    }
}

/// Add the ingress to `builder` as module, REST host and stateful module.
pub fn register(builder: &mut RegistryBuilder) -> Arc<ApiIngress> {
    let ingress = Arc::new(ApiIngress::default());
    builder.add_module(MODULE_NAME, &[], ingress.clone());
    builder.add_rest_host(MODULE_NAME, ingress.clone());
    builder.add_stateful(MODULE_NAME, ingress.clone());
    ingress
}

impl ApiIngress {
    pub fn config(&self) -> ApiIngressConfig {
        ApiIngressConfig::clone(&self.config.load())
    }

    /// Where the server listens, between start and stop.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.bound.lock()
    }

    pub fn openapi_document(&self) -> Result<serde_json::Value> {
        let specs: Vec<OperationSpec> = self.operations.iter().map(|e| e.value().clone()).collect();
        let doc = openapi::build_document(&specs, &self.schemas.load())?;
        Ok(serde_json::to_value(doc)?)
    }

    fn health_routes(router: Router) -> Router {
        router
            .route("/health", get(web::health))
            .route("/healthz", get(|| async { "ok" }))
    }

    /// The request id layers end up outermost, the body limit innermost.
    fn with_middleware(router: Router, cfg: &ApiIngressConfig) -> Router {
        let router = router
            .layer(TimeoutLayer::new(Duration::from_secs(cfg.request_timeout_secs)))
            .layer(RequestBodyLimitLayer::new(cfg.body_limit_bytes));
        request_id::wrap(router)
    }
}

#[async_trait]
impl Module for ApiIngress {
    async fn init(&self, ctx: &ModuleCtx) -> Result<()> {
        let cfg: ApiIngressConfig = ctx.module_config();
        tracing::debug!(bind_addr = %cfg.bind_addr, enable_docs = cfg.enable_docs, "api_ingress configured");
        self.config.store(Arc::new(cfg));
        Ok(())
    }
}

impl RestHostModule for ApiIngress {
    fn prepare_router(&self, _ctx: &ModuleCtx, router: Router) -> Result<Router> {
        Ok(Self::health_routes(router))
    }

    fn finish_router(&self, _ctx: &ModuleCtx, router: Router) -> Result<Router> {
        let cfg = self.config();
        let mut router = router;
        if cfg.enable_docs {
            // Rendered once; nothing registers after this point.
            let doc = Arc::new(self.openapi_document()?);
            let serve_doc = move || {
                let doc = doc.clone();
                async move { ([(header::CACHE_CONTROL, "no-store")], Json(doc.as_ref().clone())).into_response() }
            };
            router = router
                .route("/openapi.json", get(serve_doc))
                .route("/docs", get(web::docs));
        }
        let router = Self::with_middleware(router, &cfg);
        *self.router.lock() = Some(router.clone());
        tracing::debug!(operations = self.operations.len(), docs = cfg.enable_docs, "router finished");
        Ok(router)
    }

    fn openapi(&self) -> &dyn OpenApiRegistry {
        self
    }
}

#[async_trait]
impl StatefulModule for ApiIngress {
    async fn start(&self, cancel: CancellationToken) -> Result<()> {
        let cfg = self.config();
        let addr: SocketAddr = cfg
            .bind_addr
            .parse()
            .with_context(|| format!("invalid bind address '{}'", cfg.bind_addr))?;
        let prepared = self.router.lock().take();
        let router = prepared.unwrap_or_else(|| {
            tracing::debug!("no REST phase ran, serving health checks only");
            Self::with_middleware(Self::health_routes(Router::new()), &cfg)
        });

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        let bound = listener.local_addr()?;
        *self.bound.lock() = Some(bound);
        tracing::info!(addr = %bound, "HTTP server bound");

        let shutdown = cancel.child_token();
        let signal = {
            let shutdown = shutdown.clone();
            async move { shutdown.cancelled().await }
        };
        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(signal)
                .await
                .context("HTTP server failed")
        });
        *self.server.lock() = Some(Server { shutdown, task });
        Ok(())
    }

    async fn stop(&self, _cancel: CancellationToken) -> Result<()> {
        let Some(server) = self.server.lock().take() else {
            return Ok(());
        };
        server.shutdown.cancel();
        match tokio::time::timeout(STOP_TIMEOUT, server.task).await {
            Ok(joined) => joined.context("HTTP server task panicked")??,
            Err(_) => tracing::warn!(timeout = ?STOP_TIMEOUT, "HTTP server did not stop in time"),
        }
        *self.bound.lock() = None;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

impl OpenApiRegistry for ApiIngress {
    fn add_operation(&self, op: &OperationSpec) {
        let key = format!("{} {}", op.method, op.path);
        if self.operations.contains_key(&key) || !self.handler_ids.insert(op.handler_id.clone()) {
            tracing::error!(method = %op.method, path = %op.path, "operation registered twice, keeping the first");
            return;
        }
        self.operations.insert(key, op.clone());
        tracing::debug!(method = %op.method, path = %op.path, "operation registered");
    }

    fn add_schemas(&self, root: &str, schemas: SchemaList) -> String {
        // Copy on write so a reader never sees a half-updated map.
        self.schemas.rcu(|current| {
            let mut next = openapi::Components::clone(current);
            for (name, schema) in &schemas {
                let same = next.get(name).is_some_and(|old| {
                    serde_json::to_value(old).ok() == serde_json::to_value(schema).ok()
                });
                if !same {
                    if next.contains_key(name) {
                        tracing::warn!(%name, "schema redefined, keeping the latest");
                    }
                    next.insert(name.clone(), schema.clone());
                }
            }
            next
        });
        root.to_string()
    }
}
