use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use modkit::api::OpenApiRegistry;
use modkit::{Module, ModuleCtx, RegistryBuilder, RestfulModule};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::api::rest::routes;
use crate::config::RealEstatesConfig;
use crate::contract::client::RealEstateService;
use crate::domain::service::{Service, ServiceConfig};
use crate::gateways::local::RealEstatesLocalClient;
use crate::infra::storage::memory_repo::InMemoryRealEstatesRepository;

pub const MODULE_NAME: &str = "real_estates";

/// Real estates module: wires the in-memory repository, the domain service and
/// the REST endpoint group.
#[derive(Default)]
pub struct RealEstates {
    service: ArcSwapOption<Service>,
    config: RwLock<RealEstatesConfig>,
}

impl RealEstates {
    /// The module's service capability, available after `init`.
    pub fn client(&self) -> Option<Arc<dyn RealEstateService>> {
        let service = self.service.load_full()?;
        Some(Arc::new(RealEstatesLocalClient::new(service)))
    }
}

/// Register the module; it mounts its routes on the api_ingress host.
pub fn register(builder: &mut RegistryBuilder) -> Arc<RealEstates> {
    let module = Arc::new(RealEstates::default());
    builder.add_module(MODULE_NAME, &["api_ingress"], module.clone());
    builder.add_rest(MODULE_NAME, module.clone());
    module
}

#[async_trait]
impl Module for RealEstates {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        info!("Initializing real_estates module");

        let cfg: RealEstatesConfig = ctx.module_config();
        debug!(
            "Loaded real_estates config: cors_allowed_origin={}, max_name_length={}",
            cfg.cors_allowed_origin, cfg.max_name_length
        );

        let repo = InMemoryRealEstatesRepository::default();
        let service = Service::new(
            Arc::new(repo),
            ServiceConfig {
                max_name_length: cfg.max_name_length,
            },
        );
        self.service.store(Some(Arc::new(service)));
        *self.config.write() = cfg;
        Ok(())
    }
}

impl RestfulModule for RealEstates {
    fn register_rest(
        &self,
        _ctx: &ModuleCtx,
        router: axum::Router,
        openapi: &dyn OpenApiRegistry,
    ) -> anyhow::Result<axum::Router> {
        info!("Registering real_estates REST routes");

        let service = self
            .client()
            .ok_or_else(|| anyhow::anyhow!("Service not initialized"))?;
        let cors_origin = self.config.read().cors_allowed_origin.clone();

        let router = routes::register_routes(router, openapi, service, &cors_origin)?;
        info!("Real estates REST routes registered successfully");
        Ok(router)
    }
}
