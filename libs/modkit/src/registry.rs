//! Module registration and the ordered lifecycle phases.

use std::fmt;
use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::context::ModuleCtx;
use crate::contracts::{Module, RestHostModule, RestfulModule, StatefulModule};

/// Lifecycle step in which a module failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Init,
    RestPrepare,
    RestRegister,
    RestFinish,
    Start,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Init => "init",
            Phase::RestPrepare => "rest prepare",
            Phase::RestRegister => "rest registration",
            Phase::RestFinish => "rest finish",
            Phase::Start => "start",
        })
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("module '{0}' is registered twice")]
    Duplicate(&'static str),
    #[error("no module named '{0}' is registered")]
    UnknownModule(&'static str),
    #[error("module '{module}' depends on '{missing}', which is not registered")]
    UnknownDependency {
        module: &'static str,
        missing: &'static str,
    },
    #[error("modules {0:?} depend on each other")]
    Cycle(Vec<&'static str>),
    #[error("both '{0}' and '{1}' claim to be the REST host")]
    MultipleRestHosts(&'static str, &'static str),
    #[error("REST modules are registered but no REST host is")]
    RestRequiresHost,
    #[error("{phase} failed in module '{module}'")]
    Phase {
        phase: Phase,
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

fn failed(phase: Phase, module: &'static str) -> impl FnOnce(anyhow::Error) -> RegistryError {
    move |source| RegistryError::Phase {
        phase,
        module,
        source,
    }
}

struct Slot {
    name: &'static str,
    deps: &'static [&'static str],
    core: Arc<dyn Module>,
    rest: Option<Arc<dyn RestfulModule>>,
    host: Option<Arc<dyn RestHostModule>>,
    stateful: Option<Arc<dyn StatefulModule>>,
}

/// Collects modules and their capabilities. A capability must be added after
/// the module it belongs to.
#[derive(Default)]
pub struct RegistryBuilder {
    slots: Vec<Slot>,
    host: Option<&'static str>,
    rejected: Option<RegistryError>,
}

impl RegistryBuilder {
    fn reject(&mut self, err: RegistryError) {
        self.rejected.get_or_insert(err);
    }

    fn slot(&mut self, name: &'static str) -> Option<&mut Slot> {
        let found = self.slots.iter_mut().position(|s| s.name == name);
        match found {
            Some(i) => Some(&mut self.slots[i]),
            None => {
                self.reject(RegistryError::UnknownModule(name));
                None
            }
        }
    }

    pub fn add_module(&mut self, name: &'static str, deps: &'static [&'static str], m: Arc<dyn Module>) {
        if self.slots.iter().any(|s| s.name == name) {
            self.reject(RegistryError::Duplicate(name));
            return;
        }
        self.slots.push(Slot {
            name,
            deps,
            core: m,
            rest: None,
            host: None,
            stateful: None,
        });
    }

    pub fn add_rest(&mut self, name: &'static str, m: Arc<dyn RestfulModule>) {
        if let Some(slot) = self.slot(name) {
            slot.rest = Some(m);
        }
    }

    pub fn add_rest_host(&mut self, name: &'static str, m: Arc<dyn RestHostModule>) {
        if let Some(existing) = self.host {
            self.reject(RegistryError::MultipleRestHosts(existing, name));
            return;
        }
        if let Some(slot) = self.slot(name) {
            slot.host = Some(m);
            self.host = Some(name);
        }
    }

    pub fn add_stateful(&mut self, name: &'static str, m: Arc<dyn StatefulModule>) {
        if let Some(slot) = self.slot(name) {
            slot.stateful = Some(m);
        }
    }

    /// Order modules so each comes after its dependencies. Among modules that
    /// are free to go, the one registered first goes first.
    pub fn build(self) -> Result<ModuleRegistry, RegistryError> {
        if let Some(err) = self.rejected {
            return Err(err);
        }
        for slot in &self.slots {
            if let Some(&missing) = slot.deps.iter().find(|d| !self.slots.iter().any(|s| s.name == **d)) {
                return Err(RegistryError::UnknownDependency {
                    module: slot.name,
                    missing,
                });
            }
        }

        let mut waiting = self.slots;
        let mut ordered: Vec<Slot> = Vec::with_capacity(waiting.len());
        while !waiting.is_empty() {
            let ready = waiting
                .iter()
                .position(|s| s.deps.iter().all(|d| ordered.iter().any(|o| o.name == *d)));
            match ready {
                Some(i) => ordered.push(waiting.remove(i)),
                None => return Err(RegistryError::Cycle(waiting.iter().map(|s| s.name).collect())),
            }
        }

        let registry = ModuleRegistry { modules: ordered };
        tracing::info!(modules = ?registry.names(), "module registry built");
        Ok(registry)
    }
}

/// Modules in dependency order.
pub struct ModuleRegistry {
    modules: Vec<Slot>,
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl ModuleRegistry {
    pub fn names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|s| s.name).collect()
    }

    pub async fn init(&self, ctx: &ModuleCtx) -> Result<(), RegistryError> {
        for slot in &self.modules {
            tracing::debug!(module = slot.name, "init");
            slot.core
                .init(&ctx.clone().for_module(slot.name))
                .await
                .map_err(failed(Phase::Init, slot.name))?;
        }
        Ok(())
    }

    /// Let the host prepare `router`, mount every REST module on it, then let
    /// the host finish it.
    pub fn mount_rest(&self, ctx: &ModuleCtx, router: Router) -> Result<Router, RegistryError> {
        let host = self
            .modules
            .iter()
            .find_map(|s| s.host.as_ref().map(|h| (s.name, h)));
        let Some((host_name, host)) = host else {
            if self.modules.iter().any(|s| s.rest.is_some()) {
                return Err(RegistryError::RestRequiresHost);
            }
            return Ok(router);
        };
        let host_ctx = ctx.clone().for_module(host_name);

        let mut router = host
            .prepare_router(&host_ctx, router)
            .map_err(failed(Phase::RestPrepare, host_name))?;
        for slot in &self.modules {
            if let Some(rest) = &slot.rest {
                router = rest
                    .register_rest(&ctx.clone().for_module(slot.name), router, host.openapi())
                    .map_err(failed(Phase::RestRegister, slot.name))?;
            }
        }
        host.finish_router(&host_ctx, router)
            .map_err(failed(Phase::RestFinish, host_name))
    }

    pub async fn start(&self, cancel: &CancellationToken) -> Result<(), RegistryError> {
        for slot in &self.modules {
            if let Some(s) = &slot.stateful {
                s.start(cancel.clone())
                    .await
                    .map_err(failed(Phase::Start, slot.name))?;
            }
        }
        Ok(())
    }

    /// Reverse order. A failing module is logged and the rest still stop.
    pub async fn stop(&self, cancel: &CancellationToken) {
        for slot in self.modules.iter().rev() {
            if let Some(s) = &slot.stateful {
                if let Err(err) = s.stop(cancel.clone()).await {
                    tracing::warn!(module = slot.name, error = %err, "Failed to stop module");
                }
            }
        }
    }
}
