use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Source of the raw `modules.<name>` config sections.
pub trait ConfigProvider: Send + Sync {
    fn module_section(&self, module: &str) -> Option<&Value>;
}

/// Handed to a module in every phase. The registry scopes it to the module
/// being called, so config lookups need no name.
#[derive(Clone)]
pub struct ModuleCtx {
    config: Option<Arc<dyn ConfigProvider>>,
    cancel: CancellationToken,
    module: Option<Arc<str>>,
}

pub struct ModuleCtxBuilder(ModuleCtx);

impl ModuleCtxBuilder {
    pub fn new(cancel: CancellationToken) -> Self {
        Self(ModuleCtx {
            config: None,
            cancel,
            module: None,
        })
    }

    pub fn with_config_provider(mut self, provider: Arc<dyn ConfigProvider>) -> Self {
        self.0.config = Some(provider);
        self
    }

    pub fn for_module(self, name: &str) -> Self {
        Self(self.0.for_module(name))
    }

    pub fn build(self) -> ModuleCtx {
        self.0
    }
}

impl ModuleCtx {
    pub(crate) fn for_module(mut self, name: &str) -> Self {
        self.module = Some(Arc::from(name));
        self
    }

    /// Cancelled when the process starts shutting down.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn current_module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    fn section(&self) -> Option<(&str, &Value)> {
        let name = self.module.as_deref()?;
        let value = self.config.as_ref()?.module_section(name)?;
        Some((name, value))
    }

    /// The module's section as `T`. A missing or malformed section yields
    /// `T::default()`; the malformed case is logged.
    pub fn module_config<T: DeserializeOwned + Default>(&self) -> T {
        let Some((name, value)) = self.section() else {
            return T::default();
        };
        T::deserialize(value).unwrap_or_else(|e| {
            tracing::warn!(module = name, error = %e, "invalid module config, using defaults");
            T::default()
        })
    }

    /// Like [`module_config`](Self::module_config) but a missing or malformed
    /// section is an error.
    pub fn module_config_required<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        let name = self
            .current_module()
            .ok_or_else(|| anyhow::anyhow!("context is not scoped to a module"))?;
        let (_, value) = self
            .section()
            .ok_or_else(|| anyhow::anyhow!("missing module config: {name}"))?;
        T::deserialize(value).map_err(|e| anyhow::anyhow!("invalid {name} config: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    struct Sections(Value);

    impl ConfigProvider for Sections {
        fn module_section(&self, module: &str) -> Option<&Value> {
            self.0.get(module)
        }
    }

    #[derive(Debug, Deserialize, Default, PartialEq)]
    #[serde(default)]
    struct Limits {
        origin: String,
        limit: u32,
    }

    fn ctx(module: &str, sections: Value) -> ModuleCtx {
        ModuleCtxBuilder::new(CancellationToken::new())
            .with_config_provider(Arc::new(Sections(sections)))
            .for_module(module)
            .build()
    }

    #[test]
    fn reads_the_scoped_section() {
        let ctx = ctx(
            "real_estates",
            json!({ "real_estates": { "origin": "http://localhost:3000", "limit": 5 } }),
        );
        let cfg: Limits = ctx.module_config();
        assert_eq!(cfg.origin, "http://localhost:3000");
        assert_eq!(cfg.limit, 5);
        assert_eq!(ctx.current_module(), Some("real_estates"));
    }

    #[test]
    fn malformed_section_falls_back_to_default() {
        let ctx = ctx("real_estates", json!({ "real_estates": { "limit": "many" } }));
        assert_eq!(ctx.module_config::<Limits>(), Limits::default());
        let err = ctx.module_config_required::<Limits>().unwrap_err();
        assert!(err.to_string().starts_with("invalid real_estates config"));
    }

    #[test]
    fn required_config_reports_missing_section() {
        let ctx = ctx("real_estates", json!({ "api_ingress": {} }));
        let err = ctx.module_config_required::<Limits>().unwrap_err();
        assert_eq!(err.to_string(), "missing module config: real_estates");
    }

    #[test]
    fn unscoped_context_uses_defaults() {
        let ctx = ModuleCtxBuilder::new(CancellationToken::new()).build();
        assert_eq!(ctx.module_config::<Limits>(), Limits::default());
        assert!(ctx.module_config_required::<Limits>().is_err());
        assert!(!ctx.cancellation_token().is_cancelled());
    }
}
