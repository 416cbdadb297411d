//! Process-wide mapping from `(type, name)` to a registered `Plugin`.
//!
//! Registration is rare relative to lookups, so the registry is a
//! `RwLock`-guarded map: registration briefly takes a write lock, while
//! concurrent `execute_step` calls only ever need read access through
//! `get`, matching the "safe concurrent-with-lookup" requirement.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use weft_core::error::{AlreadyExistsError, NotFoundError, WeftError, WeftResult};

use crate::plugin::Plugin;

#[derive(Default)]
pub struct PluginRegistry {
    plugins: RwLock<HashMap<(String, String), Arc<dyn Plugin>>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            plugins: RwLock::new(HashMap::new()),
        }
    }

    /// Register a plugin. Fails if `(plugin_type, plugin_name)` is already
    /// registered; registration is otherwise idempotent on identity.
    pub fn register(&self, plugin: Arc<dyn Plugin>) -> WeftResult<()> {
        let key = (
            plugin.plugin_type().to_string(),
            plugin.plugin_name().to_string(),
        );
        let mut plugins = self.plugins.write().expect("plugin registry lock poisoned");
        if plugins.contains_key(&key) {
            return Err(WeftError::AlreadyExists(AlreadyExistsError::Plugin {
                plugin_type: key.0,
                name: key.1,
            }));
        }
        plugins.insert(key, plugin);
        Ok(())
    }

    /// Resolve a plugin by `(type, name)`. The error message names which of
    /// the two is unknown: if the type has no registered plugins at all,
    /// that's reported; otherwise it's the name under that type.
    pub fn get(&self, plugin_type: &str, name: &str) -> WeftResult<Arc<dyn Plugin>> {
        let plugins = self.plugins.read().expect("plugin registry lock poisoned");

        if let Some(plugin) = plugins.get(&(plugin_type.to_string(), name.to_string())) {
            return Ok(plugin.clone());
        }

        let type_known = plugins.keys().any(|(t, _)| t == plugin_type);
        if !type_known {
            Err(WeftError::NotFound(NotFoundError::PluginType {
                plugin_type: plugin_type.to_string(),
            }))
        } else {
            Err(WeftError::NotFound(NotFoundError::Plugin {
                plugin_type: plugin_type.to_string(),
                name: name.to_string(),
            }))
        }
    }

    pub fn list(&self) -> Vec<Arc<dyn Plugin>> {
        self.plugins
            .read()
            .expect("plugin registry lock poisoned")
            .values()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PluginContext;
    use async_trait::async_trait;
    use serde_json::Value;
    use tokio_util::sync::CancellationToken;

    struct EchoPlugin {
        plugin_type: String,
        name: String,
    }

    #[async_trait]
    impl Plugin for EchoPlugin {
        async fn execute_step(
            &self,
            _cancellation: &CancellationToken,
            _step_config: &crate::plugin::StepConfig,
            _shared_context: &PluginContext,
        ) -> anyhow::Result<PluginContext> {
            Ok(PluginContext::new())
        }

        fn validate_config(&self, _config: &serde_json::Map<String, Value>) -> anyhow::Result<()> {
            Ok(())
        }

        fn plugin_type(&self) -> &str {
            &self.plugin_type
        }

        fn plugin_name(&self) -> &str {
            &self.name
        }
    }

    fn echo(plugin_type: &str, name: &str) -> Arc<dyn Plugin> {
        Arc::new(EchoPlugin {
            plugin_type: plugin_type.to_string(),
            name: name.to_string(),
        })
    }

    #[test]
    fn registers_and_resolves() {
        let registry = PluginRegistry::new();
        registry.register(echo("Input", "csv")).unwrap();
        assert!(registry.get("Input", "csv").is_ok());
    }

    #[test]
    fn rejects_duplicate_registration() {
        let registry = PluginRegistry::new();
        registry.register(echo("Input", "csv")).unwrap();
        let err = registry.register(echo("Input", "csv")).unwrap_err();
        assert!(matches!(
            err,
            WeftError::AlreadyExists(AlreadyExistsError::Plugin { .. })
        ));
    }

    #[test]
    fn reports_unknown_type_vs_unknown_name() {
        let registry = PluginRegistry::new();
        registry.register(echo("Input", "csv")).unwrap();

        let err = registry.get("Output", "html").unwrap_err();
        assert!(matches!(
            err,
            WeftError::NotFound(NotFoundError::PluginType { .. })
        ));

        let err = registry.get("Input", "json").unwrap_err();
        assert!(matches!(
            err,
            WeftError::NotFound(NotFoundError::Plugin { .. })
        ));
    }

    #[test]
    fn list_returns_all_registered_plugins() {
        let registry = PluginRegistry::new();
        registry.register(echo("Input", "csv")).unwrap();
        registry.register(echo("Output", "html")).unwrap();
        assert_eq!(registry.list().len(), 2);
    }
}
