//! Plugin registry for syntax extension lookup
//!
//! This module provides the ordered registry the parser and renderers consult.
//! Plugins are looked up by name; block and inline plugins are iterated in registration
//! order because two patterns may overlap and the first match wins.
//!
//! The registry is configured before conversions start. Mutation needs `&mut`, so a
//! registry shared behind a pipeline cannot change while conversions run.

use crate::plugin::Plugin;
use thiserror::Error;

/// Errors raised when registering a plugin
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The plugin declares neither a block rule nor an inline pattern
    #[error("plugin '{0}' has neither a block rule nor an inline pattern")]
    NoMatchRule(String),
}

/// Registry of syntax plugins
///
/// # Examples
///
/// ```ignore
/// let mut registry = PluginRegistry::new();
/// registry.register(PanelPlugin::new())?;
///
/// let panel = registry.get("panel");
/// for plugin in registry.block_plugins() {
///     // registration order
/// }
/// ```
pub struct PluginRegistry {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        PluginRegistry {
            plugins: Vec::new(),
        }
    }

    /// Register a plugin
    ///
    /// If a plugin with the same name already exists it is replaced in place (keeping its
    /// position in the iteration order) and the previous plugin is returned. Callers
    /// that want first-registration-wins must check [`PluginRegistry::has`] first.
    pub fn register<P: Plugin + 'static>(
        &mut self,
        plugin: P,
    ) -> Result<Option<Box<dyn Plugin>>, RegistryError> {
        self.register_boxed(Box::new(plugin))
    }

    /// Register an already boxed plugin
    pub fn register_boxed(
        &mut self,
        plugin: Box<dyn Plugin>,
    ) -> Result<Option<Box<dyn Plugin>>, RegistryError> {
        if plugin.block_rule().is_none() && plugin.inline_pattern().is_none() {
            return Err(RegistryError::NoMatchRule(plugin.name().to_string()));
        }
        match self.position(plugin.name()) {
            Some(index) => Ok(Some(std::mem::replace(&mut self.plugins[index], plugin))),
            None => {
                self.plugins.push(plugin);
                Ok(None)
            }
        }
    }

    /// Remove a plugin by name, returning it if it was registered
    pub fn unregister(&mut self, name: &str) -> Option<Box<dyn Plugin>> {
        let index = self.position(name)?;
        Some(self.plugins.remove(index))
    }

    /// Get a plugin by name
    pub fn get(&self, name: &str) -> Option<&dyn Plugin> {
        self.plugins
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref())
    }

    /// Check if a plugin exists
    pub fn has(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Plugin names in registration order
    pub fn list_plugins(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().to_string()).collect()
    }

    /// Plugins with a block rule, in registration order
    pub fn block_plugins(&self) -> impl Iterator<Item = &dyn Plugin> {
        self.plugins
            .iter()
            .map(|p| p.as_ref())
            .filter(|p| p.block_rule().is_some())
    }

    /// Plugins with an inline pattern, in registration order
    pub fn inline_plugins(&self) -> impl Iterator<Item = &dyn Plugin> {
        self.plugins
            .iter()
            .map(|p| p.as_ref())
            .filter(|p| p.inline_pattern().is_some())
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.plugins.iter().position(|p| p.name() == name)
    }

    /// Create a registry with the built-in plugins
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for plugin in crate::plugins::builtin_plugins() {
            // Built-ins always carry a match rule.
            let _ = registry.register_boxed(plugin);
        }
        registry
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.list_plugins())
            .finish()
    }
}
