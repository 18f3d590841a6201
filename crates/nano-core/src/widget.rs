//! Widget descriptors
//!
//! Widgets are display-only: the model references them by name inside an
//! answer and the UI renders them. The core only keeps their descriptors so
//! they can be listed to the model.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::{AgentError, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetDescriptor {
    pub name: String,
    pub description: String,
    /// Parameter name to description
    pub params: BTreeMap<String, String>,
}

impl WidgetDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.params.insert(name.into(), description.into());
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct WidgetRegistry {
    widgets: Vec<WidgetDescriptor>,
}

impl WidgetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, widget: WidgetDescriptor) -> Result<()> {
        self.register_all([widget])
    }

    /// Register several widgets; either all of them are added or none is.
    pub fn register_all<I>(&mut self, widgets: I) -> Result<()>
    where
        I: IntoIterator<Item = WidgetDescriptor>,
    {
        let widgets: Vec<WidgetDescriptor> = widgets.into_iter().collect();

        let mut seen = HashSet::new();
        for w in &widgets {
            if self.get(&w.name).is_some() || !seen.insert(w.name.as_str()) {
                tracing::error!(widget = %w.name, "Widget already registered");
                return Err(AgentError::DuplicateRegistration {
                    kind: "Widget",
                    name: w.name.clone(),
                });
            }
        }

        tracing::info!("Registering {} widgets", widgets.len());
        for w in widgets {
            tracing::debug!(widget = %w.name, "Registered widget");
            self.widgets.push(w);
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&WidgetDescriptor> {
        self.widgets.iter().find(|w| w.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.widgets.iter().map(|w| w.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// JSON object keyed by widget name, as sent to the model
    pub fn catalog_json(&self) -> Result<String> {
        let mut catalog = serde_json::Map::new();
        for w in &self.widgets {
            catalog.insert(w.name.clone(), serde_json::to_value(w)?);
        }
        Ok(serde_json::Value::Object(catalog).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_widget() -> WidgetDescriptor {
        WidgetDescriptor::new("map", "Displays a map")
            .param("latitude", "List of latitudes for display")
            .param("longitude", "List of longitudes for display")
    }

    #[test]
    fn test_duplicate_widget_leaves_registry_unchanged() {
        let mut registry = WidgetRegistry::new();
        registry.register(map_widget()).unwrap();

        let err = registry
            .register_all([WidgetDescriptor::new("metric", "m"), map_widget()])
            .unwrap_err();
        assert!(matches!(err, AgentError::DuplicateRegistration { kind: "Widget", .. }));
        assert_eq!(registry.names(), vec!["map"]);
    }

    #[test]
    fn test_catalog_keyed_by_name() {
        let mut registry = WidgetRegistry::new();
        registry.register(map_widget()).unwrap();

        let catalog: serde_json::Value =
            serde_json::from_str(&registry.catalog_json().unwrap()).unwrap();
        assert_eq!(catalog["map"]["name"], "map");
        assert_eq!(catalog["map"]["params"]["latitude"], "List of latitudes for display");
    }
}
