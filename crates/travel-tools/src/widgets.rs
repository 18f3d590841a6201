//! Display widgets offered to the model.
//!
//! Widgets are only described here; rendering belongs to the client that
//! receives the `<Widget>` payloads.

use nano_core::WidgetDescriptor;

pub fn map_widget() -> WidgetDescriptor {
    WidgetDescriptor::new("map", "Displays a map")
        .param("latitude", "List of latitudes for display")
        .param("longitude", "List of longitudes for display")
}

pub fn metric_widget() -> WidgetDescriptor {
    WidgetDescriptor::new("metric", "Displays a metric, i.e. temperature, humidity, etc.")
        .param("metric_name", "List of metric names to display")
        .param("value", "List of values to display")
}

/// Every widget the travel assistant can emit
pub fn default_widgets() -> Vec<WidgetDescriptor> {
    vec![map_widget(), metric_widget()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use nano_core::WidgetRegistry;

    #[test]
    fn test_default_widgets_register() {
        let mut registry = WidgetRegistry::new();
        registry.register_all(default_widgets()).unwrap();
        assert_eq!(registry.names(), vec!["map", "metric"]);

        let catalog: serde_json::Value =
            serde_json::from_str(&registry.catalog_json().unwrap()).unwrap();
        assert_eq!(
            catalog["map"]["params"]["latitude"],
            "List of latitudes for display"
        );
    }
}
