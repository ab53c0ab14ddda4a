//! Device/product/SKU expansion
//!
//! Authored documents describe the fleet as devices, each with products
//! and SKUs. Expansion emits one flat record per (device, product, SKU)
//! combination with every template placeholder substituted.

use crate::document::{self, CONFIG, CONFIGS, DEVICES, PRODUCTS, SKUS};
use crate::template::{TemplateExpander, TemplateScope, strip_template_only};
use crate::{Error, Result};
use regex::Regex;
use serde_json::{Map, Value};

/// Restricts output to records whose `name` matches at its start.
#[derive(Debug, Clone)]
pub struct NameFilter {
    pattern: String,
    regex: Regex,
}

impl NameFilter {
    /// Compile a filter. The pattern is anchored at the start of the name.
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        let regex = Regex::new(&format!("^(?:{pattern})")).map_err(|source| Error::InvalidFilter {
            pattern: pattern.clone(),
            source,
        })?;
        Ok(Self { pattern, regex })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Whether `record` passes. Records without a string name never do.
    pub fn matches(&self, record: &Value) -> bool {
        record
            .get(document::NAME)
            .and_then(Value::as_str)
            .is_some_and(|name| self.regex.is_match(name))
    }
}

/// Expands authored device trees into flat configuration records
#[derive(Debug, Clone, Default)]
pub struct DeviceExpander {
    templates: TemplateExpander,
    name_filter: Option<NameFilter>,
}

impl DeviceExpander {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_templates(mut self, templates: TemplateExpander) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_name_filter(mut self, filter: NameFilter) -> Self {
        self.name_filter = Some(filter);
        self
    }

    /// Expand an authored document into `{root: {configs: [...]}}`.
    ///
    /// Documents that already carry a flat `configs` list pass through
    /// unchanged apart from the name filter.
    pub fn expand_document(&self, doc: &Value, root: &str) -> Result<Value> {
        let body = doc
            .get(root)
            .and_then(Value::as_object)
            .ok_or_else(|| Error::missing(root, "document"))?;

        let records = if let Some(devices) = body.get(DEVICES) {
            let devices = devices
                .as_array()
                .ok_or_else(|| Error::invalid(format!("'{root}/{DEVICES}' must be a list")))?;
            self.expand_devices(devices)?
        } else if let Some(configs) = body.get(CONFIGS) {
            configs
                .as_array()
                .cloned()
                .ok_or_else(|| Error::invalid(format!("'{root}/{CONFIGS}' must be a list")))?
        } else {
            return Err(Error::missing(format!("{root}/{DEVICES}"), "document"));
        };

        let total = records.len();
        let records: Vec<Value> = match &self.name_filter {
            Some(filter) => records.into_iter().filter(|r| filter.matches(r)).collect(),
            None => records,
        };
        tracing::debug!(total, kept = records.len(), "Records expanded");

        Ok(document::wrap_configs(root, records))
    }

    /// Expand every device into its records, in authoring order.
    pub fn expand_devices(&self, devices: &[Value]) -> Result<Vec<Value>> {
        let default_products = vec![Value::Object(Map::new())];
        let mut records = Vec::new();

        for (device_idx, device) in devices.iter().enumerate() {
            let device = device
                .as_object()
                .ok_or_else(|| Error::invalid(format!("device #{device_idx} must be a map")))?;
            let products = match device.get(PRODUCTS) {
                Some(products) => products.as_array().ok_or_else(|| {
                    Error::invalid(format!("'{PRODUCTS}' of device #{device_idx} must be a list"))
                })?,
                None => &default_products,
            };
            let skus = device
                .get(SKUS)
                .ok_or_else(|| Error::missing(SKUS, format!("device #{device_idx}")))?
                .as_array()
                .ok_or_else(|| {
                    Error::invalid(format!("'{SKUS}' of device #{device_idx} must be a list"))
                })?;

            for (product_idx, product) in products.iter().enumerate() {
                let product = product.as_object().ok_or_else(|| {
                    Error::invalid(format!(
                        "product #{product_idx} of device #{device_idx} must be a map"
                    ))
                })?;
                for (sku_idx, sku) in skus.iter().enumerate() {
                    let sku = sku.as_object().ok_or_else(|| {
                        Error::invalid(format!("sku #{sku_idx} of device #{device_idx} must be a map"))
                    })?;
                    let context = format!("device #{device_idx} sku #{sku_idx}");
                    records.push(self.expand_sku(device, product, sku, &context)?);
                }
            }
        }

        Ok(records)
    }

    /// Build the layered scope for one SKU and return its resolved config.
    ///
    /// Layers, last write wins: the SKU's config payload, then the device,
    /// then the product, then the SKU's own top-level scalars.
    fn expand_sku(
        &self,
        device: &Map<String, Value>,
        product: &Map<String, Value>,
        sku: &Map<String, Value>,
        context: &str,
    ) -> Result<Value> {
        let mut scope = TemplateScope::new();
        if let Some(Value::Object(config)) = sku.get(CONFIG) {
            scope.collect(config);
        }
        scope.collect(device);
        scope.collect(product);
        scope.collect_own(sku);
        self.templates.resolve_scope(&mut scope)?;

        let mut sku = sku.clone();
        self.templates.apply(&mut sku, &scope)?;

        let mut config = match sku.remove(CONFIG) {
            Some(Value::Object(config)) => config,
            Some(_) => return Err(Error::invalid(format!("'{CONFIG}' of {context} must be a map"))),
            None => return Err(Error::missing(CONFIG, context)),
        };
        strip_template_only(&mut config);
        Ok(Value::Object(config))
    }
}
