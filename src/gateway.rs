use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const UNKNOWN_SOURCE: &str = "unknown";

/// Canonical columns a table row can populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Url,
    ClientId,
    ClientSecret,
    Active,
}

/// One detected gateway occurrence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GatewayRecord {
    pub source_id: String,
    pub name: String,
    pub url: String,
    pub client_id: String,
    pub client_secret: String,
    pub active: String,
    pub extra: BTreeMap<String, Value>,
}

impl GatewayRecord {
    pub fn new(source_id: &str, name: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn set(&mut self, field: Field, value: &Value) {
        let text = display_value(value);
        match field {
            Field::Url => self.url = text,
            Field::ClientId => self.client_id = text,
            Field::ClientSecret => self.client_secret = text,
            Field::Active => self.active = text,
        }
    }

    /// `extra` as compact JSON, empty when nothing was collected.
    pub fn other_data(&self) -> String {
        if self.extra.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&self.extra).unwrap_or_default()
        }
    }

    /// Cells in report column order.
    pub fn row(&self) -> [String; 7] {
        [
            self.source_id.clone(),
            self.name.clone(),
            self.url.clone(),
            self.client_id.clone(),
            self.client_secret.clone(),
            self.active.clone(),
            self.other_data(),
        ]
    }
}

/// Strings stay verbatim, null becomes empty, everything else is its JSON text.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
