use std::collections::HashSet;

use serde_json::{Map, Value};

use super::fields::FieldMapper;
use crate::gateway::GatewayRecord;
use crate::settings::Settings;

/// Builds a record from a matched table's rows.
///
/// Rows are expected as `[[{key: value, ...}, ...], ...]`; anything at those
/// two levels that is not an array (outer) or an object (inner) is skipped.
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    mapper: FieldMapper,
    ignored_keys: HashSet<String>,
    ignored_values: HashSet<String>,
}

impl RecordExtractor {
    pub fn new(settings: &Settings) -> Self {
        Self {
            mapper: FieldMapper::new(&settings.field_mapping),
            ignored_keys: settings.ignored_keys.iter().map(|k| k.to_lowercase()).collect(),
            ignored_values: settings.ignored_values.iter().cloned().collect(),
        }
    }

    pub fn extract(&self, name: &str, table: Option<&Value>, source_id: &str) -> GatewayRecord {
        let mut record = GatewayRecord::new(source_id, name);

        let Some(Value::Array(rows)) = table else {
            return record;
        };

        for row in rows {
            let Value::Array(cells) = row else { continue };
            for cell in cells {
                if let Value::Object(item) = cell {
                    self.apply(item, &mut record);
                }
            }
        }

        record
    }

    fn apply(&self, item: &Map<String, Value>, record: &mut GatewayRecord) {
        for (key, value) in item {
            let key_lower = key.to_lowercase();
            match self.mapper.resolve(key) {
                Some(field) => record.set(field, value),
                None if self.keep_extra(&key_lower, value) => {
                    record.extra.insert(key.clone(), value.clone());
                }
                None => {}
            }
        }
    }

    fn keep_extra(&self, key_lower: &str, value: &Value) -> bool {
        if self.ignored_keys.contains(key_lower) {
            return false;
        }
        // only string values can equal an ignored marker
        !matches!(value, Value::String(s) if self.ignored_values.contains(s))
    }
}
