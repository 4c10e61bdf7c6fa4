pub mod extract;
pub mod fields;
pub mod keywords;

use serde_json::Value;
use tracing::{info, warn};

use crate::error::ProcessError;
use crate::gateway::{GatewayRecord, UNKNOWN_SOURCE};
use crate::settings::Settings;
use extract::RecordExtractor;
use keywords::KeywordMatcher;

/// Keyword scan over table names, then field extraction for each hit.
#[derive(Debug, Clone)]
pub struct Detector {
    matcher: KeywordMatcher,
    extractor: RecordExtractor,
}

impl Detector {
    pub fn new(settings: &Settings) -> Self {
        let matcher = KeywordMatcher::new(&settings.keywords);
        info!("Detector initialised with {} keywords", matcher.len());
        Self {
            matcher,
            extractor: RecordExtractor::new(settings),
        }
    }

    /// Mine one parsed document. Only a non-object top level is an error;
    /// every other irregularity falls back to a default.
    pub fn scan_document(&self, doc: &Value) -> Result<Vec<GatewayRecord>, ProcessError> {
        let Value::Object(root) = doc else {
            return Err(ProcessError::Shape(format!(
                "top level is {}, expected an object",
                kind_of(doc)
            )));
        };

        let site = root
            .get("site")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_SOURCE);

        let tables: &[Value] = match root.get("tables") {
            Some(Value::Array(tables)) => tables,
            Some(other) => {
                warn!("{}: 'tables' is {}, ignoring", site, kind_of(other));
                &[]
            }
            None => &[],
        };

        info!("Processing: {}", site);
        let gateways = self.scan_tables(tables, site);
        info!("Total gateways found: {}", gateways.len());
        Ok(gateways)
    }

    fn scan_tables(&self, tables: &[Value], site: &str) -> Vec<GatewayRecord> {
        let mut gateways = Vec::new();

        for table_obj in tables {
            let Value::Object(entries) = table_obj else { continue };
            for (table_name, table_data) in entries {
                if self.matcher.matches(table_name) {
                    gateways.push(self.extractor.extract(table_name, Some(table_data), site));
                    info!("Gateway found: {}", table_name);
                }
            }
        }

        gateways
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn detector() -> Detector {
        Detector::new(&Settings::default())
    }

    #[test]
    fn shop_example_document() {
        let doc = json!({"site": "shop.example", "tables": [{"payment_gateway": [[{"url": "https://pay.example", "client_id": "abc", "id": "9", "note": "-"}]]}]});
        let found = detector().scan_document(&doc).unwrap();
        assert_eq!(found.len(), 1);
        let r = &found[0];
        assert_eq!(r.source_id, "shop.example");
        assert_eq!(r.name, "payment_gateway");
        assert_eq!(r.url, "https://pay.example");
        assert_eq!(r.client_id, "abc");
        assert_eq!(r.client_secret, "");
        assert_eq!(r.active, "");
        assert!(r.extra.is_empty());
    }

    #[test]
    fn non_gateway_tables_are_ignored() {
        let doc = json!({"site": "s", "tables": [{"users_table": [[{"url": "x"}]]}]});
        assert!(detector().scan_document(&doc).unwrap().is_empty());
    }

    #[test]
    fn defaults_for_missing_site_and_tables() {
        let d = detector();
        assert!(d.scan_document(&json!({})).unwrap().is_empty());

        let doc = json!({"site": 12, "tables": [{"pix": []}]});
        let found = d.scan_document(&doc).unwrap();
        assert_eq!(found[0].source_id, "unknown");

        let doc = json!({"site": "s", "tables": {"pix": []}});
        assert!(d.scan_document(&doc).unwrap().is_empty());
    }

    #[test]
    fn discovery_order_is_preserved() {
        let doc = json!({"site": "s", "tables": [
            {"stripe_keys": [], "users": [], "paypal": []},
            "not-a-table",
            {"invoice_cfg": []}
        ]});
        let names: Vec<String> = detector()
            .scan_document(&doc)
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["stripe_keys", "paypal", "invoice_cfg"]);
    }

    #[test]
    fn non_object_top_level_is_a_shape_error() {
        let err = detector().scan_document(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, ProcessError::Shape(_)));
        assert!(!err.is_io());
    }
}
