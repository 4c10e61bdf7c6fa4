use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::gateway::Field;

pub const DEFAULT_OUTPUT: &str = "gateways_pagamento.xlsx";

const DEFAULT_KEYWORDS: &[&str] = &[
    "pay", "pagamento", "payment", "bank", "banco", "pix", "card", "cartao",
    "wallet", "checkout", "mercado", "pagseguro", "paypal", "stripe",
    "gateway", "financeiro", "transacao", "billing", "invoice", "fatura",
];

const DEFAULT_FIELD_MAPPING: &[(Field, &[&str])] = &[
    (Field::Url, &["url"]),
    (Field::ClientId, &["client_id", "clientid"]),
    (Field::ClientSecret, &["client_secret", "clientsecret"]),
    (Field::Active, &["ativo", "active", "status"]),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAliases {
    pub field: Field,
    pub aliases: Vec<String>,
}

/// Process-wide configuration, read-only once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub keywords: Vec<String>,
    /// Earlier entries win when a key matches several fields.
    pub field_mapping: Vec<FieldAliases>,
    pub ignored_keys: Vec<String>,
    pub ignored_values: Vec<String>,
    pub max_column_width: usize,
    pub log_level: String,
    pub default_output: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            field_mapping: DEFAULT_FIELD_MAPPING
                .iter()
                .map(|(field, aliases)| FieldAliases {
                    field: *field,
                    aliases: aliases.iter().map(|a| a.to_string()).collect(),
                })
                .collect(),
            ignored_keys: vec!["id".into()],
            ignored_values: vec!["-".into(), String::new()],
            max_column_width: 50,
            log_level: "info".into(),
            default_output: DEFAULT_OUTPUT.into(),
        }
    }
}

impl Settings {
    /// Built-in defaults, then an optional config file, then `PGO_*` env vars.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Config::try_from(&Settings::default())
            .context("Failed to serialise default settings")?;

        let mut builder = Config::builder().add_source(defaults);
        if let Some(p) = path {
            builder = builder.add_source(File::from(p).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix("PGO")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("keywords")
                .with_list_parse_key("ignored_keys")
                .with_list_parse_key("ignored_values"),
        );

        let settings: Settings = builder
            .build()
            .context("Failed to build settings")?
            .try_deserialize()
            .context("Invalid settings")?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_builtin_table() {
        let s = Settings::default();
        assert_eq!(s.keywords.len(), 20);
        assert!(s.keywords.contains(&"pagseguro".to_string()));
        let order: Vec<Field> = s.field_mapping.iter().map(|m| m.field).collect();
        assert_eq!(
            order,
            vec![Field::Url, Field::ClientId, Field::ClientSecret, Field::Active]
        );
        assert_eq!(s.ignored_keys, vec!["id"]);
        assert_eq!(s.ignored_values, vec!["-", ""]);
        assert_eq!(s.max_column_width, 50);
        assert_eq!(s.default_output, "gateways_pagamento.xlsx");
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            r#"
keywords = ["boleto"]
max_column_width = 80

[[field_mapping]]
field = "active"
aliases = ["enabled"]
"#,
        )
        .unwrap();

        let s = Settings::load(Some(&path)).unwrap();
        assert_eq!(s.keywords, vec!["boleto"]);
        assert_eq!(s.max_column_width, 80);
        assert_eq!(s.field_mapping.len(), 1);
        assert_eq!(s.field_mapping[0].field, Field::Active);
        // untouched keys keep their defaults
        assert_eq!(s.ignored_keys, vec!["id"]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
