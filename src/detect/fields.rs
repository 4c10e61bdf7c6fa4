use crate::gateway::Field;
use crate::settings::FieldAliases;

/// Maps raw row keys onto canonical fields; first configured match wins.
#[derive(Debug, Clone)]
pub struct FieldMapper {
    mapping: Vec<(Field, Vec<String>)>,
}

impl FieldMapper {
    pub fn new(mapping: &[FieldAliases]) -> Self {
        let mapping = mapping
            .iter()
            .map(|m| {
                let aliases = m
                    .aliases
                    .iter()
                    .map(|a| a.to_lowercase())
                    .filter(|a| !a.is_empty())
                    .collect();
                (m.field, aliases)
            })
            .collect();
        Self { mapping }
    }

    pub fn resolve(&self, key: &str) -> Option<Field> {
        let lower = key.to_lowercase();
        self.mapping
            .iter()
            .find(|(_, aliases)| aliases.iter().any(|a| lower.contains(a.as_str())))
            .map(|(field, _)| *field)
    }
}
