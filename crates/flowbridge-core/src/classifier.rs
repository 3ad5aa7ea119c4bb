//! Field classifier.
//!
//! Decides whether a parameter is static configuration or a data mapping that
//! references runtime values.  The sequential platform keeps the two apart
//! (`parameters` vs `mapper`); the graph platform mixes them in one bag.

use crate::value::{ParamValue, Params};

/// Substrings that mark a value as an expression over runtime data:
/// `{{ … }}` interpolation, the current item (`$json`) and another step's
/// output (`$node`).
pub const MAPPER_MARKERS: [&str; 3] = ["{{", "$json", "$node"];

/// Which bag a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass {
    Configuration,
    Mapper,
}

/// Classify one parameter.  Only strings can be mapper fields.
pub fn classify(_key: &str, value: &ParamValue) -> FieldClass {
    match value {
        ParamValue::String(s) if MAPPER_MARKERS.iter().any(|m| s.contains(m)) => FieldClass::Mapper,
        _ => FieldClass::Configuration,
    }
}

pub fn is_mapper_field(key: &str, value: &ParamValue) -> bool {
    classify(key, value) == FieldClass::Mapper
}

/// Split a bag into `(configuration, mapper)`, preserving key order in both.
pub fn split_params(params: &Params) -> (Params, Params) {
    let mut configuration = Params::new();
    let mut mapper = Params::new();
    for (key, value) in params {
        let bag = match classify(key, value) {
            FieldClass::Configuration => &mut configuration,
            FieldClass::Mapper => &mut mapper,
        };
        bag.insert(key.clone(), value.clone());
    }
    (configuration, mapper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::params_from_json;
    use serde_json::json;

    #[test]
    fn interpolation_is_mapper() {
        let value = ParamValue::from("Hello {{ name }}");
        assert_eq!(classify("text", &value), FieldClass::Mapper);
        // Same answer every time.
        assert_eq!(classify("text", &value), classify("text", &value));
    }

    #[test]
    fn data_references_are_mapper() {
        assert!(is_mapper_field("to", &ParamValue::from("=$json.email")));
        assert!(is_mapper_field("id", &ParamValue::from("$node[\"Trigger\"].json.id")));
    }

    #[test]
    fn literals_and_non_strings_are_configuration() {
        assert!(!is_mapper_field("channel", &ParamValue::from("#general")));
        assert!(!is_mapper_field("retries", &ParamValue::from(3_i64)));
        assert!(!is_mapper_field("flag", &ParamValue::Bool(true)));
        // Nested expressions do not promote the container.
        let nested = ParamValue::from(json!({"content": "{{$json.body}}"}));
        assert!(!is_mapper_field("messages", &nested));
    }

    #[test]
    fn split_keeps_order() {
        let params = params_from_json(json!({
            "operation": "post",
            "text": "{{$json.summary}}",
            "channel": "#alerts",
            "user": "$node.Lookup.json.id"
        }));
        let (config, mapper) = split_params(&params);
        assert_eq!(config.keys().collect::<Vec<_>>(), ["operation", "channel"]);
        assert_eq!(mapper.keys().collect::<Vec<_>>(), ["text", "user"]);
    }
}
