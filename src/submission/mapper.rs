use serde_json::{Map, Value};

use crate::forms::{EMAIL_KEY, FORM_TYPE_KEY, FormVariant, PHONE_KEY};

/// A submission reshaped into the fixed contact columns plus the nested
/// variant-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub variant: FormVariant,
    pub email_address: Option<String>,
    pub full_name: Option<String>,
    pub whatsapp_number: Option<String>,
    pub form_data: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapWarning {
    MissingFormType,
}

#[derive(Debug)]
pub struct Mapped {
    pub record: NormalizedRecord,
    pub warnings: Vec<MapWarning>,
}

/// Resolve the variant of a raw payload. A missing or blank `form_type`
/// falls back to the general form; an unrecognised one is an error.
pub fn resolve_variant(raw: &Map<String, Value>) -> Result<(FormVariant, Vec<MapWarning>), String> {
    match raw.get(FORM_TYPE_KEY).and_then(scalar_to_string) {
        Some(id) => FormVariant::parse(&id)
            .map(|v| (v, Vec::new()))
            .ok_or_else(|| format!("Unknown form type: {id}")),
        None => Ok((FormVariant::General, vec![MapWarning::MissingFormType])),
    }
}

pub fn map(raw: &Map<String, Value>) -> Result<Mapped, String> {
    let (variant, warnings) = resolve_variant(raw)?;
    if warnings.contains(&MapWarning::MissingFormType) {
        tracing::warn!("No form_type provided, defaulting to '{variant}'");
    }
    Ok(Mapped {
        record: map_variant(variant, raw),
        warnings,
    })
}

pub fn map_variant(variant: FormVariant, raw: &Map<String, Value>) -> NormalizedRecord {
    let schema = variant.schema();

    let mut form_data = Map::new();
    for (key, value) in raw {
        if value.is_null() {
            continue;
        }
        if variant.is_common_key(key) {
            // Lists and objects cannot fill a column; keep them with the payload.
            if value.is_array() || value.is_object() {
                tracing::warn!("Field '{key}' of {variant} is not a scalar, storing it in form_data");
                form_data.insert(key.clone(), value.clone());
            }
            continue;
        }
        form_data.insert(variant.nested_key(key), value.clone());
    }

    NormalizedRecord {
        variant,
        email_address: raw.get(EMAIL_KEY).and_then(scalar_to_string),
        full_name: raw.get(schema.name_key).and_then(scalar_to_string),
        whatsapp_number: raw.get(PHONE_KEY).and_then(scalar_to_string),
        form_data,
    }
}

/// Strings are trimmed; numbers and booleans are stringified. Empty values,
/// nulls, arrays and objects yield `None`; `map_variant` keeps the latter two
/// in `form_data`.
fn scalar_to_string(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}
