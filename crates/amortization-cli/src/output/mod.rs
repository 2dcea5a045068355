pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// A result object split into dotted scalar fields and nested row sets.
pub struct Flattened<'a> {
    pub fields: Vec<(String, &'a Value)>,
    pub row_sets: Vec<(String, &'a [Value])>,
}

/// Flatten nested objects into dotted keys; arrays of objects (periods,
/// presets) are kept apart so they can be rendered as their own tables.
pub fn flatten(map: &Map<String, Value>) -> Flattened<'_> {
    let mut out = Flattened {
        fields: Vec::new(),
        row_sets: Vec::new(),
    };
    flatten_into(map, "", &mut out);
    out
}

fn flatten_into<'a>(map: &'a Map<String, Value>, prefix: &str, out: &mut Flattened<'a>) {
    for (key, val) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => flatten_into(inner, &path, out),
            Value::Array(items) if items.first().is_some_and(Value::is_object) => {
                out.row_sets.push((path, items.as_slice()));
            }
            _ => out.fields.push((path, val)),
        }
    }
}

/// Walk a dotted path through nested objects.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |v, key| v.get(key))
}
