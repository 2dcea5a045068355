use amortization_core::format::{format_currency, format_percent};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use tabled::{builder::Builder, Table};

use super::flatten;

/// Fields rendered as currency.
const MONEY_FIELDS: &[&str] = &[
    "payment",
    "amortization",
    "interest",
    "balance",
    "cumulative_interest",
    "cumulative_amortization",
    "extra_amortization",
    "total_payment",
    "total_interest",
    "total_amortization",
    "first_payment",
    "last_payment",
    "interest_saved",
    "total_saved",
    "first_payment_delta",
    "financed_amount",
    "total_gross_income",
    "new_balance",
    "balance_at_watermark",
    "extra_principal",
    "total_extra_applied",
];

/// Fields holding decimal rates, rendered as percentages.
const RATE_FIELDS: &[&str] = &["periodic_rate", "correction_rate", "monthly_interest_rate", "monthly_correction_rate"];

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => print_result_table(result, map),
            None => print_object(map),
        },
        Value::Array(arr) => print_rows("", arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &serde_json::Map<String, Value>) {
    match result {
        Value::Object(res_map) => print_object(res_map),
        Value::Array(arr) => print_rows("", arr),
        _ => println!("{}", format_value("", result)),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_object(map: &serde_json::Map<String, Value>) {
    let flat = flatten(map);

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in &flat.fields {
        builder.push_record([key.as_str(), &format_value(key, val)]);
    }
    println!("{}", Table::from(builder));

    for (key, rows) in flat.row_sets {
        print_rows(&key, rows);
    }
}

fn print_rows(title: &str, arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }
    if !title.is_empty() {
        println!("\n{}:", title);
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(|v| format_value(h, v)).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }
        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value("", item));
        }
    }
}

fn leaf(key: &str) -> &str {
    key.rsplit('.').next().unwrap_or(key)
}

fn as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => Decimal::from_str(s).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}

fn format_value(key: &str, value: &Value) -> String {
    let field = leaf(key);
    if MONEY_FIELDS.contains(&field) {
        if let Some(d) = as_decimal(value) {
            return format_currency(d);
        }
    }
    if RATE_FIELDS.contains(&field) {
        if let Some(d) = as_decimal(value) {
            return format_percent(d * Decimal::ONE_HUNDRED);
        }
    }
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(|v| format_value("", v)).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
