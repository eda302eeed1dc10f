use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::errors::ValidationErrors;

pub const NAME_MAX_CHARS: usize = 100;
pub const CATEGORY_MAX_CHARS: usize = 50;

/// A stored product record.
///
/// `id` is assigned by the service on creation and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub category: String,
}

pub fn check_name(errors: &mut ValidationErrors, name: &str) {
    check_text(errors, "name", name, NAME_MAX_CHARS);
}

pub fn check_category(errors: &mut ValidationErrors, category: &str) {
    check_text(errors, "category", category, CATEGORY_MAX_CHARS);
}

pub fn check_price(errors: &mut ValidationErrors, price: Decimal) {
    if price <= Decimal::ZERO {
        errors.push("price", "price must be greater than zero");
    }
}

// Limits count characters, not bytes.
fn check_text(errors: &mut ValidationErrors, field: &'static str, value: &str, max_chars: usize) {
    if value.trim().is_empty() {
        errors.push(field, format!("{field} must not be blank"));
    }
    if value.chars().count() > max_chars {
        errors.push(field, format!("{field} exceeds {max_chars} characters"));
    }
}

/// Lowercases the keys of a JSON object so field names match in any letter case.
pub fn fold_key_case(item: Value) -> Value {
    match item {
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(key, value)| (key.to_lowercase(), value))
                .collect(),
        ),
        other => other,
    }
}
