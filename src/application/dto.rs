use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::domain::{
    Product, ProductError, ValidationErrors,
    product::{check_category, check_name, check_price, fold_key_case},
};

/// Decodes a request body, matching field names in any letter case.
pub fn from_json_body<T: DeserializeOwned>(body: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(fold_key_case(body))
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub category: String,
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<(), ProductError> {
        let mut errors = ValidationErrors::new();
        check_name(&mut errors, &self.name);
        check_price(&mut errors, self.price);
        check_category(&mut errors, &self.category);
        errors.into_result()
    }

    pub fn into_product(self, id: i64) -> Product {
        Product {
            id,
            name: self.name,
            price: self.price,
            category: self.category,
        }
    }
}

/// Partial update. Absent fields leave the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub category: Option<String>,
}

impl UpdateProductRequest {
    /// Checks only the fields that were supplied.
    pub fn validate(&self) -> Result<(), ProductError> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            check_name(&mut errors, name);
        }
        if let Some(price) = self.price {
            check_price(&mut errors, price);
        }
        if let Some(category) = &self.category {
            check_category(&mut errors, category);
        }
        errors.into_result()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.category.is_none()
    }

    /// Copies the supplied fields onto `product`; returns whether anything was supplied.
    pub fn apply_to(self, product: &mut Product) -> bool {
        let changed = !self.is_empty();
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        changed
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
