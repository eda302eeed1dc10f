pub mod errors;
pub mod product;

pub use errors::{FieldViolation, ProductError, ValidationErrors};
pub use product::Product;
