// ============================================================================
// Product Store Library
// ============================================================================

//! CRUD operations over product records kept in a single JSON file.
//!
//! Layers, leaves first:
//! - [`storage`]: moves the whole collection between memory and its medium
//! - [`application::product_service`]: validation, id assignment and lookups
//! - [`interface::http`] and [`app`]: the axum HTTP surface
//!
//! # Examples
//!
//! ```no_run
//! use product_store::application::{dto::CreateProductRequest, product_service::ProductService};
//! use rust_decimal::Decimal;
//!
//! # async fn run() -> Result<(), product_store::domain::ProductError> {
//! let service = ProductService::open_file("Data Source/products.json");
//! let pen = service
//!     .create_product(CreateProductRequest {
//!         name: "Pen".to_string(),
//!         price: Decimal::new(150, 2),
//!         category: "Office".to_string(),
//!     })
//!     .await?;
//! assert_eq!(service.get_product(pen.id).await?, pen);
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod interface;
pub mod state;
pub mod storage;

pub use app::build_router;
pub use application::product_service::ProductService;
pub use domain::{Product, ProductError};
