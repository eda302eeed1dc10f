use std::sync::Arc;

use crate::application::product_service::ProductService;

#[derive(Clone)]
pub struct AppState {
    pub product_service: Arc<ProductService>,
}

impl AppState {
    pub fn new(product_service: Arc<ProductService>) -> Self {
        Self { product_service }
    }
}
