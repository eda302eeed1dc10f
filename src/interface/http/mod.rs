pub mod problem;
pub mod products_handler;
