pub mod dto;
pub mod product_service;
