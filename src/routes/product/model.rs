use serde::Serialize;

use crate::catalogue::Product;

/// 首页展示的商品数量
pub const PAGE_ONE_SIZE: usize = 10;

#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub source: &'static str,
    pub count: usize,
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub product: Product,
}

impl ListingResponse {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            source: "api",
            count: products.len(),
            products,
        }
    }
}
