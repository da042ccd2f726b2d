mod handler;
mod model;

pub use handler::{add_purchase, buy_product, delete_purchase, list_purchases};
pub use model::BuyProductRequest;
