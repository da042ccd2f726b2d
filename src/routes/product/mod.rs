mod handler;
mod model;

pub use handler::{page_one, product_by_id, shopping};
