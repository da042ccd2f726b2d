pub mod about;
pub mod product;
pub mod purchase;
pub mod user;
