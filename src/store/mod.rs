//! 持久化层：用户凭证与购买账本
//!
//! 所有账本修改（扣款+计数、删除+退款）都在一次原子操作内完成，
//! 并发请求不会丢失更新。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
    pub password_hash: String,
    pub balance: Decimal,
}

/// 某用户对某商品的购买记录，price 为首次购买时的快照
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub user_id: Uuid,
    pub product_id: String,
    pub price: Decimal,
    pub count: i32,
}

impl Purchase {
    pub fn total(&self) -> Decimal {
        self.price * Decimal::from(self.count)
    }
}

/// 扣款后的账本状态
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub purchase: Purchase,
    pub balance: Decimal,
}

#[derive(Debug, Clone)]
pub struct Refund {
    pub purchase: Purchase,
    pub refunded: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    Conflict,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("insufficient balance")]
    InsufficientBalance,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait Store: Send + Sync {
    /// 邮箱已存在时返回 `Conflict`
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn update_profile(&self, id: Uuid, name: &str, email: &str)
    -> Result<User, StoreError>;

    async fn list_purchases(&self, user_id: Uuid) -> Result<Vec<Purchase>, StoreError>;

    /// 已有记录 count+1 并按记录中的价格扣款；无记录返回 `NotFound`
    async fn increment_purchase(
        &self,
        user_id: Uuid,
        product_id: &str,
    ) -> Result<LedgerEntry, StoreError>;

    /// 首次购买按 `price` 建立记录（count=1）；已有记录时等同 `increment_purchase`
    async fn open_purchase(
        &self,
        user_id: Uuid,
        product_id: &str,
        price: Decimal,
    ) -> Result<LedgerEntry, StoreError>;

    /// 删除整条记录并退还 count × price
    async fn remove_purchase(&self, user_id: Uuid, product_id: &str)
    -> Result<Refund, StoreError>;

    async fn insert_report(&self, user_id: Uuid, message: &str) -> Result<Report, StoreError>;
}
