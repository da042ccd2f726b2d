use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{LedgerEntry, NewUser, Purchase, Refund, Report, Store, StoreError, User};

/// 内存存储，用于无数据库的本地运行和测试。
/// 每个操作只获取一次锁，账本修改要么全部生效要么不生效。
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    purchases: HashMap<(Uuid, String), Purchase>,
    reports: Vec<Report>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn reports(&self) -> Vec<Report> {
        self.inner.lock().await.reports.clone()
    }
}

impl Inner {
    fn user_mut(&mut self, id: Uuid) -> Result<&mut User, StoreError> {
        self.users.get_mut(&id).ok_or(StoreError::NotFound("user"))
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|user| user.email == email && Some(user.id) != except)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.email_taken(&user.email, None) {
            return Err(StoreError::Conflict);
        }

        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            age: user.age,
            password_hash: user.password_hash,
            balance: user.balance,
            created_at: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.values().find(|user| user.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.inner.lock().await.users.get(&id).cloned())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: &str,
        email: &str,
    ) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.email_taken(email, Some(id)) {
            return Err(StoreError::Conflict);
        }

        let user = inner.user_mut(id)?;
        user.name = name.to_string();
        user.email = email.to_string();
        Ok(user.clone())
    }

    async fn list_purchases(&self, user_id: Uuid) -> Result<Vec<Purchase>, StoreError> {
        let inner = self.inner.lock().await;
        let mut purchases: Vec<Purchase> = inner
            .purchases
            .values()
            .filter(|purchase| purchase.user_id == user_id)
            .cloned()
            .collect();
        purchases.sort_by(|a, b| a.product_id.cmp(&b.product_id));
        Ok(purchases)
    }

    async fn increment_purchase(
        &self,
        user_id: Uuid,
        product_id: &str,
    ) -> Result<LedgerEntry, StoreError> {
        let mut inner = self.inner.lock().await;
        let balance = inner.user_mut(user_id)?.balance;
        let key = (user_id, product_id.to_string());
        let price = inner
            .purchases
            .get(&key)
            .map(|purchase| purchase.price)
            .ok_or(StoreError::NotFound("purchase"))?;

        if balance < price {
            return Err(StoreError::InsufficientBalance);
        }

        let user = inner.user_mut(user_id)?;
        user.balance -= price;
        let balance = user.balance;

        let purchase = inner
            .purchases
            .get_mut(&key)
            .ok_or(StoreError::NotFound("purchase"))?;
        purchase.count += 1;

        Ok(LedgerEntry {
            purchase: purchase.clone(),
            balance,
        })
    }

    async fn open_purchase(
        &self,
        user_id: Uuid,
        product_id: &str,
        price: Decimal,
    ) -> Result<LedgerEntry, StoreError> {
        let mut inner = self.inner.lock().await;
        let balance = inner.user_mut(user_id)?.balance;
        let key = (user_id, product_id.to_string());
        let charged = inner
            .purchases
            .get(&key)
            .map_or(price, |purchase| purchase.price);

        if balance < charged {
            return Err(StoreError::InsufficientBalance);
        }

        let user = inner.user_mut(user_id)?;
        user.balance -= charged;
        let balance = user.balance;

        let purchase = inner
            .purchases
            .entry(key)
            .and_modify(|purchase| purchase.count += 1)
            .or_insert_with(|| Purchase {
                user_id,
                product_id: product_id.to_string(),
                price,
                count: 1,
            });

        Ok(LedgerEntry {
            purchase: purchase.clone(),
            balance,
        })
    }

    async fn remove_purchase(
        &self,
        user_id: Uuid,
        product_id: &str,
    ) -> Result<Refund, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.user_mut(user_id)?;

        let purchase = inner
            .purchases
            .remove(&(user_id, product_id.to_string()))
            .ok_or(StoreError::NotFound("purchase"))?;
        let refunded = purchase.total();

        let user = inner.user_mut(user_id)?;
        user.balance += refunded;

        Ok(Refund {
            balance: user.balance,
            purchase,
            refunded,
        })
    }

    async fn insert_report(&self, user_id: Uuid, message: &str) -> Result<Report, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.user_mut(user_id)?;

        let report = Report {
            id: Uuid::new_v4(),
            user_id,
            message: message.to_string(),
            created_at: Utc::now(),
        };
        inner.reports.push(report.clone());
        Ok(report)
    }
}
