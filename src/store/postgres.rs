use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{LedgerEntry, NewUser, Purchase, Refund, Report, Store, StoreError, User};

const USER_COLUMNS: &str = "id, name, email, age, password_hash, balance, created_at";
const PURCHASE_COLUMNS: &str = "user_id, product_id, price, count";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn map_unique_violation(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
        _ => StoreError::Database(err),
    }
}

/// 锁定用户行，同一用户的账本操作在数据库层串行化
async fn lock_balance(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> Result<Decimal, StoreError> {
    sqlx::query_scalar::<_, Decimal>("SELECT balance FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StoreError::NotFound("user"))
}

async fn lock_purchase(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    product_id: &str,
) -> Result<Option<Purchase>, StoreError> {
    let purchase = sqlx::query_as::<_, Purchase>(&format!(
        "SELECT {PURCHASE_COLUMNS} FROM purchases \
         WHERE user_id = $1 AND product_id = $2 FOR UPDATE"
    ))
    .bind(user_id)
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(purchase)
}

async fn set_balance(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    balance: Decimal,
) -> Result<(), StoreError> {
    sqlx::query("UPDATE users SET balance = $2 WHERE id = $1")
        .bind(user_id)
        .bind(balance)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn bump_count(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    product_id: &str,
) -> Result<Purchase, StoreError> {
    let purchase = sqlx::query_as::<_, Purchase>(&format!(
        "UPDATE purchases SET count = count + 1 \
         WHERE user_id = $1 AND product_id = $2 \
         RETURNING {PURCHASE_COLUMNS}"
    ))
    .bind(user_id)
    .bind(product_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(purchase)
}

fn debit(balance: Decimal, price: Decimal) -> Result<Decimal, StoreError> {
    if balance < price {
        return Err(StoreError::InsufficientBalance);
    }
    Ok(balance - price)
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, name, email, age, password_hash, balance) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.age)
        .bind(&user.password_hash)
        .bind(user.balance)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: &str,
        email: &str,
    ) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET name = $2, email = $3 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique_violation)?
        .ok_or(StoreError::NotFound("user"))
    }

    async fn list_purchases(&self, user_id: Uuid) -> Result<Vec<Purchase>, StoreError> {
        let purchases = sqlx::query_as::<_, Purchase>(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE user_id = $1 ORDER BY product_id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(purchases)
    }

    async fn increment_purchase(
        &self,
        user_id: Uuid,
        product_id: &str,
    ) -> Result<LedgerEntry, StoreError> {
        let mut tx = self.pool.begin().await?;

        let balance = lock_balance(&mut tx, user_id).await?;
        let anchor = lock_purchase(&mut tx, user_id, product_id)
            .await?
            .ok_or(StoreError::NotFound("purchase"))?;

        let balance = debit(balance, anchor.price)?;
        set_balance(&mut tx, user_id, balance).await?;
        let purchase = bump_count(&mut tx, user_id, product_id).await?;

        tx.commit().await?;
        Ok(LedgerEntry { purchase, balance })
    }

    async fn open_purchase(
        &self,
        user_id: Uuid,
        product_id: &str,
        price: Decimal,
    ) -> Result<LedgerEntry, StoreError> {
        let mut tx = self.pool.begin().await?;

        let balance = lock_balance(&mut tx, user_id).await?;
        let existing = lock_purchase(&mut tx, user_id, product_id).await?;
        let charged = existing.as_ref().map_or(price, |purchase| purchase.price);

        let balance = debit(balance, charged)?;
        set_balance(&mut tx, user_id, balance).await?;

        let purchase = match existing {
            Some(_) => bump_count(&mut tx, user_id, product_id).await?,
            None => {
                sqlx::query_as::<_, Purchase>(&format!(
                    "INSERT INTO purchases (user_id, product_id, price, count) \
                     VALUES ($1, $2, $3, 1) \
                     RETURNING {PURCHASE_COLUMNS}"
                ))
                .bind(user_id)
                .bind(product_id)
                .bind(price)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        Ok(LedgerEntry { purchase, balance })
    }

    async fn remove_purchase(
        &self,
        user_id: Uuid,
        product_id: &str,
    ) -> Result<Refund, StoreError> {
        let mut tx = self.pool.begin().await?;

        let balance = lock_balance(&mut tx, user_id).await?;
        let purchase = sqlx::query_as::<_, Purchase>(&format!(
            "DELETE FROM purchases WHERE user_id = $1 AND product_id = $2 \
             RETURNING {PURCHASE_COLUMNS}"
        ))
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound("purchase"))?;

        let refunded = purchase.total();
        let balance = balance + refunded;
        set_balance(&mut tx, user_id, balance).await?;

        tx.commit().await?;
        Ok(Refund {
            purchase,
            refunded,
            balance,
        })
    }

    async fn insert_report(&self, user_id: Uuid, message: &str) -> Result<Report, StoreError> {
        let report = sqlx::query_as::<_, Report>(
            "INSERT INTO reports (id, user_id, message) VALUES ($1, $2, $3) \
             RETURNING id, user_id, message, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(message)
        .fetch_one(&self.pool)
        .await?;

        Ok(report)
    }
}
