use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::{
    catalogue::CatalogueClient,
    error::AppError,
    middleware::AuthUser,
    store::{LedgerEntry, Purchase, Refund, Store},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyProductRequest {
    #[serde(alias = "id")]
    pub product_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PurchasesResponse {
    pub purchases: Vec<Purchase>,
}

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub purchase: Purchase,
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct RefundResponse {
    pub refunded: Decimal,
    pub balance: Decimal,
}

impl From<LedgerEntry> for PurchaseResponse {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            purchase: entry.purchase,
            balance: entry.balance,
        }
    }
}

impl From<Refund> for RefundResponse {
    fn from(refund: Refund) -> Self {
        Self {
            refunded: refund.refunded,
            balance: refund.balance,
        }
    }
}

pub async fn purchases_of(store: &dyn Store, caller: &AuthUser) -> Result<Vec<Purchase>, AppError> {
    Ok(store.list_purchases(caller.id).await?)
}

/// 账本金额保留两位小数，与数据库 NUMERIC(14,2) 的舍入方式一致
pub fn ledger_price(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// 已有购买记录 count+1，并按记录中的价格扣款
pub async fn increment(
    store: &dyn Store,
    caller: &AuthUser,
    product_id: &str,
) -> Result<LedgerEntry, AppError> {
    let entry = store.increment_purchase(caller.id, product_id).await?;

    tracing::info!(
        user_id = %caller.id,
        product_id,
        count = entry.purchase.count,
        balance = %entry.balance,
        "Purchase count incremented"
    );
    Ok(entry)
}

/// 首次购买：从目录取当前价格作为快照建立记录
pub async fn buy(
    store: &dyn Store,
    catalogue: &CatalogueClient,
    caller: &AuthUser,
    req: BuyProductRequest,
) -> Result<LedgerEntry, AppError> {
    let product_id = req
        .product_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("Product ID is required.".into()))?;

    let product = catalogue.fetch_by_id(&product_id).await?;
    let price = product
        .price
        .filter(|price| !price.is_sign_negative())
        .map(ledger_price)
        .ok_or_else(|| AppError::Validation("This product has no valid price.".into()))?;

    // 记录以请求中的 id 为键，之后的 PUT/DELETE 用同一个 id 访问
    let entry = store.open_purchase(caller.id, &product_id, price).await?;

    tracing::info!(
        user_id = %caller.id,
        product_id = %product_id,
        price = %entry.purchase.price,
        count = entry.purchase.count,
        "Product bought"
    );
    Ok(entry)
}

/// 删除整条记录，按记录中的 count × price 退款
pub async fn refund(
    store: &dyn Store,
    caller: &AuthUser,
    product_id: &str,
) -> Result<Refund, AppError> {
    let refund = store.remove_purchase(caller.id, product_id).await?;

    tracing::info!(
        user_id = %caller.id,
        product_id,
        refunded = %refund.refunded,
        balance = %refund.balance,
        "Purchase deleted and refunded"
    );
    Ok(refund)
}
