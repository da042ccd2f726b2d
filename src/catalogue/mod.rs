//! 第三方商品目录网关（只读）

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

mod normalize;

pub use normalize::Product;

#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("catalogue request timed out")]
    Timeout,
    #[error("catalogue unavailable: {0}")]
    Unavailable(String),
    #[error("malformed catalogue response: {0}")]
    Malformed(String),
    #[error("catalogue is empty")]
    Empty,
    #[error("product {0} not found")]
    NotFound(String),
    #[error("failed to build catalogue client: {0}")]
    Client(reqwest::Error),
}

impl From<reqwest::Error> for CatalogueError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CatalogueError::Timeout
        } else if err.is_decode() {
            CatalogueError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            CatalogueError::Unavailable(format!("upstream returned {status}"))
        } else {
            CatalogueError::Unavailable(err.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct CatalogueClient {
    http: reqwest::Client,
    url: String,
}

impl CatalogueClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, CatalogueError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(CatalogueError::Client)?;

        Ok(Self {
            http,
            url: url.into(),
        })
    }

    async fn fetch_items(&self) -> Result<Vec<Value>, CatalogueError> {
        let body: Value = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        normalize::items(body)
    }

    /// 拉取完整商品列表，列表为空时返回 `Empty`
    pub async fn fetch_listing(&self) -> Result<Vec<Product>, CatalogueError> {
        let items = self.fetch_items().await?;
        let products = normalize::products(&items);
        if products.is_empty() {
            return Err(CatalogueError::Empty);
        }

        tracing::debug!(count = products.len(), "Fetched catalogue listing");
        Ok(products)
    }

    /// 上游没有单品接口，拉取完整列表后线性查找
    pub async fn fetch_by_id(&self, id: &str) -> Result<Product, CatalogueError> {
        let items = self.fetch_items().await?;

        items
            .iter()
            .find(|item| normalize::matches_id(item, id))
            .and_then(Product::from_value)
            .ok_or_else(|| CatalogueError::NotFound(id.to_string()))
    }
}
