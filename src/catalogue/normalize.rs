//! 上游商品数据的规范化
//!
//! 上游返回的结构并不统一：可能是裸数组，也可能是 `{products: [...]}`，
//! 字段名也有多个历史别名。这里按顺序尝试别名，统一转换成 [`Product`]。

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};

use super::CatalogueError;

pub const ID_FIELDS: &[&str] = &["id", "_id"];
const NAME_FIELDS: &[&str] = &["name", "title"];
const DESCRIPTION_FIELDS: &[&str] = &["dsc", "description", "desc"];
const PRICE_FIELDS: &[&str] = &["price", "cost"];
const IMAGE_FIELDS: &[&str] = &["img", "image", "thumbnail"];
const RATING_FIELDS: &[&str] = &["rate", "rating"];
const REVIEW_FIELDS: &[&str] = &["reviews", "reviewCount"];
const COUNTRY_FIELDS: &[&str] = &["country"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "dsc")]
    pub description: Option<String>,
    pub price: Option<Decimal>,
    #[serde(rename = "img")]
    pub image: Option<String>,
    #[serde(rename = "rate")]
    pub rating: Option<f64>,
    pub reviews: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// 取出商品条目，接受裸数组或 `{products: [...]}`
pub fn items(body: Value) -> Result<Vec<Value>, CatalogueError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut envelope) => match envelope.remove("products") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(CatalogueError::Malformed(
                "object response without a products array".into(),
            )),
        },
        other => Err(CatalogueError::Malformed(format!(
            "unexpected {} response",
            kind(&other)
        ))),
    }
}

/// 任意一个ID别名与 `id` 相同即匹配
pub fn matches_id(item: &Value, id: &str) -> bool {
    let Some(fields) = item.as_object() else {
        return false;
    };
    ID_FIELDS
        .iter()
        .filter_map(|field| fields.get(*field))
        .filter_map(text)
        .any(|candidate| candidate == id)
}

impl Product {
    /// 没有ID的条目无法被引用，返回 None
    pub fn from_value(item: &Value) -> Option<Self> {
        let fields = item.as_object()?;
        let id = first(fields, ID_FIELDS, text)?;

        Some(Product {
            id,
            name: first(fields, NAME_FIELDS, text),
            description: first(fields, DESCRIPTION_FIELDS, text),
            price: first(fields, PRICE_FIELDS, decimal),
            image: first(fields, IMAGE_FIELDS, text),
            rating: first(fields, RATING_FIELDS, float),
            reviews: first(fields, REVIEW_FIELDS, count).unwrap_or(0),
            country: first(fields, COUNTRY_FIELDS, text),
        })
    }
}

pub fn products(items: &[Value]) -> Vec<Product> {
    items
        .iter()
        .filter_map(|item| {
            let product = Product::from_value(item);
            if product.is_none() {
                tracing::debug!(item = %item, "Skipping catalogue entry without an id");
            }
            product
        })
        .collect()
}

/// 按别名顺序取第一个存在且非 null 的字段
fn first<T>(
    fields: &Map<String, Value>,
    aliases: &[&str],
    convert: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    aliases
        .iter()
        .filter_map(|alias| fields.get(*alias))
        .find(|value| !value.is_null())
        .and_then(convert)
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn decimal(value: &Value) -> Option<Decimal> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .ok()
}

fn float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|f: &f64| f.is_finite())
}

fn count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
