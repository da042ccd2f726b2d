use serde::Serialize;

/// 通用的API响应结构，调用方根据 `success` 判断结果
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub payload: T,
}

/// 空响应类型（用于无响应数据的API）
#[derive(Debug, Default, Serialize)]
pub struct EmptyResponse {}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, payload: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            payload,
        }
    }
}

impl ApiResponse<EmptyResponse> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            payload: EmptyResponse {},
        }
    }
}
