//! HTTP 执行器 - 基础设施层
//!
//! 持有唯一的 HTTP 客户端，只暴露"发请求、拿 JSON"的能力

use std::time::Duration;

use reqwest::{Client, Method, StatusCode, Url};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult, ConfigError};

/// HTTP 执行器
///
/// 职责：
/// - 持有 reqwest Client、API 根地址和令牌
/// - 把非 2xx 响应统一转换为带消息的 `ApiError`
/// - 不认识 Test / Question
pub struct HttpExecutor {
    client: Client,
    base_url: String,
    base: Url,
    token: String,
}

impl HttpExecutor {
    /// 创建新的 HTTP 执行器
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        let base = Url::parse(&base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: base_url.clone(),
            message: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl {
                url: base_url,
                message: "不能作为根地址".to_string(),
            });
        }

        Ok(Self {
            client,
            base_url,
            base,
            token: token.into(),
        })
    }

    /// 把路径段逐个编码后拼到根地址之后，段内的 `/`、`?` 等都会被转义
    pub fn url_for(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // 构造时已排除 cannot-be-a-base 的地址
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 发送请求并返回 JSON 结果
    ///
    /// # 参数
    /// - `method`: HTTP 方法
    /// - `segments`: 根地址之后的路径段，每段单独编码
    /// - `body`: 请求体（可选）
    ///
    /// # 返回
    /// 成功时返回响应 JSON，空响应体返回 `Null`
    pub async fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&JsonValue>,
    ) -> ApiResult<JsonValue> {
        let path = endpoint(segments);
        let url = self.url_for(segments);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method, url);
        if !self.token.is_empty() {
            request = request.bearer_auth(&self.token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!("请求失败 {}: {}", path, e);
            ApiError::RequestFailed {
                endpoint: path.clone(),
                source: Box::new(e),
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| ApiError::RequestFailed {
            endpoint: path.clone(),
            source: Box::new(e),
        })?;

        if !status.is_success() {
            let message = extract_error_message(status, &text);
            warn!("API 返回错误 {} ({}): {}", path, status.as_u16(), message);
            return Err(ApiError::bad_response(path.as_str(), status.as_u16(), message));
        }

        if text.trim().is_empty() {
            return Ok(JsonValue::Null);
        }

        Ok(serde_json::from_str(&text)?)
    }
}

/// 日志和错误里使用的端点名，如 `/tests/T1/questions`
pub fn endpoint(segments: &[&str]) -> String {
    format!("/{}", segments.join("/"))
}

/// 从错误响应中提取人类可读的消息
///
/// 依次尝试 `message`、`error` 字段，其次是原始响应体，最后是状态码描述
pub fn extract_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<JsonValue>(body) {
        for field in ["message", "error"] {
            if let Some(msg) = value.get(field).and_then(|v| v.as_str()) {
                if !msg.trim().is_empty() {
                    return msg.to_string();
                }
            }
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

/// 从成功响应中提取 `id`，数字 id 统一转为字符串
pub fn extract_id(endpoint: &str, value: &JsonValue) -> ApiResult<String> {
    match value.get("id") {
        Some(JsonValue::String(id)) if !id.is_empty() => Ok(id.clone()),
        Some(JsonValue::Number(id)) => Ok(id.to_string()),
        _ => Err(ApiError::MissingId {
            endpoint: endpoint.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_error_message_prefers_message_field() {
        let body = r#"{"message":"标题过长","error":"bad"}"#;
        assert_eq!(
            extract_error_message(StatusCode::UNPROCESSABLE_ENTITY, body),
            "标题过长"
        );
    }

    #[test]
    fn test_extract_error_message_falls_back() {
        assert_eq!(
            extract_error_message(StatusCode::BAD_REQUEST, r#"{"error":"bad"}"#),
            "bad"
        );
        assert_eq!(
            extract_error_message(StatusCode::BAD_GATEWAY, "upstream down"),
            "upstream down"
        );
        assert_eq!(
            extract_error_message(StatusCode::NOT_FOUND, ""),
            "Not Found"
        );
    }

    #[test]
    fn test_extract_id_accepts_string_and_number() {
        assert_eq!(extract_id("/tests", &json!({"id": "T1"})).unwrap(), "T1");
        assert_eq!(extract_id("/tests", &json!({"id": 42})).unwrap(), "42");
        assert!(matches!(
            extract_id("/tests", &json!({"ok": true})),
            Err(ApiError::MissingId { .. })
        ));
        assert!(extract_id("/tests", &json!({"id": ""})).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let executor =
            HttpExecutor::new("http://localhost:8080/api/", "", Duration::from_secs(1)).unwrap();
        assert_eq!(executor.base_url(), "http://localhost:8080/api");
    }

    #[test]
    fn test_url_for_encodes_each_segment() {
        let executor =
            HttpExecutor::new("http://localhost:8080/api/", "", Duration::from_secs(1)).unwrap();

        assert_eq!(
            executor.url_for(&["tests", "T1", "questions"]).as_str(),
            "http://localhost:8080/api/tests/T1/questions"
        );
        assert_eq!(
            executor.url_for(&["test-cases", "a/b?c#d"]).as_str(),
            "http://localhost:8080/api/test-cases/a%2Fb%3Fc%23d"
        );
        assert_eq!(endpoint(&["options", "O1"]), "/options/O1");
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(matches!(
            HttpExecutor::new("not a url", "", Duration::from_secs(1)),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            HttpExecutor::new("mailto:ops@example.com", "", Duration::from_secs(1)),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }
}
