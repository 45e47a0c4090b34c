/// 论坛 API 客户端
///
/// 封装所有与测试/题目相关的远程调用
use reqwest::Method;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::debug;

use crate::clients::payload::{
    ArgumentInput, OptionInput, QuestionInput, SignatureInput, TestCaseInput, TestInput,
};
use crate::clients::test_api::TestApi;
use crate::config::Config;
use crate::error::{ApiResult, ConfigError};
use crate::infrastructure::http_executor::{endpoint, extract_id, HttpExecutor};
use crate::models::RemoteId;

/// 论坛 API 客户端
pub struct ForumClient {
    executor: HttpExecutor,
}

impl ForumClient {
    /// 创建新的论坛客户端
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let executor = HttpExecutor::new(
            &config.api_base_url,
            &config.api_token,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(Self { executor })
    }

    pub fn with_executor(executor: HttpExecutor) -> Self {
        Self { executor }
    }

    /// 发送创建/更新请求并提取返回的 id
    async fn send_for_id<T: Serialize>(
        &self,
        method: Method,
        segments: &[&str],
        payload: &T,
    ) -> ApiResult<RemoteId> {
        let body = serde_json::to_value(payload)?;
        let path = endpoint(segments);
        debug!("请求 {} {} Payload: {}", method, path, body);
        let result = self.executor.send(method, segments, Some(&body)).await?;
        extract_id(&path, &result)
    }

    /// 发送无需返回 id 的请求
    async fn send_unit(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&JsonValue>,
    ) -> ApiResult<()> {
        self.executor.send(method, segments, body).await?;
        Ok(())
    }
}

impl TestApi for ForumClient {
    async fn create_test(&self, input: &TestInput) -> ApiResult<RemoteId> {
        self.send_for_id(Method::POST, &["tests"], input).await
    }

    async fn update_test(&self, test_id: &str, input: &TestInput) -> ApiResult<RemoteId> {
        self.send_for_id(Method::PUT, &["tests", test_id], input)
            .await
    }

    async fn publish_test(&self, test_id: &str) -> ApiResult<()> {
        let body = serde_json::json!({});
        self.send_unit(
            Method::POST,
            &["tests", test_id, "publish"],
            Some(&body),
        )
        .await
    }

    async fn create_question(&self, test_id: &str, input: &QuestionInput) -> ApiResult<RemoteId> {
        self.send_for_id(
            Method::POST,
            &["tests", test_id, "questions"],
            input,
        )
        .await
    }

    async fn update_question(
        &self,
        question_id: &str,
        input: &QuestionInput,
    ) -> ApiResult<RemoteId> {
        self.send_for_id(Method::PUT, &["questions", question_id], input)
            .await
    }

    async fn create_signature(
        &self,
        question_id: &str,
        input: &SignatureInput,
    ) -> ApiResult<RemoteId> {
        self.send_for_id(
            Method::POST,
            &["questions", question_id, "signatures"],
            input,
        )
        .await
    }

    async fn update_signature(
        &self,
        signature_id: &str,
        input: &SignatureInput,
    ) -> ApiResult<RemoteId> {
        self.send_for_id(Method::PUT, &["signatures", signature_id], input)
            .await
    }

    async fn create_test_case(
        &self,
        question_id: &str,
        input: &TestCaseInput,
    ) -> ApiResult<RemoteId> {
        self.send_for_id(
            Method::POST,
            &["questions", question_id, "test-cases"],
            input,
        )
        .await
    }

    async fn delete_test_case(&self, test_case_id: &str) -> ApiResult<()> {
        self.send_unit(
            Method::DELETE,
            &["test-cases", test_case_id],
            None,
        )
        .await
    }

    async fn create_argument(
        &self,
        test_case_id: &str,
        input: &ArgumentInput,
    ) -> ApiResult<RemoteId> {
        self.send_for_id(
            Method::POST,
            &["test-cases", test_case_id, "arguments"],
            input,
        )
        .await
    }

    async fn create_option(&self, question_id: &str, input: &OptionInput) -> ApiResult<RemoteId> {
        self.send_for_id(
            Method::POST,
            &["questions", question_id, "options"],
            input,
        )
        .await
    }

    async fn delete_option(&self, option_id: &str) -> ApiResult<()> {
        self.send_unit(Method::DELETE, &["options", option_id], None)
            .await
    }
}
