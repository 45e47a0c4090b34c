//! 按配置选择真实远端或内存远端

use crate::clients::forum_client::ForumClient;
use crate::clients::memory_api::InMemoryApi;
use crate::clients::payload::{
    ArgumentInput, OptionInput, QuestionInput, SignatureInput, TestCaseInput, TestInput,
};
use crate::clients::test_api::TestApi;
use crate::config::Config;
use crate::error::{ApiResult, ConfigError};
use crate::models::RemoteId;

/// 远端后端
pub enum ApiBackend {
    Http(ForumClient),
    /// 演练模式：所有写操作都进内存
    DryRun(InMemoryApi),
}

impl ApiBackend {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        if config.dry_run {
            return Ok(ApiBackend::DryRun(InMemoryApi::new()));
        }
        if config.api_base_url.trim().is_empty() {
            return Err(ConfigError::Missing {
                var_name: "FORUM_API_BASE_URL",
            });
        }
        Ok(ApiBackend::Http(ForumClient::new(config)?))
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, ApiBackend::DryRun(_))
    }
}

impl TestApi for ApiBackend {
    async fn create_test(&self, input: &TestInput) -> ApiResult<RemoteId> {
        match self {
            ApiBackend::Http(c) => c.create_test(input).await,
            ApiBackend::DryRun(c) => c.create_test(input).await,
        }
    }

    async fn update_test(&self, test_id: &str, input: &TestInput) -> ApiResult<RemoteId> {
        match self {
            ApiBackend::Http(c) => c.update_test(test_id, input).await,
            ApiBackend::DryRun(c) => c.update_test(test_id, input).await,
        }
    }

    async fn publish_test(&self, test_id: &str) -> ApiResult<()> {
        match self {
            ApiBackend::Http(c) => c.publish_test(test_id).await,
            ApiBackend::DryRun(c) => c.publish_test(test_id).await,
        }
    }

    async fn create_question(&self, test_id: &str, input: &QuestionInput) -> ApiResult<RemoteId> {
        match self {
            ApiBackend::Http(c) => c.create_question(test_id, input).await,
            ApiBackend::DryRun(c) => c.create_question(test_id, input).await,
        }
    }

    async fn update_question(
        &self,
        question_id: &str,
        input: &QuestionInput,
    ) -> ApiResult<RemoteId> {
        match self {
            ApiBackend::Http(c) => c.update_question(question_id, input).await,
            ApiBackend::DryRun(c) => c.update_question(question_id, input).await,
        }
    }

    async fn create_signature(
        &self,
        question_id: &str,
        input: &SignatureInput,
    ) -> ApiResult<RemoteId> {
        match self {
            ApiBackend::Http(c) => c.create_signature(question_id, input).await,
            ApiBackend::DryRun(c) => c.create_signature(question_id, input).await,
        }
    }

    async fn update_signature(
        &self,
        signature_id: &str,
        input: &SignatureInput,
    ) -> ApiResult<RemoteId> {
        match self {
            ApiBackend::Http(c) => c.update_signature(signature_id, input).await,
            ApiBackend::DryRun(c) => c.update_signature(signature_id, input).await,
        }
    }

    async fn create_test_case(
        &self,
        question_id: &str,
        input: &TestCaseInput,
    ) -> ApiResult<RemoteId> {
        match self {
            ApiBackend::Http(c) => c.create_test_case(question_id, input).await,
            ApiBackend::DryRun(c) => c.create_test_case(question_id, input).await,
        }
    }

    async fn delete_test_case(&self, test_case_id: &str) -> ApiResult<()> {
        match self {
            ApiBackend::Http(c) => c.delete_test_case(test_case_id).await,
            ApiBackend::DryRun(c) => c.delete_test_case(test_case_id).await,
        }
    }

    async fn create_argument(
        &self,
        test_case_id: &str,
        input: &ArgumentInput,
    ) -> ApiResult<RemoteId> {
        match self {
            ApiBackend::Http(c) => c.create_argument(test_case_id, input).await,
            ApiBackend::DryRun(c) => c.create_argument(test_case_id, input).await,
        }
    }

    async fn create_option(&self, question_id: &str, input: &OptionInput) -> ApiResult<RemoteId> {
        match self {
            ApiBackend::Http(c) => c.create_option(question_id, input).await,
            ApiBackend::DryRun(c) => c.create_option(question_id, input).await,
        }
    }

    async fn delete_option(&self, option_id: &str) -> ApiResult<()> {
        match self {
            ApiBackend::Http(c) => c.delete_option(option_id).await,
            ApiBackend::DryRun(c) => c.delete_option(option_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_does_not_need_base_url() {
        let config = Config {
            dry_run: true,
            api_base_url: String::new(),
            ..Config::default()
        };
        let backend = ApiBackend::from_config(&config).unwrap();
        assert!(backend.is_dry_run());
    }

    #[test]
    fn test_http_backend_requires_base_url() {
        let config = Config {
            dry_run: false,
            api_base_url: "  ".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            ApiBackend::from_config(&config),
            Err(ConfigError::Missing { .. })
        ));
    }
}
