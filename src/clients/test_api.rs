//! 远程 API 契约
//!
//! 每个子实体一个创建/更新/删除端点，成功返回 id，失败返回带消息的错误

use std::future::Future;

use crate::clients::payload::{
    ArgumentInput, OptionInput, QuestionInput, SignatureInput, TestCaseInput, TestInput,
};
use crate::error::ApiResult;
use crate::models::RemoteId;

/// 测试编写流程依赖的远程操作
pub trait TestApi: Send + Sync {
    fn create_test(&self, input: &TestInput) -> impl Future<Output = ApiResult<RemoteId>> + Send;

    fn update_test(
        &self,
        test_id: &str,
        input: &TestInput,
    ) -> impl Future<Output = ApiResult<RemoteId>> + Send;

    /// 最终确认（发布）测试
    fn publish_test(&self, test_id: &str) -> impl Future<Output = ApiResult<()>> + Send;

    fn create_question(
        &self,
        test_id: &str,
        input: &QuestionInput,
    ) -> impl Future<Output = ApiResult<RemoteId>> + Send;

    fn update_question(
        &self,
        question_id: &str,
        input: &QuestionInput,
    ) -> impl Future<Output = ApiResult<RemoteId>> + Send;

    fn create_signature(
        &self,
        question_id: &str,
        input: &SignatureInput,
    ) -> impl Future<Output = ApiResult<RemoteId>> + Send;

    fn update_signature(
        &self,
        signature_id: &str,
        input: &SignatureInput,
    ) -> impl Future<Output = ApiResult<RemoteId>> + Send;

    fn create_test_case(
        &self,
        question_id: &str,
        input: &TestCaseInput,
    ) -> impl Future<Output = ApiResult<RemoteId>> + Send;

    fn delete_test_case(&self, test_case_id: &str) -> impl Future<Output = ApiResult<()>> + Send;

    fn create_argument(
        &self,
        test_case_id: &str,
        input: &ArgumentInput,
    ) -> impl Future<Output = ApiResult<RemoteId>> + Send;

    fn create_option(
        &self,
        question_id: &str,
        input: &OptionInput,
    ) -> impl Future<Output = ApiResult<RemoteId>> + Send;

    fn delete_option(&self, option_id: &str) -> impl Future<Output = ApiResult<()>> + Send;
}
