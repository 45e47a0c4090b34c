//! 内存远端 - 用于演练模式和测试
//!
//! 行为与真实 API 的契约一致：创建返回新 id，更新/删除不存在的实体返回 404。
//! 每一次调用都会被记录，并且可以在某类调用的第 N 次注入失败

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::clients::payload::{
    ArgumentInput, OptionInput, QuestionInput, SignatureInput, TestCaseInput, TestInput,
};
use crate::clients::test_api::TestApi;
use crate::error::{ApiError, ApiResult};
use crate::models::RemoteId;

/// 远程操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ApiOp {
    CreateTest,
    UpdateTest,
    PublishTest,
    CreateQuestion,
    UpdateQuestion,
    CreateSignature,
    UpdateSignature,
    CreateTestCase,
    DeleteTestCase,
    CreateArgument,
    CreateOption,
    DeleteOption,
}

impl ApiOp {
    fn id_prefix(self) -> &'static str {
        match self {
            ApiOp::CreateTest => "test",
            ApiOp::CreateQuestion => "question",
            ApiOp::CreateSignature => "signature",
            ApiOp::CreateTestCase => "case",
            ApiOp::CreateArgument => "arg",
            ApiOp::CreateOption => "option",
            _ => "entity",
        }
    }
}

/// 一次被记录的调用
#[derive(Debug, Clone, PartialEq)]
pub struct ApiCall {
    pub op: ApiOp,
    /// 路径上的目标 id（父实体或被更新/删除的实体）
    pub target: Option<String>,
    pub payload: JsonValue,
    /// 创建成功时分配的 id
    pub result_id: Option<RemoteId>,
}

/// 远端保存的实体
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntity {
    pub op: ApiOp,
    pub parent: Option<String>,
    pub payload: JsonValue,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    calls: Vec<ApiCall>,
    counts: HashMap<ApiOp, usize>,
    failures: HashMap<(ApiOp, usize), String>,
    entities: BTreeMap<RemoteId, StoredEntity>,
    published: Vec<RemoteId>,
}

/// 内存远端
#[derive(Debug, Default)]
pub struct InMemoryApi {
    state: Mutex<State>,
}

impl InMemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// 让 `op` 的第 `nth` 次调用（从 1 开始）失败
    pub fn fail_on(&self, op: ApiOp, nth: usize, message: impl Into<String>) {
        if let Ok(mut state) = self.state.lock() {
            state.failures.insert((op, nth), message.into());
        }
    }

    /// 所有调用记录
    pub fn calls(&self) -> Vec<ApiCall> {
        self.state
            .lock()
            .map(|s| s.calls.clone())
            .unwrap_or_default()
    }

    /// 调用顺序
    pub fn ops(&self) -> Vec<ApiOp> {
        self.calls().into_iter().map(|c| c.op).collect()
    }

    pub fn count(&self, op: ApiOp) -> usize {
        self.calls().iter().filter(|c| c.op == op).count()
    }

    pub fn entity(&self, id: &str) -> Option<StoredEntity> {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.entities.get(id).cloned())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entity(id).is_some()
    }

    /// 某个父实体下仍然存在的子实体
    pub fn children_of(&self, parent: &str) -> Vec<(RemoteId, StoredEntity)> {
        self.state
            .lock()
            .map(|s| {
                s.entities
                    .iter()
                    .filter(|(_, e)| e.parent.as_deref() == Some(parent))
                    .map(|(id, e)| (id.clone(), e.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_published(&self, test_id: &str) -> bool {
        self.state
            .lock()
            .map(|s| s.published.iter().any(|id| id == test_id))
            .unwrap_or(false)
    }

    fn endpoint(op: ApiOp) -> String {
        format!("memory::{:?}", op)
    }

    /// 记录调用并检查失败注入
    fn begin(
        state: &mut State,
        op: ApiOp,
        target: Option<&str>,
        payload: JsonValue,
    ) -> ApiResult<usize> {
        let nth = {
            let count = state.counts.entry(op).or_insert(0);
            *count += 1;
            *count
        };
        state.calls.push(ApiCall {
            op,
            target: target.map(str::to_string),
            payload,
            result_id: None,
        });

        if let Some(message) = state.failures.get(&(op, nth)) {
            debug!("注入失败: {:?} 第 {} 次", op, nth);
            return Err(ApiError::bad_response(Self::endpoint(op), 500, message.clone()));
        }
        Ok(nth)
    }

    fn create<T: Serialize>(
        &self,
        op: ApiOp,
        parent: Option<&str>,
        input: &T,
    ) -> ApiResult<RemoteId> {
        let payload = serde_json::to_value(input)?;
        let mut state = self.lock()?;
        Self::begin(&mut state, op, parent, payload.clone())?;

        if let Some(parent) = parent {
            if !state.entities.contains_key(parent) {
                return Err(ApiError::bad_response(
                    Self::endpoint(op),
                    404,
                    format!("父实体 {} 不存在", parent),
                ));
            }
        }

        state.next_id += 1;
        let id = format!("{}-{}", op.id_prefix(), state.next_id);
        state.entities.insert(
            id.clone(),
            StoredEntity {
                op,
                parent: parent.map(str::to_string),
                payload,
            },
        );
        if let Some(call) = state.calls.last_mut() {
            call.result_id = Some(id.clone());
        }
        Ok(id)
    }

    fn update<T: Serialize>(&self, op: ApiOp, id: &str, input: &T) -> ApiResult<RemoteId> {
        let payload = serde_json::to_value(input)?;
        let mut state = self.lock()?;
        Self::begin(&mut state, op, Some(id), payload.clone())?;

        match state.entities.get_mut(id) {
            Some(entity) => {
                entity.payload = payload;
                Ok(id.to_string())
            }
            None => Err(Self::not_found(op, id)),
        }
    }

    /// 删除实体，子实体一并删除
    fn delete(&self, op: ApiOp, id: &str) -> ApiResult<()> {
        let mut state = self.lock()?;
        Self::begin(&mut state, op, Some(id), JsonValue::Null)?;

        if state.entities.remove(id).is_none() {
            return Err(Self::not_found(op, id));
        }
        state
            .entities
            .retain(|_, e| e.parent.as_deref() != Some(id));
        Ok(())
    }

    fn not_found(op: ApiOp, id: &str) -> ApiError {
        ApiError::bad_response(Self::endpoint(op), 404, format!("实体 {} 不存在", id))
    }

    fn lock(&self) -> ApiResult<std::sync::MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| ApiError::bad_response("memory", 500, "内存远端锁已损坏"))
    }
}

impl TestApi for InMemoryApi {
    async fn create_test(&self, input: &TestInput) -> ApiResult<RemoteId> {
        self.create(ApiOp::CreateTest, None, input)
    }

    async fn update_test(&self, test_id: &str, input: &TestInput) -> ApiResult<RemoteId> {
        self.update(ApiOp::UpdateTest, test_id, input)
    }

    async fn publish_test(&self, test_id: &str) -> ApiResult<()> {
        let mut state = self.lock()?;
        Self::begin(&mut state, ApiOp::PublishTest, Some(test_id), JsonValue::Null)?;
        if !state.entities.contains_key(test_id) {
            return Err(Self::not_found(ApiOp::PublishTest, test_id));
        }
        state.published.push(test_id.to_string());
        Ok(())
    }

    async fn create_question(&self, test_id: &str, input: &QuestionInput) -> ApiResult<RemoteId> {
        self.create(ApiOp::CreateQuestion, Some(test_id), input)
    }

    async fn update_question(
        &self,
        question_id: &str,
        input: &QuestionInput,
    ) -> ApiResult<RemoteId> {
        self.update(ApiOp::UpdateQuestion, question_id, input)
    }

    async fn create_signature(
        &self,
        question_id: &str,
        input: &SignatureInput,
    ) -> ApiResult<RemoteId> {
        self.create(ApiOp::CreateSignature, Some(question_id), input)
    }

    async fn update_signature(
        &self,
        signature_id: &str,
        input: &SignatureInput,
    ) -> ApiResult<RemoteId> {
        self.update(ApiOp::UpdateSignature, signature_id, input)
    }

    async fn create_test_case(
        &self,
        question_id: &str,
        input: &TestCaseInput,
    ) -> ApiResult<RemoteId> {
        self.create(ApiOp::CreateTestCase, Some(question_id), input)
    }

    async fn delete_test_case(&self, test_case_id: &str) -> ApiResult<()> {
        self.delete(ApiOp::DeleteTestCase, test_case_id)
    }

    async fn create_argument(
        &self,
        test_case_id: &str,
        input: &ArgumentInput,
    ) -> ApiResult<RemoteId> {
        self.create(ApiOp::CreateArgument, Some(test_case_id), input)
    }

    async fn create_option(&self, question_id: &str, input: &OptionInput) -> ApiResult<RemoteId> {
        self.create(ApiOp::CreateOption, Some(question_id), input)
    }

    async fn delete_option(&self, option_id: &str) -> ApiResult<()> {
        self.delete(ApiOp::DeleteOption, option_id)
    }
}
