//! 编程题构建器 - 业务能力层
//!
//! 持有一道编程题的内存草稿，并按固定顺序把它物化到远端：
//! Question → Signature → 每个 TestCase → 该用例的每个 Argument。
//! 任何一步失败都会中止后续步骤，已提交的步骤不回滚

use std::fmt::Write as _;

use tracing::{debug, error, info};

use crate::clients::{ArgumentInput, QuestionInput, SignatureInput, TestApi, TestCaseInput};
use crate::error::{AppError, AppResult, MaterializeError, ValidationError};
use crate::models::{Argument, CodeQuestion, QuestionKind, RemoteId, Signature, TestCase};
use crate::services::materialize::{EntityKind, StepOutcome, StepRecorder};
use crate::services::question_form::{is_blank, QuestionForm};
use crate::workflow::QuestionCtx;

/// 测试用例草稿
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestCaseDraft {
    pub expected_output: String,
    /// 长度始终等于构建器的 `argument_count`
    pub arguments: Vec<String>,
}

impl TestCaseDraft {
    fn blank(argument_count: usize) -> Self {
        Self {
            expected_output: String::new(),
            arguments: vec![String::new(); argument_count],
        }
    }
}

/// 编辑已物化题目时需要的远端 id
#[derive(Debug, Clone, PartialEq, Eq)]
struct ExistingCode {
    question_id: RemoteId,
    signature_id: Option<RemoteId>,
    test_case_ids: Vec<RemoteId>,
}

impl ExistingCode {
    fn of(question: &CodeQuestion) -> Self {
        Self {
            question_id: question.id.clone(),
            signature_id: Some(question.signature.id.clone()),
            test_case_ids: question.test_cases.iter().map(|tc| tc.id.clone()).collect(),
        }
    }
}

/// 编程题构建器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeQuestionBuilder {
    form: QuestionForm,
    signature: String,
    argument_count: usize,
    test_cases: Vec<TestCaseDraft>,
    existing: Option<ExistingCode>,
}

impl Default for CodeQuestionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeQuestionBuilder {
    /// 空白草稿：0 个参数、1 个空测试用例
    pub fn new() -> Self {
        Self {
            form: QuestionForm::new(),
            signature: String::new(),
            argument_count: 0,
            test_cases: vec![TestCaseDraft::blank(0)],
            existing: None,
        }
    }

    /// 从已物化题目载入草稿，进入编辑模式
    pub fn from_question(question: &CodeQuestion) -> Self {
        let argument_count = question.signature.argument_count;
        let mut test_cases: Vec<TestCaseDraft> = question
            .test_cases
            .iter()
            .map(|tc| {
                let mut arguments: Vec<String> = question
                    .arguments_for(&tc.id)
                    .into_iter()
                    .map(|a| a.value.clone())
                    .collect();
                arguments.resize(argument_count, String::new());
                TestCaseDraft {
                    expected_output: tc.expected_output.clone(),
                    arguments,
                }
            })
            .collect();
        if test_cases.is_empty() {
            test_cases.push(TestCaseDraft::blank(argument_count));
        }

        Self {
            form: QuestionForm::with_body(question.body.clone()),
            signature: question.signature.value.clone(),
            argument_count,
            test_cases,
            existing: Some(ExistingCode::of(question)),
        }
    }

    // ========== 草稿编辑 ==========

    pub fn body(&self) -> &str {
        self.form.body()
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.form.set_body(body);
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn set_signature(&mut self, signature: impl Into<String>) {
        self.signature = signature.into();
    }

    pub fn argument_count(&self) -> usize {
        self.argument_count
    }

    /// 修改参数个数，所有测试用例的参数同步补空或截断，截掉的值直接丢弃
    pub fn set_argument_count(&mut self, argument_count: usize) {
        self.argument_count = argument_count;
        for case in &mut self.test_cases {
            case.arguments.resize(argument_count, String::new());
        }
    }

    pub fn test_cases(&self) -> &[TestCaseDraft] {
        &self.test_cases
    }

    /// 追加一个空测试用例，返回其索引
    pub fn add_test_case(&mut self) -> usize {
        self.test_cases.push(TestCaseDraft::blank(self.argument_count));
        self.test_cases.len() - 1
    }

    /// 移除测试用例；只剩 1 个或索引越界时不做任何事
    pub fn remove_test_case(&mut self, index: usize) -> Option<TestCaseDraft> {
        if self.test_cases.len() <= 1 || index >= self.test_cases.len() {
            return None;
        }
        Some(self.test_cases.remove(index))
    }

    pub fn set_expected_output(
        &mut self,
        case: usize,
        expected_output: impl Into<String>,
    ) -> Result<(), ValidationError> {
        let len = self.test_cases.len();
        let draft = self
            .test_cases
            .get_mut(case)
            .ok_or(ValidationError::IndexOutOfRange { index: case, len })?;
        draft.expected_output = expected_output.into();
        Ok(())
    }

    pub fn set_argument(
        &mut self,
        case: usize,
        argument: usize,
        value: impl Into<String>,
    ) -> Result<(), ValidationError> {
        let len = self.test_cases.len();
        let draft = self
            .test_cases
            .get_mut(case)
            .ok_or(ValidationError::IndexOutOfRange { index: case, len })?;
        let arg_len = draft.arguments.len();
        let slot = draft
            .arguments
            .get_mut(argument)
            .ok_or(ValidationError::IndexOutOfRange {
                index: argument,
                len: arg_len,
            })?;
        *slot = value.into();
        Ok(())
    }

    /// 一次性填写一个测试用例的期望输出和全部参数
    pub fn fill_test_case(
        &mut self,
        case: usize,
        expected_output: impl Into<String>,
        arguments: &[String],
    ) -> Result<(), ValidationError> {
        self.set_expected_output(case, expected_output)?;
        for (i, value) in arguments.iter().enumerate() {
            self.set_argument(case, i, value.clone())?;
        }
        Ok(())
    }

    pub fn is_editing(&self) -> bool {
        self.existing.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.form.error()
    }

    pub fn dismiss_error(&mut self) {
        self.form.dismiss_error();
    }

    // ========== 校验 ==========

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.form.validate_body()?;
        if is_blank(&self.signature) {
            return Err(ValidationError::EmptySignature);
        }
        if self.test_cases.is_empty() {
            return Err(ValidationError::NoTestCases);
        }
        for (i, case) in self.test_cases.iter().enumerate() {
            let case_no = i + 1;
            if is_blank(&case.expected_output) {
                return Err(ValidationError::EmptyExpectedOutput { case: case_no });
            }
            if case.arguments.len() != self.argument_count {
                return Err(ValidationError::ArgumentShape {
                    case: case_no,
                    expected: self.argument_count,
                    actual: case.arguments.len(),
                });
            }
            if let Some(j) = case.arguments.iter().position(|a| is_blank(a)) {
                return Err(ValidationError::EmptyArgument {
                    case: case_no,
                    argument: j + 1,
                });
            }
        }
        Ok(())
    }

    /// 是否允许提交
    pub fn can_submit(&self) -> bool {
        self.validate().is_ok()
    }

    // ========== 物化 ==========

    /// 把草稿物化到远端
    ///
    /// 新题：依次创建全部子实体。
    /// 编辑：原地更新 Question 和 Signature（没有则创建），删除全部旧测试用例后按草稿重建
    pub async fn materialize<A: TestApi>(
        &mut self,
        api: &A,
        ctx: &QuestionCtx,
    ) -> AppResult<CodeQuestion> {
        self.validate()?;

        let result = match self.existing.clone() {
            None => self.create_all(api, ctx).await,
            Some(existing) => self.replace_all(api, ctx, &existing).await,
        };

        match result {
            Ok(question) => {
                info!(
                    "{} ✓ 编程题物化完成: {} 个用例, {} 个参数",
                    ctx,
                    question.test_cases.len(),
                    question.arguments.len()
                );
                self.form.clear_error();
                self.existing = Some(ExistingCode::of(&question));
                Ok(question)
            }
            Err(e) => {
                error!(
                    "{} ❌ 编程题物化失败于 {}: {} (已提交: {})",
                    ctx, e.failed_step, e.source, e.committed
                );
                self.sync_existing(&e);
                let err = AppError::from(e);
                self.form.report(&err);
                Err(err)
            }
        }
    }

    async fn create_all<A: TestApi>(
        &self,
        api: &A,
        ctx: &QuestionCtx,
    ) -> Result<CodeQuestion, MaterializeError> {
        info!("{} 📤 正在创建编程题...", ctx);
        let mut rec = StepRecorder::new();

        let question_id = rec.created(
            EntityKind::Question,
            api.create_question(&ctx.test_id, &self.question_input())
                .await,
        )?;
        let signature_id = rec.created(
            EntityKind::Signature,
            api.create_signature(&question_id, &self.signature_input())
                .await,
        )?;
        let (test_cases, arguments) = self
            .create_test_cases(api, ctx, &question_id, &mut rec)
            .await?;

        Ok(self.assemble(question_id, signature_id, test_cases, arguments))
    }

    async fn replace_all<A: TestApi>(
        &self,
        api: &A,
        ctx: &QuestionCtx,
        existing: &ExistingCode,
    ) -> Result<CodeQuestion, MaterializeError> {
        info!("{} 📝 正在更新编程题 {}...", ctx, existing.question_id);
        let mut rec = StepRecorder::new();

        let question_id = rec.updated(
            EntityKind::Question,
            api.update_question(&existing.question_id, &self.question_input())
                .await,
        )?;
        let signature_id = match &existing.signature_id {
            Some(id) => rec.updated(
                EntityKind::Signature,
                api.update_signature(id, &self.signature_input()).await,
            )?,
            None => rec.created(
                EntityKind::Signature,
                api.create_signature(&question_id, &self.signature_input())
                    .await,
            )?,
        };

        for id in &existing.test_case_ids {
            debug!("{} 删除旧测试用例 {}", ctx, id);
            rec.deleted(EntityKind::TestCase, id, api.delete_test_case(id).await)?;
        }

        let (test_cases, arguments) = self
            .create_test_cases(api, ctx, &question_id, &mut rec)
            .await?;

        Ok(self.assemble(question_id, signature_id, test_cases, arguments))
    }

    async fn create_test_cases<A: TestApi>(
        &self,
        api: &A,
        ctx: &QuestionCtx,
        question_id: &str,
        rec: &mut StepRecorder,
    ) -> Result<(Vec<TestCase>, Vec<Argument>), MaterializeError> {
        let mut test_cases = Vec::with_capacity(self.test_cases.len());
        let mut arguments = Vec::with_capacity(self.test_cases.len() * self.argument_count);

        for (i, case) in self.test_cases.iter().enumerate() {
            debug!("{} 创建测试用例 {}/{}", ctx, i + 1, self.test_cases.len());
            let test_case_id = rec.created(
                EntityKind::TestCase,
                api.create_test_case(
                    question_id,
                    &TestCaseInput {
                        expected_output: case.expected_output.clone(),
                    },
                )
                .await,
            )?;

            for (index, value) in case.arguments.iter().take(self.argument_count).enumerate() {
                let order = index + 1;
                let argument_id = rec.created(
                    EntityKind::Argument,
                    api.create_argument(
                        &test_case_id,
                        &ArgumentInput {
                            value: value.clone(),
                            order,
                        },
                    )
                    .await,
                )?;
                arguments.push(Argument {
                    id: argument_id,
                    test_case_id: test_case_id.clone(),
                    order,
                    value: value.clone(),
                });
            }

            test_cases.push(TestCase {
                id: test_case_id,
                expected_output: case.expected_output.clone(),
            });
        }

        Ok((test_cases, arguments))
    }

    /// 编辑失败时，已删除的旧用例不再参与下一次重试；
    /// 已新建的用例和签名记入编辑状态，下一次重试照常删除或更新
    fn sync_existing(&mut self, err: &MaterializeError) {
        let Some(existing) = &mut self.existing else {
            return;
        };
        for step in err.committed.steps() {
            match (step.outcome, step.kind) {
                (StepOutcome::Deleted, EntityKind::TestCase) => {
                    existing.test_case_ids.retain(|id| id != &step.id);
                }
                (StepOutcome::Created, EntityKind::TestCase) => {
                    existing.test_case_ids.push(step.id.clone());
                }
                (StepOutcome::Created, EntityKind::Signature) => {
                    existing.signature_id = Some(step.id.clone());
                }
                _ => {}
            }
        }
    }

    fn question_input(&self) -> QuestionInput {
        QuestionInput {
            body: self.form.body().to_string(),
            question_type_id: QuestionKind::Code.type_id(),
        }
    }

    fn signature_input(&self) -> SignatureInput {
        SignatureInput {
            value: self.signature.clone(),
            argument_count: self.argument_count,
        }
    }

    fn assemble(
        &self,
        question_id: RemoteId,
        signature_id: RemoteId,
        test_cases: Vec<TestCase>,
        arguments: Vec<Argument>,
    ) -> CodeQuestion {
        CodeQuestion {
            id: question_id,
            body: self.form.body().to_string(),
            signature: Signature {
                id: signature_id,
                value: self.signature.clone(),
                argument_count: self.argument_count,
            },
            test_cases,
            arguments,
        }
    }

    // ========== 渲染 ==========

    /// 渲染编辑表单
    pub fn render_form(&self) -> String {
        let mut out = String::new();
        self.form
            .render_header(QuestionKind::Code, self.is_editing(), &mut out);
        let _ = writeln!(
            out,
            "签名: {} ({} 个参数)",
            if is_blank(&self.signature) { "(未填写)" } else { self.signature.as_str() },
            self.argument_count
        );
        for (i, case) in self.test_cases.iter().enumerate() {
            let _ = writeln!(
                out,
                "  用例 #{}: ({}) => {}",
                i + 1,
                case.arguments.join(", "),
                case.expected_output
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{ApiOp, InMemoryApi, TestInput};

    fn ctx(test_id: &str) -> QuestionCtx {
        QuestionCtx::new("algo101".to_string(), test_id.to_string(), 1)
    }

    async fn api_with_test() -> (InMemoryApi, String) {
        let api = InMemoryApi::new();
        let test_id = api
            .create_test(&TestInput {
                title: "小测".to_string(),
                description: String::new(),
                community_id: "algo101".to_string(),
            })
            .await
            .unwrap();
        (api, test_id)
    }

    fn add_builder() -> CodeQuestionBuilder {
        let mut builder = CodeQuestionBuilder::new();
        builder.set_body("实现两数相加");
        builder.set_signature("add");
        builder.set_argument_count(2);
        builder
            .fill_test_case(0, "8", &["3".to_string(), "5".to_string()])
            .unwrap();
        builder
    }

    #[test]
    fn test_new_builder_has_one_test_case_and_no_arguments() {
        let builder = CodeQuestionBuilder::new();
        assert_eq!(builder.test_cases().len(), 1);
        assert_eq!(builder.argument_count(), 0);
        assert!(!builder.can_submit());
        assert!(!builder.is_editing());
    }

    #[test]
    fn test_remove_test_case_respects_floor() {
        let mut builder = CodeQuestionBuilder::new();
        assert!(builder.remove_test_case(0).is_none());

        let idx = builder.add_test_case();
        assert_eq!(idx, 1);
        assert!(builder.remove_test_case(5).is_none());
        assert!(builder.remove_test_case(1).is_some());
        assert_eq!(builder.test_cases().len(), 1);
    }

    #[test]
    fn test_argument_count_reshapes_every_test_case() {
        let mut builder = add_builder();
        builder.add_test_case();
        builder
            .fill_test_case(1, "3", &["1".to_string(), "2".to_string()])
            .unwrap();

        builder.set_argument_count(3);
        assert!(builder.test_cases().iter().all(|c| c.arguments.len() == 3));
        assert_eq!(builder.test_cases()[0].arguments[2], "");

        builder.set_argument_count(1);
        assert_eq!(builder.test_cases()[0].arguments, vec!["3"]);
        assert_eq!(builder.test_cases()[1].arguments, vec!["1"]);

        // 截掉的值不会恢复
        builder.set_argument_count(2);
        assert_eq!(builder.test_cases()[0].arguments, vec!["3", ""]);
    }

    #[test]
    fn test_validation_rules() {
        let mut builder = add_builder();
        assert!(builder.validate().is_ok());

        builder.set_argument(0, 1, " ").unwrap();
        assert_eq!(
            builder.validate(),
            Err(ValidationError::EmptyArgument { case: 1, argument: 2 })
        );
        builder.set_argument(0, 1, "5").unwrap();

        builder.set_expected_output(0, "").unwrap();
        assert_eq!(
            builder.validate(),
            Err(ValidationError::EmptyExpectedOutput { case: 1 })
        );
        builder.set_expected_output(0, "8").unwrap();

        builder.set_signature("");
        assert_eq!(builder.validate(), Err(ValidationError::EmptySignature));
        builder.set_signature("add");

        builder.set_body("");
        assert_eq!(builder.validate(), Err(ValidationError::EmptyBody));
    }

    #[test]
    fn test_zero_arguments_is_valid() {
        let mut builder = CodeQuestionBuilder::new();
        builder.set_body("返回 42");
        builder.set_signature("answer");
        builder.set_expected_output(0, "42").unwrap();
        assert!(builder.can_submit());
    }

    #[test]
    fn test_setters_reject_out_of_range() {
        let mut builder = add_builder();
        assert_eq!(
            builder.set_argument(0, 2, "x"),
            Err(ValidationError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert_eq!(
            builder.set_expected_output(3, "x"),
            Err(ValidationError::IndexOutOfRange { index: 3, len: 1 })
        );
    }

    #[tokio::test]
    async fn test_materialize_issues_calls_in_order() {
        let (api, test_id) = api_with_test().await;
        let mut builder = add_builder();

        let question = builder.materialize(&api, &ctx(&test_id)).await.unwrap();

        assert_eq!(
            api.ops()[1..],
            [
                ApiOp::CreateQuestion,
                ApiOp::CreateSignature,
                ApiOp::CreateTestCase,
                ApiOp::CreateArgument,
                ApiOp::CreateArgument,
            ]
        );
        let orders: Vec<usize> = question.arguments.iter().map(|a| a.order).collect();
        assert_eq!(orders, vec![1, 2]);
        assert_eq!(question.signature.argument_count, 2);
        assert_eq!(question.test_cases[0].expected_output, "8");
        assert!(builder.is_editing());
    }

    #[tokio::test]
    async fn test_invalid_draft_makes_no_remote_calls() {
        let (api, test_id) = api_with_test().await;
        let mut builder = CodeQuestionBuilder::new();

        let err = builder.materialize(&api, &ctx(&test_id)).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(ValidationError::EmptyBody)));
        assert_eq!(api.ops(), vec![ApiOp::CreateTest]);
        assert!(builder.error().is_none());
    }

    #[tokio::test]
    async fn test_failure_stops_sequence_and_shows_error() {
        let (api, test_id) = api_with_test().await;
        api.fail_on(ApiOp::CreateSignature, 1, "签名格式错误");
        let mut builder = add_builder();

        let err = builder.materialize(&api, &ctx(&test_id)).await.unwrap_err();

        assert_eq!(err.orphans().unwrap().created_ids().len(), 1);
        assert_eq!(api.count(ApiOp::CreateTestCase), 0);
        assert_eq!(builder.error(), Some("签名格式错误"));
        assert!(!builder.is_editing());

        builder.dismiss_error();
        assert!(builder.error().is_none());
    }

    #[tokio::test]
    async fn test_edit_replaces_all_test_cases() {
        let (api, test_id) = api_with_test().await;
        let mut builder = add_builder();
        let original = builder.materialize(&api, &ctx(&test_id)).await.unwrap();

        let mut editor = CodeQuestionBuilder::from_question(&original);
        assert!(editor.is_editing());
        assert_eq!(editor.test_cases()[0].arguments, vec!["3", "5"]);

        editor.add_test_case();
        editor
            .fill_test_case(1, "0", &["-1".to_string(), "1".to_string()])
            .unwrap();
        let calls_before = api.calls().len();
        let edited = editor.materialize(&api, &ctx(&test_id)).await.unwrap();

        assert_eq!(
            api.ops()[calls_before..],
            [
                ApiOp::UpdateQuestion,
                ApiOp::UpdateSignature,
                ApiOp::DeleteTestCase,
                ApiOp::CreateTestCase,
                ApiOp::CreateArgument,
                ApiOp::CreateArgument,
                ApiOp::CreateTestCase,
                ApiOp::CreateArgument,
                ApiOp::CreateArgument,
            ]
        );
        assert_eq!(edited.id, original.id);
        assert_eq!(edited.signature.id, original.signature.id);
        assert_eq!(edited.test_cases.len(), 2);
        assert!(!api.contains(&original.test_cases[0].id));
        assert_eq!(api.children_of(&original.id).len(), 3);
    }

    #[tokio::test]
    async fn test_failed_edit_does_not_delete_twice_on_retry() {
        let (api, test_id) = api_with_test().await;
        let original = add_builder()
            .materialize(&api, &ctx(&test_id))
            .await
            .unwrap();

        let mut editor = CodeQuestionBuilder::from_question(&original);
        api.fail_on(ApiOp::CreateTestCase, 2, "写入失败");
        assert!(editor.materialize(&api, &ctx(&test_id)).await.is_err());

        let deletes_before = api.count(ApiOp::DeleteTestCase);
        let edited = editor.materialize(&api, &ctx(&test_id)).await.unwrap();
        assert_eq!(api.count(ApiOp::DeleteTestCase), deletes_before);
        assert_eq!(edited.test_cases.len(), 1);
    }

    #[tokio::test]
    async fn test_retry_after_failed_edit_removes_partially_created_cases() {
        let (api, test_id) = api_with_test().await;
        let original = add_builder()
            .materialize(&api, &ctx(&test_id))
            .await
            .unwrap();

        let mut editor = CodeQuestionBuilder::from_question(&original);
        editor.add_test_case();
        editor
            .fill_test_case(1, "0", &["-1".to_string(), "1".to_string()])
            .unwrap();
        // 第二个新用例写入失败，第一个新用例已留在远端
        api.fail_on(ApiOp::CreateTestCase, 3, "写入失败");
        assert!(editor.materialize(&api, &ctx(&test_id)).await.is_err());

        let edited = editor.materialize(&api, &ctx(&test_id)).await.unwrap();

        let remote_cases: Vec<String> = api
            .children_of(&original.id)
            .into_iter()
            .filter(|(_, e)| e.op == ApiOp::CreateTestCase)
            .map(|(id, _)| id)
            .collect();
        assert_eq!(remote_cases.len(), edited.test_cases.len());
        assert!(edited.test_cases.iter().all(|tc| remote_cases.contains(&tc.id)));
        assert_eq!(api.count(ApiOp::DeleteTestCase), 2);
    }

    #[test]
    fn test_render_form() {
        let builder = add_builder();
        assert_eq!(
            builder.render_form(),
            "[code] 新建题目\n题干: 实现两数相加\n签名: add (2 个参数)\n  用例 #1: (3, 5) => 8\n"
        );
    }
}
