//! 选择题构建器 - 业务能力层
//!
//! 草稿始终至少有 2 个选项；提交时要求每个选项都有内容且至少一个正确。
//! 物化顺序：Question → 每个 Option

use std::fmt::Write as _;

use tracing::{debug, error, info};

use crate::clients::{OptionInput, QuestionInput, TestApi};
use crate::error::{AppError, AppResult, MaterializeError, ValidationError};
use crate::models::{McqOption, McqQuestion, QuestionKind, RemoteId};
use crate::services::materialize::{EntityKind, StepOutcome, StepRecorder};
use crate::services::question_form::{is_blank, QuestionForm};
use crate::workflow::QuestionCtx;

/// 选项数量下限
pub const MIN_OPTIONS: usize = 2;

/// 选项草稿
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct McqOptionDraft {
    pub body: String,
    pub is_correct: bool,
}

impl McqOptionDraft {
    pub fn new(body: impl Into<String>, is_correct: bool) -> Self {
        Self {
            body: body.into(),
            is_correct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ExistingMcq {
    question_id: RemoteId,
    option_ids: Vec<RemoteId>,
}

/// 选择题构建器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McqQuestionBuilder {
    form: QuestionForm,
    options: Vec<McqOptionDraft>,
    existing: Option<ExistingMcq>,
}

impl Default for McqQuestionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl McqQuestionBuilder {
    /// 空白草稿：2 个空选项，都不正确
    pub fn new() -> Self {
        Self {
            form: QuestionForm::new(),
            options: vec![McqOptionDraft::default(); MIN_OPTIONS],
            existing: None,
        }
    }

    /// 从已物化题目载入草稿，进入编辑模式
    pub fn from_question(question: &McqQuestion) -> Self {
        let mut options: Vec<McqOptionDraft> = question
            .options
            .iter()
            .map(|o| McqOptionDraft::new(o.body.clone(), o.is_correct))
            .collect();
        while options.len() < MIN_OPTIONS {
            options.push(McqOptionDraft::default());
        }

        Self {
            form: QuestionForm::with_body(question.body.clone()),
            options,
            existing: Some(ExistingMcq {
                question_id: question.id.clone(),
                option_ids: question.options.iter().map(|o| o.id.clone()).collect(),
            }),
        }
    }

    // ========== 草稿编辑 ==========

    pub fn body(&self) -> &str {
        self.form.body()
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.form.set_body(body);
    }

    pub fn options(&self) -> &[McqOptionDraft] {
        &self.options
    }

    /// 追加一个空选项，返回其索引
    pub fn add_option(&mut self) -> usize {
        self.options.push(McqOptionDraft::default());
        self.options.len() - 1
    }

    /// 移除选项
    ///
    /// 只剩 2 个选项，或要移除的是唯一的正确选项时拒绝
    pub fn remove_option(&mut self, index: usize) -> Result<McqOptionDraft, ValidationError> {
        let len = self.options.len();
        let target = self
            .options
            .get(index)
            .ok_or(ValidationError::IndexOutOfRange { index, len })?;
        if len <= MIN_OPTIONS {
            return Err(ValidationError::TooFewOptions { count: len });
        }
        if target.is_correct && self.correct_count() == 1 {
            return Err(ValidationError::LastCorrectOption);
        }
        Ok(self.options.remove(index))
    }

    pub fn set_option_body(
        &mut self,
        index: usize,
        body: impl Into<String>,
    ) -> Result<(), ValidationError> {
        self.option_mut(index)?.body = body.into();
        Ok(())
    }

    /// 标记选项是否正确；允许多个正确选项
    pub fn set_correct(&mut self, index: usize, is_correct: bool) -> Result<(), ValidationError> {
        self.option_mut(index)?.is_correct = is_correct;
        Ok(())
    }

    /// 把所有选项整体替换为给定列表，不足 2 个时补空选项
    pub fn replace_options(&mut self, options: Vec<McqOptionDraft>) {
        self.options = options;
        while self.options.len() < MIN_OPTIONS {
            self.options.push(McqOptionDraft::default());
        }
    }

    pub fn correct_count(&self) -> usize {
        self.options.iter().filter(|o| o.is_correct).count()
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

    fn option_mut(&mut self, index: usize) -> Result<&mut McqOptionDraft, ValidationError> {
        let len = self.options.len();
        self.options
            .get_mut(index)
            .ok_or(ValidationError::IndexOutOfRange { index, len })
    }

    // ========== 校验 ==========

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.form.validate_body()?;
        if self.options.len() < MIN_OPTIONS {
            return Err(ValidationError::TooFewOptions {
                count: self.options.len(),
            });
        }
        if let Some(i) = self.options.iter().position(|o| is_blank(&o.body)) {
            return Err(ValidationError::EmptyOptionBody { option: i + 1 });
        }
        if self.correct_count() == 0 {
            return Err(ValidationError::NoCorrectOption);
        }
        Ok(())
    }

    pub fn can_submit(&self) -> bool {
        self.validate().is_ok()
    }

    // ========== 物化 ==========

    /// 把草稿物化到远端
    ///
    /// 编辑时更新 Question，删除全部旧选项后按草稿重建
    pub async fn materialize<A: TestApi>(
        &mut self,
        api: &A,
        ctx: &QuestionCtx,
    ) -> AppResult<McqQuestion> {
        self.validate()?;

        let result = match self.existing.clone() {
            None => self.create_all(api, ctx).await,
            Some(existing) => self.replace_all(api, ctx, &existing).await,
        };

        match result {
            Ok(question) => {
                info!(
                    "{} ✓ 选择题物化完成: {} 个选项, {} 个正确",
                    ctx,
                    question.options.len(),
                    self.correct_count()
                );
                self.form.clear_error();
                self.existing = Some(ExistingMcq {
                    question_id: question.id.clone(),
                    option_ids: question.options.iter().map(|o| o.id.clone()).collect(),
                });
                Ok(question)
            }
            Err(e) => {
                error!(
                    "{} ❌ 选择题物化失败于 {}: {} (已提交: {})",
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
    ) -> Result<McqQuestion, MaterializeError> {
        info!("{} 📤 正在创建选择题...", ctx);
        let mut rec = StepRecorder::new();
        let question_id = rec.created(
            EntityKind::Question,
            api.create_question(&ctx.test_id, &self.question_input())
                .await,
        )?;
        let options = self.create_options(api, ctx, &question_id, &mut rec).await?;
        Ok(self.assemble(question_id, options))
    }

    async fn replace_all<A: TestApi>(
        &self,
        api: &A,
        ctx: &QuestionCtx,
        existing: &ExistingMcq,
    ) -> Result<McqQuestion, MaterializeError> {
        info!("{} 📝 正在更新选择题 {}...", ctx, existing.question_id);
        let mut rec = StepRecorder::new();
        let question_id = rec.updated(
            EntityKind::Question,
            api.update_question(&existing.question_id, &self.question_input())
                .await,
        )?;
        for id in &existing.option_ids {
            debug!("{} 删除旧选项 {}", ctx, id);
            rec.deleted(EntityKind::Option, id, api.delete_option(id).await)?;
        }
        let options = self.create_options(api, ctx, &question_id, &mut rec).await?;
        Ok(self.assemble(question_id, options))
    }

    async fn create_options<A: TestApi>(
        &self,
        api: &A,
        ctx: &QuestionCtx,
        question_id: &str,
        rec: &mut StepRecorder,
    ) -> Result<Vec<McqOption>, MaterializeError> {
        let mut options = Vec::with_capacity(self.options.len());
        for (i, draft) in self.options.iter().enumerate() {
            debug!("{} 创建选项 {}/{}", ctx, i + 1, self.options.len());
            let id = rec.created(
                EntityKind::Option,
                api.create_option(
                    question_id,
                    &OptionInput {
                        body: draft.body.clone(),
                        is_correct: draft.is_correct,
                    },
                )
                .await,
            )?;
            options.push(McqOption {
                id,
                body: draft.body.clone(),
                is_correct: draft.is_correct,
            });
        }
        Ok(options)
    }

    /// 编辑失败时：已删除的旧选项移出编辑状态，已新建的选项留待下次重试删除
    fn sync_existing(&mut self, err: &MaterializeError) {
        let Some(existing) = &mut self.existing else {
            return;
        };
        for step in err.committed.steps() {
            if step.kind != EntityKind::Option {
                continue;
            }
            match step.outcome {
                StepOutcome::Deleted => existing.option_ids.retain(|id| id != &step.id),
                StepOutcome::Created => existing.option_ids.push(step.id.clone()),
                StepOutcome::Updated => {}
            }
        }
    }

    fn question_input(&self) -> QuestionInput {
        QuestionInput {
            body: self.form.body().to_string(),
            question_type_id: QuestionKind::Mcq.type_id(),
        }
    }

    fn assemble(&self, question_id: RemoteId, options: Vec<McqOption>) -> McqQuestion {
        McqQuestion {
            id: question_id,
            body: self.form.body().to_string(),
            options,
        }
    }

    // ========== 渲染 ==========

    pub fn render_form(&self) -> String {
        let mut out = String::new();
        self.form
            .render_header(QuestionKind::Mcq, self.is_editing(), &mut out);
        for (i, option) in self.options.iter().enumerate() {
            let mark = if option.is_correct { "[x]" } else { "[ ]" };
            let _ = writeln!(out, "  {} {}. {}", mark, i + 1, option.body);
        }
        out
    }
}
