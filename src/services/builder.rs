//! 题目构建器分派
//!
//! 会话只持有一个进行中的构建器，类型在开始时选定

use crate::clients::TestApi;
use crate::error::{AppResult, ValidationError};
use crate::models::{Question, QuestionKind};
use crate::services::code_builder::CodeQuestionBuilder;
use crate::services::mcq_builder::McqQuestionBuilder;
use crate::workflow::QuestionCtx;

/// 进行中的题目草稿
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionBuilder {
    Code(CodeQuestionBuilder),
    Mcq(McqQuestionBuilder),
}

impl QuestionBuilder {
    /// 指定类型的空白草稿
    pub fn blank(kind: QuestionKind) -> Self {
        match kind {
            QuestionKind::Code => QuestionBuilder::Code(CodeQuestionBuilder::new()),
            QuestionKind::Mcq => QuestionBuilder::Mcq(McqQuestionBuilder::new()),
        }
    }

    /// 载入已物化题目用于编辑
    pub fn from_question(question: &Question) -> Self {
        match question {
            Question::Code(q) => QuestionBuilder::Code(CodeQuestionBuilder::from_question(q)),
            Question::Mcq(q) => QuestionBuilder::Mcq(McqQuestionBuilder::from_question(q)),
        }
    }

    pub fn kind(&self) -> QuestionKind {
        match self {
            QuestionBuilder::Code(_) => QuestionKind::Code,
            QuestionBuilder::Mcq(_) => QuestionKind::Mcq,
        }
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        match self {
            QuestionBuilder::Code(b) => b.set_body(body),
            QuestionBuilder::Mcq(b) => b.set_body(body),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            QuestionBuilder::Code(b) => b.validate(),
            QuestionBuilder::Mcq(b) => b.validate(),
        }
    }

    pub fn can_submit(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn is_editing(&self) -> bool {
        match self {
            QuestionBuilder::Code(b) => b.is_editing(),
            QuestionBuilder::Mcq(b) => b.is_editing(),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            QuestionBuilder::Code(b) => b.error(),
            QuestionBuilder::Mcq(b) => b.error(),
        }
    }

    pub fn dismiss_error(&mut self) {
        match self {
            QuestionBuilder::Code(b) => b.dismiss_error(),
            QuestionBuilder::Mcq(b) => b.dismiss_error(),
        }
    }

    pub fn as_code_mut(&mut self) -> Option<&mut CodeQuestionBuilder> {
        match self {
            QuestionBuilder::Code(b) => Some(b),
            QuestionBuilder::Mcq(_) => None,
        }
    }

    pub fn as_mcq_mut(&mut self) -> Option<&mut McqQuestionBuilder> {
        match self {
            QuestionBuilder::Mcq(b) => Some(b),
            QuestionBuilder::Code(_) => None,
        }
    }

    pub async fn materialize<A: TestApi>(
        &mut self,
        api: &A,
        ctx: &QuestionCtx,
    ) -> AppResult<Question> {
        match self {
            QuestionBuilder::Code(b) => b.materialize(api, ctx).await.map(Question::Code),
            QuestionBuilder::Mcq(b) => b.materialize(api, ctx).await.map(Question::Mcq),
        }
    }

    pub fn render_form(&self) -> String {
        match self {
            QuestionBuilder::Code(b) => b.render_form(),
            QuestionBuilder::Mcq(b) => b.render_form(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{McqOption, McqQuestion};

    #[test]
    fn test_blank_matches_kind() {
        assert_eq!(QuestionBuilder::blank(QuestionKind::Code).kind(), QuestionKind::Code);
        let mut mcq = QuestionBuilder::blank(QuestionKind::Mcq);
        assert!(mcq.as_code_mut().is_none());
        assert!(mcq.as_mcq_mut().is_some());
        assert!(!mcq.is_editing());
    }

    #[test]
    fn test_from_question_enters_edit_mode() {
        let question = Question::Mcq(McqQuestion {
            id: "Q1".to_string(),
            body: "?".to_string(),
            options: vec![
                McqOption {
                    id: "O1".to_string(),
                    body: "是".to_string(),
                    is_correct: true,
                },
                McqOption {
                    id: "O2".to_string(),
                    body: "否".to_string(),
                    is_correct: false,
                },
            ],
        });
        let builder = QuestionBuilder::from_question(&question);
        assert!(builder.is_editing());
        assert!(builder.can_submit());
        assert!(builder.render_form().starts_with("[mcq] 编辑题目"));
    }
}
