//! 题目表单 - 两类题目共用的部分
//!
//! 持有题干和错误提示条。错误提示只来自远程失败，本地校验失败不会写入

use std::fmt::Write as _;

use crate::error::{AppError, ValidationError};
use crate::models::QuestionKind;

/// 题目表单公共部分
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionForm {
    body: String,
    error: Option<String>,
}

impl QuestionForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            error: None,
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// 修改题干，同时收起上次的错误提示
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
        self.error = None;
    }

    pub fn validate_body(&self) -> Result<(), ValidationError> {
        if is_blank(&self.body) {
            return Err(ValidationError::EmptyBody);
        }
        Ok(())
    }

    /// 当前显示的错误提示
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// 用户手动关闭错误提示
    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// 记录远程失败，供界面展示
    pub fn report(&mut self, err: &AppError) {
        self.error = Some(err.user_message());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// 渲染表单头部（类型、题干、错误提示）
    pub fn render_header(&self, kind: QuestionKind, editing: bool, out: &mut String) {
        let mode = if editing { "编辑" } else { "新建" };
        let _ = writeln!(out, "[{}] {}题目", kind, mode);
        let body = if is_blank(&self.body) {
            "(未填写)"
        } else {
            self.body.as_str()
        };
        let _ = writeln!(out, "题干: {}", body);
        if let Some(error) = &self.error {
            let _ = writeln!(out, "⚠️ {}", error);
        }
    }
}

/// 空字符串或只包含空白
pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
