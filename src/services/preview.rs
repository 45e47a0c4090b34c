//! 题目预览
//!
//! 把已物化题目渲染成文本，并定义预览界面能发出的操作

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::{CodeQuestion, McqQuestion, Question};
use crate::utils::logging::truncate_text;

/// 紧凑模式下题干最多显示的字符数
const COMPACT_BODY_LEN: usize = 40;

/// 预览模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewMode {
    /// 一行摘要
    Compact,
    /// 完整内容
    Full,
}

/// 预览界面发出的操作，参数是题目在测试中的索引（从 0 开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewIntent {
    /// 从测试中移除；只影响本地草稿
    Remove(usize),
    /// 载入构建器编辑
    Edit(usize),
    /// 展开完整预览
    Preview(usize),
}

/// 单道题目的预览
pub struct QuestionPreview<'a> {
    question: &'a Question,
    index: usize,
    mode: PreviewMode,
}

impl<'a> QuestionPreview<'a> {
    pub fn new(question: &'a Question, index: usize, mode: PreviewMode) -> Self {
        Self {
            question,
            index,
            mode,
        }
    }

    pub fn compact(question: &'a Question, index: usize) -> Self {
        Self::new(question, index, PreviewMode::Compact)
    }

    pub fn full(question: &'a Question, index: usize) -> Self {
        Self::new(question, index, PreviewMode::Full)
    }

    fn write_code(&self, f: &mut fmt::Formatter<'_>, q: &CodeQuestion) -> fmt::Result {
        writeln!(f, "    签名: {} ({} 个参数)", q.signature.value, q.signature.argument_count)?;
        for tc in &q.test_cases {
            let args: Vec<&str> = q
                .arguments_for(&tc.id)
                .into_iter()
                .map(|a| a.value.as_str())
                .collect();
            writeln!(
                f,
                "    {}({}) => {}",
                q.signature.value,
                args.join(", "),
                tc.expected_output
            )?;
        }
        Ok(())
    }

    fn write_mcq(&self, f: &mut fmt::Formatter<'_>, q: &McqQuestion) -> fmt::Result {
        for option in &q.options {
            let mark = if option.is_correct { "[x]" } else { "[ ]" };
            writeln!(f, "    {} {}", mark, option.body)?;
        }
        Ok(())
    }
}

impl fmt::Display for QuestionPreview<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let number = self.index + 1;
        let kind = self.question.kind();
        match self.mode {
            PreviewMode::Compact => {
                let body = truncate_text(&collapse_whitespace(self.question.body()), COMPACT_BODY_LEN);
                let detail = match self.question {
                    Question::Code(q) => format!("{} 个用例", q.test_cases.len()),
                    Question::Mcq(q) => format!("{} 个选项", q.options.len()),
                };
                write!(f, "{}. [{}] {} ({})", number, kind, body, detail)
            }
            PreviewMode::Full => {
                writeln!(f, "{}. [{}] {}", number, kind, self.question.body())?;
                match self.question {
                    Question::Code(q) => self.write_code(f, q),
                    Question::Mcq(q) => self.write_mcq(f, q),
                }
            }
        }
    }
}

/// 把连续空白（含换行）压成一个空格
pub fn collapse_whitespace(text: &str) -> String {
    static WS: OnceLock<Option<Regex>> = OnceLock::new();
    match WS.get_or_init(|| Regex::new(r"\s+").ok()) {
        Some(re) => re.replace_all(text.trim(), " ").into_owned(),
        None => text.trim().to_string(),
    }
}

/// 渲染整个测试的紧凑预览列表
pub fn render_list(questions: &[Question]) -> String {
    if questions.is_empty() {
        return "(还没有题目)\n".to_string();
    }
    questions
        .iter()
        .enumerate()
        .map(|(i, q)| format!("{}\n", QuestionPreview::compact(q, i)))
        .collect()
}
