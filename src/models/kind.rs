use phf::phf_map;
use serde::{Deserialize, Serialize};

/// 题目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// 编程题
    Code = 1,
    /// 选择题
    Mcq = 2,
}

/// 题目类型别名表（不区分大小写，查找前统一转小写）
static KIND_NAMES: phf::Map<&'static str, QuestionKind> = phf_map! {
    "code" => QuestionKind::Code,
    "coding" => QuestionKind::Code,
    "function" => QuestionKind::Code,
    "编程" => QuestionKind::Code,
    "mcq" => QuestionKind::Mcq,
    "choice" => QuestionKind::Mcq,
    "multiple-choice" => QuestionKind::Mcq,
    "选择" => QuestionKind::Mcq,
};

impl QuestionKind {
    /// 远端使用的 questionTypeId
    pub fn type_id(self) -> u32 {
        self as u32
    }

    /// 标准名称
    pub fn name(self) -> &'static str {
        match self {
            QuestionKind::Code => "code",
            QuestionKind::Mcq => "mcq",
        }
    }

    /// 从名称解析题目类型
    pub fn from_name(s: &str) -> Option<Self> {
        KIND_NAMES.get(s.trim().to_lowercase().as_str()).copied()
    }
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
