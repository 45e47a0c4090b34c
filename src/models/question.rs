//! 已物化的题目
//!
//! 所有 id 都来自远端；题目只有在全部子实体创建成功后才会以此形态出现

use serde::{Deserialize, Serialize};

use crate::models::kind::QuestionKind;

/// 远端返回的实体标识
pub type RemoteId = String;

/// 已物化题目（按类型打标签）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Question {
    Code(CodeQuestion),
    Mcq(McqQuestion),
}

impl Question {
    pub fn id(&self) -> &str {
        match self {
            Question::Code(q) => &q.id,
            Question::Mcq(q) => &q.id,
        }
    }

    pub fn body(&self) -> &str {
        match self {
            Question::Code(q) => &q.body,
            Question::Mcq(q) => &q.body,
        }
    }

    pub fn kind(&self) -> QuestionKind {
        match self {
            Question::Code(_) => QuestionKind::Code,
            Question::Mcq(_) => QuestionKind::Mcq,
        }
    }
}

/// 编程题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeQuestion {
    pub id: RemoteId,
    pub body: String,
    pub signature: Signature,
    pub test_cases: Vec<TestCase>,
    /// 扁平存储，通过 `test_case_id` 关联到测试用例
    pub arguments: Vec<Argument>,
}

impl CodeQuestion {
    /// 按 order 排好序的某个测试用例的参数
    pub fn arguments_for(&self, test_case_id: &str) -> Vec<&Argument> {
        let mut args: Vec<&Argument> = self
            .arguments
            .iter()
            .filter(|a| a.test_case_id == test_case_id)
            .collect();
        args.sort_by_key(|a| a.order);
        args
    }
}

/// 函数签名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub id: RemoteId,
    pub value: String,
    pub argument_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: RemoteId,
    pub expected_output: String,
}

/// 测试用例参数，`order` 从 1 开始
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Argument {
    pub id: RemoteId,
    pub test_case_id: RemoteId,
    pub order: usize,
    pub value: String,
}

/// 选择题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McqQuestion {
    pub id: RemoteId,
    pub body: String,
    pub options: Vec<McqOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McqOption {
    pub id: RemoteId,
    pub body: String,
    pub is_correct: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_serializes_with_type_tag() {
        let q = Question::Mcq(McqQuestion {
            id: "Q1".to_string(),
            body: "2 + 2 = ?".to_string(),
            options: vec![McqOption {
                id: "O1".to_string(),
                body: "4".to_string(),
                is_correct: true,
            }],
        });

        let value = serde_json::to_value(&q).unwrap();
        assert_eq!(value["type"], "mcq");
        assert_eq!(value["options"][0]["isCorrect"], true);
    }

    #[test]
    fn test_arguments_for_sorts_by_order() {
        let q = CodeQuestion {
            id: "Q1".to_string(),
            body: "add".to_string(),
            signature: Signature {
                id: "S1".to_string(),
                value: "add".to_string(),
                argument_count: 2,
            },
            test_cases: vec![TestCase {
                id: "T1".to_string(),
                expected_output: "8".to_string(),
            }],
            arguments: vec![
                Argument {
                    id: "A2".to_string(),
                    test_case_id: "T1".to_string(),
                    order: 2,
                    value: "5".to_string(),
                },
                Argument {
                    id: "A1".to_string(),
                    test_case_id: "T1".to_string(),
                    order: 1,
                    value: "3".to_string(),
                },
            ],
        };

        let values: Vec<&str> = q
            .arguments_for("T1")
            .iter()
            .map(|a| a.value.as_str())
            .collect();
        assert_eq!(values, vec!["3", "5"]);
        assert!(q.arguments_for("T9").is_empty());
    }
}
