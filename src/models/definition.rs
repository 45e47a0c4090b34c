use serde::{Deserialize, Serialize};

/// TOML 中描述的一份待编写测试
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestDefinition {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub community_id: String,
    #[serde(default)]
    pub questions: Vec<QuestionDefinition>,
    #[serde(skip_serializing, skip_deserializing)]
    pub file_path: Option<String>,
}

/// 单道题目定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDefinition {
    /// 题目类型名称，见 `QuestionKind::from_name`
    #[serde(rename = "type")]
    pub kind: String,
    pub body: String,
    #[serde(default)]
    pub signature: Option<String>,
    /// 缺省时取第一个测试用例的参数个数
    #[serde(default)]
    pub argument_count: Option<usize>,
    #[serde(default)]
    pub test_cases: Vec<TestCaseDefinition>,
    #[serde(default)]
    pub options: Vec<OptionDefinition>,
}

impl QuestionDefinition {
    pub fn resolved_argument_count(&self) -> usize {
        self.argument_count.unwrap_or_else(|| {
            self.test_cases
                .first()
                .map(|tc| tc.arguments.len())
                .unwrap_or(0)
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCaseDefinition {
    pub expected_output: String,
    #[serde(default)]
    pub arguments: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionDefinition {
    pub body: String,
    #[serde(default)]
    pub correct: bool,
}

impl TestDefinition {
    pub fn with_file_path(mut self, file_path: String) -> Self {
        self.file_path = Some(file_path);
        self
    }
}
