//! 草稿快照 - 写入草稿存储的最小单位

use serde::{Deserialize, Serialize};

use crate::error::DraftError;
use crate::models::question::{Question, RemoteId};

/// 测试编写会话的可恢复状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSnapshot {
    /// 远端测试 id，初始化前为空
    pub test_id: Option<RemoteId>,
    pub title: String,
    pub description: String,
    /// 测试所属社区
    pub community_id: String,
    /// 创建时间（毫秒时间戳），用于 TTL 判断
    pub created_at: i64,
    /// 已物化的题目，保持添加顺序
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl DraftSnapshot {
    /// 创建一个尚未发送到远端的空白快照
    pub fn new(community_id: impl Into<String>, created_at: i64) -> Self {
        Self {
            test_id: None,
            title: String::new(),
            description: String::new(),
            community_id: community_id.into(),
            created_at,
            questions: Vec::new(),
        }
    }

    /// 快照年龄（毫秒）
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.created_at
    }

    pub fn is_expired(&self, now_ms: i64, ttl_ms: i64) -> bool {
        self.age_ms(now_ms) > ttl_ms
    }

    /// testId 为空时不允许出现题目（题目需要测试 id 作为外键）
    pub fn check_invariant(&self) -> Result<(), DraftError> {
        if self.test_id.is_none() && !self.questions.is_empty() {
            return Err(DraftError::QuestionsWithoutTest {
                count: self.questions.len(),
            });
        }
        Ok(())
    }
}
