//! 题目物化上下文
//!
//! 封装"我正在给哪个社区的哪份测试物化第几题"这一信息

use std::fmt::Display;

/// 题目物化上下文
#[derive(Debug, Clone)]
pub struct QuestionCtx {
    /// 社区ID
    pub community_id: String,

    /// 远端测试ID（题目的外键）
    pub test_id: String,

    /// 题目在测试中的位置（从1开始，仅用于日志显示）
    pub question_index: usize,
}

impl QuestionCtx {
    /// 创建新的题目上下文
    pub fn new(community_id: String, test_id: String, question_index: usize) -> Self {
        Self {
            community_id,
            test_id,
            question_index,
        }
    }
}

impl Display for QuestionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[社区 {} 测试 {} 题目#{}]",
            self.community_id, self.test_id, self.question_index
        )
    }
}
