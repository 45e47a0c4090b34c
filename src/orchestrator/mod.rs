//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量测试处理器
//! - 管理应用生命周期（初始化、运行）
//! - 批量加载测试定义（Vec<TestDefinition>）
//! - 按社区分组，控制并发数量（Semaphore）
//! - 输出全局统计信息
//!
//! ### `test_processor` - 单份测试处理器
//! - 挂载会话并决定续作还是新建
//! - 遍历题目定义，填写构建器并提交
//! - 完成测试、清理文件
//! - 输出单份测试的统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<TestDefinition>)
//!     ↓
//! test_processor (处理 Vec<QuestionDefinition>)
//!     ↓
//! workflow::TestSession (会话状态机)
//!     ↓
//! services (能力层：草稿 / 构建器 / 预览 / 孤儿报告)
//!     ↓
//! clients + infrastructure (远端 / 草稿槽 / 时钟)
//! ```

pub mod batch_processor;
pub mod test_processor;

// 重新导出主要类型
pub use batch_processor::App;
pub use test_processor::{fill_builder, process_test, QuestionStats};
