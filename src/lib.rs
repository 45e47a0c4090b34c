//! # Test Authoring
//!
//! 测试（由编程题和选择题组成的小测）的编写与草稿恢复流水线
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源，只暴露能力
//! - `HttpExecutor` - 唯一的 `reqwest::Client` owner，提供 send() 能力
//! - `FileSlot` / `MemorySlot` - 草稿槽，按 key 整体覆盖写入
//! - `Clock` - 提供当前毫秒时间，测试中可手动拨动
//!
//! ### ② 远端契约层（Clients）
//! - `clients/` - `TestApi` 描述每个子实体的创建/更新/删除接口
//! - `ForumClient` - HTTP 实现
//! - `InMemoryApi` - 内存实现，用于演练模式和测试
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单道题目
//! - `DraftStore` - 带有效期的草稿读写
//! - `CodeQuestionBuilder` / `McqQuestionBuilder` - 题目草稿与分步物化
//! - `QuestionPreview` - 已物化题目的渲染
//! - `OrphanWriter` - 写 warn.txt 能力
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 定义"一份测试"的完整生命周期
//! - `QuestionCtx` - 上下文封装（community_id + test_id + question_index）
//! - `TestSession` - 会话状态机（初始化 → 逐题物化 → 完成/放弃）
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量测试处理器，管理资源和并发
//! - `orchestrator/test_processor` - 单份测试处理器，遍历题目定义
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{ApiBackend, ForumClient, InMemoryApi, TestApi};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{DraftSnapshot, Question, QuestionKind};
pub use orchestrator::{process_test, App};
pub use services::{CodeQuestionBuilder, DraftStore, McqQuestionBuilder, QuestionBuilder};
pub use workflow::{QuestionCtx, SessionState, TestSession};
