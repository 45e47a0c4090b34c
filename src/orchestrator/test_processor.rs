//! 单份测试处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责把一份 TOML 测试定义完整地编写到远端，是测试级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **挂载会话**：读取社区草稿，标题一致则续作，否则丢弃旧草稿
//! 2. **遍历题目**：跳过草稿中已物化的题目，逐题填写构建器并提交
//! 3. **失败处理**：题目失败即停止本测试，保留草稿，写孤儿报告
//! 4. **完成测试**：全部题目成功后完成（发布）测试
//! 5. **文件清理**：删除已处理的 TOML 文件
//! 6. **统计输出**：记录新建/续作/失败数量

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::clients::TestApi;
use crate::config::Config;
use crate::error::{AppError, ValidationError};
use crate::infrastructure::SlotBackend;
use crate::models::{QuestionDefinition, QuestionKind, TestDefinition};
use crate::services::{DraftStore, McqOptionDraft, OrphanWriter, QuestionBuilder};
use crate::workflow::{QuestionCtx, SessionState, TestSession};

/// 题目处理统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QuestionStats {
    /// 本次新物化的题目
    pub created: usize,
    /// 从草稿恢复、直接跳过的题目
    pub resumed: usize,
    /// 失败的题目（失败后本测试停止）
    pub failed: usize,
}

/// 处理单份测试
///
/// # 参数
/// - `api`: 远端
/// - `store`: 草稿存储
/// - `definition`: 测试定义
/// - `test_index`: 测试序号（用于日志）
/// - `config`: 配置
/// - `orphans`: 孤儿报告写入器
///
/// # 返回
/// 测试是否已完成；`false` 表示中途停止，草稿保留待下次续作
pub async fn process_test<A: TestApi, B: SlotBackend>(
    api: &A,
    store: &DraftStore<B>,
    definition: &TestDefinition,
    test_index: usize,
    config: &Config,
    orphans: &OrphanWriter,
) -> Result<bool> {
    log_test_start(test_index, definition);

    let mut session = mount_matching(api, store, definition, test_index)?
        .with_publish_on_finalize(config.publish_on_finalize);

    if session.state() == SessionState::Uninitialized {
        session.set_title(definition.title.clone())?;
        session.set_description(definition.description.clone())?;
        session
            .initialize()
            .await
            .with_context(|| format!("[测试 {}] 创建测试失败", test_index))?;
    }

    let mut stats = QuestionStats {
        resumed: session.questions().len(),
        ..Default::default()
    };
    if stats.resumed > 0 {
        info!(
            "[测试 {}] ♻️ 从草稿续作，跳过已完成的 {} 道题目",
            test_index, stats.resumed
        );
    }

    let total = definition.questions.len();
    for (index, question) in definition.questions.iter().enumerate().skip(stats.resumed) {
        let question_index = index + 1;
        log_question_start(test_index, question_index, total);

        if let Err(e) = author_question(&mut session, question, orphans).await {
            error!(
                "[测试 {}] 题目 {} 处理失败: {:#}",
                test_index, question_index, e
            );
            stats.failed += 1;
            if session.state() == SessionState::QuestionInProgress {
                session.cancel_question()?;
            }
            log_test_stopped(test_index, &stats, total);
            return Ok(false);
        }
        stats.created += 1;
    }

    let test_id = session
        .finalize()
        .await
        .with_context(|| format!("[测试 {}] 完成测试失败", test_index))?;
    info!("[测试 {}] ✓ 测试已完成: {}", test_index, test_id);

    // 清理文件
    cleanup_file(definition.file_path.as_deref(), test_index)?;

    log_test_complete(test_index, &stats, total);

    Ok(true)
}

/// 挂载会话；草稿属于另一份测试时丢弃后重新挂载
fn mount_matching<'a, A: TestApi, B: SlotBackend>(
    api: &'a A,
    store: &'a DraftStore<B>,
    definition: &TestDefinition,
    test_index: usize,
) -> Result<TestSession<'a, A, B>> {
    let mut session = TestSession::mount(api, store, definition.community_id.clone());
    if !session.is_resumed() {
        return Ok(session);
    }

    let same_test = session.title() == definition.title
        && session.questions().len() <= definition.questions.len();
    if same_test {
        return Ok(session);
    }

    warn!(
        "[测试 {}] ⚠️ 社区 {} 的草稿属于另一份测试 \"{}\"，已丢弃",
        test_index,
        definition.community_id,
        session.title()
    );
    session.abandon()?;
    Ok(TestSession::mount(api, store, definition.community_id.clone()))
}

/// 编写一道题目：开始 → 填写 → 提交
///
/// 物化失败时把已提交的远端步骤写入孤儿报告
async fn author_question<A: TestApi, B: SlotBackend>(
    session: &mut TestSession<'_, A, B>,
    question: &QuestionDefinition,
    orphans: &OrphanWriter,
) -> Result<()> {
    let kind = QuestionKind::from_name(&question.kind)
        .with_context(|| format!("未知的题目类型: {}", question.kind))?;

    let builder = session.begin_question(kind)?;
    fill_builder(builder, question).context("题目定义不完整")?;

    let position = session.questions().len() + 1;
    match session.submit_question().await {
        Ok(_) => Ok(()),
        Err(AppError::Materialize(e)) => {
            let ctx = QuestionCtx::new(
                session.community_id().to_string(),
                session.test_id().unwrap_or_default().to_string(),
                position,
            );
            match orphans.write(&ctx, &e) {
                Ok(true) => warn!("{} 已提交的远端步骤已写入 {}", ctx, orphans.path()),
                Ok(false) => {}
                Err(write_err) => error!("{} 孤儿报告写入失败: {}", ctx, write_err),
            }
            Err(AppError::Materialize(e).into())
        }
        Err(e) => Err(e.into()),
    }
}

/// 把题目定义填入构建器
pub fn fill_builder(
    builder: &mut QuestionBuilder,
    question: &QuestionDefinition,
) -> Result<(), ValidationError> {
    builder.set_body(question.body.clone());

    if let Some(code) = builder.as_code_mut() {
        code.set_signature(question.signature.clone().unwrap_or_default());
        code.set_argument_count(question.resolved_argument_count());
        for (i, case) in question.test_cases.iter().enumerate() {
            if i > 0 {
                code.add_test_case();
            }
            code.fill_test_case(i, case.expected_output.clone(), &case.arguments)?;
        }
    }

    if let Some(mcq) = builder.as_mcq_mut() {
        mcq.replace_options(
            question
                .options
                .iter()
                .map(|o| McqOptionDraft::new(o.body.clone(), o.correct))
                .collect(),
        );
    }

    builder.validate()
}

/// 清理已处理的文件
fn cleanup_file(file_path: Option<&str>, test_index: usize) -> Result<()> {
    info!("[测试 {}] 🗑️ 清理已处理的文件...", test_index);

    if let Some(file_path) = file_path {
        if Path::new(file_path).exists() {
            fs::remove_file(file_path).with_context(|| format!("无法删除文件: {}", file_path))?;
            info!(
                "[测试 {}] ✓ 文件已删除: {}",
                test_index,
                Path::new(file_path)
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
            );
        } else {
            warn!("[测试 {}] ⚠️ 文件不存在: {}", test_index, file_path);
        }
    } else {
        warn!("[测试 {}] ⚠️ 文件路径未设置", test_index);
    }

    Ok(())
}

// ========== 日志辅助函数 ==========

fn log_test_start(test_index: usize, definition: &TestDefinition) {
    info!("[测试 {}] 开始处理", test_index);
    info!("[测试 {}] 标题: {}", test_index, definition.title);
    info!("[测试 {}] 社区: {}", test_index, definition.community_id);
    info!(
        "[测试 {}] 题目总数: {}",
        test_index,
        definition.questions.len()
    );
}

fn log_question_start(test_index: usize, question_index: usize, total: usize) {
    info!("\n[测试 {}] {}", test_index, "─".repeat(30));
    info!(
        "[测试 {}] 处理第 {}/{} 道题目",
        test_index, question_index, total
    );
}

fn log_test_stopped(test_index: usize, stats: &QuestionStats, total: usize) {
    warn!(
        "[测试 {}] 题目统计: 新建 {}, 续作 {}, 失败 {}, 总计 {}",
        test_index, stats.created, stats.resumed, stats.failed, total
    );
    warn!("[测试 {}] ⏸️ 测试已中止，草稿已保留，下次运行将续作\n", test_index);
}

fn log_test_complete(test_index: usize, stats: &QuestionStats, total: usize) {
    info!(
        "[测试 {}] 题目统计: 新建 {}, 续作 {}, 总计 {}",
        test_index, stats.created, stats.resumed, total
    );
    info!("\n[测试 {}] ✅ 测试处理完成\n", test_index);
}
