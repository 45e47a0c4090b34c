//! 孤儿实体报告服务 - 业务能力层
//!
//! 只负责"写 warn.txt"能力，不关心流程

use std::fs::OpenOptions;
use std::io::Write;

use tracing::debug;

use crate::error::{FileError, MaterializeError};
use crate::workflow::QuestionCtx;

/// 孤儿实体报告服务
///
/// 职责：
/// - 把物化失败时已在远端提交的步骤追加到 warn.txt
/// - 只处理单道题目
/// - 不做补偿删除
pub struct OrphanWriter {
    warn_file_path: String,
}

impl OrphanWriter {
    pub fn new() -> Self {
        Self {
            warn_file_path: "warn.txt".to_string(),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            warn_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.warn_file_path
    }

    /// 追加一条报告
    ///
    /// 已提交步骤为空时不写
    pub fn write(&self, ctx: &QuestionCtx, err: &MaterializeError) -> Result<bool, FileError> {
        if err.committed.is_empty() {
            return Ok(false);
        }

        debug!(
            "写入孤儿报告: {} | 遗留 {} 步",
            ctx,
            err.committed.len()
        );

        let line = format!(
            "社区 {} | 测试 {} | 题目 #{} | 失败步骤: {} | 遗留: {} | 原因: {}\n",
            ctx.community_id,
            ctx.test_id,
            ctx.question_index,
            err.failed_step,
            err.committed,
            err.source.message()
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.warn_file_path)
            .map_err(|e| self.write_failed(e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| self.write_failed(e))?;

        Ok(true)
    }

    fn write_failed(&self, source: std::io::Error) -> FileError {
        FileError::WriteFailed {
            path: self.warn_file_path.clone(),
            source,
        }
    }
}

impl Default for OrphanWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::services::materialize::{EntityKind, MaterializationLog};

    fn temp_path(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("orphan-writer-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join("warn.txt")
    }

    #[test]
    fn test_appends_committed_steps() {
        let path = temp_path("append");
        let _ = std::fs::remove_file(&path);
        let writer = OrphanWriter::with_path(path.to_string_lossy());
        let ctx = QuestionCtx::new("algo101".to_string(), "T1".to_string(), 2);

        let mut committed = MaterializationLog::default();
        committed.created(EntityKind::Question, "Q9");
        let err = MaterializeError {
            failed_step: EntityKind::Signature,
            source: ApiError::bad_response("signatures", 500, "服务繁忙"),
            committed,
        };

        assert!(writer.write(&ctx, &err).unwrap());
        assert!(writer.write(&ctx, &err).unwrap());

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.starts_with(
            "社区 algo101 | 测试 T1 | 题目 #2 | 失败步骤: signature | 遗留: +question=Q9 | 原因: 服务繁忙"
        ));
    }

    #[test]
    fn test_nothing_committed_writes_nothing() {
        let path = temp_path("empty");
        let _ = std::fs::remove_file(&path);
        let writer = OrphanWriter::with_path(path.to_string_lossy());
        let ctx = QuestionCtx::new("algo101".to_string(), "T1".to_string(), 1);
        let err = MaterializeError {
            failed_step: EntityKind::Question,
            source: ApiError::bad_response("questions", 500, "x"),
            committed: MaterializationLog::default(),
        };

        assert!(!writer.write(&ctx, &err).unwrap());
        assert!(!path.exists());
    }
}
