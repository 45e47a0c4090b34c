//! 物化步骤记录
//!
//! 一道题的物化是一串互相依赖、非原子的远程调用。这里把每一步的结果记下来，
//! 失败时随错误一起交出去，调用方据此知道远端留下了哪些孤儿实体。
//! 当前不做补偿删除，也不从失败步骤续跑

use std::fmt;

use crate::error::{ApiError, ApiResult, MaterializeError};
use crate::models::RemoteId;

/// 子实体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Question,
    Signature,
    TestCase,
    Argument,
    Option,
}

impl EntityKind {
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Question => "question",
            EntityKind::Signature => "signature",
            EntityKind::TestCase => "testCase",
            EntityKind::Argument => "argument",
            EntityKind::Option => "option",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Created,
    Updated,
    Deleted,
}

/// 已在远端提交的一步
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub outcome: StepOutcome,
    pub kind: EntityKind,
    pub id: RemoteId,
}

/// 已提交步骤的有序记录
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializationLog {
    steps: Vec<Step>,
}

impl MaterializationLog {
    pub fn created(&mut self, kind: EntityKind, id: impl Into<RemoteId>) {
        self.push(StepOutcome::Created, kind, id.into());
    }

    pub fn updated(&mut self, kind: EntityKind, id: impl Into<RemoteId>) {
        self.push(StepOutcome::Updated, kind, id.into());
    }

    pub fn deleted(&mut self, kind: EntityKind, id: impl Into<RemoteId>) {
        self.push(StepOutcome::Deleted, kind, id.into());
    }

    fn push(&mut self, outcome: StepOutcome, kind: EntityKind, id: RemoteId) {
        self.steps.push(Step { outcome, kind, id });
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 新创建的实体 id（失败时即孤儿实体）
    pub fn created_ids(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Created)
            .map(|s| s.id.as_str())
            .collect()
    }

    pub fn count(&self, outcome: StepOutcome, kind: EntityKind) -> usize {
        self.steps
            .iter()
            .filter(|s| s.outcome == outcome && s.kind == kind)
            .count()
    }
}

impl fmt::Display for MaterializationLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return f.write_str("(无)");
        }
        let parts: Vec<String> = self
            .steps
            .iter()
            .map(|s| {
                let verb = match s.outcome {
                    StepOutcome::Created => "+",
                    StepOutcome::Updated => "~",
                    StepOutcome::Deleted => "-",
                };
                format!("{}{}={}", verb, s.kind, s.id)
            })
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// 按顺序执行步骤时的记录器
///
/// 每一步的结果交给记录器：成功则记账并返回 id，失败则把已有记录连同错误一起交出
#[derive(Debug, Default)]
pub struct StepRecorder {
    log: MaterializationLog,
}

impl StepRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(
        &mut self,
        kind: EntityKind,
        result: ApiResult<RemoteId>,
    ) -> Result<RemoteId, MaterializeError> {
        match result {
            Ok(id) => {
                self.log.created(kind, id.clone());
                Ok(id)
            }
            Err(source) => Err(self.abort(kind, source)),
        }
    }

    pub fn updated(
        &mut self,
        kind: EntityKind,
        result: ApiResult<RemoteId>,
    ) -> Result<RemoteId, MaterializeError> {
        match result {
            Ok(id) => {
                self.log.updated(kind, id.clone());
                Ok(id)
            }
            Err(source) => Err(self.abort(kind, source)),
        }
    }

    pub fn deleted(
        &mut self,
        kind: EntityKind,
        id: &str,
        result: ApiResult<()>,
    ) -> Result<(), MaterializeError> {
        match result {
            Ok(()) => {
                self.log.deleted(kind, id);
                Ok(())
            }
            Err(source) => Err(self.abort(kind, source)),
        }
    }

    pub fn log(&self) -> &MaterializationLog {
        &self.log
    }

    pub fn finish(self) -> MaterializationLog {
        self.log
    }

    fn abort(&mut self, kind: EntityKind, source: ApiError) -> MaterializeError {
        MaterializeError {
            failed_step: kind,
            source,
            committed: std::mem::take(&mut self.log),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_hands_over_committed_steps_on_failure() {
        let mut recorder = StepRecorder::new();
        let q = recorder
            .created(EntityKind::Question, Ok("Q1".to_string()))
            .unwrap();
        assert_eq!(q, "Q1");
        recorder
            .created(EntityKind::Signature, Ok("S1".to_string()))
            .unwrap();

        let err = recorder
            .created(
                EntityKind::TestCase,
                Err(ApiError::bad_response("test-cases", 500, "boom")),
            )
            .unwrap_err();

        assert_eq!(err.failed_step, EntityKind::TestCase);
        assert_eq!(err.committed.created_ids(), vec!["Q1", "S1"]);
    }

    #[test]
    fn test_log_display_and_counts() {
        let mut log = MaterializationLog::default();
        assert_eq!(log.to_string(), "(无)");

        log.updated(EntityKind::Question, "Q1");
        log.deleted(EntityKind::TestCase, "C1");
        log.created(EntityKind::TestCase, "C2");

        assert_eq!(log.to_string(), "~question=Q1, -testCase=C1, +testCase=C2");
        assert_eq!(log.count(StepOutcome::Created, EntityKind::TestCase), 1);
        assert_eq!(log.created_ids(), vec!["C2"]);
        assert_eq!(log.len(), 3);
    }
}
