//! 草稿存储服务 - 业务能力层
//!
//! 每个社区只有一个草稿槽，写入即整体覆盖（后写者胜），没有合并也没有版本号。
//! 读取时过滤掉：不存在、社区不匹配、超过有效期的快照；过期和损坏的快照会被顺手清除

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::DEFAULT_DRAFT_TTL_MS;
use crate::error::DraftError;
use crate::infrastructure::{Clock, SlotBackend, SystemClock};
use crate::models::DraftSnapshot;

/// 草稿槽 key 前缀
const SCOPE_PREFIX: &str = "test-draft";

/// 草稿存储
pub struct DraftStore<B> {
    backend: B,
    clock: Arc<dyn Clock>,
    ttl_ms: i64,
}

impl<B: SlotBackend> DraftStore<B> {
    /// 使用系统时钟和默认有效期创建
    pub fn new(backend: B) -> Self {
        Self::with_clock(backend, DEFAULT_DRAFT_TTL_MS, Arc::new(SystemClock))
    }

    pub fn with_clock(backend: B, ttl_ms: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            clock,
            ttl_ms,
        }
    }

    /// 社区对应的草稿槽 key
    pub fn scope_key(community_id: &str) -> String {
        format!("{}:{}", SCOPE_PREFIX, community_id)
    }

    /// 当前时间（毫秒），用于给新快照打时间戳
    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    pub fn ttl_ms(&self) -> i64 {
        self.ttl_ms
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// 读取社区的草稿
    ///
    /// 不产生可见错误：任何无法使用的草稿都按"没有草稿"处理
    pub fn load(&self, community_id: &str) -> Option<DraftSnapshot> {
        let key = Self::scope_key(community_id);

        let raw = match self.backend.read(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("读取草稿失败 {}: {}", key, e);
                return None;
            }
        };

        let snapshot: DraftSnapshot = match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("草稿无法解析，已丢弃 {}: {}", key, e);
                self.discard(&key);
                return None;
            }
        };

        if snapshot.community_id != community_id {
            debug!(
                "草稿属于社区 {}，与请求的 {} 不匹配",
                snapshot.community_id, community_id
            );
            return None;
        }

        if let Err(e) = snapshot.check_invariant() {
            warn!("草稿不满足约束，已丢弃 {}: {}", key, e);
            self.discard(&key);
            return None;
        }

        let now = self.clock.now_millis();
        if snapshot.is_expired(now, self.ttl_ms) {
            debug!(
                "草稿已过期 {} (年龄 {} ms > {} ms)，已清除",
                key,
                snapshot.age_ms(now),
                self.ttl_ms
            );
            self.discard(&key);
            return None;
        }

        Some(snapshot)
    }

    /// 整体覆盖写入快照
    pub fn save(&self, snapshot: &DraftSnapshot) -> Result<(), DraftError> {
        snapshot.check_invariant()?;
        let key = Self::scope_key(&snapshot.community_id);
        let raw = serde_json::to_string(snapshot)?;
        self.backend.write(&key, &raw)?;
        debug!(
            "草稿已保存 {} (testId={:?}, 题目数={})",
            key,
            snapshot.test_id,
            snapshot.questions.len()
        );
        Ok(())
    }

    /// 删除社区的草稿
    pub fn clear(&self, community_id: &str) -> Result<(), DraftError> {
        self.backend.remove(&Self::scope_key(community_id))
    }

    fn discard(&self, key: &str) {
        if let Err(e) = self.backend.remove(key) {
            warn!("清除草稿失败 {}: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{ManualClock, MemorySlot};
    use crate::models::{McqOption, McqQuestion, Question};

    const MINUTE: i64 = 60_000;

    fn store(clock: Arc<ManualClock>) -> DraftStore<MemorySlot> {
        DraftStore::with_clock(MemorySlot::new(), DEFAULT_DRAFT_TTL_MS, clock)
    }

    fn snapshot_with_question(created_at: i64) -> DraftSnapshot {
        let mut snapshot = DraftSnapshot::new("algo101", created_at);
        snapshot.test_id = Some("T1".to_string());
        snapshot.title = "小测".to_string();
        snapshot.questions.push(Question::Mcq(McqQuestion {
            id: "Q1".to_string(),
            body: "1 + 1 = ?".to_string(),
            options: vec![
                McqOption {
                    id: "O1".to_string(),
                    body: "2".to_string(),
                    is_correct: true,
                },
                McqOption {
                    id: "O2".to_string(),
                    body: "3".to_string(),
                    is_correct: false,
                },
            ],
        }));
        snapshot
    }

    #[test]
    fn test_load_missing_returns_none() {
        let store = store(Arc::new(ManualClock::new(0)));
        assert!(store.load("algo101").is_none());
    }

    #[test]
    fn test_load_recent_snapshot_unchanged_and_idempotent() {
        let clock = Arc::new(ManualClock::new(0));
        let store = store(clock.clone());
        let snapshot = snapshot_with_question(0);
        store.save(&snapshot).unwrap();

        clock.advance(10 * MINUTE);
        let first = store.load("algo101");
        let second = store.load("algo101");

        assert_eq!(first.as_ref(), Some(&snapshot));
        assert_eq!(first, second);
        assert!(store.load("discrete-math").is_none());
    }

    #[test]
    fn test_expired_snapshot_is_cleared() {
        let clock = Arc::new(ManualClock::new(0));
        let store = store(clock.clone());
        store.save(&snapshot_with_question(0)).unwrap();

        clock.advance(61 * MINUTE);
        assert!(store.load("algo101").is_none());
        assert!(!store.backend().contains("test-draft:algo101"));
        assert!(store.load("algo101").is_none());
    }

    #[test]
    fn test_exactly_ttl_old_is_still_valid() {
        let clock = Arc::new(ManualClock::new(0));
        let store = store(clock.clone());
        store.save(&snapshot_with_question(0)).unwrap();

        clock.set(DEFAULT_DRAFT_TTL_MS);
        assert!(store.load("algo101").is_some());
        clock.advance(1);
        assert!(store.load("algo101").is_none());
    }

    #[test]
    fn test_community_mismatch_inside_slot_is_rejected_but_kept() {
        let store = store(Arc::new(ManualClock::new(0)));
        let raw = serde_json::to_string(&snapshot_with_question(0)).unwrap();
        store.backend().put_raw("test-draft:discrete-math", &raw);

        assert!(store.load("discrete-math").is_none());
        assert!(store.backend().contains("test-draft:discrete-math"));
    }

    #[test]
    fn test_corrupt_slot_is_discarded() {
        let store = store(Arc::new(ManualClock::new(0)));
        store.backend().put_raw("test-draft:algo101", "{not json");

        assert!(store.load("algo101").is_none());
        assert!(!store.backend().contains("test-draft:algo101"));
    }

    #[test]
    fn test_save_rejects_questions_without_test_id() {
        let store = store(Arc::new(ManualClock::new(0)));
        let mut snapshot = snapshot_with_question(0);
        snapshot.test_id = None;

        assert!(matches!(
            store.save(&snapshot),
            Err(DraftError::QuestionsWithoutTest { count: 1 })
        ));
        assert!(store.load("algo101").is_none());
    }

    #[test]
    fn test_save_overwrites_previous_draft() {
        let store = store(Arc::new(ManualClock::new(0)));
        store.save(&snapshot_with_question(0)).unwrap();

        let mut other = DraftSnapshot::new("algo101", 0);
        other.title = "另一个测试".to_string();
        store.save(&other).unwrap();

        let loaded = store.load("algo101").unwrap();
        assert_eq!(loaded.title, "另一个测试");
        assert!(loaded.questions.is_empty());
    }

    #[test]
    fn test_clear_removes_slot() {
        let store = store(Arc::new(ManualClock::new(0)));
        store.save(&snapshot_with_question(0)).unwrap();
        store.clear("algo101").unwrap();
        assert!(store.load("algo101").is_none());
    }
}
