//! 时钟 - 基础设施层
//!
//! 草稿 TTL 以毫秒时间戳计算，测试中需要能拨动时间

use std::sync::atomic::{AtomicI64, Ordering};

/// 提供当前时间（毫秒时间戳）
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// 系统时钟
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// 手动时钟，时间只在调用 `advance`/`set` 时变化
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(start_ms),
        }
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }

    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
