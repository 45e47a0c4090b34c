//! 基础设施层：持有稀缺资源，只暴露能力

pub mod clock;
pub mod draft_slot;
pub mod http_executor;

pub use clock::{Clock, ManualClock, SystemClock};
pub use draft_slot::{FileSlot, MemorySlot, SlotBackend};
pub use http_executor::HttpExecutor;
