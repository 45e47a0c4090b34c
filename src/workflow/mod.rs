pub mod question_ctx;
pub mod test_session;

pub use question_ctx::QuestionCtx;
pub use test_session::{IntentOutcome, SessionState, TestSession};
