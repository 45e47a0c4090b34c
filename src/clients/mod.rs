pub mod backend;
pub mod forum_client;
pub mod memory_api;
pub mod payload;
pub mod test_api;

pub use backend::ApiBackend;
pub use forum_client::ForumClient;
pub use memory_api::{ApiCall, ApiOp, InMemoryApi};
pub use payload::{ArgumentInput, OptionInput, QuestionInput, SignatureInput, TestCaseInput, TestInput};
pub use test_api::TestApi;
