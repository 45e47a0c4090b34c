pub mod definition;
pub mod draft;
pub mod kind;
pub mod loaders;
pub mod question;

pub use definition::{OptionDefinition, QuestionDefinition, TestCaseDefinition, TestDefinition};
pub use draft::DraftSnapshot;
pub use kind::QuestionKind;
pub use loaders::{load_all_toml_files, load_toml_to_definition};
pub use question::{Argument, CodeQuestion, McqOption, McqQuestion, Question, RemoteId, Signature, TestCase};
