pub mod builder;
pub mod code_builder;
pub mod draft_store;
pub mod materialize;
pub mod mcq_builder;
pub mod orphan_writer;
pub mod preview;
pub mod question_form;

pub use builder::QuestionBuilder;
pub use code_builder::{CodeQuestionBuilder, TestCaseDraft};
pub use draft_store::DraftStore;
pub use materialize::{EntityKind, MaterializationLog, Step, StepOutcome, StepRecorder};
pub use mcq_builder::{McqOptionDraft, McqQuestionBuilder};
pub use orphan_writer::OrphanWriter;
pub use preview::{PreviewIntent, PreviewMode, QuestionPreview};
pub use question_form::QuestionForm;
