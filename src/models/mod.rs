pub mod answer;
pub mod loaders;
pub mod question;

pub use answer::{Answer, AnswerSnapshot, VoiceState};
pub use loaders::{load_test_definition, parse_test_definition};
pub use question::{AttemptId, Modality, Question, Section, SectionOrdering, TestDefinition};
