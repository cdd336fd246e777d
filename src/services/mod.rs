pub mod answer_store;
pub mod capture;
pub mod countdown;
pub mod navigation;
pub mod submission;

pub use answer_store::AnswerStore;
pub use capture::{CaptureDevice, LoggingCapture, RecordingCapture};
pub use countdown::{CountdownTimer, TimerEvent, TimerState};
pub use navigation::{Position, QuestionNavigator};
pub use submission::{
    JsonFileSubmitter, MemorySubmitter, SubmissionOutcome, Submission, SubmitReason, Submitter,
};
