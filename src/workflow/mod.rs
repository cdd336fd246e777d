pub mod attempt_ctx;
pub mod voice_flow;

pub use attempt_ctx::AttemptCtx;
pub use voice_flow::{VoiceResponse, DEFAULT_PREP_SECONDS};
