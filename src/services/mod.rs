pub mod feedback_parser;
pub mod llm_service;
#[cfg(test)]
pub(crate) mod mock;
pub mod providers;
pub mod question_bank;
pub mod report;
pub mod transcription;

pub use feedback_parser::parse_feedback;
pub use llm_service::LlmService;
pub use providers::{FeedbackProvider, ReferenceAnswer, ReferenceQaProvider, TranscriptionProvider};
pub use question_bank::QuestionBank;
pub use report::{build_candidate_report, CandidateReport};
pub use transcription::HttpTranscriber;
