pub mod candidate;
pub mod loaders;
pub mod question;

pub use candidate::{Candidate, CandidateId, ReviewStatus};
pub use loaders::{load_all_assessment_files, load_assessment_file, AssessmentFile};
pub use question::{
    is_valid_score, Feedback, FeedbackResult, NewQuestion, Question, QuestionId, DEFAULT_SCORE,
    PLACEHOLDER,
};
pub use test::{Test, TestId, TestStatus};
