pub mod store;

pub use store::{AssessmentStore, QuestionSnapshot};
