pub mod assessment;
pub mod caller_ctx;
pub mod evaluation;
pub mod inflight;

pub use assessment::AssessmentWorkflow;
pub use caller_ctx::{Actor, CallerCtx};
pub use evaluation::{AnswerEvaluationPipeline, AnswerInput, EvaluationOutcome};
pub use inflight::{EvaluationPermit, InFlightRegistry};
