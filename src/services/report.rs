//! 候选人报告 - 业务能力层
//!
//! 把候选人及其测试整理成可序列化的报告（供管理员查看 / 导出成绩单）

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::test::mean;
use crate::models::{
    Candidate, CandidateId, Question, QuestionId, ReviewStatus, Test, TestId, TestStatus,
};

#[derive(Debug, Clone, Serialize)]
pub struct QuestionReport {
    pub id: QuestionId,
    pub order: usize,
    pub question: String,
    pub answer: Option<String>,
    pub score: Option<f64>,
    pub feedback: Option<String>,
    pub overridden: bool,
    pub audio_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestReport {
    pub id: TestId,
    pub title: String,
    pub status: TestStatus,
    pub score: Option<f64>,
    pub completed_at: Option<DateTime<Utc>>,
    pub questions: Vec<QuestionReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateReport {
    pub id: CandidateId,
    pub name: String,
    pub position: String,
    /// 所有已打分题目的平均分，无打分时为空
    pub score: Option<f64>,
    pub review_status: ReviewStatus,
    pub tests: Vec<TestReport>,
}

impl QuestionReport {
    fn from_question(q: &Question) -> Self {
        Self {
            id: q.id,
            order: q.order,
            question: q.text.clone(),
            answer: q.transcript.clone(),
            score: q.score,
            feedback: q.feedback.as_ref().map(|f| f.summary()),
            overridden: q.is_overridden(),
            audio_ref: q.audio_ref.clone(),
        }
    }
}

impl TestReport {
    fn from_test(test: &Test) -> Self {
        let mut questions: Vec<QuestionReport> =
            test.questions.iter().map(QuestionReport::from_question).collect();
        questions.sort_by_key(|q| q.order);
        Self {
            id: test.id,
            title: test.title.clone(),
            status: test.status,
            score: test.aggregate_score(),
            completed_at: test.completed_at,
            questions,
        }
    }
}

/// 生成候选人报告
pub fn build_candidate_report(candidate: &Candidate, tests: &[Test]) -> CandidateReport {
    let score = mean(
        tests
            .iter()
            .flat_map(|t| t.questions.iter().filter_map(|q| q.score)),
    );

    let review_status =
        if !tests.is_empty() && tests.iter().all(|t| t.status == TestStatus::Completed) {
            ReviewStatus::Ready
        } else {
            ReviewStatus::Pending
        };

    CandidateReport {
        id: candidate.id,
        name: candidate.name.clone(),
        position: candidate.position.clone(),
        score,
        review_status,
        tests: tests.iter().map(TestReport::from_test).collect(),
    }
}
