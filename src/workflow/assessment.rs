//! 测评流程 - 流程层
//!
//! 核心职责：定义测试的生命周期以及每个入口的权限
//!
//! Pending ──open_question──▶ InProgress ──complete_test──▶ Completed

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{AppResult, WorkflowError};
use crate::infrastructure::{AssessmentStore, QuestionSnapshot};
use crate::models::{is_valid_score, CandidateId, NewQuestion, QuestionId, Test, TestId, TestStatus};
use crate::services::{
    build_candidate_report, CandidateReport, FeedbackProvider, QuestionBank, ReferenceAnswer,
    ReferenceQaProvider, TranscriptionProvider,
};
use crate::workflow::caller_ctx::CallerCtx;
use crate::workflow::evaluation::{AnswerEvaluationPipeline, AnswerInput, EvaluationOutcome};

/// 测评流程
///
/// - 管理候选人、测试、题目的创建与状态迁移
/// - 所有状态迁移都在存储锁内完成
/// - 作答评估交给 `AnswerEvaluationPipeline`
pub struct AssessmentWorkflow {
    store: Arc<AssessmentStore>,
    pipeline: AnswerEvaluationPipeline,
    reference_qa: Arc<dyn ReferenceQaProvider>,
    question_bank: QuestionBank,
}

impl AssessmentWorkflow {
    pub fn new(
        store: Arc<AssessmentStore>,
        transcriber: Arc<dyn TranscriptionProvider>,
        feedback: Arc<dyn FeedbackProvider>,
        reference_qa: Arc<dyn ReferenceQaProvider>,
    ) -> Self {
        Self {
            pipeline: AnswerEvaluationPipeline::new(store.clone(), transcriber, feedback),
            store,
            reference_qa,
            question_bank: QuestionBank::new(),
        }
    }

    pub fn with_question_bank(mut self, question_bank: QuestionBank) -> Self {
        self.question_bank = question_bank;
        self
    }

    pub fn with_verbose_logging(mut self, verbose: bool) -> Self {
        self.pipeline = self.pipeline.with_verbose_logging(verbose);
        self
    }

    pub fn store(&self) -> &Arc<AssessmentStore> {
        &self.store
    }

    // ========== 候选人与测试 ==========

    pub fn create_candidate(
        &self,
        ctx: &CallerCtx,
        name: &str,
        position: &str,
    ) -> AppResult<CandidateId> {
        ctx.require_admin("create_candidate")?;
        let id = self.store.insert_candidate(name, position);
        info!("{} ✓ 创建候选人 #{}: {} ({})", ctx, id, name, position);
        Ok(id)
    }

    pub fn create_test(
        &self,
        ctx: &CallerCtx,
        candidate_id: CandidateId,
        title: &str,
        description: &str,
        questions: Vec<NewQuestion>,
    ) -> AppResult<TestId> {
        ctx.require_admin("create_test")?;
        let count = questions.len();
        let id = self
            .store
            .insert_test(candidate_id, title, description, questions)?;
        info!(
            "{} ✓ 为候选人 #{} 创建测试 #{} \"{}\" ({} 道题)",
            ctx, candidate_id, id, title, count
        );
        Ok(id)
    }

    /// 用题库前几道题创建示例测试
    pub fn create_sample_test(&self, ctx: &CallerCtx, candidate_id: CandidateId) -> AppResult<TestId> {
        self.create_test(
            ctx,
            candidate_id,
            "Technical Interview Assessment",
            "Sample assessment generated from the built-in question bank",
            self.question_bank.sample_test(),
        )
    }

    pub fn append_question(
        &self,
        ctx: &CallerCtx,
        test_id: TestId,
        question: NewQuestion,
    ) -> AppResult<QuestionId> {
        ctx.require_admin("append_question")?;
        let id = self.store.append_question(test_id, question)?;
        info!("{} ✓ 测试 #{} 新增题目 {}", ctx, test_id, id);
        Ok(id)
    }

    pub fn remove_question(&self, ctx: &CallerCtx, question_id: QuestionId) -> AppResult<()> {
        ctx.require_admin("remove_question")?;
        let removed = self.store.remove_question(question_id)?;
        info!("{} ✓ 删除题目 {}: {}", ctx, question_id, removed.text);
        Ok(())
    }

    // ========== 状态迁移 ==========

    /// 打开一道题，首次打开时 Pending → InProgress（仅限候选人本人）
    pub fn open_question(
        &self,
        ctx: &CallerCtx,
        test_id: TestId,
        question_id: QuestionId,
    ) -> AppResult<TestStatus> {
        let (status, started) = self.store.update_test(test_id, |test| {
            ctx.require_candidate_owner(test.candidate_id, "open_question")?;
            if test.question(question_id).is_none() {
                return Err(WorkflowError::QuestionNotFound { question_id }.into());
            }
            let started = test.mark_opened();
            Ok((test.status, started))
        })?;

        if started {
            info!("{} ▶ 测试 #{} 开始作答", ctx, test_id);
        }
        Ok(status)
    }

    pub async fn submit_answer(
        &self,
        ctx: &CallerCtx,
        question_id: QuestionId,
        input: AnswerInput,
    ) -> AppResult<EvaluationOutcome> {
        self.pipeline.run(ctx, question_id, input).await
    }

    /// 完成测试，InProgress → Completed（仅限候选人本人）
    pub fn complete_test(&self, ctx: &CallerCtx, test_id: TestId) -> AppResult<()> {
        let (scored, total) = self.store.update_test(test_id, |test| {
            ctx.require_candidate_owner(test.candidate_id, "complete_test")?;
            test.complete()?;
            Ok((test.scored_count(), test.questions.len()))
        })?;

        if scored < total {
            warn!(
                "{} 测试 #{} 已完成，但只有 {}/{} 道题有分数",
                ctx, test_id, scored, total
            );
        } else {
            info!("{} ✓ 测试 #{} 已完成", ctx, test_id);
        }
        Ok(())
    }

    /// 管理员人工评分，任何状态下都可以覆盖
    pub fn override_score(
        &self,
        ctx: &CallerCtx,
        question_id: QuestionId,
        score: f64,
        feedback_text: &str,
    ) -> AppResult<()> {
        ctx.require_admin("override_score")?;
        if !is_valid_score(score) {
            return Err(WorkflowError::InvalidScore { score }.into());
        }

        let reviewer = ctx.display_name();
        self.store.update_question(question_id, |_, q| {
            q.record_override(score, feedback_text.to_string(), reviewer);
            Ok(())
        })?;

        if self.pipeline.is_evaluating(question_id) {
            info!(
                "{} 题目 {} 正在评估中，人工评分将被保留",
                ctx, question_id
            );
        }
        info!("{} ✓ 题目 {} 人工评分: {:.1}", ctx, question_id, score);
        Ok(())
    }

    // ========== 参考问答 ==========

    /// 针对某道题获取参考答案，不修改题目
    pub async fn check_reference(
        &self,
        ctx: &CallerCtx,
        question_id: QuestionId,
    ) -> AppResult<ReferenceAnswer> {
        ctx.require_admin("check_reference")?;
        let snapshot = self.store.question(question_id)?;
        let question = &snapshot.question;
        let answer = self
            .reference_qa
            .answer(&question.text, question.reference_context())
            .await?;
        info!(
            "{} ✓ 题目 {} 参考答案 (置信度 {:.2})",
            ctx, question_id, answer.confidence
        );
        Ok(answer)
    }

    /// 自由提问，`context` 为空时使用问题本身
    pub async fn ask_reference(
        &self,
        ctx: &CallerCtx,
        question: &str,
        context: &str,
    ) -> AppResult<ReferenceAnswer> {
        ctx.require_admin("ask_reference")?;
        let context = if context.trim().is_empty() {
            question
        } else {
            context
        };
        Ok(self.reference_qa.answer(question, context).await?)
    }

    pub fn generate_questions(&self, ctx: &CallerCtx) -> AppResult<Vec<String>> {
        ctx.require_admin("generate_questions")?;
        Ok(self.question_bank.generate())
    }

    // ========== 查询 ==========

    pub fn aggregate_score(&self, test_id: TestId) -> AppResult<Option<f64>> {
        Ok(self.store.test(test_id)?.aggregate_score())
    }

    pub fn candidate_report(
        &self,
        ctx: &CallerCtx,
        candidate_id: CandidateId,
    ) -> AppResult<CandidateReport> {
        ctx.require_admin("candidate_report")?;
        let candidate = self.store.candidate(candidate_id)?;
        let tests = self.store.tests_of(candidate_id);
        Ok(build_candidate_report(&candidate, &tests))
    }

    /// 所有候选人的报告
    pub fn all_reports(&self, ctx: &CallerCtx) -> AppResult<Vec<CandidateReport>> {
        ctx.require_admin("candidate_report")?;
        Ok(self
            .store
            .candidates()
            .iter()
            .map(|c| build_candidate_report(c, &self.store.tests_of(c.id)))
            .collect())
    }

    pub fn test(&self, test_id: TestId) -> AppResult<Test> {
        self.store.test(test_id)
    }

    pub fn question(&self, question_id: QuestionId) -> AppResult<QuestionSnapshot> {
        self.store.question(question_id)
    }
}
