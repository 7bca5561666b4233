//! 答案评估流程 - 流程层
//!
//! 核心职责：定义"一次作答"的完整处理流程
//!
//! 流程顺序：
//! 1. 校验测试状态与调用方
//! 2. 占用题目（同一道题只允许一个评估）
//! 3. 转写（或直接使用提交的文本）→ 立即写入 transcript
//! 4. 生成评价 → 解析 → 写入 feedback / score（失败时写入默认值）

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, WorkflowError};
use crate::infrastructure::AssessmentStore;
use crate::models::{FeedbackResult, QuestionId, TestStatus};
use crate::services::{parse_feedback, FeedbackProvider, TranscriptionProvider};
use crate::utils::logging::truncate_text;
use crate::workflow::caller_ctx::CallerCtx;
use crate::workflow::inflight::InFlightRegistry;

/// 一次作答的输入
#[derive(Debug, Clone, Default)]
pub struct AnswerInput {
    /// 录音数据，为空表示没有录音
    pub audio: Vec<u8>,
    /// 外部已经转写好的文本，仅在没有录音时使用
    pub transcript: Option<String>,
    /// 录音的存放位置（只做记录）
    pub audio_ref: Option<String>,
}

impl AnswerInput {
    pub fn audio(audio: Vec<u8>) -> Self {
        Self {
            audio,
            ..Self::default()
        }
    }

    pub fn text(transcript: impl Into<String>) -> Self {
        Self {
            transcript: Some(transcript.into()),
            ..Self::default()
        }
    }

    pub fn with_audio_ref(mut self, audio_ref: impl Into<String>) -> Self {
        self.audio_ref = Some(audio_ref.into());
        self
    }
}

/// 评估结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EvaluationOutcome {
    /// 转写与评价都成功（评价内容可能是解析后的默认值）
    Success {
        transcript: String,
        feedback: FeedbackResult,
    },
    /// 转写失败，题目没有任何改动
    TranscriptionFailed { reason: String },
    /// 评价服务调用失败，已写入 transcript 与默认评价
    FeedbackFailed {
        transcript: String,
        fallback: FeedbackResult,
    },
}

impl EvaluationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, EvaluationOutcome::Success { .. })
    }

    pub fn transcript(&self) -> Option<&str> {
        match self {
            EvaluationOutcome::Success { transcript, .. }
            | EvaluationOutcome::FeedbackFailed { transcript, .. } => Some(transcript),
            EvaluationOutcome::TranscriptionFailed { .. } => None,
        }
    }

    pub fn feedback(&self) -> Option<&FeedbackResult> {
        match self {
            EvaluationOutcome::Success { feedback, .. } => Some(feedback),
            EvaluationOutcome::FeedbackFailed { fallback, .. } => Some(fallback),
            EvaluationOutcome::TranscriptionFailed { .. } => None,
        }
    }
}

/// 答案评估流程
///
/// - 编排转写 → 评价 → 写入的完整流程
/// - 决定何时失败、何时使用默认值
/// - 外部调用期间不持有存储锁
/// - 只依赖能力接口（providers），不关心具体实现
pub struct AnswerEvaluationPipeline {
    store: Arc<AssessmentStore>,
    transcriber: Arc<dyn TranscriptionProvider>,
    feedback: Arc<dyn FeedbackProvider>,
    in_flight: InFlightRegistry,
    verbose_logging: bool,
}

impl AnswerEvaluationPipeline {
    pub fn new(
        store: Arc<AssessmentStore>,
        transcriber: Arc<dyn TranscriptionProvider>,
        feedback: Arc<dyn FeedbackProvider>,
    ) -> Self {
        Self {
            store,
            transcriber,
            feedback,
            in_flight: InFlightRegistry::new(),
            verbose_logging: false,
        }
    }

    pub fn with_verbose_logging(mut self, verbose: bool) -> Self {
        self.verbose_logging = verbose;
        self
    }

    /// 是否有评估正占用该题
    pub fn is_evaluating(&self, question_id: QuestionId) -> bool {
        self.in_flight.is_active(question_id)
    }

    pub async fn run(
        &self,
        ctx: &CallerCtx,
        question_id: QuestionId,
        input: AnswerInput,
    ) -> AppResult<EvaluationOutcome> {
        // ========== 步骤 1: 校验 ==========
        let snapshot = self.store.question(question_id)?;
        ctx.require_owner(snapshot.candidate_id, "submit_answer")?;
        if snapshot.test_status != TestStatus::InProgress {
            return Err(AppError::invalid_transition(
                snapshot.test_id,
                snapshot.test_status,
                "submit_answer",
            ));
        }

        // ========== 步骤 2: 占用题目 ==========
        let _permit = self
            .in_flight
            .try_acquire(question_id)
            .ok_or(WorkflowError::Busy { question_id })?;

        info!(
            "{} 📝 题目 {}: {}",
            ctx,
            question_id,
            truncate_text(&snapshot.question.text, 80)
        );

        // ========== 步骤 3: 获取答案文本 ==========
        let transcript = if input.audio.is_empty() {
            match input.transcript {
                Some(text) if !text.trim().is_empty() => {
                    debug!("{} 未提供录音，使用提交的文本答案", ctx);
                    text
                }
                _ => return Err(WorkflowError::MissingInput { question_id }.into()),
            }
        } else {
            info!(
                "{} 🎙️ 正在转写录音 ({} 字节, {})...",
                ctx,
                input.audio.len(),
                self.transcriber.name()
            );
            match self.transcriber.transcribe(&input.audio).await {
                Ok(text) if !text.trim().is_empty() => text,
                Ok(_) => {
                    warn!("{} ⚠️ 题目 {} 转写结果为空", ctx, question_id);
                    return Ok(EvaluationOutcome::TranscriptionFailed {
                        reason: format!("{} 返回了空白文本", self.transcriber.name()),
                    });
                }
                Err(e) => {
                    warn!("{} ⚠️ 题目 {} 转写失败: {}", ctx, question_id, e);
                    return Ok(EvaluationOutcome::TranscriptionFailed {
                        reason: e.to_string(),
                    });
                }
            }
        };

        // ========== 步骤 4: 写入 transcript ==========
        let stored = transcript.clone();
        self.store.update_question(question_id, |_, q| {
            q.record_transcript(stored, input.audio_ref);
            Ok(())
        })?;
        info!(
            "{} ✓ 已记录答案: {}",
            ctx,
            truncate_text(&transcript, 80)
        );

        // ========== 步骤 5: 生成评价 ==========
        info!("{} 🤖 正在生成评价 ({})...", ctx, self.feedback.name());
        let (feedback, provider_failed) = match self.feedback.generate(&transcript).await {
            Ok(raw) => {
                if self.verbose_logging {
                    debug!("{} 评价原文: {}", ctx, raw);
                }
                let parsed = parse_feedback(&raw);
                if parsed.is_default() {
                    warn!("{} ⚠️ 评价内容无法解析，使用默认值", ctx);
                }
                (parsed, false)
            }
            Err(e) => {
                warn!("{} ⚠️ 评价生成失败，写入默认评价: {}", ctx, e);
                (FeedbackResult::default(), true)
            }
        };

        // ========== 步骤 6: 写入评价 ==========
        let committed = feedback.clone();
        let written = self.store.update_question(question_id, |_, q| {
            if q.is_overridden() {
                return Ok(false);
            }
            q.record_evaluation(committed);
            Ok(true)
        })?;

        if written {
            info!("{} ✓ 题目 {} 得分: {:.1}", ctx, question_id, feedback.score);
        } else {
            info!(
                "{} 题目 {} 已被管理员人工评分，保留人工结果",
                ctx, question_id
            );
        }

        Ok(if provider_failed {
            EvaluationOutcome::FeedbackFailed {
                transcript,
                fallback: feedback,
            }
        } else {
            EvaluationOutcome::Success {
                transcript,
                feedback,
            }
        })
    }
}
