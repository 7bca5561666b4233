//! 单个测评处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责处理单个测评文件，是测评级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **登记**：创建候选人和测试
//! 2. **作答**：打开每道带答案的题目并提交（并发受 Semaphore 限制）
//! 3. **完成**：文件要求时完成测试
//! 4. **统计输出**：记录成功 / 转写失败 / 默认评价 / 错误数量

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::error::{AppError, AppResult, FileError};
use crate::models::loaders::QuestionEntry;
use crate::models::{AssessmentFile, NewQuestion, QuestionId, TestId};
use crate::utils::logging::EvaluationStats;
use crate::workflow::{AnswerInput, AssessmentWorkflow, CallerCtx, EvaluationOutcome};

/// 批处理使用的管理员身份
pub const BATCH_ADMIN: &str = "batch";

/// 处理单个测评文件
///
/// # 参数
/// - `workflow`: 测评流程
/// - `assessment`: 测评文件内容
/// - `index`: 文件序号（用于日志）
/// - `semaphore`: 全局评估并发限制
///
/// # 返回
/// 返回本文件的评估统计
pub async fn process_assessment(
    workflow: Arc<AssessmentWorkflow>,
    assessment: AssessmentFile,
    index: usize,
    semaphore: Arc<Semaphore>,
) -> AppResult<EvaluationStats> {
    let admin = CallerCtx::admin(BATCH_ADMIN);
    log_assessment_start(index, &assessment);

    let candidate_id = workflow.create_candidate(
        &admin,
        &assessment.candidate.name,
        &assessment.candidate.position,
    )?;
    let questions = assessment
        .questions
        .iter()
        .map(|q| NewQuestion {
            text: q.text.clone(),
            context: q.context.clone(),
        })
        .collect();
    let test_id = workflow.create_test(
        &admin,
        candidate_id,
        &assessment.title,
        &assessment.description,
        questions,
    )?;

    let candidate = CallerCtx::candidate(candidate_id);
    let question_ids: Vec<QuestionId> = workflow
        .test(test_id)?
        .questions
        .iter()
        .map(|q| q.id)
        .collect();

    let mut stats = EvaluationStats::default();
    let mut handles = Vec::new();

    // ========== 提交所有带答案的题目 ==========
    for (entry, question_id) in assessment.questions.iter().zip(question_ids) {
        if !entry.has_answer() {
            continue;
        }

        let input = match build_input(&assessment, entry).await {
            Ok(input) => input,
            Err(e) => {
                error!("[测评 {}] 题目 {} 读取答案失败: {}", index, question_id, e);
                stats.errors += 1;
                continue;
            }
        };

        if let Err(e) = workflow.open_question(&candidate, test_id, question_id) {
            error!("[测评 {}] 题目 {} 无法打开: {}", index, question_id, e);
            stats.errors += 1;
            continue;
        }

        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| AppError::Other(format!("并发控制已关闭: {}", e)))?;
        let workflow = workflow.clone();
        let candidate = candidate.clone();

        let handle = tokio::spawn(async move {
            let _permit = permit;
            workflow.submit_answer(&candidate, question_id, input).await
        });
        handles.push((question_id, handle));
    }

    // 等待所有评估完成
    for (question_id, handle) in handles {
        match handle.await {
            Ok(Ok(EvaluationOutcome::Success { .. })) => stats.success += 1,
            Ok(Ok(EvaluationOutcome::TranscriptionFailed { reason })) => {
                warn!("[测评 {}] 题目 {} 转写失败: {}", index, question_id, reason);
                stats.transcription_failed += 1;
            }
            Ok(Ok(EvaluationOutcome::FeedbackFailed { .. })) => stats.feedback_failed += 1,
            Ok(Err(e)) => {
                error!("[测评 {}] 题目 {} 评估失败: {}", index, question_id, e);
                stats.errors += 1;
            }
            Err(e) => {
                error!("[测评 {}] 题目 {} 任务执行失败: {}", index, question_id, e);
                stats.errors += 1;
            }
        }
    }

    if assessment.complete {
        finish_test(&workflow, &candidate, test_id, index);
    }

    log_assessment_complete(index, &stats, workflow.aggregate_score(test_id)?);
    Ok(stats)
}

/// 构建作答输入，音频路径相对于 TOML 文件
async fn build_input(assessment: &AssessmentFile, entry: &QuestionEntry) -> AppResult<AnswerInput> {
    let mut input = AnswerInput {
        transcript: entry.answer_text.clone(),
        ..AnswerInput::default()
    };

    if let Some(audio) = &entry.answer_audio {
        let path = assessment.resolve_audio_path(audio);
        input.audio = read_audio(&path).await?;
        input.audio_ref = Some(path.display().to_string());
    }

    Ok(input)
}

async fn read_audio(path: &Path) -> AppResult<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|source| {
        FileError::ReadFailed {
            path: path.display().to_string(),
            source,
        }
        .into()
    })
}

/// 以候选人身份完成测试；没有任何作答时测试仍是 Pending，只记录警告
fn finish_test(workflow: &AssessmentWorkflow, candidate: &CallerCtx, test_id: TestId, index: usize) {
    match workflow.complete_test(candidate, test_id) {
        Ok(()) => info!("[测评 {}] ✓ 测试已完成", index),
        Err(e) => warn!("[测评 {}] ⚠️ 无法完成测试: {}", index, e),
    }
}

// ========== 日志辅助函数 ==========

fn log_assessment_start(index: usize, assessment: &AssessmentFile) {
    info!("[测评 {}] 开始处理", index);
    info!("[测评 {}] 标题: {}", index, assessment.title);
    info!(
        "[测评 {}] 候选人: {} ({})",
        index, assessment.candidate.name, assessment.candidate.position
    );
    info!(
        "[测评 {}] 题目总数: {}, 已作答: {}",
        index,
        assessment.questions.len(),
        assessment.questions.iter().filter(|q| q.has_answer()).count()
    );
}

fn log_assessment_complete(index: usize, stats: &EvaluationStats, score: Option<f64>) {
    info!(
        "[测评 {}] 评估统计: 成功 {}, 转写失败 {}, 默认评价 {}, 错误 {}",
        index, stats.success, stats.transcription_failed, stats.feedback_failed, stats.errors
    );
    match score {
        Some(score) => info!("[测评 {}] ✅ 测评处理完成，平均分 {:.1}\n", index, score),
        None => info!("[测评 {}] ✅ 测评处理完成，暂无分数\n", index),
    }
}
