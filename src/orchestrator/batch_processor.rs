//! 批量测评处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量测评的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：创建转写 / LLM 客户端并组装测评流程
//! 2. **批量加载**：扫描并加载所有测评文件（`Vec<AssessmentFile>`）
//! 3. **并发控制**：使用 Semaphore 限制同时进行的答案评估数量
//! 4. **报告输出**：把所有候选人的报告写成一个 JSON 文件
//! 5. **全局统计**：汇总所有测评的处理结果
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单道题的细节
//! - **资源所有者**：唯一持有外部客户端的模块
//! - **向下委托**：委托 assessment_processor 处理单个测评文件

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppResult, FileError};
use crate::infrastructure::AssessmentStore;
use crate::models::AssessmentFile;
use crate::orchestrator::assessment_processor::{self, BATCH_ADMIN};
use crate::services::{HttpTranscriber, LlmService};
use crate::utils::logging::{self, EvaluationStats};
use crate::workflow::{AssessmentWorkflow, CallerCtx};

/// 应用主结构
pub struct App {
    config: Config,
    workflow: Arc<AssessmentWorkflow>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> AppResult<Self> {
        logging::log_startup(config.max_concurrent_evaluations, &config.llm_model_name);

        if config.llm_api_key.is_empty() {
            warn!("⚠️ 未设置 LLM_API_KEY，评价请求可能会被拒绝");
        }

        let transcriber = Arc::new(HttpTranscriber::new(&config)?);
        // 评价与参考问答共用同一个 LLM 客户端
        let llm = Arc::new(LlmService::new(&config));

        let workflow = AssessmentWorkflow::new(
            Arc::new(AssessmentStore::new()),
            transcriber,
            llm.clone(),
            llm,
        )
        .with_verbose_logging(config.verbose_logging);

        Ok(Self::with_workflow(config, workflow))
    }

    /// 使用已组装好的流程创建应用
    pub fn with_workflow(config: Config, workflow: AssessmentWorkflow) -> Self {
        Self {
            config,
            workflow: Arc::new(workflow),
        }
    }

    pub fn workflow(&self) -> &Arc<AssessmentWorkflow> {
        &self.workflow
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> AppResult<EvaluationStats> {
        let assessments = self.load_assessments().await?;

        if assessments.is_empty() {
            warn!("⚠️ 没有找到待处理的TOML文件，程序结束");
            return Ok(EvaluationStats::default());
        }

        let total = assessments.len();
        logging::log_assessments_loaded(total, self.config.max_concurrent_evaluations);

        let stats = self.process_all(assessments).await;

        self.write_report().await?;

        logging::print_final_stats(&stats, total, &self.config.report_output_file);

        Ok(stats)
    }

    /// 加载测评文件
    async fn load_assessments(&self) -> AppResult<Vec<AssessmentFile>> {
        info!("\n📁 正在扫描待处理的测评文件...");
        crate::models::load_all_assessment_files(&self.config.assessments_folder).await
    }

    /// 处理所有测评文件，评估并发由同一个 Semaphore 控制
    async fn process_all(&self, assessments: Vec<AssessmentFile>) -> EvaluationStats {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_evaluations));
        let mut handles = Vec::new();

        for (idx, assessment) in assessments.into_iter().enumerate() {
            let index = idx + 1;
            let workflow = self.workflow.clone();
            let semaphore = semaphore.clone();

            let handle = tokio::spawn(async move {
                assessment_processor::process_assessment(workflow, assessment, index, semaphore)
                    .await
            });
            handles.push((index, handle));
        }

        let (indices, handles): (Vec<usize>, Vec<_>) = handles.into_iter().unzip();
        let results = join_all(handles).await;

        let mut stats = EvaluationStats::default();
        for (index, result) in indices.into_iter().zip(results) {
            match result {
                Ok(Ok(file_stats)) => stats.merge(file_stats),
                Ok(Err(e)) => {
                    error!("[测评 {}] ❌ 处理过程中发生错误: {}", index, e);
                    stats.errors += 1;
                }
                Err(e) => {
                    error!("[测评 {}] 任务执行失败: {}", index, e);
                    stats.errors += 1;
                }
            }
        }
        stats
    }

    /// 写出所有候选人的报告
    async fn write_report(&self) -> AppResult<()> {
        let reports = self.workflow.all_reports(&CallerCtx::admin(BATCH_ADMIN))?;
        let json = serde_json::to_string_pretty(&reports)?;
        let path = &self.config.report_output_file;

        tokio::fs::write(path, json)
            .await
            .map_err(|source| FileError::WriteFailed {
                path: path.clone(),
                source,
            })?;

        info!("✓ 已写出 {} 位候选人的报告: {}", reports.len(), path);
        Ok(())
    }
}
