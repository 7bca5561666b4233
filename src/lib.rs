//! # Interview Assessment
//!
//! 面试答案评估：候选人录音作答，系统转写并生成语法 / 流利度评价与分数
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有测评数据，只暴露"在锁内读写"的能力
//! - `AssessmentStore` - Candidate / Test / Question 的唯一持有者
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `TranscriptionProvider` / `FeedbackProvider` / `ReferenceQaProvider` - 外部能力接口
//! - `HttpTranscriber` - 语音转写
//! - `LlmService` - 评价生成与参考问答
//! - `parse_feedback` - 评价文本解析（纯函数）
//! - `QuestionBank` / `build_candidate_report` - 题库与报告
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义测试生命周期与"一次作答"的处理流程
//! - `CallerCtx` - 调用方上下文（候选人 / 管理员）
//! - `AssessmentWorkflow` - 状态机（Pending → InProgress → Completed）
//! - `AnswerEvaluationPipeline` - 转写 → 评价 → 写入
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量测评处理器，管理资源、并发和报告
//! - `orchestrator/assessment_processor` - 单个测评处理器，遍历题目列表
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::AssessmentStore;
pub use models::{FeedbackResult, Question, Test, TestStatus};
pub use orchestrator::App;
pub use services::parse_feedback;
pub use workflow::{AnswerInput, AssessmentWorkflow, CallerCtx, EvaluationOutcome};
