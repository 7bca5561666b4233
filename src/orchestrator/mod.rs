//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量测评处理器
//! - 管理应用生命周期（初始化、运行）
//! - 批量加载测评文件（Vec<AssessmentFile>）
//! - 控制评估并发数量（Semaphore）
//! - 持有外部客户端（转写、LLM）
//! - 输出报告与全局统计信息
//!
//! ### `assessment_processor` - 单个测评处理器
//! - 登记候选人与测试
//! - 打开并提交每道带答案的题目
//! - 按需完成测试
//! - 输出单个测评的统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<AssessmentFile>)
//!     ↓
//! assessment_processor (处理 Vec<QuestionEntry>)
//!     ↓
//! workflow::AssessmentWorkflow / AnswerEvaluationPipeline (处理单个作答)
//!     ↓
//! services (能力层：transcription / llm / parser / report)
//!     ↓
//! infrastructure (基础设施：AssessmentStore)
//! ```

pub mod assessment_processor;
pub mod batch_processor;

// 重新导出主要类型
pub use assessment_processor::process_assessment;
pub use batch_processor::App;
