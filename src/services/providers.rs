//! 外部能力接口 - 业务能力层
//!
//! 每种能力一个小 trait，评估流程只依赖这些接口，
//! 具体由哪家服务实现可以随意替换。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// 语音转写能力
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// 把一段音频转成文本
    async fn transcribe(&self, audio: &[u8]) -> Result<String, ProviderError>;

    /// 提供方名称（用于日志）
    fn name(&self) -> &str;
}

/// 语法 / 流利度评价能力
///
/// 返回模型的原始文本，解析交给 `feedback_parser`。
#[async_trait]
pub trait FeedbackProvider: Send + Sync {
    async fn generate(&self, transcript: &str) -> Result<String, ProviderError>;

    fn name(&self) -> &str;
}

/// 参考答案
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceAnswer {
    pub answer: String,
    /// 置信度 0.0 - 1.0
    pub confidence: f64,
}

/// 参考问答能力，仅供管理员人工比对，不参与打分
#[async_trait]
pub trait ReferenceQaProvider: Send + Sync {
    /// `context` 保证非空
    async fn answer(&self, question: &str, context: &str)
        -> Result<ReferenceAnswer, ProviderError>;

    fn name(&self) -> &str;
}
