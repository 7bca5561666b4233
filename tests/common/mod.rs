//! 集成测试共用的能力提供方
//!
//! 按预设返回结果，评价调用可以挂在闸门上等待外部信号。

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use interview_assessment::error::ProviderError;
use interview_assessment::services::{
    FeedbackProvider, ReferenceAnswer, ReferenceQaProvider, TranscriptionProvider,
};

/// 调用闸门：`entered` 在调用开始时通知，调用随后等待 `release`
#[derive(Debug, Clone, Default)]
pub struct Gate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug)]
pub struct MockTranscriber {
    response: Result<String, ProviderError>,
}

impl MockTranscriber {
    pub fn new(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            response: Err(error),
        }
    }
}

#[async_trait]
impl TranscriptionProvider for MockTranscriber {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String, ProviderError> {
        self.response.clone()
    }

    fn name(&self) -> &str {
        "mock-transcriber"
    }
}

#[derive(Debug)]
pub struct MockFeedbackProvider {
    response: Result<String, ProviderError>,
    gate: Option<Gate>,
}

impl MockFeedbackProvider {
    pub fn new(raw: &str) -> Self {
        Self {
            response: Ok(raw.to_string()),
            gate: None,
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            response: Err(error),
            gate: None,
        }
    }

    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[async_trait]
impl FeedbackProvider for MockFeedbackProvider {
    async fn generate(&self, _transcript: &str) -> Result<String, ProviderError> {
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.response.clone()
    }

    fn name(&self) -> &str {
        "mock-feedback"
    }
}

#[derive(Debug)]
pub struct MockReferenceQa {
    answer: ReferenceAnswer,
}

impl MockReferenceQa {
    pub fn new(answer: &str, confidence: f64) -> Self {
        Self {
            answer: ReferenceAnswer {
                answer: answer.to_string(),
                confidence,
            },
        }
    }
}

#[async_trait]
impl ReferenceQaProvider for MockReferenceQa {
    async fn answer(
        &self,
        _question: &str,
        _context: &str,
    ) -> Result<ReferenceAnswer, ProviderError> {
        Ok(self.answer.clone())
    }

    fn name(&self) -> &str {
        "mock-reference-qa"
    }
}
