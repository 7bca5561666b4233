//! 测试用的能力提供方
//!
//! 按预设返回结果，可选地在返回前等待外部信号，用于模拟慢速远程调用。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::ProviderError;
use crate::services::providers::{
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

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

/// 预设结果的转写提供方
#[derive(Debug)]
pub struct MockTranscriber {
    response: Result<String, ProviderError>,
    gate: Option<Gate>,
    calls: AtomicUsize,
}

impl MockTranscriber {
    pub fn new(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            response: Err(error),
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptionProvider for MockTranscriber {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.pass().await;
        }
        self.response.clone()
    }

    fn name(&self) -> &str {
        "mock-transcriber"
    }
}

/// 预设结果的评价提供方
#[derive(Debug)]
pub struct MockFeedbackProvider {
    response: Result<String, ProviderError>,
    gate: Option<Gate>,
    calls: AtomicUsize,
}

impl MockFeedbackProvider {
    pub fn new(raw: &str) -> Self {
        Self {
            response: Ok(raw.to_string()),
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            response: Err(error),
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedbackProvider for MockFeedbackProvider {
    async fn generate(&self, _transcript: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.pass().await;
        }
        self.response.clone()
    }

    fn name(&self) -> &str {
        "mock-feedback"
    }
}

/// 预设结果的参考问答提供方，会记录最后一次收到的上下文
#[derive(Debug)]
pub struct MockReferenceQa {
    response: Result<ReferenceAnswer, ProviderError>,
    last_context: std::sync::Mutex<Option<String>>,
}

impl MockReferenceQa {
    pub fn new(answer: &str, confidence: f64) -> Self {
        Self {
            response: Ok(ReferenceAnswer {
                answer: answer.to_string(),
                confidence,
            }),
            last_context: std::sync::Mutex::new(None),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            response: Err(error),
            last_context: std::sync::Mutex::new(None),
        }
    }

    pub fn last_context(&self) -> Option<String> {
        self.last_context
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ReferenceQaProvider for MockReferenceQa {
    async fn answer(
        &self,
        _question: &str,
        context: &str,
    ) -> Result<ReferenceAnswer, ProviderError> {
        *self
            .last_context
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(context.to_string());
        self.response.clone()
    }

    fn name(&self) -> &str {
        "mock-reference-qa"
    }
}
