//! 语音转写服务 - 业务能力层
//!
//! 只负责"音频 → 文本"能力。
//! 把整段音频作为请求体 POST 到转写服务的 `/transcribe`，读取 JSON 中的 `text`。

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, ProviderError};
use crate::services::providers::TranscriptionProvider;

const PROVIDER_NAME: &str = "http-transcriber";

#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    #[serde(default)]
    text: String,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP 语音转写客户端
pub struct HttpTranscriber {
    client: reqwest::Client,
    base_url: String,
    language: String,
    timeout_secs: u64,
}

impl HttpTranscriber {
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.provider_timeout_secs))
            .build()
            .map_err(|e| AppError::Other(format!("无法创建 HTTP 客户端: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.transcription_base_url.trim_end_matches('/').to_string(),
            language: config.transcription_language.clone(),
            timeout_secs: config.provider_timeout_secs,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/transcribe", self.base_url)
    }
}

#[async_trait]
impl TranscriptionProvider for HttpTranscriber {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, ProviderError> {
        debug!("调用转写服务，音频大小: {} 字节", audio.len());

        let response = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "audio/wav")
            .header("X-Language", &self.language)
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| {
                warn!("转写服务请求失败: {}", e);
                if e.is_timeout() {
                    ProviderError::timeout(PROVIDER_NAME, self.timeout_secs)
                } else {
                    ProviderError::request_failed(PROVIDER_NAME, e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::BadStatus {
                provider: PROVIDER_NAME.to_string(),
                status: status.as_u16(),
            });
        }

        let body: TranscribeResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::request_failed(PROVIDER_NAME, format!("无法解析响应: {}", e)))?;

        let text = transcript_from(body)?;
        debug!("转写完成，文本长度: {} 字符", text.chars().count());
        Ok(text)
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

/// 从响应中取出转写文本
///
/// 只有空白的文本视为空结果；非空文本原样返回，不做裁剪。
fn transcript_from(body: TranscribeResponse) -> Result<String, ProviderError> {
    if let Some(error) = body.error.filter(|e| !e.is_empty()) {
        return Err(ProviderError::request_failed(PROVIDER_NAME, error));
    }
    if body.text.trim().is_empty() {
        return Err(ProviderError::empty_response(PROVIDER_NAME));
    }
    Ok(body.text)
}
