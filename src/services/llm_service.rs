//! LLM 服务 - 业务能力层
//!
//! 只负责"LLM 评价"和"LLM 参考问答"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ProviderError;
use crate::services::feedback_parser::strip_prefix_ci;
use crate::services::providers::{FeedbackProvider, ReferenceAnswer, ReferenceQaProvider};

const PROVIDER_NAME: &str = "llm";

const FEEDBACK_SYSTEM_PROMPT: &str = "You are an experienced interview coach. \
You assess spoken interview answers for grammar and fluency. \
Always answer in the exact line format you are given.";

const REFERENCE_SYSTEM_PROMPT: &str = "You answer interview questions using only the provided context. \
Always answer in the exact line format you are given.";

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API 生成评价文本
/// - 调用 LLM API 生成参考答案
/// - 只处理单道题目
/// - 不解析评价文本（交给 feedback_parser）
/// - 不写入任何题目数据
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    /// 单次调用的等待上限，与转写服务共用 `provider_timeout_secs`
    timeout: Duration,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
            timeout: Duration::from_secs(config.provider_timeout_secs),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（已去除首尾空白）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<String, ProviderError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(|e| ProviderError::request_failed(PROVIDER_NAME, e))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| ProviderError::request_failed(PROVIDER_NAME, e))?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.3)
            .max_tokens(1024u32)
            .build()
            .map_err(|e| ProviderError::request_failed(PROVIDER_NAME, e))?;

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| {
                warn!("LLM API 调用超时 ({} 秒)", self.timeout.as_secs());
                ProviderError::timeout(PROVIDER_NAME, self.timeout.as_secs())
            })?
            .map_err(|e| {
                warn!("LLM API 调用失败: {}", e);
                ProviderError::request_failed(PROVIDER_NAME, e)
            })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| ProviderError::empty_response(PROVIDER_NAME))?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl FeedbackProvider for LlmService {
    async fn generate(&self, transcript: &str) -> Result<String, ProviderError> {
        let user_message = build_feedback_message(transcript);
        self.send_to_llm(&user_message, Some(FEEDBACK_SYSTEM_PROMPT))
            .await
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

#[async_trait]
impl ReferenceQaProvider for LlmService {
    async fn answer(
        &self,
        question: &str,
        context: &str,
    ) -> Result<ReferenceAnswer, ProviderError> {
        let user_message = build_reference_message(question, context);
        let response = self
            .send_to_llm(&user_message, Some(REFERENCE_SYSTEM_PROMPT))
            .await?;
        Ok(parse_reference_response(&response))
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

/// 构建评价请求
fn build_feedback_message(transcript: &str) -> String {
    format!(
        r#"Assess the following spoken interview answer.

Answer transcript:
"""
{}
"""

Reply with exactly these lines:
SCORE: <a number from 0 to 10>
GRAMMAR: <one sentence on grammar>
FLUENCY: <one sentence on fluency>
SUGGESTIONS: <first suggestion>
<further suggestions, one per line>"#,
        transcript
    )
}

/// 构建参考问答请求
fn build_reference_message(question: &str, context: &str) -> String {
    format!(
        r#"Question: {}

Context:
"""
{}
"""

Reply with exactly these lines:
ANSWER: <the answer, taken from the context>
CONFIDENCE: <a number from 0 to 1>"#,
        question, context
    )
}

/// 解析参考问答响应
///
/// 找不到 `ANSWER:` 时把整段响应当作答案；置信度无法解析时为 0。
fn parse_reference_response(response: &str) -> ReferenceAnswer {
    let mut answer = None;
    let mut confidence = None;

    for line in response.lines().map(str::trim) {
        if let Some(value) = strip_prefix_ci(line, "ANSWER:") {
            answer.get_or_insert_with(|| value.to_string());
        } else if let Some(value) = strip_prefix_ci(line, "CONFIDENCE:") {
            if confidence.is_none() {
                confidence = value
                    .trim_end_matches('%')
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .map(|c| if c > 1.0 && c <= 100.0 { c / 100.0 } else { c })
                    .filter(|c| (0.0..=1.0).contains(c));
            }
        }
    }

    ReferenceAnswer {
        answer: answer
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| response.trim().to_string()),
        confidence: confidence.unwrap_or(0.0),
    }
}
