use std::str::FromStr;

use tracing::warn;

use crate::error::ConfigError;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 同时进行的答案评估数量
    pub max_concurrent_evaluations: usize,
    /// 测评 TOML 文件存放目录
    pub assessments_folder: String,
    /// 报告输出文件
    pub report_output_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- 转写服务配置 ---
    pub transcription_base_url: String,
    pub transcription_language: String,
    /// 单次外部调用的超时时间（秒）
    pub provider_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_evaluations: 8,
            assessments_folder: "assessments".to_string(),
            report_output_file: "report.json".to_string(),
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            transcription_base_url: "http://127.0.0.1:8090".to_string(),
            transcription_language: "en".to_string(),
            provider_timeout_secs: 60,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_concurrent_evaluations: env_parse("MAX_CONCURRENT_EVALUATIONS", default.max_concurrent_evaluations),
            assessments_folder: std::env::var("ASSESSMENTS_FOLDER").unwrap_or(default.assessments_folder),
            report_output_file: std::env::var("REPORT_OUTPUT_FILE").unwrap_or(default.report_output_file),
            verbose_logging: env_parse("VERBOSE_LOGGING", default.verbose_logging),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            transcription_base_url: std::env::var("TRANSCRIPTION_BASE_URL").unwrap_or(default.transcription_base_url),
            transcription_language: std::env::var("TRANSCRIPTION_LANGUAGE").unwrap_or(default.transcription_language),
            provider_timeout_secs: env_parse("PROVIDER_TIMEOUT_SECS", default.provider_timeout_secs),
        }
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_evaluations == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_concurrent_evaluations".to_string(),
                message: "必须大于 0".to_string(),
            });
        }
        if self.provider_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "provider_timeout_secs".to_string(),
                message: "必须大于 0".to_string(),
            });
        }
        if self.llm_model_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "llm_model_name".to_string(),
                message: "不能为空".to_string(),
            });
        }
        Ok(())
    }
}

/// 读取并解析环境变量，缺失或无法解析时使用默认值
fn env_parse<T: FromStr>(var_name: &str, default: T) -> T {
    match std::env::var(var_name) {
        Ok(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("环境变量 {} 的值 '{}' 无法解析，使用默认值", var_name, value);
                default
            }
        },
        Err(_) => default,
    }
}
