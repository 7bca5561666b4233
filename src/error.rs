//! 错误类型
//!
//! 按类别划分：流程（Workflow）、能力提供方（Provider）、配置（Config）、文件（File）

use thiserror::Error;

use crate::models::{QuestionId, TestId, TestStatus};

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 测评流程错误
    #[error("流程错误: {0}")]
    Workflow(#[from] WorkflowError),
    /// 外部能力调用错误（转写 / LLM / 参考问答）
    #[error("能力提供方错误: {0}")]
    Provider(#[from] ProviderError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 其他错误
    #[error("错误: {0}")]
    Other(String),
}

/// 测评流程错误
///
/// 这一类错误都要原样交给调用方，流程内部不重试。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    /// 既没有音频也没有文本答案
    #[error("题目 {question_id} 缺少答案输入：没有音频也没有文本")]
    MissingInput { question_id: QuestionId },

    /// 非法的状态迁移
    #[error("测试 {test_id} 处于 {from} 状态，不能执行 {action}")]
    InvalidTransition {
        test_id: TestId,
        from: TestStatus,
        action: &'static str,
    },

    /// 同一道题已有评估在进行中
    #[error("题目 {question_id} 正在评估中，请稍后重试")]
    Busy { question_id: QuestionId },

    #[error("测试不存在: {test_id}")]
    TestNotFound { test_id: TestId },

    #[error("题目不存在: {question_id}")]
    QuestionNotFound { question_id: QuestionId },

    #[error("候选人不存在: {candidate_id}")]
    CandidateNotFound { candidate_id: u64 },

    /// 调用方无权执行该操作
    #[error("无权执行 {action}: {reason}")]
    Forbidden { action: &'static str, reason: String },

    /// 管理员给出的分数不合法
    #[error("分数 {score} 不合法，必须在 0 到 10 之间")]
    InvalidScore { score: f64 },
}

/// 外部能力调用错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// 网络请求失败
    #[error("{provider} 请求失败: {message}")]
    RequestFailed { provider: String, message: String },

    /// 服务返回非成功状态码
    #[error("{provider} 返回错误状态码: {status}")]
    BadStatus { provider: String, status: u16 },

    /// 返回内容为空
    #[error("{provider} 返回内容为空")]
    EmptyResponse { provider: String },

    /// 超过配置的等待时间仍未返回
    #[error("{provider} 请求超时 ({secs} 秒)")]
    Timeout { provider: String, secs: u64 },
}

/// 配置错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// 配置值不合法
    #[error("配置项 {key} 不合法: {message}")]
    InvalidValue { key: String, message: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Other(format!("JSON序列化失败: {}", err))
    }
}

// ========== 便捷构造函数 ==========

impl ProviderError {
    pub fn request_failed(provider: impl Into<String>, message: impl ToString) -> Self {
        ProviderError::RequestFailed {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    pub fn empty_response(provider: impl Into<String>) -> Self {
        ProviderError::EmptyResponse {
            provider: provider.into(),
        }
    }

    pub fn timeout(provider: impl Into<String>, secs: u64) -> Self {
        ProviderError::Timeout {
            provider: provider.into(),
            secs,
        }
    }
}

impl AppError {
    /// 创建非法状态迁移错误
    pub fn invalid_transition(test_id: TestId, from: TestStatus, action: &'static str) -> Self {
        AppError::Workflow(WorkflowError::InvalidTransition {
            test_id,
            from,
            action,
        })
    }

    /// 创建权限错误
    pub fn forbidden(action: &'static str, reason: impl Into<String>) -> Self {
        AppError::Workflow(WorkflowError::Forbidden {
            action,
            reason: reason.into(),
        })
    }

    /// 是否为流程错误中的指定类别，便于调用方做分支
    pub fn as_workflow(&self) -> Option<&WorkflowError> {
        match self {
            AppError::Workflow(e) => Some(e),
            _ => None,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
