use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 题目 ID
pub type QuestionId = u64;

/// 分数下限
pub const MIN_SCORE: f64 = 0.0;
/// 分数上限
pub const MAX_SCORE: f64 = 10.0;
/// 解析不到分数时使用的中间值
pub const DEFAULT_SCORE: f64 = 5.0;
/// 解析不到文本字段时使用的占位文本
pub const PLACEHOLDER: &str = "Not assessed";

/// 分数是否落在 0-10 区间内
pub fn is_valid_score(score: f64) -> bool {
    score.is_finite() && (MIN_SCORE..=MAX_SCORE).contains(&score)
}

/// 语法 / 流利度评价结果
///
/// 所有字段总是有值（缺失时取默认值），下游不需要做空值判断。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackResult {
    pub grammar: String,
    pub fluency: String,
    pub suggestions: Vec<String>,
    pub score: f64,
}

impl Default for FeedbackResult {
    fn default() -> Self {
        Self {
            grammar: PLACEHOLDER.to_string(),
            fluency: PLACEHOLDER.to_string(),
            suggestions: vec![PLACEHOLDER.to_string()],
            score: DEFAULT_SCORE,
        }
    }
}

impl FeedbackResult {
    /// 建议列表，换行拼接
    pub fn suggestions_text(&self) -> String {
        self.suggestions.join("\n")
    }

    /// 各字段是否都取了默认值
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// 题目上记录的评价
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Feedback {
    /// 评估流程生成的评价
    Evaluated(FeedbackResult),
    /// 管理员人工评价，优先级最高
    Manual { text: String, reviewer: String },
}

impl Feedback {
    /// 单行摘要，用于报告与日志
    pub fn summary(&self) -> String {
        match self {
            Feedback::Evaluated(result) => format!(
                "Grammar: {} | Fluency: {} | Suggestions: {}",
                result.grammar,
                result.fluency,
                result.suggestions.join("; ")
            ),
            Feedback::Manual { text, .. } => text.clone(),
        }
    }
}

/// 新建题目时的输入
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewQuestion {
    pub text: String,
    #[serde(default)]
    pub context: Option<String>,
}

impl NewQuestion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// 面试题目及其作答记录
///
/// 题目本身没有独立的状态字段：
/// - 有 transcript 即"已作答"
/// - 有 feedback 即"已评价"
/// - 有 score 即"已打分"
///
/// 三者相互独立，可以以任意顺序出现（例如管理员直接人工打分）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub context: Option<String>,
    /// 在所属测试中的序号，从 1 开始连续
    pub order: usize,
    pub transcript: Option<String>,
    pub feedback: Option<Feedback>,
    pub score: Option<f64>,
    pub audio_ref: Option<String>,
    pub answered_at: Option<DateTime<Utc>>,
}

impl Question {
    pub fn new(id: QuestionId, order: usize, input: NewQuestion) -> Self {
        Self {
            id,
            text: input.text,
            context: input.context,
            order,
            transcript: None,
            feedback: None,
            score: None,
            audio_ref: None,
            answered_at: None,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.transcript.is_some()
    }

    pub fn is_evaluated(&self) -> bool {
        self.feedback.is_some()
    }

    pub fn is_scored(&self) -> bool {
        self.score.is_some()
    }

    /// 是否已被管理员人工覆盖
    pub fn is_overridden(&self) -> bool {
        matches!(self.feedback, Some(Feedback::Manual { .. }))
    }

    /// 参考问答使用的上下文，为空时退回题干本身
    pub fn reference_context(&self) -> &str {
        match self.context.as_deref() {
            Some(ctx) if !ctx.trim().is_empty() => ctx,
            _ => &self.text,
        }
    }

    /// 记录转写结果
    pub fn record_transcript(&mut self, transcript: String, audio_ref: Option<String>) {
        self.transcript = Some(transcript);
        if audio_ref.is_some() {
            self.audio_ref = audio_ref;
        }
        self.answered_at = Some(Utc::now());
    }

    /// 记录评估流程生成的评价与分数
    pub fn record_evaluation(&mut self, result: FeedbackResult) {
        self.score = Some(result.score);
        self.feedback = Some(Feedback::Evaluated(result));
    }

    /// 管理员覆盖分数与评价
    pub fn record_override(&mut self, score: f64, text: String, reviewer: String) {
        self.score = Some(score);
        self.feedback = Some(Feedback::Manual { text, reviewer });
    }
}
