//! 题库服务 - 业务能力层
//!
//! 提供内置的通用面试题，用于管理员"生成题目"和创建示例测试

use crate::models::NewQuestion;

/// 内置面试题
pub const SAMPLE_QUESTIONS: [&str; 8] = [
    "Tell me about a challenge you overcame?",
    "What are your greatest strengths and weaknesses?",
    "Where do you see yourself in 5 years?",
    "Why should we hire you?",
    "Describe a situation where you showed leadership.",
    "How do you handle stress and pressure?",
    "What is your approach to problem-solving?",
    "Tell me about a time you failed and what you learned from it.",
];

/// 示例测试使用的题目数量
pub const SAMPLE_TEST_SIZE: usize = 3;

/// 题库
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<String>,
}

impl QuestionBank {
    /// 使用内置题目创建
    pub fn new() -> Self {
        Self {
            questions: SAMPLE_QUESTIONS.iter().map(|q| q.to_string()).collect(),
        }
    }

    /// 使用自定义题目创建，空白题目会被丢弃
    pub fn with_questions(questions: impl IntoIterator<Item = String>) -> Self {
        Self {
            questions: questions
                .into_iter()
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty())
                .collect(),
        }
    }

    /// 全部题目
    pub fn generate(&self) -> Vec<String> {
        self.questions.clone()
    }

    /// 示例测试的题目（取前几道）
    pub fn sample_test(&self) -> Vec<NewQuestion> {
        self.questions
            .iter()
            .take(SAMPLE_TEST_SIZE)
            .map(NewQuestion::new)
            .collect()
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::new()
    }
}
