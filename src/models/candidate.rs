use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 候选人 ID
pub type CandidateId = u64;

/// 候选人
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub position: String,
    pub created_at: DateTime<Utc>,
}

impl Candidate {
    pub fn new(id: CandidateId, name: impl Into<String>, position: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            position: position.into(),
            created_at: Utc::now(),
        }
    }
}

/// 候选人整体的评审状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewStatus {
    /// 还有未完成的测试（或尚未分配测试）
    Pending,
    /// 所有测试都已完成
    Ready,
}
