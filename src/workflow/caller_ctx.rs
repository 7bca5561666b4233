//! 调用方上下文
//!
//! 封装"是谁在调用"这一信息，每个流程入口都显式传入

use std::fmt::Display;

use crate::error::{AppError, AppResult};
use crate::models::CandidateId;

/// 调用方身份
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    /// 候选人，只能操作自己的测试
    Candidate(CandidateId),
    /// 管理员
    Admin(String),
}

/// 调用方上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerCtx {
    pub actor: Actor,
}

impl CallerCtx {
    pub fn candidate(candidate_id: CandidateId) -> Self {
        Self {
            actor: Actor::Candidate(candidate_id),
        }
    }

    pub fn admin(name: impl Into<String>) -> Self {
        Self {
            actor: Actor::Admin(name.into()),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.actor, Actor::Admin(_))
    }

    /// 用于记录人工评价的署名
    pub fn display_name(&self) -> String {
        match &self.actor {
            Actor::Candidate(id) => format!("candidate-{}", id),
            Actor::Admin(name) => name.clone(),
        }
    }

    /// 要求调用方为管理员
    pub fn require_admin(&self, action: &'static str) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden(action, "仅管理员可以执行"))
        }
    }

    /// 要求调用方为管理员或测试所属的候选人
    pub fn require_owner(&self, owner: CandidateId, action: &'static str) -> AppResult<()> {
        match &self.actor {
            Actor::Admin(_) => Ok(()),
            Actor::Candidate(id) if *id == owner => Ok(()),
            Actor::Candidate(id) => Err(AppError::forbidden(
                action,
                format!("候选人 {} 不是该测试的所有者", id),
            )),
        }
    }

    /// 要求调用方就是测试所属的候选人，管理员也不允许
    ///
    /// 测试的开始与完成只能由候选人本人触发。
    pub fn require_candidate_owner(
        &self,
        owner: CandidateId,
        action: &'static str,
    ) -> AppResult<()> {
        match &self.actor {
            Actor::Candidate(id) if *id == owner => Ok(()),
            Actor::Candidate(id) => Err(AppError::forbidden(
                action,
                format!("候选人 {} 不是该测试的所有者", id),
            )),
            Actor::Admin(_) => Err(AppError::forbidden(action, "只能由候选人本人执行")),
        }
    }
}

impl Display for CallerCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.actor {
            Actor::Candidate(id) => write!(f, "[候选人 #{}]", id),
            Actor::Admin(name) => write!(f, "[管理员 {}]", name),
        }
    }
}
