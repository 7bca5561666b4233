//! 单题评估互斥
//!
//! 同一道题同一时刻最多只有一个评估在进行，第二个请求直接拒绝（不排队）。

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::models::QuestionId;

/// 正在评估的题目集合
#[derive(Debug, Default, Clone)]
pub struct InFlightRegistry {
    active: Arc<Mutex<HashSet<QuestionId>>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 尝试占用某道题，已被占用时返回 None
    pub fn try_acquire(&self, question_id: QuestionId) -> Option<EvaluationPermit> {
        let mut active = self
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if active.insert(question_id) {
            Some(EvaluationPermit {
                registry: self.clone(),
                question_id,
            })
        } else {
            None
        }
    }

    pub fn is_active(&self, question_id: QuestionId) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&question_id)
    }

    fn release(&self, question_id: QuestionId) {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&question_id);
    }
}

/// 评估许可，drop 时自动释放（包括调用方中途放弃的情况）
#[derive(Debug)]
pub struct EvaluationPermit {
    registry: InFlightRegistry,
    question_id: QuestionId,
}

impl EvaluationPermit {
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }
}

impl Drop for EvaluationPermit {
    fn drop(&mut self) {
        self.registry.release(self.question_id);
    }
}
