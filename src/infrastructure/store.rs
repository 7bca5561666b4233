//! 测评记录存储 - 基础设施层
//!
//! 持有所有 Candidate / Test / Question 记录，只暴露"在锁内读写"的能力

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use crate::error::{AppResult, WorkflowError};
use crate::models::{
    Candidate, CandidateId, NewQuestion, Question, QuestionId, Test, TestId, TestStatus,
};

/// 测评记录存储
///
/// 职责：
/// - 唯一持有测评数据
/// - 所有修改都在同一把锁内以闭包形式执行，保证状态迁移原子
/// - 不认识评估流程，不调用任何外部能力
/// - 锁不会跨越 `.await` 持有
#[derive(Debug, Default)]
pub struct AssessmentStore {
    inner: Mutex<StoreState>,
}

#[derive(Debug, Default)]
struct StoreState {
    next_candidate_id: CandidateId,
    next_test_id: TestId,
    next_question_id: QuestionId,
    candidates: BTreeMap<CandidateId, Candidate>,
    tests: BTreeMap<TestId, Test>,
    /// 题目 → 所属测试
    question_index: HashMap<QuestionId, TestId>,
}

impl StoreState {
    fn alloc_question_id(&mut self) -> QuestionId {
        self.next_question_id += 1;
        self.next_question_id
    }

    fn test_id_of(&self, question_id: QuestionId) -> AppResult<TestId> {
        self.question_index
            .get(&question_id)
            .copied()
            .ok_or_else(|| WorkflowError::QuestionNotFound { question_id }.into())
    }

    fn test_mut(&mut self, test_id: TestId) -> AppResult<&mut Test> {
        self.tests
            .get_mut(&test_id)
            .ok_or_else(|| WorkflowError::TestNotFound { test_id }.into())
    }
}

impl AssessmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // 闭包内部不会 panic 到一半留下脏数据：所有修改都是先校验后写入
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ========== 候选人 ==========

    pub fn insert_candidate(&self, name: &str, position: &str) -> CandidateId {
        let mut state = self.lock();
        state.next_candidate_id += 1;
        let id = state.next_candidate_id;
        state.candidates.insert(id, Candidate::new(id, name, position));
        id
    }

    pub fn candidate(&self, candidate_id: CandidateId) -> AppResult<Candidate> {
        self.lock()
            .candidates
            .get(&candidate_id)
            .cloned()
            .ok_or_else(|| WorkflowError::CandidateNotFound { candidate_id }.into())
    }

    pub fn candidates(&self) -> Vec<Candidate> {
        self.lock().candidates.values().cloned().collect()
    }

    // ========== 测试 ==========

    /// 创建测试及其题目，返回测试 ID
    pub fn insert_test(
        &self,
        candidate_id: CandidateId,
        title: &str,
        description: &str,
        questions: Vec<NewQuestion>,
    ) -> AppResult<TestId> {
        let mut state = self.lock();
        if !state.candidates.contains_key(&candidate_id) {
            return Err(WorkflowError::CandidateNotFound { candidate_id }.into());
        }

        state.next_test_id += 1;
        let test_id = state.next_test_id;
        let mut test = Test::new(test_id, candidate_id, title, description);
        for input in questions {
            let qid = state.alloc_question_id();
            test.push_question(qid, input);
            state.question_index.insert(qid, test_id);
        }
        state.tests.insert(test_id, test);
        Ok(test_id)
    }

    /// 向测试追加题目（仅限完成前）
    pub fn append_question(&self, test_id: TestId, input: NewQuestion) -> AppResult<QuestionId> {
        let mut state = self.lock();
        state.test_mut(test_id)?.ensure_editable("append_question")?;

        let qid = state.alloc_question_id();
        state.test_mut(test_id)?.push_question(qid, input);
        state.question_index.insert(qid, test_id);
        Ok(qid)
    }

    /// 删除题目（仅限完成前）
    pub fn remove_question(&self, question_id: QuestionId) -> AppResult<Question> {
        let mut state = self.lock();
        let test_id = state.test_id_of(question_id)?;
        let removed = state.test_mut(test_id)?.remove_question(question_id)?;
        state.question_index.remove(&question_id);
        Ok(removed)
    }

    pub fn test(&self, test_id: TestId) -> AppResult<Test> {
        self.lock()
            .tests
            .get(&test_id)
            .cloned()
            .ok_or_else(|| WorkflowError::TestNotFound { test_id }.into())
    }

    pub fn tests_of(&self, candidate_id: CandidateId) -> Vec<Test> {
        self.lock()
            .tests
            .values()
            .filter(|t| t.candidate_id == candidate_id)
            .cloned()
            .collect()
    }

    /// 在锁内修改一个测试
    pub fn update_test<R>(
        &self,
        test_id: TestId,
        f: impl FnOnce(&mut Test) -> AppResult<R>,
    ) -> AppResult<R> {
        let mut state = self.lock();
        f(state.test_mut(test_id)?)
    }

    // ========== 题目 ==========

    /// 题目快照，附带所属测试的状态与候选人
    pub fn question(&self, question_id: QuestionId) -> AppResult<QuestionSnapshot> {
        let state = self.lock();
        let test_id = state.test_id_of(question_id)?;
        let test = state
            .tests
            .get(&test_id)
            .ok_or(WorkflowError::TestNotFound { test_id })?;
        let question = test
            .question(question_id)
            .cloned()
            .ok_or(WorkflowError::QuestionNotFound { question_id })?;
        Ok(QuestionSnapshot {
            question,
            test_id,
            test_status: test.status,
            candidate_id: test.candidate_id,
        })
    }

    /// 在锁内修改一道题目，闭包同时能看到所属测试的状态
    pub fn update_question<R>(
        &self,
        question_id: QuestionId,
        f: impl FnOnce(TestStatus, &mut Question) -> AppResult<R>,
    ) -> AppResult<R> {
        let mut state = self.lock();
        let test_id = state.test_id_of(question_id)?;
        let test = state.test_mut(test_id)?;
        let status = test.status;
        let question = test
            .question_mut(question_id)
            .ok_or(WorkflowError::QuestionNotFound { question_id })?;
        f(status, question)
    }
}

/// 题目及其上下文的只读快照
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionSnapshot {
    pub question: Question,
    pub test_id: TestId,
    pub test_status: TestStatus,
    pub candidate_id: CandidateId,
}
