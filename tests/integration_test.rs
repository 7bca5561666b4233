mod common;

use std::sync::Arc;

use common::{Gate, MockFeedbackProvider, MockReferenceQa, MockTranscriber};

use interview_assessment::config::Config;
use interview_assessment::error::{ProviderError, WorkflowError};
use interview_assessment::models::{NewQuestion, ReviewStatus, TestStatus, DEFAULT_SCORE, PLACEHOLDER};
use interview_assessment::utils::logging;
use interview_assessment::{
    App, AnswerInput, AssessmentStore, AssessmentWorkflow, CallerCtx, EvaluationOutcome,
};

const CHALLENGE: &str = "Tell me about a challenge you overcame?";
const GOOD_FEEDBACK: &str =
    "SCORE: 8\nGRAMMAR: Strong\nFLUENCY: Natural\nSUGGESTIONS: Vary sentence length";

fn workflow_with(transcriber: MockTranscriber, feedback: MockFeedbackProvider) -> AssessmentWorkflow {
    AssessmentWorkflow::new(
        Arc::new(AssessmentStore::new()),
        Arc::new(transcriber),
        Arc::new(feedback),
        Arc::new(MockReferenceQa::new("A structured STAR answer", 0.8)),
    )
}

fn admin() -> CallerCtx {
    CallerCtx::admin("admin")
}

/// 创建候选人和单题测试并打开题目
fn started_test(wf: &AssessmentWorkflow) -> (CallerCtx, u64, u64) {
    let cid = wf
        .create_candidate(&admin(), "example_candidate", "Software Engineer")
        .unwrap();
    let tid = wf
        .create_test(
            &admin(),
            cid,
            "Technical Interview Assessment",
            "",
            vec![NewQuestion::new(CHALLENGE)],
        )
        .unwrap();
    let qid = wf.test(tid).unwrap().questions[0].id;
    let me = CallerCtx::candidate(cid);
    wf.open_question(&me, tid, qid).unwrap();
    (me, tid, qid)
}

#[tokio::test]
async fn test_worked_example_success() {
    let wf = workflow_with(
        MockTranscriber::new("I led a team through a tight deadline"),
        MockFeedbackProvider::new(GOOD_FEEDBACK),
    );
    let (me, tid, qid) = started_test(&wf);

    let outcome = wf
        .submit_answer(&me, qid, AnswerInput::audio(b"RIFF....".to_vec()))
        .await
        .unwrap();

    match outcome {
        EvaluationOutcome::Success {
            transcript,
            feedback,
        } => {
            assert_eq!(transcript, "I led a team through a tight deadline");
            assert_eq!(feedback.score, 8.0);
            assert_eq!(feedback.grammar, "Strong");
            assert_eq!(feedback.fluency, "Natural");
            assert_eq!(feedback.suggestions_text(), "Vary sentence length");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    let snapshot = wf.question(qid).unwrap();
    assert_eq!(
        snapshot.question.transcript.as_deref(),
        Some("I led a team through a tight deadline")
    );
    assert_eq!(wf.aggregate_score(tid).unwrap(), Some(8.0));
}

#[tokio::test]
async fn test_worked_example_unparseable_feedback() {
    let wf = workflow_with(
        MockTranscriber::new("I led a team through a tight deadline"),
        MockFeedbackProvider::new(""),
    );
    let (me, _, qid) = started_test(&wf);

    let outcome = wf
        .submit_answer(&me, qid, AnswerInput::audio(vec![0; 16]))
        .await
        .unwrap();

    assert!(outcome.is_success());
    let feedback = outcome.feedback().unwrap();
    assert_eq!(feedback.score, DEFAULT_SCORE);
    assert_eq!(feedback.grammar, PLACEHOLDER);
    assert_eq!(feedback.fluency, PLACEHOLDER);
    assert_eq!(feedback.suggestions_text(), PLACEHOLDER);
}

#[tokio::test]
async fn test_status_is_monotonic() {
    let wf = workflow_with(
        MockTranscriber::new("unused"),
        MockFeedbackProvider::new(GOOD_FEEDBACK),
    );
    let cid = wf
        .create_candidate(&admin(), "example_candidate", "Software Engineer")
        .unwrap();
    let tid = wf.create_sample_test(&admin(), cid).unwrap();
    let me = CallerCtx::candidate(cid);
    let questions: Vec<u64> = wf.test(tid).unwrap().questions.iter().map(|q| q.id).collect();

    // Pending 不能被 complete_test 推进
    assert!(wf.complete_test(&me, tid).is_err());
    assert_eq!(wf.test(tid).unwrap().status, TestStatus::Pending);

    wf.open_question(&me, tid, questions[0]).unwrap();
    wf.submit_answer(&me, questions[0], AnswerInput::text("My answer"))
        .await
        .unwrap();

    // 部分题目未打分也允许完成
    wf.complete_test(&me, tid).unwrap();
    assert_eq!(wf.test(tid).unwrap().status, TestStatus::Completed);

    // 完成后的操作都不能改变状态
    assert_eq!(
        wf.open_question(&me, tid, questions[1]).unwrap(),
        TestStatus::Completed
    );
    assert!(wf.complete_test(&me, tid).is_err());
    assert!(wf
        .append_question(&admin(), tid, NewQuestion::new("Late question"))
        .is_err());
    assert!(wf.remove_question(&admin(), questions[2]).is_err());
    let err = wf
        .submit_answer(&me, questions[1], AnswerInput::text("Too late"))
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_workflow(),
        Some(WorkflowError::InvalidTransition {
            from: TestStatus::Completed,
            ..
        })
    ));
    wf.override_score(&admin(), questions[1], 6.0, "Reviewed offline")
        .unwrap();
    assert_eq!(wf.test(tid).unwrap().status, TestStatus::Completed);
}

#[tokio::test]
async fn test_complete_without_questions_fails() {
    let wf = workflow_with(
        MockTranscriber::new("unused"),
        MockFeedbackProvider::new(GOOD_FEEDBACK),
    );
    let cid = wf
        .create_candidate(&admin(), "example_candidate", "Software Engineer")
        .unwrap();
    let tid = wf.create_test(&admin(), cid, "Empty", "", vec![]).unwrap();

    let err = wf
        .complete_test(&CallerCtx::candidate(cid), tid)
        .unwrap_err();
    assert!(matches!(
        err.as_workflow(),
        Some(WorkflowError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn test_missing_input_leaves_question_unmodified() {
    let wf = workflow_with(
        MockTranscriber::new("unused"),
        MockFeedbackProvider::new(GOOD_FEEDBACK),
    );
    let (me, _, qid) = started_test(&wf);
    let before = wf.question(qid).unwrap();

    let err = wf
        .submit_answer(&me, qid, AnswerInput::default())
        .await
        .unwrap_err();

    assert_eq!(
        err.as_workflow(),
        Some(&WorkflowError::MissingInput { question_id: qid })
    );
    assert_eq!(wf.question(qid).unwrap(), before);
}

#[tokio::test]
async fn test_concurrent_submissions_one_is_busy() {
    let gate = Gate::new();
    let wf = Arc::new(workflow_with(
        MockTranscriber::new("first"),
        MockFeedbackProvider::new(GOOD_FEEDBACK).with_gate(gate.clone()),
    ));
    let (me, _, qid) = started_test(&wf);

    let first = {
        let wf = wf.clone();
        let me = me.clone();
        tokio::spawn(async move { wf.submit_answer(&me, qid, AnswerInput::text("first")).await })
    };
    gate.entered.notified().await;

    let second = wf
        .submit_answer(&me, qid, AnswerInput::text("second"))
        .await
        .unwrap_err();
    assert_eq!(
        second.as_workflow(),
        Some(&WorkflowError::Busy { question_id: qid })
    );

    gate.release.notify_one();
    assert!(first.await.unwrap().unwrap().is_success());

    let q = wf.question(qid).unwrap().question;
    assert_eq!(q.transcript.as_deref(), Some("first"));
    assert_eq!(q.score, Some(8.0));
}

#[tokio::test]
async fn test_transcription_failure_commits_nothing() {
    let wf = workflow_with(
        MockTranscriber::failing(ProviderError::BadStatus {
            provider: "mock-transcriber".to_string(),
            status: 503,
        }),
        MockFeedbackProvider::new(GOOD_FEEDBACK),
    );
    let (me, _, qid) = started_test(&wf);
    let before = wf.question(qid).unwrap();

    let outcome = wf
        .submit_answer(&me, qid, AnswerInput::audio(vec![1, 2]))
        .await
        .unwrap();

    assert!(matches!(outcome, EvaluationOutcome::TranscriptionFailed { .. }));
    assert_eq!(wf.question(qid).unwrap(), before);
}

#[tokio::test]
async fn test_failed_resubmission_keeps_committed_answer() {
    let store = Arc::new(AssessmentStore::new());
    let workflow_on = |transcriber: MockTranscriber| {
        AssessmentWorkflow::new(
            store.clone(),
            Arc::new(transcriber),
            Arc::new(MockFeedbackProvider::new(GOOD_FEEDBACK)),
            Arc::new(MockReferenceQa::new("A structured STAR answer", 0.8)),
        )
    };

    let wf = workflow_on(MockTranscriber::new("I led a team through a tight deadline"));
    let (me, tid, qid) = started_test(&wf);
    assert!(wf
        .submit_answer(&me, qid, AnswerInput::audio(vec![0; 16]))
        .await
        .unwrap()
        .is_success());
    let committed = wf.question(qid).unwrap();
    assert_eq!(committed.question.score, Some(8.0));

    let unavailable = workflow_on(MockTranscriber::failing(ProviderError::BadStatus {
        provider: "mock-transcriber".to_string(),
        status: 503,
    }));
    let blank = workflow_on(MockTranscriber::new("   "));

    for retry in [&unavailable, &blank] {
        let outcome = retry
            .submit_answer(&me, qid, AnswerInput::audio(vec![1, 2]))
            .await
            .unwrap();
        assert!(matches!(outcome, EvaluationOutcome::TranscriptionFailed { .. }));
        assert_eq!(retry.question(qid).unwrap(), committed);
    }
    assert_eq!(wf.aggregate_score(tid).unwrap(), Some(8.0));
}

#[tokio::test]
async fn test_feedback_failure_commits_defaults() {
    let wf = workflow_with(
        MockTranscriber::new("unused"),
        MockFeedbackProvider::failing(ProviderError::request_failed("mock-feedback", "timeout")),
    );
    let (me, tid, qid) = started_test(&wf);

    let outcome = wf
        .submit_answer(&me, qid, AnswerInput::text("I stay calm"))
        .await
        .unwrap();

    assert!(matches!(outcome, EvaluationOutcome::FeedbackFailed { .. }));
    let q = wf.question(qid).unwrap().question;
    assert_eq!(q.transcript.as_deref(), Some("I stay calm"));
    assert_eq!(q.score, Some(DEFAULT_SCORE));
    assert_eq!(wf.aggregate_score(tid).unwrap(), Some(DEFAULT_SCORE));
}

#[tokio::test]
async fn test_override_is_authoritative() {
    let wf = workflow_with(
        MockTranscriber::new("unused"),
        MockFeedbackProvider::new(GOOD_FEEDBACK),
    );
    let (me, tid, qid) = started_test(&wf);

    wf.override_score(&admin(), qid, 4.0, "Answer avoided the question")
        .unwrap();
    wf.submit_answer(&me, qid, AnswerInput::text("A later answer"))
        .await
        .unwrap();

    let q = wf.question(qid).unwrap().question;
    assert_eq!(q.score, Some(4.0));
    assert!(q.is_overridden());
    assert_eq!(q.transcript.as_deref(), Some("A later answer"));
    assert_eq!(wf.aggregate_score(tid).unwrap(), Some(4.0));

    // 候选人不能人工评分
    assert!(wf.override_score(&me, qid, 10.0, "self review").is_err());
}

#[tokio::test]
async fn test_candidate_cannot_touch_other_tests() {
    let wf = workflow_with(
        MockTranscriber::new("unused"),
        MockFeedbackProvider::new(GOOD_FEEDBACK),
    );
    let (_, tid, qid) = started_test(&wf);
    let intruder = CallerCtx::candidate(42);

    assert!(matches!(
        wf.open_question(&intruder, tid, qid).unwrap_err().as_workflow(),
        Some(WorkflowError::Forbidden { .. })
    ));
    assert!(wf
        .submit_answer(&intruder, qid, AnswerInput::text("not mine"))
        .await
        .is_err());
}

#[tokio::test]
async fn test_candidate_report_reflects_completion() {
    let wf = workflow_with(
        MockTranscriber::new("unused"),
        MockFeedbackProvider::new(GOOD_FEEDBACK),
    );
    let (me, tid, qid) = started_test(&wf);
    let cid = wf.test(tid).unwrap().candidate_id;

    wf.submit_answer(&me, qid, AnswerInput::text("Answer"))
        .await
        .unwrap();
    assert_eq!(
        wf.candidate_report(&admin(), cid).unwrap().review_status,
        ReviewStatus::Pending
    );

    wf.complete_test(&me, tid).unwrap();
    let report = wf.candidate_report(&admin(), cid).unwrap();
    assert_eq!(report.review_status, ReviewStatus::Ready);
    assert_eq!(report.score, Some(8.0));
    assert_eq!(report.tests[0].questions[0].answer.as_deref(), Some("Answer"));
}

#[tokio::test]
async fn test_batch_run_writes_report() {
    logging::init(false);
    let dir = tempfile::tempdir().unwrap();
    let assessments = dir.path().join("assessments");
    std::fs::create_dir(&assessments).unwrap();
    std::fs::write(assessments.join("q1.wav"), b"fake audio").unwrap();
    std::fs::write(
        assessments.join("candidate_a.toml"),
        r#"
title = "Technical Interview Assessment"
complete = true

[candidate]
name = "example_candidate"
position = "Software Engineer"

[[questions]]
text = "Tell me about a challenge you overcame?"
answer_audio = "q1.wav"

[[questions]]
text = "Why should we hire you?"
answer_text = "I ship reliable software"

[[questions]]
text = "Where do you see yourself in 5 years?"
"#,
    )
    .unwrap();
    std::fs::write(assessments.join("broken.toml"), "title = ").unwrap();

    let report_path = dir.path().join("report.json");
    let config = Config {
        assessments_folder: assessments.display().to_string(),
        report_output_file: report_path.display().to_string(),
        max_concurrent_evaluations: 2,
        ..Config::default()
    };
    let app = App::with_workflow(
        config,
        workflow_with(
            MockTranscriber::new("I led a team through a tight deadline"),
            MockFeedbackProvider::new(GOOD_FEEDBACK),
        ),
    );

    let stats = app.run().await.unwrap();
    assert_eq!(stats.success, 2);
    assert_eq!(stats.errors, 0);

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    let candidate = &report[0];
    assert_eq!(candidate["name"], "example_candidate");
    assert_eq!(candidate["review_status"], "Ready");
    assert_eq!(candidate["score"], 8.0);
    let questions = candidate["tests"][0]["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 3);
    assert_eq!(questions[0]["answer"], "I led a team through a tight deadline");
    assert!(questions[0]["audio_ref"].as_str().unwrap().ends_with("q1.wav"));
    assert!(questions[2]["score"].is_null());
}
