//! Integration tests for the course transition engine.
//!
//! Drives `TransitionEngine` against `MemoryCourseStore` to verify that:
//! - Only edges of the status graph are accepted, and refusals mutate nothing
//! - Capabilities and the review gate are enforced before any write
//! - Publishing snapshots content into contiguous version numbers
//! - Store failures and lost races leave status, history and versions intact
//! - Restoring a version rewrites content only and is audited once
//! - Listeners see exactly one event per committed transition

use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use lectern_core::audit::verify_chain;
use lectern_core::course::{Chapter, Course, CourseContent, Curriculum, Lesson};
use lectern_core::lifecycle::memory::MemoryCourseStore;
use lectern_core::lifecycle::store::CourseStore;
use lectern_core::lifecycle::{
    Capability, CourseStatus, LifecycleConfig, LifecycleError, Principal, RequestContext,
    StatusChange, TransitionEngine, TransitionListener, TransitionRequest,
};

const AUTHOR_ID: i64 = 7;
const ADMIN_ID: i64 = 1;
const OTHER_INSTRUCTOR_ID: i64 = 42;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn complete_content() -> CourseContent {
    CourseContent {
        title: "Rust for Backend Engineers".to_string(),
        short_description: Some("Build reliable services with Rust".to_string()),
        description: Some("A long-form description.".to_string()),
        requirements: vec!["Basic programming".to_string()],
        learning_outcomes: vec!["Write async services".to_string()],
        target_audience: vec!["Backend developers".to_string()],
        category: Some("programming".to_string()),
        level: Some("intermediate".to_string()),
        price_cents: Some(4900),
        duration_hours: Some(6.5),
        thumbnail_url: Some("https://cdn.example.com/rust.png".to_string()),
        video_url: None,
    }
}

fn three_lessons() -> Curriculum {
    let lesson = |title: &str| Lesson {
        title: title.to_string(),
        duration_minutes: Some(20),
        video_url: None,
    };
    Curriculum {
        chapters: vec![Chapter {
            title: "Getting started".to_string(),
            lessons: vec![lesson("Ownership"), lesson("Traits"), lesson("Async")],
        }],
    }
}

struct Harness {
    store: Arc<MemoryCourseStore>,
    engine: TransitionEngine,
    recorder: Arc<Recorder>,
}

fn harness() -> Harness {
    harness_with(LifecycleConfig::default())
}

fn harness_with(config: LifecycleConfig) -> Harness {
    let store = Arc::new(MemoryCourseStore::new());
    let recorder = Arc::new(Recorder::default());
    let engine = TransitionEngine::new(store.clone(), config).with_listener(recorder.clone());
    Harness {
        store,
        engine,
        recorder,
    }
}

impl Harness {
    async fn seed(&self, status: &str, content: CourseContent) -> Course {
        let now = chrono::Utc::now();
        self.store
            .seed_course(Course {
                id: 0,
                author_id: AUTHOR_ID,
                content,
                curriculum: three_lessons(),
                status: status.to_string(),
                created_at: now,
                updated_at: now,
            })
            .await
    }

    async fn persisted_status(&self, course_id: i64) -> String {
        self.store
            .find_course(course_id)
            .await
            .unwrap()
            .expect("course exists")
            .status
    }
}

fn author() -> Principal {
    Principal::new(AUTHOR_ID, [Capability::Author])
}

fn admin() -> Principal {
    Principal::new(ADMIN_ID, [Capability::Administrator])
}

#[derive(Default)]
struct Recorder {
    changes: Mutex<Vec<StatusChange>>,
}

impl TransitionListener for Recorder {
    fn status_changed(&self, change: &StatusChange) {
        self.changes.lock().unwrap().push(change.clone());
    }
}

impl Recorder {
    fn count(&self) -> usize {
        self.changes.lock().unwrap().len()
    }
}

// ---------------------------------------------------------------------------
// Test: every pair outside the graph is refused without mutation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn illegal_pairs_are_refused_and_leave_status_untouched() {
    let h = harness();
    for from in CourseStatus::ALL {
        for to in CourseStatus::ALL {
            if from.can_transition_to(to) {
                continue;
            }
            let mut course = h.seed(from.as_str(), complete_content()).await;
            let result = h
                .engine
                .transition(&mut course, &admin(), TransitionRequest::to(to))
                .await;

            assert_matches!(
                result,
                Err(LifecycleError::IllegalTransition { from: f, to: t }) if f == from && t == to,
                "{from} -> {to} should be illegal"
            );
            assert_eq!(course.status, from.as_str());
            assert_eq!(h.persisted_status(course.id).await, from.as_str());
            assert!(h.store.history_for(course.id).await.unwrap().is_empty());
        }
    }
    assert_eq!(h.recorder.count(), 0);
}

#[tokio::test]
async fn draft_cannot_skip_review() {
    let h = harness();
    let mut course = h.seed("draft", complete_content()).await;
    let err = h
        .engine
        .transition(&mut course, &admin(), TransitionRequest::to(CourseStatus::Published))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Cannot transition course from Draft to Published");
}

// ---------------------------------------------------------------------------
// Test: every listed edge succeeds for a sufficiently privileged principal
// ---------------------------------------------------------------------------

#[tokio::test]
async fn every_listed_edge_succeeds_for_admin() {
    let h = harness();
    for from in CourseStatus::ALL {
        for &to in from.allowed_transitions() {
            let mut course = h.seed(from.as_str(), complete_content()).await;
            let outcome = h
                .engine
                .transition(&mut course, &admin(), TransitionRequest::to(to))
                .await
                .unwrap_or_else(|e| panic!("{from} -> {to} failed: {e}"));

            assert_eq!(outcome.old_status, from);
            assert_eq!(outcome.new_status, to);
            assert_eq!(course.status, to.as_str());
            assert_eq!(h.persisted_status(course.id).await, to.as_str());
        }
    }
}

// ---------------------------------------------------------------------------
// Test: submit scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_with_short_title_and_no_description_fails_validation() {
    let h = harness();
    let content = CourseContent {
        title: "AB".to_string(),
        short_description: None,
        ..complete_content()
    };
    let mut course = h.seed("draft", content).await;

    let err = h
        .engine
        .transition(&mut course, &author(), TransitionRequest::to(CourseStatus::InReview))
        .await
        .unwrap_err();

    let errors = assert_matches!(err, LifecycleError::ValidationFailed(errors) => errors);
    assert!(errors.iter().any(|e| e.contains("Title")));
    assert!(errors.iter().any(|e| e.contains("description")));
    assert_eq!(course.status, "draft");
    assert!(h.store.history_for(course.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn author_submits_complete_course() {
    let h = harness();
    let mut course = h.seed("draft", complete_content()).await;

    let outcome = h
        .engine
        .transition(&mut course, &author(), TransitionRequest::to(CourseStatus::InReview))
        .await
        .unwrap();

    assert_eq!(outcome.status, "success");
    assert_eq!(outcome.version_number, None);
    assert_eq!(course.status, "in_review");

    let history = h.store.history_for(course.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].from_status, "draft");
    assert_eq!(history[0].to_status, "in_review");
    assert_eq!(history[0].actor_id, AUTHOR_ID);
    assert!(h.store.versions_for(course.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn non_owner_instructor_cannot_submit() {
    let h = harness();
    let mut course = h.seed("draft", complete_content()).await;
    let outsider = Principal::for_course(OTHER_INSTRUCTOR_ID, "instructor", &course);

    let err = h
        .engine
        .transition(&mut course, &outsider, TransitionRequest::to(CourseStatus::InReview))
        .await
        .unwrap_err();

    assert_matches!(
        err,
        LifecycleError::Forbidden {
            required: Capability::Author,
            target: CourseStatus::InReview
        }
    );
    assert_eq!(course.status, "draft");
    assert_eq!(h.persisted_status(course.id).await, "draft");
    assert!(h.store.history_for(course.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn author_cannot_publish_own_course() {
    let h = harness();
    let mut course = h.seed("in_review", complete_content()).await;
    let err = h
        .engine
        .transition(&mut course, &author(), TransitionRequest::to(CourseStatus::Published))
        .await
        .unwrap_err();
    assert_matches!(
        err,
        LifecycleError::Forbidden {
            required: Capability::Administrator,
            ..
        }
    );
}

#[tokio::test]
async fn restoring_soft_deleted_course_requires_admin() {
    let h = harness();
    let mut course = h.seed("soft_deleted", complete_content()).await;
    let err = h
        .engine
        .transition(&mut course, &author(), TransitionRequest::to(CourseStatus::Draft))
        .await
        .unwrap_err();
    assert_matches!(
        err,
        LifecycleError::Forbidden {
            required: Capability::Administrator,
            target: CourseStatus::Draft
        }
    );

    h.engine
        .transition(&mut course, &admin(), TransitionRequest::to(CourseStatus::Draft))
        .await
        .unwrap();
    assert_eq!(course.status, "draft");
}

#[tokio::test]
async fn validation_only_runs_when_entering_review() {
    let h = harness();
    let mut course = h.seed("in_review", CourseContent::default()).await;
    h.engine
        .transition(&mut course, &admin(), TransitionRequest::to(CourseStatus::Rejected))
        .await
        .unwrap();
    h.engine
        .transition(&mut course, &author(), TransitionRequest::to(CourseStatus::Draft))
        .await
        .unwrap();
    assert_eq!(course.status, "draft");
}

#[tokio::test]
async fn unknown_persisted_status_is_invalid_state() {
    let h = harness();
    let mut course = h.seed("pending", complete_content()).await;
    let err = h
        .engine
        .transition(&mut course, &admin(), TransitionRequest::to(CourseStatus::Draft))
        .await
        .unwrap_err();
    assert_matches!(err, LifecycleError::InvalidState { value, .. } if value == "pending");
}

// ---------------------------------------------------------------------------
// Test: publishing and version numbering
// ---------------------------------------------------------------------------

#[tokio::test]
async fn publish_creates_first_version() {
    let h = harness();
    let mut course = h.seed("in_review", complete_content()).await;

    let outcome = h
        .engine
        .transition(&mut course, &admin(), TransitionRequest::to(CourseStatus::Published))
        .await
        .unwrap();

    assert_eq!(outcome.version_number, Some(1));
    assert_eq!(course.status, "published");

    let versions = h.store.versions_for(course.id).await.unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].version_number, 1);
    assert_eq!(versions[0].content, complete_content());
    assert_eq!(versions[0].created_by, ADMIN_ID);

    let history = h.store.history_for(course.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].from_status, "in_review");
    assert_eq!(history[0].to_status, "published");
}

#[tokio::test]
async fn archive_then_republish_creates_second_version() {
    let h = harness();
    let mut course = h.seed("in_review", complete_content()).await;

    for target in [
        CourseStatus::Published,
        CourseStatus::Archived,
        CourseStatus::Published,
    ] {
        h.engine
            .transition(&mut course, &admin(), TransitionRequest::to(target))
            .await
            .unwrap();
    }

    let numbers: Vec<i32> = h
        .store
        .versions_for(course.id)
        .await
        .unwrap()
        .iter()
        .map(|v| v.version_number)
        .collect();
    assert_eq!(numbers, vec![2, 1]);
}

#[tokio::test]
async fn transient_version_conflicts_are_retried() {
    let h = harness();
    let mut course = h.seed("in_review", complete_content()).await;
    h.store.inject_version_conflicts(2);

    let outcome = h
        .engine
        .transition(&mut course, &admin(), TransitionRequest::to(CourseStatus::Published))
        .await
        .unwrap();

    assert_eq!(outcome.version_number, Some(1));
    assert_eq!(h.store.history_for(course.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn exhausted_version_retries_become_conflict() {
    let h = harness_with(LifecycleConfig {
        max_version_retries: 1,
    });
    let mut course = h.seed("in_review", complete_content()).await;
    h.store.inject_version_conflicts(2);

    let err = h
        .engine
        .transition(&mut course, &admin(), TransitionRequest::to(CourseStatus::Published))
        .await
        .unwrap_err();

    assert_matches!(err, LifecycleError::Conflict(_));
    assert_eq!(course.status, "in_review");
    assert_eq!(h.persisted_status(course.id).await, "in_review");
    assert!(h.store.versions_for(course.id).await.unwrap().is_empty());
    assert!(h.store.history_for(course.id).await.unwrap().is_empty());
    assert_eq!(h.recorder.count(), 0);
}

#[tokio::test]
async fn concurrent_publishes_produce_one_version() {
    let h = harness();
    let course = h.seed("in_review", complete_content()).await;
    let engine = Arc::new(h.engine);

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let engine = Arc::clone(&engine);
        let mut copy = course.clone();
        tasks.push(tokio::spawn(async move {
            engine
                .transition(&mut copy, &admin(), TransitionRequest::to(CourseStatus::Published))
                .await
        }));
    }

    let mut successes = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => successes += 1,
            Err(e) => assert_matches!(e, LifecycleError::Conflict(_)),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(h.store.versions_for(course.id).await.unwrap().len(), 1);
    assert_eq!(h.store.history_for(course.id).await.unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Test: failed commits are all-or-nothing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_commit_leaves_everything_untouched() {
    let h = harness();
    let mut course = h.seed("in_review", complete_content()).await;
    h.store.fail_next_commit();

    let err = h
        .engine
        .transition(&mut course, &admin(), TransitionRequest::to(CourseStatus::Published))
        .await
        .unwrap_err();

    assert_matches!(err, LifecycleError::Storage(_));
    assert_eq!(course.status, "in_review");
    assert_eq!(h.persisted_status(course.id).await, "in_review");
    assert!(h.store.versions_for(course.id).await.unwrap().is_empty());
    assert!(h.store.history_for(course.id).await.unwrap().is_empty());
    assert_eq!(h.recorder.count(), 0);
}

#[tokio::test]
async fn stale_in_memory_course_is_a_conflict() {
    let h = harness();
    let mut course = h.seed("in_review", complete_content()).await;
    let mut stale = course.clone();

    h.engine
        .transition(&mut course, &admin(), TransitionRequest::to(CourseStatus::Rejected))
        .await
        .unwrap();

    let err = h
        .engine
        .transition(&mut stale, &admin(), TransitionRequest::to(CourseStatus::Published))
        .await
        .unwrap_err();
    assert_matches!(err, LifecycleError::Conflict(_));
    assert_eq!(h.persisted_status(course.id).await, "rejected");
}

// ---------------------------------------------------------------------------
// Test: audit trail
// ---------------------------------------------------------------------------

#[tokio::test]
async fn audit_entries_carry_reason_metadata_and_context() {
    let h = harness();
    let mut course = h.seed("in_review", complete_content()).await;
    let request = TransitionRequest::to(CourseStatus::Rejected)
        .with_reason("Needs more exercises")
        .with_metadata(serde_json::json!({"ticket": 12}))
        .with_context(RequestContext {
            ip_address: Some("10.0.0.5".to_string()),
            user_agent: Some("lectern-tests".to_string()),
        });

    h.engine
        .transition(&mut course, &admin(), request)
        .await
        .unwrap();

    let history = h.store.history_for(course.id).await.unwrap();
    let entry = &history[0];
    assert_eq!(entry.reason.as_deref(), Some("Needs more exercises"));
    assert_eq!(entry.metadata, Some(serde_json::json!({"ticket": 12})));
    assert_eq!(entry.ip_address.as_deref(), Some("10.0.0.5"));
    assert_eq!(entry.user_agent.as_deref(), Some("lectern-tests"));
}

#[tokio::test]
async fn history_reads_are_idempotent_and_chain_verifies() {
    let h = harness();
    let mut course = h.seed("draft", complete_content()).await;
    h.engine
        .transition(&mut course, &author(), TransitionRequest::to(CourseStatus::InReview))
        .await
        .unwrap();
    h.engine
        .transition(&mut course, &admin(), TransitionRequest::to(CourseStatus::Published))
        .await
        .unwrap();
    h.engine
        .transition(&mut course, &admin(), TransitionRequest::to(CourseStatus::Archived))
        .await
        .unwrap();

    let first = h.store.history_for(course.id).await.unwrap();
    let second = h.store.history_for(course.id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    assert_eq!(first[0].to_status, "archived");

    let versions_a = h.store.versions_for(course.id).await.unwrap();
    let versions_b = h.store.versions_for(course.id).await.unwrap();
    assert_eq!(versions_a, versions_b);

    let mut oldest_first = first;
    oldest_first.reverse();
    let verification = verify_chain(&oldest_first);
    assert!(verification.chain_valid);
    assert_eq!(verification.verified_entries, 3);
}

// ---------------------------------------------------------------------------
// Test: restore from version
// ---------------------------------------------------------------------------

#[tokio::test]
async fn restore_from_version_rewrites_content_only() {
    let h = harness();
    let mut course = h.seed("in_review", complete_content()).await;
    h.engine
        .transition(&mut course, &admin(), TransitionRequest::to(CourseStatus::Published))
        .await
        .unwrap();
    let version = h.store.versions_for(course.id).await.unwrap().remove(0);

    // Pretend the live content drifted after publishing.
    course.content.title = "Something else entirely".to_string();
    let history_before = h.store.history_for(course.id).await.unwrap().len();
    let events_before = h.recorder.count();

    let outcome = h
        .engine
        .restore_from_version(&mut course, &version, &admin(), RequestContext::default())
        .await
        .unwrap();

    assert_eq!(outcome.restored_from_version, 1);
    assert_eq!(course.status, "published");
    assert_eq!(course.content, version.content);

    let stored = h.store.find_course(course.id).await.unwrap().unwrap();
    assert_eq!(stored.status, "published");
    assert_eq!(stored.content, version.content);

    let history = h.store.history_for(course.id).await.unwrap();
    assert_eq!(history.len(), history_before + 1);
    let entry = &history[0];
    assert_eq!(entry.from_status, "published");
    assert_eq!(entry.to_status, "published");
    assert_eq!(
        entry.reason.as_deref(),
        Some("Restored content from version 1")
    );
    assert_eq!(
        entry.metadata,
        Some(serde_json::json!({"restored_from_version": 1}))
    );
    assert_eq!(h.recorder.count(), events_before);
}

#[tokio::test]
async fn restore_rejects_version_of_another_course() {
    let h = harness();
    let mut first = h.seed("in_review", complete_content()).await;
    let mut second = h.seed("in_review", complete_content()).await;
    h.engine
        .transition(&mut first, &admin(), TransitionRequest::to(CourseStatus::Published))
        .await
        .unwrap();
    let version = h.store.versions_for(first.id).await.unwrap().remove(0);

    let err = h
        .engine
        .restore_from_version(&mut second, &version, &admin(), RequestContext::default())
        .await
        .unwrap_err();
    assert_matches!(err, LifecycleError::InvalidArgument(_));
    assert!(h.store.history_for(second.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn restore_requires_admin() {
    let h = harness();
    let mut course = h.seed("in_review", complete_content()).await;
    h.engine
        .transition(&mut course, &admin(), TransitionRequest::to(CourseStatus::Published))
        .await
        .unwrap();
    let version = h.store.versions_for(course.id).await.unwrap().remove(0);

    let err = h
        .engine
        .restore_from_version(&mut course, &version, &author(), RequestContext::default())
        .await
        .unwrap_err();
    assert_matches!(err, LifecycleError::Forbidden { .. });
}

#[tokio::test]
async fn non_admin_is_forbidden_before_version_ownership_is_checked() {
    let h = harness();
    let mut first = h.seed("in_review", complete_content()).await;
    let mut second = h.seed("published", complete_content()).await;
    h.engine
        .transition(&mut first, &admin(), TransitionRequest::to(CourseStatus::Published))
        .await
        .unwrap();
    let version = h.store.versions_for(first.id).await.unwrap().remove(0);

    let err = h
        .engine
        .restore_from_version(&mut second, &version, &author(), RequestContext::default())
        .await
        .unwrap_err();
    assert_matches!(
        err,
        LifecycleError::Forbidden { required: Capability::Administrator, .. }
    );
    assert!(h.store.history_for(second.id).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Test: listener notifications
// ---------------------------------------------------------------------------

#[tokio::test]
async fn listener_receives_one_event_per_success() {
    let h = harness();
    let mut course = h.seed("draft", complete_content()).await;

    h.engine
        .transition(&mut course, &author(), TransitionRequest::to(CourseStatus::InReview))
        .await
        .unwrap();
    let _ = h
        .engine
        .transition(&mut course, &author(), TransitionRequest::to(CourseStatus::Published))
        .await
        .unwrap_err();
    h.engine
        .transition(
            &mut course,
            &admin(),
            TransitionRequest::to(CourseStatus::Rejected).with_reason("Too short"),
        )
        .await
        .unwrap();

    let changes = h.recorder.changes.lock().unwrap().clone();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[1].from, CourseStatus::InReview);
    assert_eq!(changes[1].to, CourseStatus::Rejected);
    assert_eq!(changes[1].author_id, AUTHOR_ID);
    assert_eq!(changes[1].actor_id, ADMIN_ID);
    assert_eq!(changes[1].reason.as_deref(), Some("Too short"));
    assert_eq!(changes[1].course_title, "Rust for Backend Engineers");
}
