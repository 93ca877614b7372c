use super::*;
use crate::error::QuizError;

fn items(pairs: &[(&str, &str)]) -> Vec<QuizItem> {
    pairs
        .iter()
        .map(|(prompt, label)| QuizItem::new(*prompt, *label))
        .collect()
}

fn active(pairs: &[(&str, &str)]) -> QuizMatchingEngine {
    let mut engine = QuizMatchingEngine::new();
    engine.start(items(pairs)).unwrap();
    engine
}

#[test]
fn test_chair_table_session_scores_one_of_two() {
    let mut engine = active(&[("chaise", "chair"), ("table", "table")]);
    assert_eq!(engine.phase(), QuizPhase::Active { index: 0 });

    assert_eq!(
        engine.attempt(["chair", "person"]),
        AttemptOutcome::Resolved { correct: true }
    );
    assert_eq!(engine.score(), 1);

    assert_eq!(engine.advance().unwrap(), QuizPhase::Active { index: 1 });
    assert!(!engine.answer_shown());

    assert_eq!(engine.attempt(["sofa"]), AttemptOutcome::Resolved { correct: false });
    assert_eq!(engine.score(), 1);

    assert_eq!(engine.advance().unwrap(), QuizPhase::Completed);
    assert_eq!(engine.current_index(), engine.len());

    let summary = engine.summary().unwrap();
    assert_eq!((summary.score, summary.total), (1, 2));
    assert!(summary.outcomes[0].correct);
    assert!(!summary.outcomes[1].correct);
    assert_eq!(summary.outcomes[1].attempts, 1);
}

#[test]
fn test_start_with_no_items_is_empty_not_completed() {
    let mut engine = QuizMatchingEngine::new();
    assert_eq!(engine.start(Vec::new()).unwrap(), QuizPhase::Empty);
    assert!(engine.phase().is_terminal());
    assert!(engine.summary().is_none());
    assert_eq!(
        engine.attempt(["chair"]),
        AttemptOutcome::Ignored(IgnoredAttempt::NotActive)
    );
}

#[test]
fn test_start_only_from_loading() {
    let mut engine = active(&[("livre", "book")]);
    assert_eq!(
        engine.start(items(&[("chat", "cat")])),
        Err(QuizError::InvalidTransition {
            phase: "active",
            operation: "start"
        })
    );
}

#[test]
fn test_prepare_then_begin() {
    let mut engine = QuizMatchingEngine::new();
    assert_eq!(engine.prepare(items(&[("tasse", "cup")])).unwrap(), QuizPhase::Ready);
    assert_eq!(
        engine.attempt(["cup"]),
        AttemptOutcome::Ignored(IgnoredAttempt::NotActive)
    );
    assert!(engine.advance().is_err());

    assert_eq!(engine.begin().unwrap(), QuizPhase::Active { index: 0 });
    assert!(engine.begin().is_err());
}

#[test]
fn test_comparison_is_case_insensitive() {
    let mut engine = active(&[("Stuhl", "Chair")]);
    assert_eq!(
        engine.attempt([" CHAIR "]),
        AttemptOutcome::Resolved { correct: true }
    );
}

#[test]
fn test_single_flight_attempts() {
    let mut engine = active(&[("tasse", "cup"), ("livre", "book")]);

    let ticket = engine.begin_attempt().unwrap();
    assert!(engine.is_attempt_in_flight());

    // Rapid taps while the detection is outstanding do nothing
    for _ in 0..5 {
        assert!(engine.begin_attempt().is_none());
        assert_eq!(
            engine.attempt(["cup"]),
            AttemptOutcome::Ignored(IgnoredAttempt::InFlight)
        );
    }
    assert_eq!(engine.score(), 0);

    // Advancing is blocked until the attempt resolves
    assert!(engine.advance().is_err());

    assert!(engine.resolve_attempt(ticket, ["cup"]).unwrap());
    assert!(!engine.is_attempt_in_flight());
    assert_eq!(engine.score(), 1);
    assert_eq!(engine.advance().unwrap(), QuizPhase::Active { index: 1 });
}

#[test]
fn test_stale_ticket_is_rejected_without_mutation() {
    let mut engine = active(&[("tasse", "cup")]);

    let first = engine.begin_attempt().unwrap();
    assert!(!engine.resolve_attempt(first, ["plate"]).unwrap());

    let second = engine.begin_attempt().unwrap();
    assert_ne!(first.attempt_id, second.attempt_id);

    assert_eq!(
        engine.resolve_attempt(first, ["cup"]),
        Err(QuizError::StaleTicket {
            attempt_id: first.attempt_id
        })
    );
    assert_eq!(engine.score(), 0);
    assert!(engine.is_attempt_in_flight());
    assert_eq!(engine.attempts_on_current(), 1);
}

#[test]
fn test_no_double_scoring_after_correct_answer() {
    let mut engine = active(&[("tasse", "cup")]);

    assert_eq!(engine.attempt(["cup"]), AttemptOutcome::Resolved { correct: true });
    assert!(engine.answer_shown());
    assert_eq!(
        engine.attempt(["cup"]),
        AttemptOutcome::Ignored(IgnoredAttempt::AlreadyCorrect)
    );
    assert_eq!(engine.score(), 1);
    assert!(engine.score() <= engine.len());
}

#[test]
fn test_reveal_answer_leaves_score_and_index() {
    let mut engine = active(&[("bouteille", "bottle"), ("chien", "dog")]);

    let item = engine.reveal_answer().unwrap();
    assert_eq!(item.expected_label(), "bottle");
    assert!(engine.answer_shown());
    assert_eq!(engine.score(), 0);
    assert_eq!(engine.current_index(), 0);

    // Still answerable after revealing
    assert_eq!(engine.attempt(["bottle"]), AttemptOutcome::Resolved { correct: true });

    engine.advance().unwrap();
    assert!(!engine.answer_shown());

    engine.reveal_answer().unwrap();
    engine.advance().unwrap();
    let summary = engine.summary().unwrap();
    assert!(summary.outcomes[1].revealed);
    assert!(!summary.outcomes[1].correct);
    assert_eq!(summary.grade, ScoreGrade::KeepPracticing);
}

#[test]
fn test_reveal_outside_active_is_an_error() {
    let mut engine = QuizMatchingEngine::new();
    assert!(engine.reveal_answer().is_err());
}

#[test]
fn test_abandon_discards_in_flight_attempt() {
    let mut engine = active(&[("tasse", "cup")]);
    let ticket = engine.begin_attempt().unwrap();

    assert!(engine.abandon());
    assert_eq!(engine.phase(), QuizPhase::Abandoned);
    assert!(!engine.is_attempt_in_flight());
    assert!(matches!(
        engine.resolve_attempt(ticket, ["cup"]),
        Err(QuizError::StaleTicket { .. })
    ));
    assert_eq!(engine.score(), 0);

    // Terminal states stay put
    assert!(!engine.abandon());
}

#[test]
fn test_score_and_index_bounds_over_full_session() {
    let pairs = [("a", "apple"), ("b", "book"), ("c", "cat"), ("d", "dog")];
    let mut engine = active(&pairs);
    let detections: [&[&str]; 4] = [&["apple"], &[], &["cat", "apple"], &["dog"]];

    for labels in detections {
        for _ in 0..3 {
            engine.attempt(labels.iter());
            assert!(engine.score() <= engine.len());
            assert!(engine.current_index() <= engine.len());
        }
        engine.advance().unwrap();
    }

    assert_eq!(engine.phase(), QuizPhase::Completed);
    assert_eq!(engine.score(), 3);
    assert_eq!(engine.summary().unwrap().grade, ScoreGrade::Good);
    assert!(engine.advance().is_err());
}

#[test]
fn test_matches_expected_is_pure_containment() {
    assert!(matches_expected(["Chair", "cup"], "chair"));
    assert!(!matches_expected(["armchair"], "chair"));
    assert!(!matches_expected(Vec::<String>::new(), "chair"));
}
