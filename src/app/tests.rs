use super::*;
use crate::classifier::{ClassifierScript, Observation, ScriptStep, ScriptedClassifier};
use crate::config::LingoLensConfig;
use crate::curation::DictionaryTranslator;
use crate::events::LingoLensEvent;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

fn create_test_config() -> LingoLensConfig {
    let mut config = LingoLensConfig::default();
    config.camera.fps = 50;
    config.stabilizer.scan_interval_ms = 20;
    config.quiz.shuffle = false;
    config.quiz.attempt_timeout_ms = 1000;
    config.system.scan_duration_seconds = 1;
    config
}

fn looping_classifier(labels: &[&str]) -> Arc<ScriptedClassifier> {
    let observations = labels
        .iter()
        .map(|label| Observation::new(*label, 0.9))
        .collect();

    Arc::new(ScriptedClassifier::new(ClassifierScript {
        steps: vec![ScriptStep::Observations(observations)],
        repeat: true,
    }))
}

fn create_orchestrator(labels: &[&str]) -> LingoLensOrchestrator {
    LingoLensOrchestrator::with_collaborators(
        create_test_config(),
        looping_classifier(labels),
        Arc::new(DictionaryTranslator::builtin()),
    )
    .unwrap()
}

#[tokio::test]
async fn test_orchestrator_creation() {
    let orchestrator = LingoLensOrchestrator::new(create_test_config()).await.unwrap();
    assert!(orchestrator.outcome().is_none());
    assert!(!orchestrator.session().is_closed());
}

#[tokio::test]
async fn test_orchestrator_rejects_missing_dictionary() {
    let mut config = create_test_config();
    config.quiz.dictionary_path = Some("/nonexistent/lingolens/dictionary.toml".to_string());

    assert!(LingoLensOrchestrator::new(config).await.is_err());
}

#[tokio::test]
async fn test_component_state_management() {
    let mut orchestrator = create_orchestrator(&["chair"]);
    orchestrator.initialize().await.unwrap();

    let states = orchestrator.get_all_component_states().await;
    assert_eq!(states.get("camera"), Some(&ComponentState::Stopped));
    assert_eq!(states.get("session"), Some(&ComponentState::Stopped));
    assert!(!states.contains_key("keyboard"));

    orchestrator
        .set_component_state("camera", ComponentState::Running)
        .await;
    assert_eq!(
        orchestrator.get_component_state("camera").await,
        Some(ComponentState::Running)
    );
}

#[tokio::test]
async fn test_keyboard_component_registered_when_enabled() {
    let mut orchestrator = create_orchestrator(&["chair"]);
    orchestrator.set_keyboard_enabled(true);
    orchestrator.initialize().await.unwrap();

    assert_eq!(
        orchestrator.get_component_state("keyboard").await,
        Some(ComponentState::Stopped)
    );
}

#[tokio::test]
async fn test_start_and_shutdown() {
    let mut orchestrator = create_orchestrator(&["chair"]);
    orchestrator.initialize().await.unwrap();
    orchestrator.start().await.unwrap();

    assert_eq!(
        orchestrator.get_component_state("camera").await,
        Some(ComponentState::Running)
    );
    assert_eq!(
        orchestrator.get_component_state("session").await,
        Some(ComponentState::Running)
    );
    assert!(orchestrator.frame_buffer().has_frame());

    let exit_code = orchestrator.shutdown().await.unwrap();
    assert_eq!(exit_code, 0);
    assert_eq!(
        orchestrator.get_component_state("camera").await,
        Some(ComponentState::Stopped)
    );
    assert!(orchestrator.session().snapshot().await.is_err());
}

#[tokio::test]
async fn test_shutdown_without_start() {
    let mut orchestrator = create_orchestrator(&["chair"]);
    orchestrator.initialize().await.unwrap();

    assert_eq!(orchestrator.shutdown().await.unwrap(), 0);
}

#[tokio::test]
async fn test_scan_mode_lists_stable_labels() {
    let mut orchestrator = create_orchestrator(&["chair", "cup"]);
    orchestrator.set_mode(RunMode::Scan);
    orchestrator.initialize().await.unwrap();
    orchestrator.start().await.unwrap();

    let exit_code = orchestrator.run().await.unwrap();
    assert_eq!(exit_code, 0);

    match orchestrator.outcome() {
        Some(FlowOutcome::Scanned(labels)) => {
            let labels: Vec<_> = labels.iter().map(|stable| stable.label.as_str()).collect();
            assert_eq!(labels, vec!["chair", "cup"]);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_auto_attempt_quiz_completes() {
    let mut orchestrator = create_orchestrator(&["chair", "table"]);
    orchestrator.set_mode(RunMode::Quiz);
    orchestrator.set_quiz_labels(vec!["chair".to_string(), "table".to_string()]);
    orchestrator.set_auto_attempt(Some(Duration::from_millis(20)));
    orchestrator.initialize().await.unwrap();
    orchestrator.start().await.unwrap();

    let exit_code = tokio::time::timeout(Duration::from_secs(10), orchestrator.run())
        .await
        .expect("quiz did not finish")
        .unwrap();
    assert_eq!(exit_code, 0);

    match orchestrator.outcome() {
        Some(FlowOutcome::QuizCompleted(summary)) => {
            assert_eq!(summary.score, 2);
            assert_eq!(summary.total, 2);
            assert_eq!(summary.outcomes[0].prompt, "chaise");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_quiz_of_blocked_labels_is_empty() {
    let mut orchestrator = create_orchestrator(&["person"]);
    orchestrator.set_mode(RunMode::Quiz);
    orchestrator.set_quiz_labels(vec!["person".to_string(), "furniture".to_string()]);
    orchestrator.initialize().await.unwrap();
    orchestrator.start().await.unwrap();

    assert_eq!(orchestrator.run().await.unwrap(), 0);
    assert!(matches!(orchestrator.outcome(), Some(FlowOutcome::NothingToQuiz)));
}

#[tokio::test]
async fn test_shutdown_request_interrupts_quiz() {
    let mut orchestrator = create_orchestrator(&["chair"]);
    orchestrator.set_mode(RunMode::Quiz);
    orchestrator.set_quiz_labels(vec!["chair".to_string()]);
    orchestrator.initialize().await.unwrap();
    orchestrator.start().await.unwrap();

    let event_bus = orchestrator.event_bus();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        let _ = event_bus
            .publish(LingoLensEvent::ShutdownRequested {
                timestamp: SystemTime::now(),
                reason: "test".to_string(),
            })
            .await;
    });

    assert_eq!(orchestrator.run().await.unwrap(), 0);
    assert!(matches!(
        orchestrator.outcome(),
        Some(FlowOutcome::Interrupted(ShutdownReason::UserRequest))
    ));
}

#[test]
fn test_run_mode_parsing() {
    assert_eq!("scan".parse::<RunMode>().unwrap(), RunMode::Scan);
    assert_eq!(" Quiz ".parse::<RunMode>().unwrap(), RunMode::Quiz);
    assert_eq!("FULL".parse::<RunMode>().unwrap(), RunMode::Full);
    assert!("demo".parse::<RunMode>().is_err());
    assert_eq!(RunMode::Quiz.to_string(), "quiz");
}
