//! Property-based tests for the turn-taking core
//!
//! These check the alternation and no-op invariants across arbitrary
//! sequences of submissions, failures, retries and clears.

use super::testing::{EchoGenerator, MockGenerator};
use super::*;
use crate::llm::GenerationError;
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

fn assert_alternates_from_user(transcript: &Transcript) {
    for (i, msg) in transcript.iter().enumerate() {
        let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
        assert_eq!(msg.role(), expected, "turn {i} has the wrong role");
        assert_eq!(msg.sequence(), u64::try_from(i).unwrap(), "turn {i} has the wrong sequence");
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

#[derive(Debug, Clone)]
enum Action {
    Submit(String),
    SubmitFailing(String),
    Retry,
    Clear,
}

fn arb_utterance() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[a-z]{1,6}",
        1 => Just("hello".to_string()),
        1 => "[ \t]{0,3}",
    ]
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        6 => arb_utterance().prop_map(Action::Submit),
        2 => arb_utterance().prop_map(Action::SubmitFailing),
        2 => Just(Action::Retry),
        1 => Just(Action::Clear),
    ]
}

fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::User), Just(Role::Assistant)]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn store_never_holds_consecutive_same_roles(roles in proptest::collection::vec(arb_role(), 0..30)) {
        let mut store = ConversationStore::new();
        for role in roles {
            let before = store.transcript().len();
            match store.append(role, "x") {
                Ok(transcript) => {
                    prop_assert_eq!(transcript.len(), before + 1);
                }
                Err(StoreError::InvalidOrder { role: rejected }) => {
                    prop_assert_eq!(rejected, role);
                    prop_assert_eq!(store.transcript().len(), before);
                }
            }
        }

        let transcript = store.transcript();
        for pair in transcript.messages().windows(2) {
            prop_assert_ne!(pair[0].role(), pair[1].role());
            prop_assert_eq!(pair[0].sequence() + 1, pair[1].sequence());
        }
    }

    #[test]
    fn distinct_submissions_alternate(utterances in proptest::collection::vec("[a-z]{1,8}", 1..15)) {
        block_on(async {
            let engine = TurnEngine::new("prop", EchoGenerator);
            let mut accepted = 0usize;
            let mut last: Option<String> = None;

            for text in &utterances {
                let transcript = engine.submit(text).await.unwrap();
                if last.as_deref() != Some(text.as_str()) {
                    accepted += 1;
                    last = Some(text.clone());
                }
                assert_eq!(transcript.len(), accepted * 2);
                assert_alternates_from_user(&transcript);
            }
            assert_eq!(engine.state().await, TurnState::Idle);
        });
    }

    #[test]
    fn blank_input_never_reaches_generator(blanks in proptest::collection::vec("[ \t\n]{0,5}", 1..10)) {
        block_on(async {
            let mock = Arc::new(MockGenerator::new());
            let engine = TurnEngine::new("prop", Arc::clone(&mock));
            for blank in &blanks {
                assert!(engine.submit(blank).await.unwrap().is_empty());
            }
            assert_eq!(mock.request_count(), 0);
            assert_eq!(engine.state().await, TurnState::Idle);
        });
    }

    #[test]
    fn mixed_actions_preserve_invariants(actions in proptest::collection::vec(arb_action(), 1..25)) {
        block_on(async {
            let mock = Arc::new(MockGenerator::new());
            let engine = TurnEngine::new("prop", Arc::clone(&mock));

            for action in actions {
                mock.clear_queue();
                let before = engine.snapshot().await;
                let calls_before = mock.request_count();

                match action {
                    Action::Submit(text) | Action::SubmitFailing(text) if text.trim().is_empty() => {
                        assert_eq!(engine.submit(&text).await.unwrap(), before);
                        assert_eq!(mock.request_count(), calls_before);
                    }
                    Action::Submit(text) => {
                        mock.queue_text(format!("re: {text}"));
                        if let Ok(after) = engine.submit(&text).await {
                            let grew = after.len() - before.len();
                            assert!(grew == 0 || grew == 2, "grew by {grew}");
                        }
                    }
                    Action::SubmitFailing(text) => {
                        mock.queue_error(GenerationError::transport("boom"));
                        match engine.submit(&text).await {
                            Err(TurnError::GenerationFailed(_)) => {
                                assert_eq!(engine.snapshot().await.len(), before.len() + 1);
                                assert_eq!(engine.state().await, TurnState::AwaitingResponse);
                            }
                            Err(TurnError::PendingRetry) | Ok(_) => {}
                            Err(other) => panic!("unexpected error: {other:?}"),
                        }
                    }
                    Action::Retry => {
                        mock.queue_text("retried");
                        let was_pending = engine.state().await == TurnState::AwaitingResponse;
                        let after = engine.retry_last().await.unwrap();
                        let expected = if was_pending { before.len() + 1 } else { before.len() };
                        assert_eq!(after.len(), expected);
                        assert_eq!(engine.state().await, TurnState::Idle);
                    }
                    Action::Clear => {
                        engine.clear().await;
                        assert!(engine.snapshot().await.is_empty());
                        assert_eq!(engine.state().await, TurnState::Idle);
                    }
                }

                assert_alternates_from_user(&engine.snapshot().await);
                assert!(!engine.is_generating().await);
            }
        });
    }
}
