mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::{chat_reply, scope, thread_detail, FakeBackend};
use mantis_client::ApiError;
use mantis_session::turn::{CHAT_FORBIDDEN_MESSAGE, CHAT_UNAVAILABLE_MESSAGE};
use mantis_session::{ChatTurnCoordinator, TurnError, TurnOutcome};
use mantis_types::{ChatMessageType, RunStatus, TurnConfig};

fn coordinator(backend: &Arc<FakeBackend>) -> ChatTurnCoordinator {
    ChatTurnCoordinator::new(
        scope(),
        "user-1",
        backend.clone(),
        backend.clone(),
        backend.clone(),
        TurnConfig::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn test_new_conversation_adopts_returned_thread() {
    let backend = FakeBackend::new();
    backend.script_chat(Ok(chat_reply("This project tracks the Q3 roadmap.", "t1", true)));
    let chat = coordinator(&backend);

    let outcome = chat.send_message("What is this project?").await.unwrap();

    assert_eq!(outcome, TurnOutcome::Replied { thread_id: "t1".into() });
    let state = chat.state().snapshot();
    assert_eq!(state.current_thread_id.as_deref(), Some("t1"));
    assert_eq!(state.selected_thread_id.as_deref(), Some("t1"));
    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.messages[0].message_type, ChatMessageType::User);
    assert_eq!(state.messages[0].content, "What is this project?");
    assert_eq!(state.messages[1].message_type, ChatMessageType::Agent);
    assert!(!state.is_loading && !state.is_typing && !state.turn_in_flight);
    assert_eq!(backend.chat_requests.lock().unwrap()[0].thread_id, None);
}

#[tokio::test(start_paused = true)]
async fn test_selected_thread_is_continued_through_a_run() {
    let backend = FakeBackend::new();
    backend.put_detail(thread_detail("t1", 1));
    let chat = coordinator(&backend);

    chat.select_thread("t1").await.unwrap();
    assert!(chat.state().borrow().is_first_message_in_thread);

    backend.put_detail(thread_detail("t1", 3));
    backend.script_runs([Ok(RunStatus::InProgress), Ok(RunStatus::Completed)]);

    let outcome = chat.send_message("Continue please").await.unwrap();

    assert_eq!(
        outcome,
        TurnOutcome::RunCompleted {
            thread_id: "t1".into(),
            run_id: "run-1".into()
        }
    );
    let state = chat.state().snapshot();
    assert_eq!(state.messages.len(), 3);
    assert!(!state.is_first_message_in_thread);
    assert_eq!(state.last_completed_run_id.as_deref(), Some("run-1"));
    assert_eq!(state.run.as_ref().map(|r| r.status.clone()), Some(RunStatus::Completed));
    assert!(backend.chat_requests.lock().unwrap().is_empty());

    tokio::time::sleep(Duration::from_millis(2_100)).await;
    assert!(chat.state().borrow().run.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_messages_after_a_run_go_direct_to_the_same_thread() {
    let backend = FakeBackend::new();
    backend.put_detail(thread_detail("t1", 2));
    backend.script_runs([Ok(RunStatus::Completed)]);
    backend.script_chat(Ok(chat_reply("Sure.", "t1", false)));
    let chat = coordinator(&backend);

    chat.select_thread("t1").await.unwrap();
    chat.send_message("Continue please").await.unwrap();
    chat.refresh_thread().await.unwrap();
    assert!(!chat.state().borrow().is_first_message_in_thread);

    let outcome = chat.send_message("And then?").await.unwrap();

    assert_eq!(outcome, TurnOutcome::Replied { thread_id: "t1".into() });
    assert_eq!(backend.runs_created.load(Ordering::SeqCst), 1);
    assert_eq!(
        backend.chat_requests.lock().unwrap()[0].thread_id.as_deref(),
        Some("t1")
    );

    chat.select_thread("t1").await.unwrap();
    assert!(!chat.state().borrow().is_first_message_in_thread);
}

#[tokio::test(start_paused = true)]
async fn test_failed_turn_keeps_user_message_and_appends_one_error() {
    let backend = FakeBackend::new();
    backend.script_chat(Err(ApiError::Server {
        status: 500,
        code: None,
        message: "Internal error".into(),
        details: None,
    }));
    let chat = coordinator(&backend);

    let outcome = chat.send_message("Hello?").await.unwrap();

    assert_eq!(
        outcome,
        TurnOutcome::Failed {
            message: "Internal error".into()
        }
    );
    let state = chat.state().snapshot();
    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.messages[0].content, "Hello?");
    assert!(state.messages[1].is_system());
    assert_eq!(state.messages[1].content, "Error: Internal error");
    assert_eq!(state.error.as_deref(), Some("Internal error"));
    assert!(!state.turn_in_flight && !state.is_loading);
    assert!(state.current_thread_id.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_chat_error_categories_use_fixed_wording() {
    let backend = FakeBackend::new();
    backend.script_chat(Err(ApiError::NotFound { message: "404".into() }));
    backend.script_chat(Err(ApiError::Permission { message: "403".into() }));
    let chat = coordinator(&backend);

    chat.send_message("one").await.unwrap();
    chat.send_message("two").await.unwrap();

    let messages = chat.state().snapshot().messages;
    assert_eq!(messages[1].content, format!("Error: {CHAT_UNAVAILABLE_MESSAGE}"));
    assert_eq!(messages[3].content, format!("Error: {CHAT_FORBIDDEN_MESSAGE}"));
}

#[tokio::test(start_paused = true)]
async fn test_failed_run_clears_tracking_and_keeps_thread_armed() {
    let backend = FakeBackend::new();
    backend.put_detail(thread_detail("t1", 2));
    backend.script_runs([Ok(RunStatus::Queued), Ok(RunStatus::Failed)]);
    let chat = coordinator(&backend);

    chat.select_thread("t1").await.unwrap();
    let outcome = chat.send_message("Continue please").await.unwrap();

    assert_eq!(
        outcome,
        TurnOutcome::Failed {
            message: "Run failed: run-1".into()
        }
    );
    let state = chat.state().snapshot();
    assert!(state.run.is_none());
    assert!(state.is_first_message_in_thread);
    assert_eq!(state.messages.len(), 4);
    assert_eq!(state.messages[3].content, "Error: Run failed: run-1");
}

#[tokio::test(start_paused = true)]
async fn test_second_turn_is_rejected_while_one_is_in_flight() {
    let backend = FakeBackend::with_latency(Duration::from_secs(1));
    backend.script_chat(Ok(chat_reply("First answer", "t1", true)));
    let chat = Arc::new(coordinator(&backend));

    let first = {
        let chat = chat.clone();
        tokio::spawn(async move { chat.send_message("first").await })
    };
    while !chat.state().borrow().turn_in_flight {
        tokio::task::yield_now().await;
    }

    assert_eq!(chat.send_message("second").await, Err(TurnError::TurnInProgress));
    assert!(first.await.unwrap().is_ok());

    let messages = chat.state().snapshot().messages;
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m.content != "second"));
    assert_eq!(backend.chat_requests.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_start_new_conversation_resets_selection() {
    let backend = FakeBackend::new();
    backend.put_detail(thread_detail("t1", 2));
    backend.script_chat(Ok(chat_reply("Fresh start", "t2", true)));
    let chat = coordinator(&backend);

    chat.select_thread("t1").await.unwrap();
    chat.start_new_conversation();

    let state = chat.state().snapshot();
    assert!(state.selected_thread_id.is_none());
    assert!(state.current_thread_id.is_none());
    assert!(state.messages.is_empty());
    assert!(!state.is_first_message_in_thread);

    chat.send_message("Hi").await.unwrap();
    assert_eq!(backend.chat_requests.lock().unwrap()[0].thread_id, None);
    assert_eq!(chat.state().borrow().current_thread_id.as_deref(), Some("t2"));
}

#[tokio::test(start_paused = true)]
async fn test_missing_thread_surfaces_load_error() {
    let backend = FakeBackend::new();
    let chat = coordinator(&backend);

    let err = chat.select_thread("missing").await.unwrap_err();

    assert!(matches!(err, ApiError::NotFound { .. }));
    assert_eq!(
        chat.state().borrow().error.as_deref(),
        Some("Thread not found or you do not have access to it")
    );
}
