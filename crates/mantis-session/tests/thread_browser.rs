mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{page, scope, thread_detail, FakeBackend};
use mantis_client::ApiError;
use mantis_session::{load_thread_history, ThreadBrowser};
use mantis_types::{ChatMessageType, SortOrder, ThreadPageConfig};

fn browser(backend: &Arc<FakeBackend>) -> ThreadBrowser {
    ThreadBrowser::new(backend.clone(), scope(), ThreadPageConfig::default())
}

#[tokio::test]
async fn test_initial_page_is_most_recent_first() {
    let backend = FakeBackend::new();
    backend.script_pages([Ok(page(&["t3", "t2"], Some("cur-1")))]);
    let threads = browser(&backend);

    assert_eq!(threads.load_initial().await.unwrap(), 2);

    let request = backend.list_requests.lock().unwrap()[0].clone();
    assert_eq!(request.order, Some(SortOrder::Desc));
    assert_eq!(request.limit, Some(20));
    assert!(request.after.is_none() && request.before.is_none());

    let state = threads.state().snapshot();
    assert_eq!(state.threads.len(), 2);
    assert!(state.has_more);
    assert_eq!(state.next_cursor.as_deref(), Some("cur-1"));
}

#[tokio::test]
async fn test_load_more_follows_cursor_until_exhausted() {
    let backend = FakeBackend::new();
    backend.script_pages([Ok(page(&["t4", "t3"], Some("cur-1"))), Ok(page(&["t2", "t1"], None))]);
    let threads = browser(&backend);

    threads.load_initial().await.unwrap();
    assert!(threads.load_more().await.unwrap());
    assert!(!threads.load_more().await.unwrap());

    let requests = backend.list_requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].after.as_deref(), Some("cur-1"));

    let ids: Vec<String> = threads.state().snapshot().threads.into_iter().map(|t| t.id).collect();
    assert_eq!(ids, ["t4", "t3", "t2", "t1"]);
    assert!(!threads.state().borrow().has_more);
}

#[tokio::test]
async fn test_sentinel_loads_once_per_exposure() {
    let backend = FakeBackend::new();
    backend.script_pages([
        Ok(page(&["t6", "t5"], Some("cur-1"))),
        Ok(page(&["t4", "t3"], Some("cur-2"))),
        Ok(page(&["t2", "t1"], None)),
    ]);
    let threads = browser(&backend);
    threads.load_initial().await.unwrap();

    assert!(threads.on_sentinel_visibility(true).await.unwrap());
    assert!(!threads.on_sentinel_visibility(true).await.unwrap());
    assert_eq!(backend.list_requests.lock().unwrap().len(), 2);

    assert!(!threads.on_sentinel_visibility(false).await.unwrap());
    assert!(threads.on_sentinel_visibility(true).await.unwrap());
    assert_eq!(backend.list_requests.lock().unwrap().len(), 3);

    threads.on_sentinel_visibility(false).await.unwrap();
    assert!(!threads.on_sentinel_visibility(true).await.unwrap());
    assert_eq!(backend.list_requests.lock().unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_no_second_load_while_one_is_in_flight() {
    let backend = FakeBackend::with_latency(Duration::from_secs(1));
    backend.script_pages([Ok(page(&["t4", "t3"], Some("cur-1"))), Ok(page(&["t2", "t1"], None))]);
    let threads = Arc::new(browser(&backend));
    threads.load_initial().await.unwrap();

    let pending = {
        let threads = threads.clone();
        tokio::spawn(async move { threads.load_more().await })
    };
    while !threads.state().borrow().is_loading {
        tokio::task::yield_now().await;
    }

    assert!(!threads.load_more().await.unwrap());
    assert!(pending.await.unwrap().unwrap());
    assert_eq!(backend.list_requests.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_load_sets_banner_error() {
    let backend = FakeBackend::new();
    backend.script_pages([Err(ApiError::Permission {
        message: "You do not have permission to view threads in this project".into(),
    })]);
    let threads = browser(&backend);

    assert!(threads.load_initial().await.is_err());

    let state = threads.state().snapshot();
    assert!(!state.is_loading);
    assert_eq!(
        state.error.as_deref(),
        Some("You do not have permission to view threads in this project")
    );
}

#[tokio::test]
async fn test_history_is_projected_in_order() {
    let backend = FakeBackend::new();
    let mut detail = thread_detail("t1", 3);
    detail.messages.reverse();
    backend.put_detail(detail);

    let messages = load_thread_history(backend.as_ref(), &scope().thread("t1")).await.unwrap();

    let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["t1-m0", "t1-m1", "t1-m2"]);
    assert_eq!(messages[0].message_type, ChatMessageType::User);
    assert_eq!(messages[1].message_type, ChatMessageType::Agent);
    assert!(messages.iter().all(|m| m.project_id == "proj-1"));
}
