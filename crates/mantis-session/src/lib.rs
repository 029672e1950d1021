//! Orchestration for the Agile Mantis client
//!
//! Everything here depends on the backend only through the traits in
//! `mantis_client::traits`, and exposes its state as [`StateCell`]s that
//! front-ends observe.

pub mod cell;
pub mod documents;
pub mod polling;
pub mod runs;
pub mod stores;
pub mod threads;
pub mod turn;

pub use cell::StateCell;
pub use documents::{DocumentBoard, DocumentStatusPoller, DocumentTracker, TrackedDocument};
pub use polling::{spawn_polling, PollCanceller, PollHandle};
pub use runs::{RunOrchestrator, StatusCallback};
pub use stores::{AuthStore, ProjectStore, TeamStore};
pub use threads::{load_thread_history, ThreadBrowser, ThreadListState};
pub use turn::{describe_chat_error, ChatTurnCoordinator, TurnError, TurnOutcome};
