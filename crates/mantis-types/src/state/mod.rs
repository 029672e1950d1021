//! Store state expressed as explicit reducers
//!
//! Every store is a plain value plus a closed set of actions; `reduce` is pure
//! so transitions can be tested without any runtime.

mod auth;
mod chat;
mod collection;
mod project;
mod team;

pub use auth::{AuthAction, AuthState};
pub use chat::{ChatEvent, ChatState, RunTracking};
pub use collection::{CollectionAction, CollectionState, Entity};
pub use project::{ProjectAction, ProjectState};
pub use team::{TeamAction, TeamState};

pub trait Reducer: Sized {
    type Action;

    fn reduce(self, action: Self::Action) -> Self;
}
