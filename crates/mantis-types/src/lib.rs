pub mod auth;
pub mod chat;
pub mod config;
pub mod document;
pub mod events;
pub mod project;
pub mod run;
pub mod scope;
pub mod state;
pub mod team;
pub mod thread;
pub mod user;
pub mod validation;

pub use auth::{AuthResponse, ChangePasswordRequest, LoginRequest, RefreshTokenResponse, RegisterRequest, ResetPasswordRequest};
pub use chat::{ChatMessage, ChatMessageType, ChatRequest, ChatResponse, ASSISTANT_AUTHOR_ID, SYSTEM_AUTHOR_ID};
pub use config::{DocumentPollConfig, PollConfig, ThreadPageConfig, TurnConfig};
pub use document::{CreateDocumentRequest, DocumentStatus, DocumentStatusReport, ProjectDocument, UpdateDocumentRequest};
pub use events::SessionEvent;
pub use project::{AddProjectMemberRequest, AgentContext, CreateProjectRequest, Project, ProjectMember, ProjectRole, UpdateProjectRequest};
pub use run::{RunRequest, RunResponse, RunStatus};
pub use scope::{ProjectScope, ThreadScope};
pub use state::{
    CollectionAction, CollectionState, Entity,
    AuthAction, AuthState, ChatEvent, ChatState, ProjectAction, ProjectState, Reducer, RunTracking,
    TeamAction, TeamState,
};
pub use team::{CreateTeamRequest, InviteUserRequest, Team, TeamMember, TeamRole, UpdateTeamRequest};
pub use thread::{MessageRole, SortOrder, ThreadDetail, ThreadInfo, ThreadListRequest, ThreadListResponse, ThreadMessage};
pub use user::{RoleScope, InviteStatus, UpdateUserRequest, User, UserInvite, UserRole};
pub use validation::ValidationIssue;
