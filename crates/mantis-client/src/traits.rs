//! Seams the orchestration layer depends on
//!
//! [`ApiClient`](crate::ApiClient) implements all of them; tests substitute
//! scripted fakes.

use async_trait::async_trait;
use mantis_types::{
    AddProjectMemberRequest, ChatRequest, ChatResponse, CreateProjectRequest, CreateTeamRequest,
    DocumentStatusReport, InviteUserRequest, Project, ProjectDocument, ProjectRole, ProjectScope,
    RunRequest, RunResponse, Team, TeamRole, ThreadDetail, ThreadListRequest, ThreadListResponse,
    ThreadScope, UpdateProjectRequest, UpdateTeamRequest,
};
use serde_json::Value;

use crate::error::Result;
use crate::upload::{ProgressCallback, UploadFile};

#[async_trait]
pub trait RunsApi: Send + Sync {
    async fn create_run(&self, thread: &ThreadScope, request: &RunRequest) -> Result<RunResponse>;

    async fn get_run_status(&self, thread: &ThreadScope, run_id: &str) -> Result<RunResponse>;
}

#[async_trait]
pub trait ThreadsApi: Send + Sync {
    async fn list_threads(&self, request: &ThreadListRequest) -> Result<ThreadListResponse>;

    async fn get_thread_details(&self, thread: &ThreadScope) -> Result<ThreadDetail>;
}

#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn send_chat_message(&self, scope: &ProjectScope, request: &ChatRequest) -> Result<ChatResponse>;
}

#[async_trait]
pub trait DocumentsApi: Send + Sync {
    async fn upload_document(
        &self,
        scope: &ProjectScope,
        file: UploadFile,
        metadata: Option<Value>,
        on_progress: Option<ProgressCallback>,
    ) -> Result<ProjectDocument>;

    async fn get_document_status(&self, scope: &ProjectScope, document_id: &str) -> Result<DocumentStatusReport>;
}

#[async_trait]
pub trait TeamsApi: Send + Sync {
    async fn list_teams(&self) -> Result<Vec<Team>>;

    async fn get_team(&self, team_id: &str) -> Result<Team>;

    async fn create_team(&self, request: &CreateTeamRequest) -> Result<Team>;

    async fn update_team(&self, team_id: &str, request: &UpdateTeamRequest) -> Result<Team>;

    async fn delete_team(&self, team_id: &str) -> Result<()>;

    async fn invite_user(&self, team_id: &str, request: &InviteUserRequest) -> Result<()>;

    async fn remove_team_member(&self, team_id: &str, user_id: &str) -> Result<()>;

    async fn update_team_member_role(&self, team_id: &str, user_id: &str, role: TeamRole) -> Result<()>;
}

#[async_trait]
pub trait ProjectsApi: Send + Sync {
    async fn list_projects(&self, team_id: &str) -> Result<Vec<Project>>;

    async fn get_project(&self, scope: &ProjectScope) -> Result<Project>;

    async fn create_project(&self, request: &CreateProjectRequest) -> Result<Project>;

    async fn update_project(&self, scope: &ProjectScope, request: &UpdateProjectRequest) -> Result<Project>;

    async fn delete_project(&self, scope: &ProjectScope) -> Result<()>;

    async fn add_project_member(&self, scope: &ProjectScope, request: &AddProjectMemberRequest) -> Result<()>;

    async fn remove_project_member(&self, scope: &ProjectScope, user_id: &str) -> Result<()>;

    async fn update_project_member_role(&self, scope: &ProjectScope, user_id: &str, role: ProjectRole) -> Result<()>;
}
