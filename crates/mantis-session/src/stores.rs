//! Team, project and auth stores
//!
//! Creates and fetches are pessimistic: state changes only after the backend
//! answers. Updates and deletes are optimistic and roll back to the
//! pre-update snapshot when the backend rejects them.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use mantis_client::{ApiClient, ProjectsApi, Result, SessionBus, TeamsApi};
use mantis_persist::CredentialStore;
use mantis_types::{
    AddProjectMemberRequest, AuthAction, AuthState, CollectionAction, CollectionState, CreateProjectRequest,
    CreateTeamRequest, Entity, InviteUserRequest, LoginRequest, Project, ProjectAction, ProjectMember, ProjectRole,
    ProjectScope, ProjectState, RegisterRequest, SessionEvent, Team, TeamAction, TeamRole, TeamState,
    UpdateProjectRequest, UpdateTeamRequest,
};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cell::StateCell;

/// Applies `action` at once and restores the previous state if `request` fails
async fn optimistic<T, F>(state: &StateCell<CollectionState<T>>, action: CollectionAction<T>, request: F) -> Result<()>
where
    T: Entity,
    F: Future<Output = Result<()>>,
{
    let snapshot = state.snapshot();
    state.dispatch(action);
    if let Err(e) = request.await {
        warn!("Rolling back optimistic update: {}", e);
        state.replace(snapshot);
        state.dispatch(CollectionAction::SetError(e.to_string()));
        return Err(e);
    }
    Ok(())
}

/// Runs a pessimistic request with the loading flag raised
async fn pessimistic<T, R, F>(state: &StateCell<CollectionState<T>>, request: F) -> Result<R>
where
    T: Entity,
    F: Future<Output = Result<R>>,
{
    state.dispatch(CollectionAction::SetLoading(true));
    match request.await {
        Ok(value) => {
            state.dispatch(CollectionAction::SetLoading(false));
            Ok(value)
        }
        Err(e) => {
            error!("Store request failed: {}", e);
            state.dispatch(CollectionAction::SetError(e.to_string()));
            Err(e)
        }
    }
}

pub struct TeamStore {
    api: Arc<dyn TeamsApi>,
    state: StateCell<TeamState>,
}

impl TeamStore {
    pub fn new(api: Arc<dyn TeamsApi>) -> Self {
        Self {
            api,
            state: StateCell::default(),
        }
    }

    pub fn state(&self) -> &StateCell<TeamState> {
        &self.state
    }

    pub async fn fetch_teams(&self) -> Result<Vec<Team>> {
        let teams = pessimistic(&self.state, self.api.list_teams()).await?;
        debug!("Loaded {} teams", teams.len());
        self.state.dispatch(TeamAction::SetItems(teams.clone()));
        Ok(teams)
    }

    pub async fn fetch_team(&self, team_id: &str) -> Result<Team> {
        let team = pessimistic(&self.state, self.api.get_team(team_id)).await?;
        self.state.dispatch(TeamAction::SetCurrent(Some(team.clone())));
        Ok(team)
    }

    pub async fn create_team(&self, request: &CreateTeamRequest) -> Result<Team> {
        let team = pessimistic(&self.state, self.api.create_team(request)).await?;
        info!("Created team {}", team.id);
        self.state.dispatch(TeamAction::Add(team.clone()));
        Ok(team)
    }

    pub async fn update_team(&self, team_id: &str, patch: UpdateTeamRequest) -> Result<()> {
        let action = TeamAction::Update {
            id: team_id.to_string(),
            patch: patch.clone(),
        };
        optimistic(&self.state, action, async {
            self.api.update_team(team_id, &patch).await.map(drop)
        })
        .await
    }

    pub async fn delete_team(&self, team_id: &str) -> Result<()> {
        optimistic(&self.state, TeamAction::Remove(team_id.to_string()), self.api.delete_team(team_id)).await
    }

    /// Invitations stay pending server-side, so the member list is untouched
    pub async fn invite_user(&self, team_id: &str, request: &InviteUserRequest) -> Result<()> {
        pessimistic(&self.state, self.api.invite_user(team_id, request)).await
    }

    pub async fn remove_member(&self, team_id: &str, user_id: &str) -> Result<()> {
        let action = TeamAction::RemoveMember {
            id: team_id.to_string(),
            user_id: user_id.to_string(),
        };
        optimistic(&self.state, action, self.api.remove_team_member(team_id, user_id)).await
    }

    pub async fn update_member_role(&self, team_id: &str, user_id: &str, role: TeamRole) -> Result<()> {
        let action = TeamAction::UpdateMemberRole {
            id: team_id.to_string(),
            user_id: user_id.to_string(),
            role,
        };
        optimistic(&self.state, action, self.api.update_team_member_role(team_id, user_id, role)).await
    }

    pub fn set_current(&self, team: Option<Team>) {
        self.state.dispatch(TeamAction::SetCurrent(team));
    }

    pub fn clear_error(&self) {
        self.state.dispatch(TeamAction::ClearError);
    }
}

pub struct ProjectStore {
    api: Arc<dyn ProjectsApi>,
    state: StateCell<ProjectState>,
}

impl ProjectStore {
    pub fn new(api: Arc<dyn ProjectsApi>) -> Self {
        Self {
            api,
            state: StateCell::default(),
        }
    }

    pub fn state(&self) -> &StateCell<ProjectState> {
        &self.state
    }

    pub async fn fetch_projects(&self, team_id: &str) -> Result<Vec<Project>> {
        let projects = pessimistic(&self.state, self.api.list_projects(team_id)).await?;
        debug!("Loaded {} projects for team {}", projects.len(), team_id);
        self.state.dispatch(ProjectAction::SetItems(projects.clone()));
        Ok(projects)
    }

    pub async fn fetch_project(&self, scope: &ProjectScope) -> Result<Project> {
        let project = pessimistic(&self.state, self.api.get_project(scope)).await?;
        self.state.dispatch(ProjectAction::SetCurrent(Some(project.clone())));
        Ok(project)
    }

    pub async fn create_project(&self, request: &CreateProjectRequest) -> Result<Project> {
        let project = pessimistic(&self.state, self.api.create_project(request)).await?;
        info!("Created project {} in team {}", project.id, project.team_id);
        self.state.dispatch(ProjectAction::Add(project.clone()));
        Ok(project)
    }

    pub async fn update_project(&self, scope: &ProjectScope, patch: UpdateProjectRequest) -> Result<()> {
        let action = ProjectAction::Update {
            id: scope.project_id.clone(),
            patch: patch.clone(),
        };
        optimistic(&self.state, action, async {
            self.api.update_project(scope, &patch).await.map(drop)
        })
        .await
    }

    pub async fn delete_project(&self, scope: &ProjectScope) -> Result<()> {
        optimistic(
            &self.state,
            ProjectAction::Remove(scope.project_id.clone()),
            self.api.delete_project(scope),
        )
        .await
    }

    /// The member appears only once the backend accepted it
    pub async fn add_member(&self, scope: &ProjectScope, request: &AddProjectMemberRequest) -> Result<()> {
        pessimistic(&self.state, self.api.add_project_member(scope, request)).await?;
        self.state.dispatch(ProjectAction::AddMember {
            id: scope.project_id.clone(),
            member: ProjectMember {
                user_id: request.user_id.clone(),
                user: None,
                role: request.role,
                joined_at: Some(Utc::now()),
            },
        });
        Ok(())
    }

    pub async fn remove_member(&self, scope: &ProjectScope, user_id: &str) -> Result<()> {
        let action = ProjectAction::RemoveMember {
            id: scope.project_id.clone(),
            user_id: user_id.to_string(),
        };
        optimistic(&self.state, action, self.api.remove_project_member(scope, user_id)).await
    }

    pub async fn update_member_role(&self, scope: &ProjectScope, user_id: &str, role: ProjectRole) -> Result<()> {
        let action = ProjectAction::UpdateMemberRole {
            id: scope.project_id.clone(),
            user_id: user_id.to_string(),
            role,
        };
        optimistic(&self.state, action, self.api.update_project_member_role(scope, user_id, role)).await
    }

    pub fn set_current(&self, project: Option<Project>) {
        self.state.dispatch(ProjectAction::SetCurrent(project));
    }

    pub fn clear_error(&self) {
        self.state.dispatch(ProjectAction::ClearError);
    }
}

/// Signed-in user and bearer token
pub struct AuthStore {
    api: ApiClient,
    state: StateCell<AuthState>,
}

impl AuthStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: StateCell::default(),
        }
    }

    pub fn state(&self) -> &StateCell<AuthState> {
        &self.state
    }

    /// Restores a persisted session; returns whether one was found
    pub async fn restore_session(&self) -> Result<bool> {
        let store = self.api.store();
        self.state.dispatch(AuthAction::SetLoading(true));
        let token = store.auth_token().await?;
        let user = store.user().await?;
        match (token, user) {
            (Some(token), Some(user)) => {
                info!("Restored session for {}", user.email);
                self.state.dispatch(AuthAction::AuthSuccess { user, token });
                Ok(true)
            }
            _ => {
                self.state.dispatch(AuthAction::SetLoading(false));
                Ok(false)
            }
        }
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<()> {
        self.state.dispatch(AuthAction::AuthStart);
        match self.api.login(request).await {
            Ok(auth) => {
                self.state.dispatch(AuthAction::AuthSuccess {
                    user: auth.user,
                    token: auth.token,
                });
                Ok(())
            }
            Err(e) => {
                self.state.dispatch(AuthAction::AuthFailure(e.to_string()));
                Err(e)
            }
        }
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<()> {
        self.state.dispatch(AuthAction::AuthStart);
        match self.api.register(request).await {
            Ok(auth) => {
                self.state.dispatch(AuthAction::AuthSuccess {
                    user: auth.user,
                    token: auth.token,
                });
                Ok(())
            }
            Err(e) => {
                self.state.dispatch(AuthAction::AuthFailure(e.to_string()));
                Err(e)
            }
        }
    }

    pub async fn logout(&self) -> Result<()> {
        let result = self.api.logout().await;
        self.state.dispatch(AuthAction::AuthLogout);
        result
    }

    pub fn clear_error(&self) {
        self.state.dispatch(AuthAction::ClearError);
    }

    /// Signs the store out whenever the session bus reports a logout
    pub fn watch_session(&self, bus: &SessionBus) -> JoinHandle<()> {
        let mut events = bus.subscribe();
        let state = self.state.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::LoggedOut) => {
                        info!("Session ended, signing out");
                        state.dispatch(AuthAction::AuthLogout);
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => warn!("Missed {} session events", skipped),
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
