use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mantis_client::{ApiError, ApiClient, Result, SessionBus, TeamsApi};
use mantis_persist::{CredentialStore, MemoryStore};
use mantis_session::{AuthStore, TeamStore};
use mantis_types::{
    CreateTeamRequest, InviteUserRequest, SessionEvent, Team, TeamMember, TeamRole, UpdateTeamRequest, User,
};
use serde_json::json;

fn team(id: &str, name: &str) -> Team {
    serde_json::from_value(json!({
        "id": id,
        "name": name,
        "ownerId": "u1",
        "members": [{ "userId": "u2", "role": "member" }]
    }))
    .unwrap()
}

fn rejected() -> ApiError {
    ApiError::Permission {
        message: "Only team owners can do that".into(),
    }
}

/// Teams backend that accepts reads and rejects writes when `reject` is set
#[derive(Default)]
struct FakeTeams {
    teams: Mutex<Vec<Team>>,
    reject: bool,
}

impl FakeTeams {
    fn write(&self) -> Result<()> {
        if self.reject {
            Err(rejected())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TeamsApi for FakeTeams {
    async fn list_teams(&self) -> Result<Vec<Team>> {
        Ok(self.teams.lock().unwrap().clone())
    }

    async fn get_team(&self, team_id: &str) -> Result<Team> {
        self.teams
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == team_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                message: "Team not found".into(),
            })
    }

    async fn create_team(&self, request: &CreateTeamRequest) -> Result<Team> {
        self.write()?;
        Ok(team("t-new", &request.name))
    }

    async fn update_team(&self, team_id: &str, _request: &UpdateTeamRequest) -> Result<Team> {
        self.write()?;
        self.get_team(team_id).await
    }

    async fn delete_team(&self, _team_id: &str) -> Result<()> {
        self.write()
    }

    async fn invite_user(&self, _team_id: &str, _request: &InviteUserRequest) -> Result<()> {
        self.write()
    }

    async fn remove_team_member(&self, _team_id: &str, _user_id: &str) -> Result<()> {
        self.write()
    }

    async fn update_team_member_role(&self, _team_id: &str, _user_id: &str, _role: TeamRole) -> Result<()> {
        self.write()
    }
}

async fn loaded_store(reject: bool) -> TeamStore {
    let api = FakeTeams {
        teams: Mutex::new(vec![team("t1", "Platform"), team("t2", "Growth")]),
        reject,
    };
    let store = TeamStore::new(Arc::new(api));
    store.fetch_teams().await.unwrap();
    store
}

#[tokio::test]
async fn test_update_applies_optimistically() {
    let store = loaded_store(false).await;

    store
        .update_team(
            "t1",
            UpdateTeamRequest {
                name: Some("Core Platform".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(store.state().borrow().get("t1").unwrap().name, "Core Platform");
}

#[tokio::test]
async fn test_rejected_update_rolls_back() {
    let store = loaded_store(true).await;
    let before = store.state().snapshot().items;

    let err = store
        .update_team(
            "t1",
            UpdateTeamRequest {
                name: Some("Renamed".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    let state = store.state().snapshot();
    assert_eq!(err, rejected());
    assert_eq!(state.items, before);
    assert_eq!(state.error.as_deref(), Some("Only team owners can do that"));
}

#[tokio::test]
async fn test_rejected_delete_and_member_changes_roll_back() {
    let store = loaded_store(true).await;

    assert!(store.delete_team("t2").await.is_err());
    assert!(store.remove_member("t1", "u2").await.is_err());
    assert!(store.update_member_role("t1", "u2", TeamRole::Admin).await.is_err());

    let state = store.state().snapshot();
    assert_eq!(state.items.len(), 2);
    let members: &Vec<TeamMember> = &state.get("t1").unwrap().members;
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].role, TeamRole::Member);
}

#[tokio::test]
async fn test_create_is_pessimistic() {
    let store = loaded_store(true).await;
    let request = CreateTeamRequest {
        name: "Research".into(),
        description: None,
    };

    assert!(store.create_team(&request).await.is_err());
    let state = store.state().snapshot();
    assert_eq!(state.items.len(), 2);
    assert!(!state.is_loading);

    let store = loaded_store(false).await;
    let created = store.create_team(&request).await.unwrap();
    assert_eq!(created.name, "Research");
    assert_eq!(store.state().borrow().items.len(), 3);
}

fn user() -> User {
    serde_json::from_value(json!({ "id": "u1", "email": "ada@example.com", "name": "Ada" })).unwrap()
}

#[tokio::test]
async fn test_auth_store_restores_persisted_session() {
    let store = Arc::new(MemoryStore::new());
    store.save_session("token-abc", &user()).await.unwrap();
    let api = ApiClient::builder().store(store).build().unwrap();
    let auth = AuthStore::new(api);

    assert!(auth.restore_session().await.unwrap());

    let state = auth.state().snapshot();
    assert!(state.is_authenticated);
    assert_eq!(state.token.as_deref(), Some("token-abc"));
    assert_eq!(state.user.unwrap().email, "ada@example.com");
}

#[tokio::test]
async fn test_auth_store_signs_out_on_session_bus_logout() {
    let store = Arc::new(MemoryStore::new());
    store.save_session("token-abc", &user()).await.unwrap();
    let bus = SessionBus::new();
    let api = ApiClient::builder().store(store).session_bus(bus.clone()).build().unwrap();
    let auth = AuthStore::new(api);
    auth.restore_session().await.unwrap();

    let mut changes = auth.state().subscribe();
    let watcher = auth.watch_session(&bus);
    bus.publish(SessionEvent::LoggedOut);
    changes.changed().await.unwrap();

    assert!(!auth.state().borrow().is_authenticated);
    watcher.abort();
}
