use async_trait::async_trait;
use mantis_types::{CreateTeamRequest, InviteUserRequest, Team, TeamMember, TeamRole, UpdateTeamRequest};
use tracing::info;

use crate::envelope;
use crate::error::Result;
use crate::http::ApiClient;
use crate::traits::TeamsApi;

impl ApiClient {
    pub async fn list_team_members(&self, team_id: &str) -> Result<Vec<TeamMember>> {
        envelope::data(&self.get(&format!("/teams/{}/members", team_id)).await?)
    }

    pub async fn leave_team(&self, team_id: &str) -> Result<()> {
        self.post_empty(&format!("/teams/{}/leave", team_id)).await?;
        info!("Left team {}", team_id);
        Ok(())
    }
}

#[async_trait]
impl TeamsApi for ApiClient {
    async fn list_teams(&self) -> Result<Vec<Team>> {
        envelope::data(&self.get("/teams").await?)
    }

    async fn get_team(&self, team_id: &str) -> Result<Team> {
        envelope::data(&self.get(&format!("/teams/{}", team_id)).await?)
    }

    async fn create_team(&self, request: &CreateTeamRequest) -> Result<Team> {
        let team: Team = envelope::data(&self.post("/teams", request).await?)?;
        info!("Created team {}", team.id);
        Ok(team)
    }

    async fn update_team(&self, team_id: &str, request: &UpdateTeamRequest) -> Result<Team> {
        envelope::data(&self.put(&format!("/teams/{}", team_id), request).await?)
    }

    async fn delete_team(&self, team_id: &str) -> Result<()> {
        self.delete(&format!("/teams/{}", team_id)).await?;
        info!("Deleted team {}", team_id);
        Ok(())
    }

    async fn invite_user(&self, team_id: &str, request: &InviteUserRequest) -> Result<()> {
        self.post(&format!("/teams/{}/invite", team_id), request).await?;
        Ok(())
    }

    async fn remove_team_member(&self, team_id: &str, user_id: &str) -> Result<()> {
        self.delete(&format!("/teams/{}/members/{}", team_id, user_id)).await?;
        Ok(())
    }

    async fn update_team_member_role(&self, team_id: &str, user_id: &str, role: TeamRole) -> Result<()> {
        let path = format!("/teams/{}/members/{}/role", team_id, user_id);
        self.put(&path, &serde_json::json!({ "role": role })).await?;
        Ok(())
    }
}
