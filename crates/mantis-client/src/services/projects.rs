use async_trait::async_trait;
use mantis_types::{
    AddProjectMemberRequest, CreateProjectRequest, Project, ProjectMember, ProjectRole, ProjectScope,
    UpdateProjectRequest,
};
use tracing::info;

use crate::envelope;
use crate::error::Result;
use crate::http::ApiClient;
use crate::traits::ProjectsApi;

fn project_path(scope: &ProjectScope) -> String {
    format!("/Teams/{}/Projects/{}", scope.team_id, scope.project_id)
}

impl ApiClient {
    pub async fn list_project_members(&self, scope: &ProjectScope) -> Result<Vec<ProjectMember>> {
        envelope::data(&self.get(&format!("{}/members", project_path(scope))).await?)
    }
}

#[async_trait]
impl ProjectsApi for ApiClient {
    async fn list_projects(&self, team_id: &str) -> Result<Vec<Project>> {
        envelope::data(&self.get(&format!("/Teams/{}/Projects", team_id)).await?)
    }

    async fn get_project(&self, scope: &ProjectScope) -> Result<Project> {
        envelope::data(&self.get(&project_path(scope)).await?)
    }

    async fn create_project(&self, request: &CreateProjectRequest) -> Result<Project> {
        let path = format!("/Teams/{}/Projects", request.team_id);
        let project: Project = envelope::data(&self.post(&path, request).await?)?;
        info!("Created project {} in team {}", project.id, request.team_id);
        Ok(project)
    }

    async fn update_project(&self, scope: &ProjectScope, request: &UpdateProjectRequest) -> Result<Project> {
        envelope::data(&self.put(&project_path(scope), request).await?)
    }

    async fn delete_project(&self, scope: &ProjectScope) -> Result<()> {
        self.delete(&project_path(scope)).await?;
        info!("Deleted project {}", scope.project_id);
        Ok(())
    }

    async fn add_project_member(&self, scope: &ProjectScope, request: &AddProjectMemberRequest) -> Result<()> {
        self.post(&format!("{}/members", project_path(scope)), request).await?;
        Ok(())
    }

    async fn remove_project_member(&self, scope: &ProjectScope, user_id: &str) -> Result<()> {
        self.delete(&format!("{}/members/{}", project_path(scope), user_id)).await?;
        Ok(())
    }

    async fn update_project_member_role(&self, scope: &ProjectScope, user_id: &str, role: ProjectRole) -> Result<()> {
        let path = format!("{}/members/{}/role", project_path(scope), user_id);
        self.put(&path, &serde_json::json!({ "role": role })).await?;
        Ok(())
    }
}
