use super::collection::{CollectionAction, CollectionState, Entity};
use crate::project::{Project, ProjectMember, ProjectRole, UpdateProjectRequest};

pub type ProjectState = CollectionState<Project>;
pub type ProjectAction = CollectionAction<Project>;

impl Entity for Project {
    type Member = ProjectMember;
    type Role = ProjectRole;
    type Patch = UpdateProjectRequest;

    fn id(&self) -> &str {
        &self.id
    }

    fn members_mut(&mut self) -> &mut Vec<ProjectMember> {
        &mut self.members
    }

    fn member_user_id(member: &ProjectMember) -> &str {
        &member.user_id
    }

    fn set_member_role(member: &mut ProjectMember, role: ProjectRole) {
        member.role = role;
    }

    fn apply_patch(&mut self, patch: &UpdateProjectRequest) {
        patch.apply_to(self);
    }
}
