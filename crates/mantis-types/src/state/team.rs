use super::collection::{CollectionAction, CollectionState, Entity};
use crate::team::{Team, TeamMember, TeamRole, UpdateTeamRequest};

pub type TeamState = CollectionState<Team>;
pub type TeamAction = CollectionAction<Team>;

impl Entity for Team {
    type Member = TeamMember;
    type Role = TeamRole;
    type Patch = UpdateTeamRequest;

    fn id(&self) -> &str {
        &self.id
    }

    fn members_mut(&mut self) -> &mut Vec<TeamMember> {
        &mut self.members
    }

    fn member_user_id(member: &TeamMember) -> &str {
        &member.user_id
    }

    fn set_member_role(member: &mut TeamMember, role: TeamRole) {
        member.role = role;
    }

    fn apply_patch(&mut self, patch: &UpdateTeamRequest) {
        patch.apply_to(self);
    }
}
