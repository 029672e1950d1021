use serde::{Deserialize, Serialize};

/// Team + project pair that prefixes every project-scoped endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectScope {
    pub team_id: String,
    pub project_id: String,
}

impl ProjectScope {
    pub fn new(team_id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            team_id: team_id.into(),
            project_id: project_id.into(),
        }
    }

    pub fn thread(&self, thread_id: impl Into<String>) -> ThreadScope {
        ThreadScope {
            team_id: self.team_id.clone(),
            project_id: self.project_id.clone(),
            thread_id: thread_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadScope {
    pub team_id: String,
    pub project_id: String,
    pub thread_id: String,
}

impl ThreadScope {
    pub fn project(&self) -> ProjectScope {
        ProjectScope::new(self.team_id.clone(), self.project_id.clone())
    }
}
