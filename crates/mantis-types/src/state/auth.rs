use super::Reducer;
use crate::user::User;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AuthAction {
    AuthStart,
    AuthSuccess { user: User, token: String },
    AuthFailure(String),
    AuthLogout,
    ClearError,
    SetLoading(bool),
}

impl Reducer for AuthState {
    type Action = AuthAction;

    fn reduce(self, action: AuthAction) -> Self {
        match action {
            AuthAction::AuthStart => Self {
                is_loading: true,
                error: None,
                ..self
            },
            AuthAction::AuthSuccess { user, token } => Self {
                user: Some(user),
                token: Some(token),
                is_authenticated: true,
                is_loading: false,
                error: None,
            },
            AuthAction::AuthFailure(error) => Self {
                error: Some(error),
                ..Self::default()
            },
            AuthAction::AuthLogout => Self::default(),
            AuthAction::ClearError => Self { error: None, ..self },
            AuthAction::SetLoading(is_loading) => Self { is_loading, ..self },
        }
    }
}
