use crate::models::{User, UserId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub viewer: Option<User>,
}

impl AuthState {
    pub fn viewer_id(&self) -> Option<UserId> {
        self.viewer.as_ref().map(|u| u.id)
    }

    pub fn is_admin(&self) -> bool {
        self.viewer.as_ref().is_some_and(User::is_admin)
    }
}

#[derive(Debug, Clone)]
pub enum AuthAction {
    SignedIn(User),
    SignedOut,
    /// The viewer edited their own profile
    ViewerUpdated(User),
}

impl AuthAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SignedIn(_) => "auth/signed_in",
            Self::SignedOut => "auth/signed_out",
            Self::ViewerUpdated(_) => "auth/viewer_updated",
        }
    }
}

impl AuthState {
    pub fn reduce(&mut self, action: AuthAction) {
        match action {
            AuthAction::SignedIn(user) => self.viewer = Some(user),
            AuthAction::SignedOut => self.viewer = None,
            AuthAction::ViewerUpdated(user) => {
                if self.viewer_id() == Some(user.id) {
                    self.viewer = Some(user);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn user(id: u64, role: Role) -> User {
        User {
            id: UserId(id),
            login: format!("user{}", id),
            email: String::new(),
            full_name: String::new(),
            profile_picture_url: None,
            role,
            rating: 0,
        }
    }

    #[test]
    fn sign_in_then_out() {
        let mut state = AuthState::default();
        state.reduce(AuthAction::SignedIn(user(1, Role::Admin)));
        assert_eq!(state.viewer_id(), Some(UserId(1)));
        assert!(state.is_admin());

        state.reduce(AuthAction::SignedOut);
        assert!(state.viewer.is_none());
        assert!(!state.is_admin());
    }

    #[test]
    fn update_of_another_user_is_ignored() {
        let mut state = AuthState::default();
        state.reduce(AuthAction::SignedIn(user(1, Role::User)));
        state.reduce(AuthAction::ViewerUpdated(user(2, Role::Admin)));
        assert_eq!(state.viewer_id(), Some(UserId(1)));
        assert!(!state.is_admin());
    }
}
