use crate::api::{UserListQuery, UserSortKey};
use crate::models::{Page, User};
use crate::query::{total_pages, SortOrder};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsersState {
    /// User shown on the profile page
    pub profile: Option<User>,
    pub profile_loading: bool,
    pub profile_error: Option<String>,

    pub list: Vec<User>,
    pub list_query: UserListQuery,
    pub found: u64,
    pub list_loading: bool,
    pub list_error: Option<String>,
}

impl UsersState {
    pub fn total_pages(&self) -> u32 {
        total_pages(self.found)
    }
}

#[derive(Debug, Clone)]
pub enum UsersAction {
    ProfileStarted,
    ProfileLoaded(User),
    ProfileFailed(String),
    Updated(User),
    SortChanged {
        sort_by: UserSortKey,
        order: SortOrder,
    },
    PageChanged(u32),
    ListStarted,
    ListLoaded(Page<User>),
    ListFailed(String),
}

impl UsersAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ProfileStarted => "users/profile_started",
            Self::ProfileLoaded(_) => "users/profile_loaded",
            Self::ProfileFailed(_) => "users/profile_failed",
            Self::Updated(_) => "users/updated",
            Self::SortChanged { .. } => "users/sort_changed",
            Self::PageChanged(_) => "users/page_changed",
            Self::ListStarted => "users/list_started",
            Self::ListLoaded(_) => "users/list_loaded",
            Self::ListFailed(_) => "users/list_failed",
        }
    }
}

impl UsersState {
    pub fn reduce(&mut self, action: UsersAction) {
        match action {
            UsersAction::ProfileStarted => {
                self.profile_loading = true;
                self.profile_error = None;
            }
            UsersAction::ProfileLoaded(user) => {
                self.profile_loading = false;
                self.profile = Some(user);
            }
            UsersAction::ProfileFailed(error) => {
                self.profile_loading = false;
                self.profile_error = Some(error);
            }
            UsersAction::Updated(user) => {
                if let Some(existing) = self.list.iter_mut().find(|u| u.id == user.id) {
                    *existing = user.clone();
                }
                if self.profile.as_ref().is_some_and(|p| p.id == user.id) {
                    self.profile = Some(user);
                }
            }
            UsersAction::SortChanged { sort_by, order } => {
                self.list_query.sort_by = sort_by;
                self.list_query.order = order;
                self.list_query.page = 1;
            }
            UsersAction::PageChanged(page) => self.list_query.page = page,
            UsersAction::ListStarted => {
                self.list_loading = true;
                self.list_error = None;
            }
            UsersAction::ListLoaded(page) => {
                self.list_loading = false;
                self.list = page.items;
                self.found = page.found;
            }
            UsersAction::ListFailed(error) => {
                self.list_loading = false;
                self.list_error = Some(error);
            }
        }
    }
}
