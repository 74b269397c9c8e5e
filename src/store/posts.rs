use std::collections::HashMap;

use crate::models::{EnrichedPost, Page, PostId};
use crate::query::{total_pages, FilterPatch, ListSource, QueryState, SortKey, SortOrder};
use crate::reaction::{CounterDelta, Counters, ReactionState, ReactionStatus};

/// One post list bound to a source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostList {
    pub query: QueryState,
    pub posts: Vec<EnrichedPost>,
    pub found: u64,
    pub total: u64,
    pub loading: bool,
    pub error: Option<String>,
    /// Id of the newest fetch issued for this list
    pub latest_request: u64,
}

impl PostList {
    pub fn total_pages(&self) -> u32 {
        total_pages(self.found)
    }
}

/// Where a loaded copy of a post lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostCopy {
    Detail,
    Listed(ListSource),
}

fn counters_of(post: &EnrichedPost) -> Counters {
    Counters {
        likes: post.record.likes,
        dislikes: post.record.dislikes,
        rating: post.record.rating,
    }
}

fn set_counters(post: &mut EnrichedPost, counters: Counters) {
    post.record.likes = counters.likes;
    post.record.dislikes = counters.dislikes;
    post.record.rating = counters.rating;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostsState {
    pub lists: HashMap<ListSource, PostList>,

    /// Post open in the detail view
    pub current: Option<EnrichedPost>,
    pub current_loading: bool,
    pub current_error: Option<String>,

    pub like_statuses: HashMap<PostId, ReactionStatus>,
    pub reaction_errors: HashMap<PostId, String>,

    pub uploaded_files: Vec<String>,
    pub creating: bool,
    pub create_error: Option<String>,
    pub updating: bool,
    pub update_error: Option<String>,

    request_counter: u64,
}

#[derive(Debug, Clone)]
pub enum PostsAction {
    FiltersChanged {
        source: ListSource,
        patch: FilterPatch,
    },
    SortChanged {
        source: ListSource,
        sort_by: SortKey,
        order: SortOrder,
    },
    /// Already checked against the list's page count
    PageChanged {
        source: ListSource,
        page: u32,
    },
    FetchStarted {
        source: ListSource,
        request: u64,
    },
    FetchSucceeded {
        source: ListSource,
        request: u64,
        page: Page<EnrichedPost>,
    },
    FetchFailed {
        source: ListSource,
        request: u64,
        error: String,
    },

    DetailStarted,
    DetailLoaded(EnrichedPost),
    DetailFailed(String),

    ReactionStatusLoaded {
        id: PostId,
        status: ReactionStatus,
    },
    ReactionApplied {
        id: PostId,
        status: ReactionStatus,
        delta: CounterDelta,
    },
    /// Put each copy back to the counters it had before a failed reaction
    ReactionRestored {
        id: PostId,
        status: ReactionStatus,
        copies: Vec<(PostCopy, Counters)>,
    },
    ReactionFailed {
        id: PostId,
        error: String,
    },
    FavoriteSet {
        id: PostId,
        favourite: bool,
    },

    CreateStarted,
    Created(EnrichedPost),
    CreateFailed(String),
    UpdateStarted,
    Updated(EnrichedPost),
    UpdateFailed(String),
    Removed(PostId),

    FilesUploaded(Vec<String>),
    UploadedFilesReset,

    /// Drop everything tied to the signed-in viewer
    ViewerCleared,
}

impl PostsAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FiltersChanged { .. } => "posts/filters_changed",
            Self::SortChanged { .. } => "posts/sort_changed",
            Self::PageChanged { .. } => "posts/page_changed",
            Self::FetchStarted { .. } => "posts/fetch_started",
            Self::FetchSucceeded { .. } => "posts/fetch_succeeded",
            Self::FetchFailed { .. } => "posts/fetch_failed",
            Self::DetailStarted => "posts/detail_started",
            Self::DetailLoaded(_) => "posts/detail_loaded",
            Self::DetailFailed(_) => "posts/detail_failed",
            Self::ReactionStatusLoaded { .. } => "posts/reaction_status_loaded",
            Self::ReactionApplied { .. } => "posts/reaction_applied",
            Self::ReactionRestored { .. } => "posts/reaction_restored",
            Self::ReactionFailed { .. } => "posts/reaction_failed",
            Self::FavoriteSet { .. } => "posts/favorite_set",
            Self::CreateStarted => "posts/create_started",
            Self::Created(_) => "posts/created",
            Self::CreateFailed(_) => "posts/create_failed",
            Self::UpdateStarted => "posts/update_started",
            Self::Updated(_) => "posts/updated",
            Self::UpdateFailed(_) => "posts/update_failed",
            Self::Removed(_) => "posts/removed",
            Self::FilesUploaded(_) => "posts/files_uploaded",
            Self::UploadedFilesReset => "posts/uploaded_files_reset",
            Self::ViewerCleared => "posts/viewer_cleared",
        }
    }
}

impl PostsState {
    pub fn list(&self, source: ListSource) -> Option<&PostList> {
        self.lists.get(&source)
    }

    /// Query state for `source`, defaults if it was never touched
    pub fn query(&self, source: ListSource) -> QueryState {
        self.list(source)
            .map(|l| l.query.clone())
            .unwrap_or_default()
    }

    pub fn total_pages(&self, source: ListSource) -> u32 {
        self.list(source).map_or(1, PostList::total_pages)
    }

    /// Id to hand to the next `FetchStarted`
    pub fn next_request_id(&self) -> u64 {
        self.request_counter + 1
    }

    pub fn status_of(&self, id: PostId) -> ReactionStatus {
        self.like_statuses.get(&id).copied().unwrap_or_default()
    }

    /// First copy of the post found in the detail view or any list
    pub fn find(&self, id: PostId) -> Option<&EnrichedPost> {
        self.current
            .iter()
            .chain(self.lists.values().flat_map(|l| l.posts.iter()))
            .find(|p| p.record.id == id)
    }

    pub fn reaction_state(&self, id: PostId) -> Option<ReactionState> {
        self.find(id).map(|p| ReactionState {
            status: self.status_of(id),
            counters: counters_of(p),
        })
    }

    /// Counters of every loaded copy of `id`. Mirrors can disagree when one
    /// of them is stale, so rollback restores each copy on its own.
    pub fn counters_by_copy(&self, id: PostId) -> Vec<(PostCopy, Counters)> {
        let detail = self
            .current
            .iter()
            .filter(|p| p.record.id == id)
            .map(|p| (PostCopy::Detail, counters_of(p)));
        let listed = self.lists.iter().flat_map(|(source, list)| {
            list.posts
                .iter()
                .filter(move |p| p.record.id == id)
                .map(move |p| (PostCopy::Listed(*source), counters_of(p)))
        });
        detail.chain(listed).collect()
    }

    fn copy_mut(&mut self, copy: PostCopy, id: PostId) -> Option<&mut EnrichedPost> {
        match copy {
            PostCopy::Detail => self.current.as_mut().filter(|p| p.record.id == id),
            PostCopy::Listed(source) => self
                .lists
                .get_mut(&source)?
                .posts
                .iter_mut()
                .find(|p| p.record.id == id),
        }
    }

    fn copies_mut(&mut self, id: PostId) -> impl Iterator<Item = &mut EnrichedPost> {
        self.current
            .iter_mut()
            .chain(self.lists.values_mut().flat_map(|l| l.posts.iter_mut()))
            .filter(move |p| p.record.id == id)
    }

    pub fn reduce(&mut self, action: PostsAction) {
        match action {
            PostsAction::FiltersChanged { source, patch } => {
                self.lists
                    .entry(source)
                    .or_default()
                    .query
                    .apply_filters(patch);
            }
            PostsAction::SortChanged {
                source,
                sort_by,
                order,
            } => {
                self.lists
                    .entry(source)
                    .or_default()
                    .query
                    .apply_sort(sort_by, order);
            }
            PostsAction::PageChanged { source, page } => {
                let list = self.lists.entry(source).or_default();
                let pages = list.total_pages();
                list.query.try_set_page(i64::from(page), pages);
            }
            PostsAction::FetchStarted { source, request } => {
                self.request_counter = self.request_counter.max(request);
                let list = self.lists.entry(source).or_default();
                list.latest_request = request;
                list.loading = true;
                list.error = None;
            }
            PostsAction::FetchSucceeded {
                source,
                request,
                page,
            } => {
                let list = self.lists.entry(source).or_default();
                if request != list.latest_request {
                    tracing::warn!(
                        "Discarding stale response {} for {} (latest {})",
                        request,
                        source,
                        list.latest_request
                    );
                    return;
                }
                list.loading = false;
                list.posts = page.items;
                list.found = page.found;
                list.total = page.total;
            }
            PostsAction::FetchFailed {
                source,
                request,
                error,
            } => {
                let list = self.lists.entry(source).or_default();
                if request != list.latest_request {
                    tracing::warn!("Discarding stale failure {} for {}", request, source);
                    return;
                }
                list.loading = false;
                list.error = Some(error);
            }

            PostsAction::DetailStarted => {
                self.current_loading = true;
                self.current_error = None;
            }
            PostsAction::DetailLoaded(post) => {
                self.current_loading = false;
                self.current = Some(post);
            }
            PostsAction::DetailFailed(error) => {
                self.current_loading = false;
                self.current = None;
                self.current_error = Some(error);
            }

            PostsAction::ReactionStatusLoaded { id, status } => {
                self.like_statuses.insert(id, status);
            }
            PostsAction::ReactionApplied { id, status, delta } => {
                for post in self.copies_mut(id) {
                    let counters = counters_of(post).apply(delta);
                    set_counters(post, counters);
                }
                self.like_statuses.insert(id, status);
                self.reaction_errors.remove(&id);
            }
            PostsAction::ReactionRestored { id, status, copies } => {
                for (copy, counters) in copies {
                    if let Some(post) = self.copy_mut(copy, id) {
                        set_counters(post, counters);
                    }
                }
                self.like_statuses.insert(id, status);
            }
            PostsAction::ReactionFailed { id, error } => {
                self.reaction_errors.insert(id, error);
            }
            PostsAction::FavoriteSet { id, favourite } => {
                for post in self.copies_mut(id) {
                    post.record.is_favourite = Some(favourite);
                }
            }

            PostsAction::CreateStarted => {
                self.creating = true;
                self.create_error = None;
            }
            PostsAction::Created(post) => {
                self.creating = false;
                if let Some(list) = self.lists.get_mut(&ListSource::All) {
                    list.posts.insert(0, post);
                    list.found += 1;
                    list.total += 1;
                }
            }
            PostsAction::CreateFailed(error) => {
                self.creating = false;
                self.create_error = Some(error);
            }
            PostsAction::UpdateStarted => {
                self.updating = true;
                self.update_error = None;
            }
            PostsAction::Updated(post) => {
                self.updating = false;
                let id = post.record.id;
                for existing in self.copies_mut(id) {
                    *existing = post.clone();
                }
            }
            PostsAction::UpdateFailed(error) => {
                self.updating = false;
                self.update_error = Some(error);
            }
            PostsAction::Removed(id) => {
                for list in self.lists.values_mut() {
                    let before = list.posts.len();
                    list.posts.retain(|p| p.record.id != id);
                    if list.posts.len() < before {
                        list.found = list.found.saturating_sub(1);
                        list.total = list.total.saturating_sub(1);
                    }
                }
                if self.current.as_ref().is_some_and(|p| p.record.id == id) {
                    self.current = None;
                }
                self.like_statuses.remove(&id);
                self.reaction_errors.remove(&id);
            }

            PostsAction::FilesUploaded(files) => self.uploaded_files.extend(files),
            PostsAction::UploadedFilesReset => self.uploaded_files.clear(),

            PostsAction::ViewerCleared => {
                self.like_statuses.clear();
                self.reaction_errors.clear();
                self.uploaded_files.clear();
                self.lists
                    .retain(|source, _| matches!(source, ListSource::All));
                for post in self.copies_all_mut() {
                    post.record.is_favourite = None;
                }
            }
        }
    }

    fn copies_all_mut(&mut self) -> impl Iterator<Item = &mut EnrichedPost> {
        self.current
            .iter_mut()
            .chain(self.lists.values_mut().flat_map(|l| l.posts.iter_mut()))
    }
}
