use crate::models::{Category, CategoryId, Page};
use crate::query::total_pages;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoriesState {
    pub categories: Vec<Category>,
    pub page: u32,
    pub title: String,
    pub found: u64,
    pub current: Option<Category>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for CategoriesState {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            page: 1,
            title: String::new(),
            found: 0,
            current: None,
            loading: false,
            error: None,
        }
    }
}

impl CategoriesState {
    pub fn total_pages(&self) -> u32 {
        total_pages(self.found)
    }

    pub fn find(&self, id: CategoryId) -> Option<&Category> {
        self.current
            .iter()
            .chain(self.categories.iter())
            .find(|c| c.id == id)
    }
}

#[derive(Debug, Clone)]
pub enum CategoriesAction {
    ListStarted { page: u32, title: String },
    ListLoaded(Page<Category>),
    Started,
    Loaded(Category),
    Created(Category),
    Updated(Category),
    Removed(CategoryId),
    Failed(String),
}

impl CategoriesAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ListStarted { .. } => "categories/list_started",
            Self::ListLoaded(_) => "categories/list_loaded",
            Self::Started => "categories/started",
            Self::Loaded(_) => "categories/loaded",
            Self::Created(_) => "categories/created",
            Self::Updated(_) => "categories/updated",
            Self::Removed(_) => "categories/removed",
            Self::Failed(_) => "categories/failed",
        }
    }
}

impl CategoriesState {
    pub fn reduce(&mut self, action: CategoriesAction) {
        match action {
            CategoriesAction::ListStarted { page, title } => {
                self.page = page;
                self.title = title;
                self.loading = true;
                self.error = None;
            }
            CategoriesAction::ListLoaded(page) => {
                self.loading = false;
                self.categories = page.items;
                self.found = page.found;
            }
            CategoriesAction::Started => {
                self.loading = true;
                self.error = None;
            }
            CategoriesAction::Loaded(category) => {
                self.loading = false;
                self.current = Some(category);
            }
            CategoriesAction::Created(category) => {
                self.loading = false;
                self.found += 1;
                self.categories.insert(0, category);
            }
            CategoriesAction::Updated(category) => {
                self.loading = false;
                if let Some(existing) = self.categories.iter_mut().find(|c| c.id == category.id) {
                    *existing = category.clone();
                }
                if self.current.as_ref().is_some_and(|c| c.id == category.id) {
                    self.current = Some(category);
                }
            }
            CategoriesAction::Removed(id) => {
                self.loading = false;
                let before = self.categories.len();
                self.categories.retain(|c| c.id != id);
                if self.categories.len() < before {
                    self.found = self.found.saturating_sub(1);
                }
                if self.current.as_ref().is_some_and(|c| c.id == id) {
                    self.current = None;
                }
            }
            CategoriesAction::Failed(error) => {
                self.loading = false;
                self.error = Some(error);
            }
        }
    }
}
