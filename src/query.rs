use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{CategoryId, UserId};

pub const PAGE_SIZE: u32 = 30;

/// Which collection a post list is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListSource {
    All,
    User(UserId),
    Favorites(UserId),
}

impl ListSource {
    /// Endpoint path relative to the API root
    pub fn path(self) -> String {
        match self {
            Self::All => "posts".to_string(),
            Self::User(id) => format!("users/{}/posts", id),
            Self::Favorites(id) => format!("users/{}/favorite-posts", id),
        }
    }

    pub fn forwards_status(self) -> bool {
        matches!(self, Self::User(_))
    }
}

impl fmt::Display for ListSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::User(id) => write!(f, "user:{}", id),
            Self::Favorites(id) => write!(f, "favorites:{}", id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Rating,
    CreatedAt,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rating => "rating",
            Self::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    Active,
    Inactive,
    Both,
}

impl StatusFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Both => "both",
        }
    }
}

/// Filter, sort and pagination parameters for one list source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    pub current_page: u32,
    pub search_title: String,
    pub category_filters: Vec<CategoryId>,
    pub start_date: Option<NaiveDate>,
    /// Exclusive upper bound, already shifted by one day
    pub end_date: Option<NaiveDate>,
    pub sort_by: SortKey,
    pub order: SortOrder,
    pub status_filter: StatusFilter,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            current_page: 1,
            search_title: String::new(),
            category_filters: Vec::new(),
            start_date: None,
            end_date: None,
            sort_by: SortKey::Rating,
            order: SortOrder::Desc,
            status_filter: StatusFilter::Active,
        }
    }
}

/// Partial update of the filter fields; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPatch {
    pub search_title: Option<String>,
    pub category_filters: Option<Vec<CategoryId>>,
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
    pub status_filter: Option<StatusFilter>,
}

impl FilterPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            search_title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Category selection, with the single-id quirk applied
    pub fn categories(selected: &[CategoryId]) -> Self {
        Self {
            category_filters: Some(category_filter_for(selected)),
            ..Default::default()
        }
    }

    /// Date range as picked by the user; `end` is inclusive here
    pub fn date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self {
            start_date: Some(start),
            end_date: Some(end.and_then(exclusive_end)),
            ..Default::default()
        }
    }

    pub fn status(status: StatusFilter) -> Self {
        Self {
            status_filter: Some(status),
            ..Default::default()
        }
    }
}

/// The backend filters categories as a two-endpoint pair, so a single
/// selection is sent as `[id, id]`.
pub fn category_filter_for(selected: &[CategoryId]) -> Vec<CategoryId> {
    match selected {
        [only] => vec![*only, *only],
        _ => selected.to_vec(),
    }
}

/// Shift an inclusive end date to the exclusive bound the backend expects
pub fn exclusive_end(end: NaiveDate) -> Option<NaiveDate> {
    end.checked_add_days(Days::new(1))
}

pub fn total_pages(found: u64) -> u32 {
    let pages = found.div_ceil(u64::from(PAGE_SIZE));
    pages.clamp(1, u64::from(u32::MAX)) as u32
}

impl QueryState {
    pub fn apply_filters(&mut self, patch: FilterPatch) {
        if let Some(title) = patch.search_title {
            self.search_title = title;
        }
        if let Some(categories) = patch.category_filters {
            self.category_filters = categories;
        }
        if let Some(start) = patch.start_date {
            self.start_date = start;
        }
        if let Some(end) = patch.end_date {
            self.end_date = end;
        }
        if let Some(status) = patch.status_filter {
            self.status_filter = status;
        }
        self.current_page = 1;
    }

    pub fn apply_sort(&mut self, sort_by: SortKey, order: SortOrder) {
        self.sort_by = sort_by;
        self.order = order;
        self.current_page = 1;
    }

    /// Move to `page` if it lies within `1..=total_pages`
    pub fn try_set_page(&mut self, page: i64, total_pages: u32) -> bool {
        if page < 1 || page > i64::from(total_pages) {
            return false;
        }
        self.current_page = page as u32;
        true
    }

    pub fn has_filters(&self) -> bool {
        !self.search_title.is_empty()
            || !self.category_filters.is_empty()
            || self.start_date.is_some()
            || self.end_date.is_some()
    }

    /// Query parameters for a post listing request
    pub fn to_params(&self, source: ListSource) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.current_page.to_string()),
            ("limit".to_string(), PAGE_SIZE.to_string()),
            ("sortBy".to_string(), self.sort_by.as_str().to_string()),
            ("order".to_string(), self.order.as_str().to_string()),
        ];

        if !self.search_title.is_empty() {
            params.push(("title".to_string(), self.search_title.clone()));
        }
        if source.forwards_status() {
            params.push(("status".to_string(), self.status_filter.as_str().to_string()));
        }
        for id in &self.category_filters {
            params.push(("category_ids".to_string(), id.to_string()));
        }
        if let Some(start) = self.start_date {
            params.push(("startDate".to_string(), start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = self.end_date {
            params.push(("endDate".to_string(), end.format("%Y-%m-%d").to_string()));
        }

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn values<'a>(params: &'a [(String, String)], key: &str) -> Vec<&'a str> {
        params
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    #[test]
    fn defaults_sort_by_rating_desc_on_page_one() {
        let q = QueryState::default();
        assert_eq!(q.current_page, 1);
        assert_eq!(q.sort_by, SortKey::Rating);
        assert_eq!(q.order, SortOrder::Desc);
        assert_eq!(q.status_filter, StatusFilter::Active);
        assert!(!q.has_filters());
    }

    #[test]
    fn any_filter_patch_resets_page() {
        let patches = vec![
            FilterPatch::title("rust"),
            FilterPatch::categories(&[CategoryId(3)]),
            FilterPatch::date_range(Some(date("2024-01-01")), None),
            FilterPatch::status(StatusFilter::Both),
            FilterPatch::default(),
        ];
        for patch in patches {
            let mut q = QueryState {
                current_page: 4,
                ..Default::default()
            };
            q.apply_filters(patch);
            assert_eq!(q.current_page, 1);
        }
    }

    #[test]
    fn patch_leaves_other_filters_alone() {
        let mut q = QueryState::default();
        q.apply_filters(FilterPatch::title("rust"));
        q.apply_filters(FilterPatch::categories(&[CategoryId(7), CategoryId(9)]));
        assert_eq!(q.search_title, "rust");
        assert_eq!(q.category_filters, vec![CategoryId(7), CategoryId(9)]);
    }

    #[test]
    fn sort_change_resets_page() {
        let mut q = QueryState {
            current_page: 2,
            ..Default::default()
        };
        q.apply_sort(SortKey::CreatedAt, SortOrder::Asc);
        assert_eq!(q.current_page, 1);
        assert_eq!(q.sort_by, SortKey::CreatedAt);
    }

    #[test]
    fn page_bounds_are_enforced() {
        let mut q = QueryState {
            current_page: 3,
            ..Default::default()
        };
        assert!(!q.try_set_page(0, 5));
        assert!(!q.try_set_page(-5, 5));
        assert!(!q.try_set_page(6, 5));
        assert_eq!(q.current_page, 3);

        assert!(q.try_set_page(3, 5));
        assert_eq!(q.current_page, 3);
        assert!(q.try_set_page(5, 5));
        assert_eq!(q.current_page, 5);
    }

    #[test]
    fn page_change_keeps_filters() {
        let mut q = QueryState::default();
        q.apply_filters(FilterPatch::title("rust"));
        assert!(q.try_set_page(2, 3));
        assert_eq!(q.search_title, "rust");
    }

    #[test]
    fn single_category_is_sent_twice() {
        assert_eq!(
            category_filter_for(&[CategoryId(7)]),
            vec![CategoryId(7), CategoryId(7)]
        );
        assert_eq!(
            category_filter_for(&[CategoryId(7), CategoryId(9)]),
            vec![CategoryId(7), CategoryId(9)]
        );
        assert!(category_filter_for(&[]).is_empty());
    }

    #[test]
    fn end_date_is_made_exclusive() {
        let patch = FilterPatch::date_range(None, Some(date("2024-05-10")));
        let mut q = QueryState::default();
        q.apply_filters(patch);
        let params = q.to_params(ListSource::All);
        assert_eq!(values(&params, "endDate"), vec!["2024-05-11"]);
        assert!(values(&params, "startDate").is_empty());
    }

    #[test]
    fn end_date_crosses_month_boundary() {
        assert_eq!(exclusive_end(date("2024-02-29")), Some(date("2024-03-01")));
    }

    #[test]
    fn clearing_date_range_removes_bounds() {
        let mut q = QueryState::default();
        q.apply_filters(FilterPatch::date_range(
            Some(date("2024-01-01")),
            Some(date("2024-01-31")),
        ));
        q.apply_filters(FilterPatch::date_range(None, None));
        assert_eq!(q.start_date, None);
        assert_eq!(q.end_date, None);
    }

    #[test]
    fn params_carry_sort_and_categories() {
        let mut q = QueryState::default();
        q.apply_filters(FilterPatch::categories(&[CategoryId(7)]));
        q.apply_sort(SortKey::CreatedAt, SortOrder::Asc);
        let params = q.to_params(ListSource::All);
        assert_eq!(values(&params, "page"), vec!["1"]);
        assert_eq!(values(&params, "limit"), vec!["30"]);
        assert_eq!(values(&params, "sortBy"), vec!["created_at"]);
        assert_eq!(values(&params, "order"), vec!["ASC"]);
        assert_eq!(values(&params, "category_ids"), vec!["7", "7"]);
        assert!(values(&params, "title").is_empty());
    }

    #[test]
    fn only_user_source_forwards_status() {
        let q = QueryState::default();
        assert!(values(&q.to_params(ListSource::All), "status").is_empty());
        assert!(values(&q.to_params(ListSource::Favorites(UserId(1))), "status").is_empty());
        assert_eq!(
            values(&q.to_params(ListSource::User(UserId(1))), "status"),
            vec!["active"]
        );
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0), 1);
        assert_eq!(total_pages(30), 1);
        assert_eq!(total_pages(31), 2);
        assert_eq!(total_pages(150), 5);
    }

    #[test]
    fn source_paths() {
        assert_eq!(ListSource::All.path(), "posts");
        assert_eq!(ListSource::User(UserId(3)).path(), "users/3/posts");
        assert_eq!(
            ListSource::Favorites(UserId(3)).path(),
            "users/3/favorite-posts"
        );
    }
}
