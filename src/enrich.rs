// Joins posts and comments with the users and categories they reference
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use futures::future::try_join_all;

use crate::api::ForumApi;
use crate::error::ClientResult;
use crate::models::{Category, CategoryId, Comment, Enriched, Post, User, UserId};

/// Ids a record points at
pub trait References {
    fn author_id(&self) -> UserId;

    fn category_ids(&self) -> &[CategoryId] {
        &[]
    }
}

impl References for Post {
    fn author_id(&self) -> UserId {
        self.user_id
    }

    fn category_ids(&self) -> &[CategoryId] {
        &self.category_ids
    }
}

impl References for Comment {
    fn author_id(&self) -> UserId {
        self.user_id
    }
}

/// Unique values in first-seen order
fn distinct<T: Copy + Eq + Hash>(values: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    values.into_iter().filter(|v| seen.insert(*v)).collect()
}

/// Fetch every distinct author and category once, concurrently, and attach
/// them to `records` in their original order. A single failed lookup fails
/// the whole batch.
pub async fn enrich<T, A>(api: &A, records: Vec<T>) -> ClientResult<Vec<Enriched<T>>>
where
    T: References,
    A: ForumApi + ?Sized,
{
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let user_ids = distinct(records.iter().map(|r| r.author_id()));
    let category_ids = distinct(
        records
            .iter()
            .flat_map(|r| r.category_ids().iter().copied()),
    );

    tracing::debug!(
        "Enriching {} records with {} users and {} categories",
        records.len(),
        user_ids.len(),
        category_ids.len()
    );

    let user_lookups: Vec<_> = user_ids.iter().map(|id| api.get_user(*id)).collect();
    let category_lookups: Vec<_> = category_ids
        .iter()
        .map(|id| api.get_category(*id))
        .collect();
    let (users, categories) = futures::try_join!(
        try_join_all(user_lookups),
        try_join_all(category_lookups)
    )?;

    let users: HashMap<UserId, User> = user_ids.into_iter().zip(users).collect();
    let categories: HashMap<CategoryId, Category> =
        category_ids.into_iter().zip(categories).collect();

    Ok(records
        .into_iter()
        .map(|record| {
            let user = users.get(&record.author_id()).cloned();
            let categories = record
                .category_ids()
                .iter()
                .filter_map(|id| categories.get(id).cloned())
                .collect();
            Enriched {
                record,
                user,
                categories,
            }
        })
        .collect())
}

/// Single-record variant used by detail views and freshly created records
pub async fn enrich_one<T, A>(api: &A, record: T) -> ClientResult<Enriched<T>>
where
    T: References,
    A: ForumApi + ?Sized,
{
    let category_ids = distinct(record.category_ids().iter().copied());
    let category_lookups: Vec<_> = category_ids
        .iter()
        .map(|id| api.get_category(*id))
        .collect();
    let (user, categories) = futures::try_join!(
        api.get_user(record.author_id()),
        try_join_all(category_lookups)
    )?;

    Ok(Enriched {
        record,
        user: Some(user),
        categories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_keeps_first_seen_order() {
        assert_eq!(distinct([3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }

    #[test]
    fn distinct_of_nothing_is_empty() {
        assert!(distinct(Vec::<u64>::new()).is_empty());
    }
}
