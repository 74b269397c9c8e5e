// Reaction state machine - pure, no side effects
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{CommentId, PostId};

/// A viewer's reaction to one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReactionStatus {
    #[default]
    None,
    Liked,
    Disliked,
}

impl ReactionStatus {
    pub fn state_name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Liked => "Liked",
            Self::Disliked => "Disliked",
        }
    }
}

// Wire form is "like" | "dislike" | null
impl Serialize for ReactionStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::None => serializer.serialize_none(),
            Self::Liked => serializer.serialize_str("like"),
            Self::Disliked => serializer.serialize_str("dislike"),
        }
    }
}

impl<'de> Deserialize<'de> for ReactionStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref() {
            None => Ok(Self::None),
            Some("like") => Ok(Self::Liked),
            Some("dislike") => Ok(Self::Disliked),
            Some(other) => Err(serde::de::Error::unknown_variant(
                other,
                &["like", "dislike"],
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Post,
    Comment,
}

impl TargetKind {
    /// Rating moved by a plain like or dislike. A reversal moves twice this.
    pub fn weight(self) -> i64 {
        match self {
            Self::Post => 2,
            Self::Comment => 1,
        }
    }
}

/// What a reaction is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactionTarget {
    Post(PostId),
    Comment(CommentId),
}

impl ReactionTarget {
    pub fn kind(self) -> TargetKind {
        match self {
            Self::Post(_) => TargetKind::Post,
            Self::Comment(_) => TargetKind::Comment,
        }
    }

    /// Path segment under the API root, e.g. `posts/4`
    pub fn path(self) -> String {
        match self {
            Self::Post(id) => format!("posts/{}", id),
            Self::Comment(id) => format!("comments/{}", id),
        }
    }
}

impl fmt::Display for ReactionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Post(id) => write!(f, "post {}", id),
            Self::Comment(id) => write!(f, "comment {}", id),
        }
    }
}

/// What the viewer asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionIntent {
    Like,
    Dislike,
    Remove,
}

/// A single gateway call needed to move between statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionCall {
    Like,
    Dislike,
    Remove,
}

/// Displayed counters of a post or comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counters {
    pub likes: u32,
    pub dislikes: u32,
    pub rating: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterDelta {
    pub likes: i64,
    pub dislikes: i64,
    pub rating: i64,
}

impl CounterDelta {
    pub fn negated(self) -> Self {
        Self {
            likes: -self.likes,
            dislikes: -self.dislikes,
            rating: -self.rating,
        }
    }

    pub fn is_zero(self) -> bool {
        self == Self::default()
    }
}

fn shift(count: u32, by: i64) -> u32 {
    let shifted = i64::from(count) + by;
    shifted.clamp(0, i64::from(u32::MAX)) as u32
}

impl Counters {
    /// Apply a delta, never letting a count drop below zero
    pub fn apply(self, delta: CounterDelta) -> Self {
        Self {
            likes: shift(self.likes, delta.likes),
            dislikes: shift(self.dislikes, delta.dislikes),
            rating: self.rating + delta.rating,
        }
    }

    /// The delta that actually takes `self` to `other`
    pub fn delta_to(self, other: Counters) -> CounterDelta {
        CounterDelta {
            likes: i64::from(other.likes) - i64::from(self.likes),
            dislikes: i64::from(other.dislikes) - i64::from(self.dislikes),
            rating: other.rating - self.rating,
        }
    }
}

/// Status plus counters for one (viewer, target) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReactionState {
    pub status: ReactionStatus,
    pub counters: Counters,
}

/// A move between two reaction states. Applying it to the `from` state
/// yields the `to` state; its inverse undoes it exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ReactionStatus,
    pub to: ReactionStatus,
    pub delta: CounterDelta,
}

impl Transition {
    pub fn apply(&self, state: ReactionState) -> ReactionState {
        ReactionState {
            status: self.to,
            counters: state.counters.apply(self.delta),
        }
    }

    pub fn inverse(&self) -> Transition {
        Transition {
            from: self.to,
            to: self.from,
            delta: self.delta.negated(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.from == self.to && self.delta.is_zero()
    }

    /// Gateway calls that take the server from `from` to `to`
    pub fn calls(&self) -> Vec<ReactionCall> {
        use ReactionStatus::*;
        match (self.from, self.to) {
            (None, Liked) => vec![ReactionCall::Like],
            (None, Disliked) => vec![ReactionCall::Dislike],
            (Disliked, Liked) => vec![ReactionCall::Remove, ReactionCall::Like],
            (Liked, Disliked) => vec![ReactionCall::Remove, ReactionCall::Dislike],
            (Liked, None) | (Disliked, None) => vec![ReactionCall::Remove],
            (None, None) | (Liked, Liked) | (Disliked, Disliked) => Vec::new(),
        }
    }
}

/// Table of status moves and their nominal counter deltas
pub fn plan(kind: TargetKind, current: ReactionStatus, intent: ReactionIntent) -> Transition {
    use ReactionStatus::*;
    let w = kind.weight();

    let (to, likes, dislikes, rating) = match (current, intent) {
        (None, ReactionIntent::Like) => (Liked, 1, 0, w),
        (Disliked, ReactionIntent::Like) => (Liked, 1, -1, 2 * w),
        (Liked, ReactionIntent::Like) => (None, -1, 0, -w),

        (None, ReactionIntent::Dislike) => (Disliked, 0, 1, -w),
        (Liked, ReactionIntent::Dislike) => (Disliked, -1, 1, -2 * w),
        (Disliked, ReactionIntent::Dislike) => (None, 0, -1, w),

        (Liked, ReactionIntent::Remove) => (None, -1, 0, -w),
        (Disliked, ReactionIntent::Remove) => (None, 0, -1, w),
        (None, ReactionIntent::Remove) => (None, 0, 0, 0),
    };

    Transition {
        from: current,
        to,
        delta: CounterDelta {
            likes,
            dislikes,
            rating,
        },
    }
}

/// Compute the optimistic state for `intent` and the transition that undoes it.
///
/// The inverse carries the effective change, so when a stale mirror would have
/// pushed a count below zero, rolling back still lands on the original values.
pub fn apply_transition(
    kind: TargetKind,
    state: ReactionState,
    intent: ReactionIntent,
) -> (ReactionState, Transition) {
    let planned = plan(kind, state.status, intent);
    let next = planned.apply(state);
    let effective = Transition {
        from: state.status,
        to: next.status,
        delta: state.counters.delta_to(next.counters),
    };
    (next, effective.inverse())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(status: ReactionStatus, likes: u32, dislikes: u32, rating: i64) -> ReactionState {
        ReactionState {
            status,
            counters: Counters {
                likes,
                dislikes,
                rating,
            },
        }
    }

    fn intents() -> [ReactionIntent; 3] {
        [
            ReactionIntent::Like,
            ReactionIntent::Dislike,
            ReactionIntent::Remove,
        ]
    }

    fn statuses() -> [ReactionStatus; 3] {
        [
            ReactionStatus::None,
            ReactionStatus::Liked,
            ReactionStatus::Disliked,
        ]
    }

    #[test]
    fn like_from_none_adds_one_like() {
        let (next, _) = apply_transition(
            TargetKind::Comment,
            state(ReactionStatus::None, 0, 0, 0),
            ReactionIntent::Like,
        );
        assert_eq!(next, state(ReactionStatus::Liked, 1, 0, 1));
    }

    #[test]
    fn reversing_a_post_dislike_moves_rating_by_four() {
        let (next, _) = apply_transition(
            TargetKind::Post,
            state(ReactionStatus::Disliked, 3, 2, 10),
            ReactionIntent::Like,
        );
        assert_eq!(next, state(ReactionStatus::Liked, 4, 1, 14));
    }

    #[test]
    fn liking_twice_unlikes() {
        let (next, _) = apply_transition(
            TargetKind::Post,
            state(ReactionStatus::Liked, 5, 0, 10),
            ReactionIntent::Like,
        );
        assert_eq!(next, state(ReactionStatus::None, 4, 0, 8));
    }

    #[test]
    fn dislike_mirrors_like() {
        let (next, _) = apply_transition(
            TargetKind::Comment,
            state(ReactionStatus::Liked, 1, 0, 1),
            ReactionIntent::Dislike,
        );
        assert_eq!(next, state(ReactionStatus::Disliked, 0, 1, -1));
    }

    #[test]
    fn remove_from_none_is_noop() {
        let t = plan(TargetKind::Post, ReactionStatus::None, ReactionIntent::Remove);
        assert!(t.is_noop());
        assert!(t.calls().is_empty());
    }

    #[test]
    fn comment_rating_deltas_stay_in_range() {
        for from in statuses() {
            for intent in intents() {
                let t = plan(TargetKind::Comment, from, intent);
                assert!(
                    [-2, -1, 0, 1, 2].contains(&t.delta.rating),
                    "{:?} {:?} gave {}",
                    from,
                    intent,
                    t.delta.rating
                );
            }
        }
    }

    #[test]
    fn post_rating_deltas_stay_in_range() {
        for from in statuses() {
            for intent in intents() {
                let t = plan(TargetKind::Post, from, intent);
                assert!([-4, -2, 0, 2, 4].contains(&t.delta.rating));
            }
        }
    }

    #[test]
    fn rollback_restores_exact_values() {
        for kind in [TargetKind::Post, TargetKind::Comment] {
            for from in statuses() {
                for intent in intents() {
                    let before = state(from, 3, 2, 7);
                    let (after, inverse) = apply_transition(kind, before, intent);
                    assert_eq!(inverse.apply(after), before);
                }
            }
        }
    }

    #[test]
    fn rollback_is_exact_even_when_count_was_clamped() {
        // Mirror says Liked with zero likes: the decrement is clamped
        let before = state(ReactionStatus::Liked, 0, 0, 0);
        let (after, inverse) = apply_transition(TargetKind::Post, before, ReactionIntent::Like);
        assert_eq!(after.counters.likes, 0);
        assert_eq!(inverse.apply(after), before);
    }

    #[test]
    fn sequence_ends_in_status_of_last_call_and_counts_stay_non_negative() {
        use ReactionIntent::*;
        let sequences: Vec<Vec<ReactionIntent>> = vec![
            vec![Like],
            vec![Dislike],
            vec![Like, Dislike],
            vec![Dislike, Like],
            vec![Like, Remove],
            vec![Dislike, Remove, Like],
            vec![Like, Dislike, Dislike, Like],
            vec![Remove, Remove, Dislike],
        ];

        for seq in sequences {
            let mut s = ReactionState::default();
            for intent in &seq {
                s = apply_transition(TargetKind::Comment, s, *intent).0;
                assert!(i64::from(s.counters.likes) >= 0);
                assert!(i64::from(s.counters.dislikes) >= 0);
            }
            // From None a viewer's counts are exactly their own status
            let expected_likes = u32::from(s.status == ReactionStatus::Liked);
            let expected_dislikes = u32::from(s.status == ReactionStatus::Disliked);
            assert_eq!(s.counters.likes, expected_likes, "{:?}", seq);
            assert_eq!(s.counters.dislikes, expected_dislikes, "{:?}", seq);
        }
    }

    #[test]
    fn single_call_sequences_end_in_implied_status() {
        let s = apply_transition(
            TargetKind::Post,
            ReactionState::default(),
            ReactionIntent::Dislike,
        )
        .0;
        assert_eq!(s.status, ReactionStatus::Disliked);
        let s = apply_transition(TargetKind::Post, s, ReactionIntent::Like).0;
        assert_eq!(s.status, ReactionStatus::Liked);
        let s = apply_transition(TargetKind::Post, s, ReactionIntent::Remove).0;
        assert_eq!(s.status, ReactionStatus::None);
    }

    #[test]
    fn reversal_needs_remove_then_apply() {
        let t = plan(TargetKind::Post, ReactionStatus::Disliked, ReactionIntent::Like);
        assert_eq!(t.calls(), vec![ReactionCall::Remove, ReactionCall::Like]);
        let t = plan(TargetKind::Post, ReactionStatus::None, ReactionIntent::Dislike);
        assert_eq!(t.calls(), vec![ReactionCall::Dislike]);
        let t = plan(TargetKind::Post, ReactionStatus::Liked, ReactionIntent::Like);
        assert_eq!(t.calls(), vec![ReactionCall::Remove]);
    }

    #[test]
    fn status_wire_format() {
        assert_eq!(serde_json::to_string(&ReactionStatus::Liked).unwrap(), "\"like\"");
        assert_eq!(serde_json::to_string(&ReactionStatus::None).unwrap(), "null");
        let s: ReactionStatus = serde_json::from_str("\"dislike\"").unwrap();
        assert_eq!(s, ReactionStatus::Disliked);
        let s: ReactionStatus = serde_json::from_str("null").unwrap();
        assert_eq!(s, ReactionStatus::None);
        assert!(serde_json::from_str::<ReactionStatus>("\"meh\"").is_err());
    }
}
