//! Pure filter view over a calendar's posts.
//!
//! Filtering never mutates canonical state. Callers distinguish "no
//! post on this date" from "post filtered out" by comparing the
//! filtered result against the unfiltered map.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;

use crate::post::{Post, PostStatus, PostType};

/// Filter specification. An empty category imposes no constraint;
/// categories combine with logical AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFilter {
    pub statuses: HashSet<PostStatus>,
    pub types: HashSet<PostType>,
    pub platforms: HashSet<String>,
}

impl PostFilter {
    pub fn is_unconstrained(&self) -> bool {
        self.statuses.is_empty() && self.types.is_empty() && self.platforms.is_empty()
    }

    pub fn matches(&self, post: &Post) -> bool {
        let status_ok = self.statuses.is_empty() || self.statuses.contains(&post.status);
        let types_ok =
            self.types.is_empty() || post.types.iter().any(|t| self.types.contains(t));
        let platforms_ok = self.platforms.is_empty()
            || post.platforms.iter().any(|p| self.platforms.contains(p));
        status_ok && types_ok && platforms_ok
    }

    /// The subset of entries whose posts satisfy the filter.
    pub fn apply<'a>(
        &self,
        calendar_data: &'a BTreeMap<NaiveDate, Post>,
    ) -> BTreeMap<NaiveDate, &'a Post> {
        calendar_data
            .iter()
            .filter(|(_, post)| self.matches(post))
            .map(|(date, post)| (*date, post))
            .collect()
    }
}
