//! Query builder
//!
//! Turns optional list filters into a [`PostPredicate`]. Filters that are
//! absent or empty contribute no clause at all.

use crate::models::{normalize_tags, PostClause, PostFilter, PostPredicate};

/// Build the conjunctive predicate for a post listing
pub fn build_post_predicate(filter: &PostFilter) -> PostPredicate {
    let mut clauses = Vec::new();

    if let Some(term) = filter.search.as_deref().map(str::trim) {
        if !term.is_empty() {
            clauses.push(PostClause::Search(term.to_string()));
        }
    }

    let tags = normalize_tags(&filter.tags);
    if !tags.is_empty() {
        clauses.push(PostClause::HasAllTags(tags));
    }

    if let Some(flag) = filter.is_featured {
        clauses.push(PostClause::Featured(flag));
    }
    if let Some(status) = filter.status {
        clauses.push(PostClause::Status(status));
    }
    if let Some(author_id) = filter.author_id {
        clauses.push(PostClause::Author(author_id));
    }

    PostPredicate::new(clauses)
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::models::PostStatus;
    use proptest::prelude::*;

    fn status_strategy() -> impl Strategy<Value = Option<PostStatus>> {
        prop_oneof![
            Just(None),
            Just(Some(PostStatus::Draft)),
            Just(Some(PostStatus::Published)),
            Just(Some(PostStatus::Archived)),
        ]
    }

    proptest! {
        #[test]
        fn clause_count_matches_present_filters(
            search in proptest::option::of("[ a-z]{0,8}"),
            tags in proptest::collection::vec("[ a-c]{0,2}", 0..5),
            is_featured in proptest::option::of(any::<bool>()),
            status in status_strategy(),
            author_id in proptest::option::of(1i64..1000),
        ) {
            let filter = PostFilter { search: search.clone(), tags: tags.clone(), is_featured, status, author_id };
            let predicate = build_post_predicate(&filter);

            let expected = usize::from(search.as_deref().map(str::trim).is_some_and(|s| !s.is_empty()))
                + usize::from(tags.iter().any(|t| !t.trim().is_empty()))
                + usize::from(is_featured.is_some())
                + usize::from(status.is_some())
                + usize::from(author_id.is_some());
            prop_assert_eq!(predicate.clauses().len(), expected);
        }

        #[test]
        fn tag_clause_is_sorted_and_unique(tags in proptest::collection::vec("[a-d]{1,2}", 1..8)) {
            let filter = PostFilter { tags, ..Default::default() };
            let predicate = build_post_predicate(&filter);
            match predicate.clauses() {
                [PostClause::HasAllTags(tags)] => {
                    prop_assert!(tags.windows(2).all(|w| w[0] < w[1]));
                }
                other => prop_assert!(false, "unexpected clauses {:?}", other),
            }
        }
    }
}
