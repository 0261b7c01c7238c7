use std::fmt;

use tracing::debug;

use crate::domain::Sort;
use crate::error::{QueryError, Result};
use crate::query::order_by::parse_order_by;
use crate::query::part::{strip_first, Part};
use crate::query::property_path::{method_form, DomainContext};

const SUBJECT_VERBS: [&str; 10] = [
    "find", "read", "get", "query", "search", "stream", "count", "exists", "delete", "remove",
];
const ALL_IGNORE_CASE_KEYWORDS: [&str; 2] = ["AllIgnoreCase", "AllIgnoringCase"];
const ORDER_BY: &str = "OrderBy";

/// What the query returns, derived from the method-name prefix.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Subject {
    verb: Option<String>,
    distinct: bool,
    max_results: Option<usize>,
}

impl Subject {
    fn parse(verb: &str, body: &str) -> Self {
        Self {
            verb: Some(verb.to_string()),
            distinct: body.contains("Distinct"),
            max_results: parse_limit(body),
        }
    }

    /// Prefix verb (`find`, `count`, ...), if the name carried one.
    pub fn verb(&self) -> Option<&str> {
        self.verb.as_deref()
    }

    /// `Distinct` was requested.
    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Count projection (`countBy`).
    pub fn is_count_projection(&self) -> bool {
        self.verb.as_deref() == Some("count")
    }

    /// Exists projection (`existsBy`).
    pub fn is_exists_projection(&self) -> bool {
        self.verb.as_deref() == Some("exists")
    }

    /// Delete query (`deleteBy`, `removeBy`).
    pub fn is_delete(&self) -> bool {
        matches!(self.verb.as_deref(), Some("delete" | "remove"))
    }

    /// Result limit from `First`/`Top`.
    pub fn max_results(&self) -> Option<usize> {
        self.max_results
    }

    /// Whether a `First`/`Top` limit applies.
    pub fn is_limiting(&self) -> bool {
        self.max_results.is_some()
    }
}

/// `First`/`Top` limit directly after the verb or `Distinct`, followed by
/// optional digits and a camel-case boundary.
fn parse_limit(body: &str) -> Option<usize> {
    let body = body.strip_prefix("Distinct").unwrap_or(body);
    let rest = ["First", "Top"]
        .iter()
        .find_map(|keyword| body.strip_prefix(keyword))?;
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let (digits, tail) = rest.split_at(digits_end);
    if tail.chars().next().is_some_and(|c| !c.is_uppercase()) {
        return None;
    }
    Some(digits.parse().unwrap_or(1))
}

/// AND-joined parts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrPart {
    parts: Vec<Part>,
}

impl OrPart {
    fn parse(source: &str, ctx: Option<&DomainContext<'_>>, all_ignore_case: bool) -> Result<Self> {
        let parts = split_keyword(source, "And")
            .into_iter()
            .filter(|segment| !segment.is_empty())
            .map(|segment| Part::parse(segment, ctx, all_ignore_case))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { parts })
    }

    /// Parts in declaration order.
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Iterates the parts.
    pub fn iter(&self) -> std::slice::Iter<'_, Part> {
        self.parts.iter()
    }

    /// Number of parts.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the group holds no parts.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl<'a> IntoIterator for &'a OrPart {
    type Item = &'a Part;
    type IntoIter = std::slice::Iter<'a, Part>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.iter()
    }
}

/// Parsed method name: subject, OR-of-AND predicate and static sort.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PartTree {
    subject: Subject,
    nodes: Vec<OrPart>,
    sort: Sort,
    all_ignore_case: bool,
}

impl PartTree {
    /// Parses a method name. Property paths are resolved against the
    /// domain type in `ctx`; without one, raw tokens are used.
    pub fn parse(source: &str, ctx: Option<&DomainContext<'_>>) -> Result<Self> {
        let (subject, predicate) = split_subject(source);
        let (predicate, all_ignore_case) = strip_first(predicate, &ALL_IGNORE_CASE_KEYWORDS);

        let clauses = split_keyword(&predicate, ORDER_BY);
        if clauses.len() > 2 {
            return Err(QueryError::DuplicateOrderBy {
                method: source.to_string(),
            });
        }
        let sort = match clauses.get(1) {
            Some(clause) => parse_order_by(clause, ctx)?,
            None => Sort::unsorted(),
        };
        let nodes = split_keyword(clauses[0], "Or")
            .into_iter()
            .filter(|segment| !segment.is_empty())
            .map(|segment| OrPart::parse(segment, ctx, all_ignore_case))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            method = source,
            domain = ctx.map(|c| c.domain),
            groups = nodes.len(),
            orders = sort.len(),
            "query.part_tree.parsed"
        );
        Ok(Self {
            subject,
            nodes,
            sort,
            all_ignore_case,
        })
    }

    /// Subject clause.
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    /// OR-groups in declaration order.
    pub fn or_parts(&self) -> &[OrPart] {
        &self.nodes
    }

    /// Iterates the OR-groups.
    pub fn iter(&self) -> std::slice::Iter<'_, OrPart> {
        self.nodes.iter()
    }

    /// All parts, flattened in declaration order.
    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.nodes.iter().flat_map(OrPart::iter)
    }

    /// Static sort from the `OrderBy` clause.
    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    /// Whether `AllIgnoreCase` was present.
    pub fn is_all_ignore_case(&self) -> bool {
        self.all_ignore_case
    }

    /// Shorthand for [`Subject::is_distinct`].
    pub fn is_distinct(&self) -> bool {
        self.subject.is_distinct()
    }

    /// Shorthand for [`Subject::is_count_projection`].
    pub fn is_count_projection(&self) -> bool {
        self.subject.is_count_projection()
    }

    /// Shorthand for [`Subject::is_exists_projection`].
    pub fn is_exists_projection(&self) -> bool {
        self.subject.is_exists_projection()
    }

    /// Shorthand for [`Subject::is_delete`].
    pub fn is_delete(&self) -> bool {
        self.subject.is_delete()
    }

    /// Shorthand for [`Subject::max_results`].
    pub fn max_results(&self) -> Option<usize> {
        self.subject.max_results()
    }

    /// Total number of bound arguments the predicate consumes.
    pub fn number_of_arguments(&self) -> usize {
        self.parts().map(Part::number_of_arguments).sum()
    }
}

impl<'a> IntoIterator for &'a PartTree {
    type Item = &'a OrPart;
    type IntoIter = std::slice::Iter<'a, OrPart>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl fmt::Display for PartTree {
    /// Canonical method name that re-parses to an equivalent tree.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(verb) = self.subject.verb() {
            f.write_str(verb)?;
            if self.subject.is_distinct() {
                f.write_str("Distinct")?;
            }
            if let Some(max) = self.subject.max_results() {
                write!(f, "Top{max}")?;
            }
            f.write_str("By")?;
        }
        for (group_idx, group) in self.nodes.iter().enumerate() {
            if group_idx > 0 {
                f.write_str("Or")?;
            }
            for (part_idx, part) in group.iter().enumerate() {
                if part_idx > 0 {
                    f.write_str("And")?;
                }
                write!(f, "{part}")?;
            }
        }
        if self.all_ignore_case {
            f.write_str("AllIgnoreCase")?;
        }
        if self.sort.is_sorted() {
            f.write_str(ORDER_BY)?;
            for order in &self.sort {
                f.write_str(&method_form(order.property()))?;
                f.write_str(order.direction().keyword())?;
            }
        }
        Ok(())
    }
}

fn split_subject(source: &str) -> (Subject, &str) {
    for verb in SUBJECT_VERBS {
        let Some(rest) = source.strip_prefix(verb) else {
            continue;
        };
        let by = if rest.starts_with("By") {
            Some(0)
        } else {
            match rest.chars().next() {
                Some(first) if first.is_uppercase() => {
                    let skip = first.len_utf8();
                    rest[skip..].find("By").map(|at| at + skip)
                }
                _ => None,
            }
        };
        if let Some(at) = by {
            return (Subject::parse(verb, &rest[..at]), &rest[at + 2..]);
        }
    }
    (Subject::default(), source)
}

/// Splits `text` on `keyword` wherever the keyword is followed by an
/// upper-case or non-ASCII character.
pub(crate) fn split_keyword<'a>(text: &'a str, keyword: &str) -> Vec<&'a str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut search = 0;
    while let Some(found) = text[search..].find(keyword) {
        let at = search + found;
        let after = at + keyword.len();
        let boundary = text[after..]
            .chars()
            .next()
            .is_some_and(|c| c.is_uppercase() || !c.is_ascii());
        if boundary {
            segments.push(&text[start..at]);
            start = after;
            search = after;
        } else {
            search = at + 1;
        }
    }
    segments.push(&text[start..]);
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::part::PartKind;
    use crate::types::{TypeDescriptor, TypeRef, TypeRegistry};

    fn user_types() -> TypeRegistry {
        TypeRegistry::new().with_type(
            TypeDescriptor::class("User")
                .with_property("lastname", TypeRef::string())
                .with_property("firstname", TypeRef::string())
                .with_property("age", TypeRef::named("int"))
                .with_property("orderNumber", TypeRef::named("long")),
        )
    }

    #[test]
    fn splits_or_then_and() {
        let tree = PartTree::parse("findByLastnameAndAgeOrFirstname", None).unwrap();
        assert_eq!(tree.or_parts().len(), 2);
        assert_eq!(tree.or_parts()[0].len(), 2);
        assert_eq!(tree.or_parts()[1].parts()[0].property().dot_path(), "firstname");
    }

    #[test]
    fn keywords_inside_words_do_not_split() {
        let types = user_types();
        let ctx = DomainContext::new("User", &types);
        let tree = PartTree::parse("findByOrderNumber", Some(&ctx)).unwrap();
        assert_eq!(tree.parts().count(), 1);
        assert!(tree.sort().is_unsorted());
        assert_eq!(split_keyword("BrandOrColor", "Or"), ["Brand", "Color"]);
        assert_eq!(split_keyword("Ordinal", "Or"), ["Ordinal"]);
    }

    #[test]
    fn subject_detects_distinct_limits_and_projections() {
        let tree = PartTree::parse("findDistinctTop10ByLastname", None).unwrap();
        assert!(tree.is_distinct());
        assert_eq!(tree.max_results(), Some(10));

        let tree = PartTree::parse("findFirstByLastname", None).unwrap();
        assert_eq!(tree.max_results(), Some(1));

        assert!(PartTree::parse("countByLastname", None).unwrap().is_count_projection());
        assert!(PartTree::parse("existsByLastname", None).unwrap().is_exists_projection());
        assert!(PartTree::parse("removeByLastname", None).unwrap().is_delete());
    }

    #[test]
    fn limit_keywords_inside_subject_words_are_ignored() {
        for name in ["findTopicsByLastname", "findFirstnamesByLastname", "findDistinctTopsByLastname"] {
            let tree = PartTree::parse(name, None).unwrap();
            assert_eq!(tree.max_results(), None, "{name}");
        }
        let tree = PartTree::parse("findTop3UsersByLastname", None).unwrap();
        assert_eq!(tree.max_results(), Some(3));
        let tree = PartTree::parse("findFirstUserByLastname", None).unwrap();
        assert_eq!(tree.max_results(), Some(1));
    }

    #[test]
    fn find_all_with_order_by_has_empty_predicate() {
        let tree = PartTree::parse("findAllByOrderByLastnameDesc", None).unwrap();
        assert_eq!(tree.or_parts().len(), 0);
        assert_eq!(tree.sort().to_string(), "lastname: DESC");
    }

    #[test]
    fn duplicate_order_by_is_rejected() {
        let err = PartTree::parse("findByLastnameOrderByAgeOrderByFirstname", None).unwrap_err();
        assert!(matches!(err, QueryError::DuplicateOrderBy { .. }));
    }

    #[test]
    fn all_ignore_case_applies_to_string_parts() {
        let types = user_types();
        let ctx = DomainContext::new("User", &types);
        let tree = PartTree::parse("findByLastnameAndAgeAllIgnoreCase", Some(&ctx)).unwrap();
        let parts: Vec<_> = tree.parts().collect();
        assert_eq!(parts[0].ignore_case(), crate::query::IgnoreCase::WhenPossible);
        assert_eq!(parts[1].ignore_case(), crate::query::IgnoreCase::Never);
    }

    #[test]
    fn display_reparses_to_same_tree() {
        let types = user_types();
        let ctx = DomainContext::new("User", &types);
        let tree = PartTree::parse(
            "readDistinctFirst3ByLastnameIgnoreCaseAndAgeBetweenOrFirstnameNotNullOrderByAgeDesc",
            Some(&ctx),
        )
        .unwrap();
        let rendered = tree.to_string();
        assert_eq!(
            rendered,
            "readDistinctTop3ByLastnameIgnoreCaseAndAgeBetweenOrFirstnameIsNotNullOrderByAgeDesc"
        );
        let reparsed = PartTree::parse(&rendered, Some(&ctx)).unwrap();
        assert_eq!(reparsed, tree);
        assert_eq!(reparsed.parts().nth(1).unwrap().kind(), PartKind::Between);
        assert_eq!(reparsed.number_of_arguments(), 3);
    }
}
