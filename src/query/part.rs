use std::fmt;

use crate::error::{QueryError, Result};
use crate::query::property_path::{DomainContext, PropertyPath};
use crate::types::TypeRef;

/// Comparison operator of a [`Part`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PartKind {
    /// `Between`, two arguments.
    Between,
    /// `IsNotNull`.
    IsNotNull,
    /// `IsNull`.
    IsNull,
    /// `LessThan`.
    LessThan,
    /// `LessThanEqual`.
    LessThanEqual,
    /// `GreaterThan`.
    GreaterThan,
    /// `GreaterThanEqual`.
    GreaterThanEqual,
    /// `Before`.
    Before,
    /// `After`.
    After,
    /// `NotLike`.
    NotLike,
    /// `Like`.
    Like,
    /// `StartingWith`.
    StartingWith,
    /// `EndingWith`.
    EndingWith,
    /// `IsNotEmpty`.
    IsNotEmpty,
    /// `IsEmpty`.
    IsEmpty,
    /// `NotContaining`.
    NotContaining,
    /// `Containing`.
    Containing,
    /// `NotIn`.
    NotIn,
    /// `In`.
    In,
    /// `Near`.
    Near,
    /// `Within`.
    Within,
    /// `Regex`.
    Regex,
    /// `Exists`.
    Exists,
    /// `True`.
    True,
    /// `False`.
    False,
    /// `Not`: inequality.
    NegatingSimpleProperty,
    /// Plain property, equality.
    SimpleProperty,
}

impl PartKind {
    /// Every operator in declaration order.
    pub const ALL: [PartKind; 27] = [
        PartKind::Between,
        PartKind::IsNotNull,
        PartKind::IsNull,
        PartKind::LessThan,
        PartKind::LessThanEqual,
        PartKind::GreaterThan,
        PartKind::GreaterThanEqual,
        PartKind::Before,
        PartKind::After,
        PartKind::NotLike,
        PartKind::Like,
        PartKind::StartingWith,
        PartKind::EndingWith,
        PartKind::IsNotEmpty,
        PartKind::IsEmpty,
        PartKind::NotContaining,
        PartKind::Containing,
        PartKind::NotIn,
        PartKind::In,
        PartKind::Near,
        PartKind::Within,
        PartKind::Regex,
        PartKind::Exists,
        PartKind::True,
        PartKind::False,
        PartKind::NegatingSimpleProperty,
        PartKind::SimpleProperty,
    ];

    /// Method-name keywords that select this operator.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            PartKind::Between => &["IsBetween", "Between"],
            PartKind::IsNotNull => &["IsNotNull", "NotNull"],
            PartKind::IsNull => &["IsNull", "Null"],
            PartKind::LessThan => &["IsLessThan", "LessThan"],
            PartKind::LessThanEqual => &["IsLessThanEqual", "LessThanEqual"],
            PartKind::GreaterThan => &["IsGreaterThan", "GreaterThan"],
            PartKind::GreaterThanEqual => &["IsGreaterThanEqual", "GreaterThanEqual"],
            PartKind::Before => &["IsBefore", "Before"],
            PartKind::After => &["IsAfter", "After"],
            PartKind::NotLike => &["IsNotLike", "NotLike"],
            PartKind::Like => &["IsLike", "Like"],
            PartKind::StartingWith => &["IsStartingWith", "StartingWith", "StartsWith"],
            PartKind::EndingWith => &["IsEndingWith", "EndingWith", "EndsWith"],
            PartKind::IsNotEmpty => &["IsNotEmpty", "NotEmpty"],
            PartKind::IsEmpty => &["IsEmpty", "Empty"],
            PartKind::NotContaining => &["IsNotContaining", "NotContaining", "NotContains"],
            PartKind::Containing => &["IsContaining", "Containing", "Contains"],
            PartKind::NotIn => &["IsNotIn", "NotIn"],
            PartKind::In => &["IsIn", "In"],
            PartKind::Near => &["IsNear", "Near"],
            PartKind::Within => &["IsWithin", "Within"],
            PartKind::Regex => &["MatchesRegex", "Matches", "Regex"],
            PartKind::Exists => &["Exists"],
            PartKind::True => &["IsTrue", "True"],
            PartKind::False => &["IsFalse", "False"],
            PartKind::NegatingSimpleProperty => &["IsNot", "Not"],
            PartKind::SimpleProperty => &["Is", "Equals"],
        }
    }

    /// Keyword used when rendering a part back into a method name.
    pub fn canonical_keyword(self) -> &'static str {
        match self {
            PartKind::IsNotNull => "IsNotNull",
            PartKind::IsNull => "IsNull",
            PartKind::IsNotEmpty => "IsNotEmpty",
            PartKind::IsEmpty => "IsEmpty",
            PartKind::Exists => "Exists",
            PartKind::Regex => "Regex",
            PartKind::NegatingSimpleProperty => "Not",
            PartKind::SimpleProperty => "",
            other => other.keywords()[1],
        }
    }

    /// Number of bound arguments the operator consumes.
    pub fn number_of_arguments(self) -> usize {
        match self {
            PartKind::Between => 2,
            PartKind::IsNotNull
            | PartKind::IsNull
            | PartKind::IsNotEmpty
            | PartKind::IsEmpty
            | PartKind::Exists
            | PartKind::True
            | PartKind::False => 0,
            _ => 1,
        }
    }

    /// Picks the operator whose keyword is the longest suffix of `source`
    /// that still leaves a property, returning it with the property part.
    pub fn from_source(source: &str) -> (PartKind, &str) {
        let mut best: Option<(PartKind, &str)> = None;
        for kind in PartKind::ALL {
            for &keyword in kind.keywords() {
                let longer = best.map_or(true, |(_, current)| keyword.len() > current.len());
                if longer && source.len() > keyword.len() && source.ends_with(keyword) {
                    best = Some((kind, keyword));
                }
            }
        }
        match best {
            Some((kind, keyword)) => (kind, &source[..source.len() - keyword.len()]),
            None => (PartKind::SimpleProperty, source),
        }
    }

    /// Upper-case operator name.
    pub fn name(self) -> &'static str {
        match self {
            PartKind::Between => "BETWEEN",
            PartKind::IsNotNull => "IS_NOT_NULL",
            PartKind::IsNull => "IS_NULL",
            PartKind::LessThan => "LESS_THAN",
            PartKind::LessThanEqual => "LESS_THAN_EQUAL",
            PartKind::GreaterThan => "GREATER_THAN",
            PartKind::GreaterThanEqual => "GREATER_THAN_EQUAL",
            PartKind::Before => "BEFORE",
            PartKind::After => "AFTER",
            PartKind::NotLike => "NOT_LIKE",
            PartKind::Like => "LIKE",
            PartKind::StartingWith => "STARTING_WITH",
            PartKind::EndingWith => "ENDING_WITH",
            PartKind::IsNotEmpty => "IS_NOT_EMPTY",
            PartKind::IsEmpty => "IS_EMPTY",
            PartKind::NotContaining => "NOT_CONTAINING",
            PartKind::Containing => "CONTAINING",
            PartKind::NotIn => "NOT_IN",
            PartKind::In => "IN",
            PartKind::Near => "NEAR",
            PartKind::Within => "WITHIN",
            PartKind::Regex => "REGEX",
            PartKind::Exists => "EXISTS",
            PartKind::True => "TRUE",
            PartKind::False => "FALSE",
            PartKind::NegatingSimpleProperty => "NEGATING_SIMPLE_PROPERTY",
            PartKind::SimpleProperty => "SIMPLE_PROPERTY",
        }
    }
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Case sensitivity of a part.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum IgnoreCase {
    /// Case-sensitive comparison.
    #[default]
    Never,
    /// Explicit `IgnoreCase` on the part.
    Always,
    /// `AllIgnoreCase` on the method, applied where the property is a string.
    WhenPossible,
}

/// One atomic predicate: property path, operator and arity.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Part {
    property: PropertyPath,
    kind: PartKind,
    ignore_case: IgnoreCase,
}

const IGNORE_CASE_KEYWORDS: [&str; 2] = ["IgnoreCase", "IgnoringCase"];

impl Part {
    /// Parses one AND segment. `always_ignore_case` reflects a method-level
    /// `AllIgnoreCase`.
    pub fn parse(
        source: &str,
        ctx: Option<&DomainContext<'_>>,
        always_ignore_case: bool,
    ) -> Result<Self> {
        let (stripped, explicit_ignore_case) = strip_first(source, &IGNORE_CASE_KEYWORDS);
        let (kind, property_source) = PartKind::from_source(&stripped);
        let property = PropertyPath::parse(property_source, ctx)?;

        let leaf = property.leaf_type().map(TypeRef::actual_type);
        let string_like = leaf.map_or(true, |ty| *ty == TypeRef::string());
        let ignore_case = if explicit_ignore_case {
            if !string_like {
                return Err(QueryError::IgnoreCaseNotSupported {
                    property: property.dot_path(),
                    type_name: leaf.map_or_else(String::new, ToString::to_string),
                });
            }
            IgnoreCase::Always
        } else if always_ignore_case && string_like {
            IgnoreCase::WhenPossible
        } else {
            IgnoreCase::Never
        };

        Ok(Self {
            property,
            kind,
            ignore_case,
        })
    }

    /// Property the predicate applies to.
    pub fn property(&self) -> &PropertyPath {
        &self.property
    }

    /// Operator.
    pub fn kind(&self) -> PartKind {
        self.kind
    }

    /// Number of bound arguments consumed by this part.
    pub fn number_of_arguments(&self) -> usize {
        self.kind.number_of_arguments()
    }

    /// Case sensitivity.
    pub fn ignore_case(&self) -> IgnoreCase {
        self.ignore_case
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.property.method_form())?;
        f.write_str(self.kind.canonical_keyword())?;
        if self.ignore_case == IgnoreCase::Always {
            f.write_str("IgnoreCase")?;
        }
        Ok(())
    }
}

/// Removes the first occurrence of any of `keywords`, reporting whether
/// one was found.
pub(crate) fn strip_first(source: &str, keywords: &[&str]) -> (String, bool) {
    let found = keywords
        .iter()
        .filter_map(|keyword| source.find(keyword).map(|at| (at, keyword.len())))
        .min_by_key(|(at, _)| *at);
    match found {
        Some((at, len)) => {
            let mut stripped = String::with_capacity(source.len() - len);
            stripped.push_str(&source[..at]);
            stripped.push_str(&source[at + len..]);
            (stripped, true)
        }
        None => (source.to_string(), false),
    }
}
