use std::ops::Range;

use crate::error::{QueryError, Result};

/// Quoted regions of a query string.
///
/// A region opens at `'` or `"` and closes at the next occurrence of the
/// same character; the other quote character is literal inside it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuotationMap {
    ranges: Vec<Range<usize>>,
}

impl QuotationMap {
    /// Scans `query` for quoted regions. Byte offsets are inclusive of
    /// both quote characters.
    pub fn scan(query: &str) -> Result<Self> {
        let mut ranges = Vec::new();
        let mut open: Option<(char, usize)> = None;
        for (index, ch) in query.char_indices() {
            if ch != '\'' && ch != '"' {
                continue;
            }
            match open {
                None => open = Some((ch, index)),
                Some((quote, start)) if quote == ch => {
                    ranges.push(start..index + 1);
                    open = None;
                }
                Some(_) => {}
            }
        }
        if let Some((_, position)) = open {
            return Err(QueryError::UnbalancedQuotes {
                query: query.to_string(),
                position,
            });
        }
        Ok(Self { ranges })
    }

    /// Whether the byte at `index` lies inside a quoted region.
    pub fn is_quoted(&self, index: usize) -> bool {
        self.ranges.iter().any(|range| range.contains(&index))
    }

    /// Quoted regions in order of appearance.
    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_single_and_double_quotes() {
        let map = QuotationMap::scan(r#"a = 'x' and b = "it's""#).unwrap();
        assert_eq!(map.ranges(), &[4..7, 16..22]);
        assert!(map.is_quoted(5));
        assert!(map.is_quoted(19));
        assert!(!map.is_quoted(8));
    }

    #[test]
    fn unterminated_quote_names_position() {
        let err = QuotationMap::scan("where a = 'b' and c = 'd").unwrap_err();
        assert!(matches!(err, QueryError::UnbalancedQuotes { position: 22, .. }));
        assert!(err.to_string().contains("at 22"));
    }

    #[test]
    fn unquoted_query_has_no_ranges() {
        let map = QuotationMap::scan("select u from User u").unwrap();
        assert!(map.ranges().is_empty());
        assert!(!map.is_quoted(0));
    }
}
