//! `OrderBy` clause parsing.

use crate::domain::{Direction, Order, Sort};
use crate::error::{QueryError, Result};
use crate::query::property_path::{DomainContext, PropertyPath};

const DIRECTIONS: [(&str, Direction); 2] = [("Desc", Direction::Desc), ("Asc", Direction::Asc)];

/// Parses the text following `OrderBy` into a [`Sort`].
///
/// Elements are separated after a direction keyword that is followed by an
/// upper-case character, e.g. `AgeDescLastnameAsc`. An element without a
/// direction sorts ascending; a direction without a property is rejected.
pub fn parse_order_by(clause: &str, ctx: Option<&DomainContext<'_>>) -> Result<Sort> {
    let mut orders = Vec::new();
    for element in split_elements(clause) {
        let (property, direction) = split_direction(element);
        if property.is_empty() {
            return Err(QueryError::InvalidOrderSyntax {
                token: element.to_string(),
            });
        }
        let path = PropertyPath::parse(property, ctx)?;
        orders.push(Order::new(direction.unwrap_or_default(), path.dot_path()));
    }
    Ok(Sort::by(orders))
}

fn split_elements(clause: &str) -> Vec<&str> {
    let mut elements = Vec::new();
    let mut start = 0;
    for (idx, c) in clause.char_indices() {
        if idx > start && c.is_uppercase() {
            let head = &clause[start..idx];
            if DIRECTIONS.iter().any(|(keyword, _)| head.ends_with(keyword)) {
                elements.push(head);
                start = idx;
            }
        }
    }
    elements.push(&clause[start..]);
    elements
}

fn split_direction(element: &str) -> (&str, Option<Direction>) {
    DIRECTIONS
        .iter()
        .find_map(|(keyword, direction)| {
            element
                .strip_suffix(keyword)
                .map(|property| (property, Some(*direction)))
        })
        .unwrap_or((element, None))
}
