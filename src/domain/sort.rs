use std::fmt;

/// Sort direction.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Direction {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl Direction {
    /// Keyword used in method names.
    pub fn keyword(self) -> &'static str {
        match self {
            Direction::Asc => "Asc",
            Direction::Desc => "Desc",
        }
    }

    /// Whether this is [`Direction::Asc`].
    pub fn is_ascending(self) -> bool {
        self == Direction::Asc
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => f.write_str("ASC"),
            Direction::Desc => f.write_str("DESC"),
        }
    }
}

/// Placement of `null` values in an ordering.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum NullHandling {
    /// Store default.
    #[default]
    Native,
    /// Nulls before non-null values.
    NullsFirst,
    /// Nulls after non-null values.
    NullsLast,
}

/// A single ordering instruction.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Order {
    property: String,
    direction: Direction,
    ignore_case: bool,
    null_handling: NullHandling,
}

impl Order {
    /// Creates an order for `property` in `direction`.
    pub fn new(direction: Direction, property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction,
            ignore_case: false,
            null_handling: NullHandling::Native,
        }
    }

    /// Ascending order.
    pub fn asc(property: impl Into<String>) -> Self {
        Self::new(Direction::Asc, property)
    }

    /// Descending order.
    pub fn desc(property: impl Into<String>) -> Self {
        Self::new(Direction::Desc, property)
    }

    /// Case-insensitive variant of this order.
    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    /// Applies a null handling hint.
    pub fn with_null_handling(mut self, null_handling: NullHandling) -> Self {
        self.null_handling = null_handling;
        self
    }

    /// Property dot path.
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether comparison ignores case.
    pub fn is_ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Null handling hint.
    pub fn null_handling(&self) -> NullHandling {
        self.null_handling
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property, self.direction)?;
        if self.ignore_case {
            f.write_str(" (ignoring case)")?;
        }
        Ok(())
    }
}

/// Ordered list of orders. Empty means unsorted.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    /// The empty sort.
    pub fn unsorted() -> Self {
        Self::default()
    }

    /// Sort from explicit orders.
    pub fn by<I: IntoIterator<Item = Order>>(orders: I) -> Self {
        Self {
            orders: orders.into_iter().collect(),
        }
    }

    /// Whether any order is present.
    pub fn is_sorted(&self) -> bool {
        !self.orders.is_empty()
    }

    /// Whether no order is present.
    pub fn is_unsorted(&self) -> bool {
        self.orders.is_empty()
    }

    /// Appends the orders of `other`.
    pub fn and(mut self, other: &Sort) -> Self {
        self.orders.extend(other.orders.iter().cloned());
        self
    }

    /// Order for `property`, if present.
    pub fn order_for(&self, property: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.property == property)
    }

    /// Orders in precedence order.
    pub fn iter(&self) -> std::slice::Iter<'_, Order> {
        self.orders.iter()
    }

    /// Number of orders.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Alias of [`Sort::is_unsorted`].
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

impl<'a> IntoIterator for &'a Sort {
    type Item = &'a Order;
    type IntoIter = std::slice::Iter<'a, Order>;

    fn into_iter(self) -> Self::IntoIter {
        self.orders.iter()
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.orders.is_empty() {
            return f.write_str("UNSORTED");
        }
        for (idx, order) in self.orders.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{order}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_appends_in_order() {
        let sort = Sort::by([Order::desc("age")]).and(&Sort::by([Order::asc("lastname")]));
        assert_eq!(sort.to_string(), "age: DESC, lastname: ASC");
        assert_eq!(sort.order_for("lastname").unwrap().direction(), Direction::Asc);
        assert_eq!(Sort::unsorted().to_string(), "UNSORTED");
    }
}
