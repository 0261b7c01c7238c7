//! Visitor contract through which a store translates a [`PartTree`] into
//! its own query representation.

use crate::domain::Sort;
use crate::error::Result;
use crate::query::part::Part;
use crate::query::tree::PartTree;
use crate::repository::{BindableValues, ParameterAccessor};

/// Store-specific translation of parts into criteria.
///
/// Parts are visited in declaration order. The first part of every
/// OR-group goes through [`create`](QueryCreator::create), the following
/// ones through [`and`](QueryCreator::and); groups are combined with
/// [`or`](QueryCreator::or). Each part consumes as many arguments from
/// `args` as its operator declares.
pub trait QueryCreator {
    /// Criteria built for a part or a combination of parts.
    type Criteria;
    /// Final query.
    type Query;

    /// Criteria for the first part of a group.
    fn create(&mut self, part: &Part, args: &mut BindableValues<'_>) -> Result<Self::Criteria>;

    /// Combines `base` with `part` using AND.
    fn and(
        &mut self,
        part: &Part,
        base: Self::Criteria,
        args: &mut BindableValues<'_>,
    ) -> Result<Self::Criteria>;

    /// Combines two groups using OR.
    fn or(&mut self, left: Self::Criteria, right: Self::Criteria) -> Result<Self::Criteria>;

    /// Finishes the query. `criteria` is `None` for an empty predicate.
    fn complete(&mut self, criteria: Option<Self::Criteria>, sort: &Sort) -> Result<Self::Query>;
}

impl PartTree {
    /// Drives `creator` over the tree, feeding bindable arguments from
    /// `accessor`. The static `OrderBy` sort is followed by the dynamic one.
    pub fn accept<C: QueryCreator>(
        &self,
        creator: &mut C,
        accessor: &ParameterAccessor<'_>,
    ) -> Result<C::Query> {
        let mut args = accessor.bindable_values();
        let mut criteria: Option<C::Criteria> = None;
        for group in self {
            let mut parts = group.iter();
            let Some(first) = parts.next() else {
                continue;
            };
            let mut base = creator.create(first, &mut args)?;
            for part in parts {
                base = creator.and(part, base, &mut args)?;
            }
            criteria = Some(match criteria {
                Some(left) => creator.or(left, base)?,
                None => base,
            });
        }
        let sort = self.sort().clone().and(&accessor.sort());
        creator.complete(criteria, &sort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Order, Sort};
    use crate::repository::{MethodSignature, ParameterDecl, Parameters};
    use crate::types::{SpecialType, TypeRef, TypeRegistry};
    use crate::value::Value;

    /// Renders criteria as text, pulling one argument per declared slot.
    struct TextCreator;

    impl TextCreator {
        fn predicate(part: &Part, args: &mut BindableValues<'_>) -> String {
            let bound: Vec<String> = args
                .take(part.number_of_arguments())
                .map(|v| format!("{v:?}"))
                .collect();
            format!("{} {} [{}]", part.property(), part.kind(), bound.join(", "))
        }
    }

    impl QueryCreator for TextCreator {
        type Criteria = String;
        type Query = String;

        fn create(&mut self, part: &Part, args: &mut BindableValues<'_>) -> Result<String> {
            Ok(Self::predicate(part, args))
        }

        fn and(&mut self, part: &Part, base: String, args: &mut BindableValues<'_>) -> Result<String> {
            Ok(format!("({base} AND {})", Self::predicate(part, args)))
        }

        fn or(&mut self, left: String, right: String) -> Result<String> {
            Ok(format!("({left} OR {right})"))
        }

        fn complete(&mut self, criteria: Option<String>, sort: &Sort) -> Result<String> {
            Ok(format!("{} ORDER {}", criteria.unwrap_or_default(), sort))
        }
    }

    #[test]
    fn visits_groups_and_consumes_arguments_in_order() {
        let tree = PartTree::parse("findByLastnameAndAgeBetweenOrActiveTrueOrderByAgeDesc", None).unwrap();
        let method = MethodSignature::new("findByLastnameAndAgeBetweenOrActiveTrue", TypeRef::list(TypeRef::named("User")))
            .with_parameter(ParameterDecl::new(TypeRef::string()))
            .with_parameter(ParameterDecl::new(TypeRef::named("int")))
            .with_parameter(ParameterDecl::new(TypeRef::Special(SpecialType::Sort)))
            .with_parameter(ParameterDecl::new(TypeRef::named("int")));
        let parameters = Parameters::from_method(&method, "User", &TypeRegistry::new()).unwrap();
        let values = [
            Value::from("Matthews"),
            Value::Int(18),
            Value::from(Sort::by([Order::asc("lastname")])),
            Value::Int(65),
        ];
        let accessor = ParameterAccessor::new(&parameters, &values).unwrap();
        let query = tree.accept(&mut TextCreator, &accessor).unwrap();
        assert_eq!(
            query,
            "((lastname SIMPLE_PROPERTY [String(\"Matthews\")] AND age BETWEEN [Int(18), Int(65)]) \
             OR active TRUE []) ORDER age: DESC, lastname: ASC"
        );
    }
}
