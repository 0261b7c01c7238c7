use proptest::prelude::*;
use quarry::{
    expression::ExpressionQueryContext,
    geo::Point,
    query::{PartKind, PartTree},
    repository::{MethodSignature, ParameterDecl, ParameterRole, Parameters},
    types::{SpecialType, TypeRef, TypeRegistry},
};

const PROPERTIES: [&str; 5] = ["Lastname", "Firstname", "Age", "Active", "Birthday"];

const KINDS: [PartKind; 11] = [
    PartKind::SimpleProperty,
    PartKind::GreaterThan,
    PartKind::LessThanEqual,
    PartKind::Between,
    PartKind::IsNull,
    PartKind::Like,
    PartKind::In,
    PartKind::NotIn,
    PartKind::StartingWith,
    PartKind::Containing,
    PartKind::True,
];

#[derive(Debug, Clone)]
enum Param {
    Value,
    Special(SpecialType),
}

fn arb_part() -> impl Strategy<Value = (usize, PartKind)> {
    (0..PROPERTIES.len(), prop::sample::select(KINDS.to_vec()))
}

fn arb_tree() -> impl Strategy<Value = Vec<Vec<(usize, PartKind)>>> {
    prop::collection::vec(prop::collection::vec(arb_part(), 1..=3), 1..=3)
}

fn arb_param() -> impl Strategy<Value = Param> {
    prop_oneof![
        3 => Just(Param::Value),
        1 => prop::sample::select(vec![
            SpecialType::Pageable,
            SpecialType::Sort,
            SpecialType::Limit,
            SpecialType::ScrollPosition,
            SpecialType::Vector,
            SpecialType::Score,
            SpecialType::ScoreRange,
        ])
        .prop_map(Param::Special),
    ]
}

fn method_name(groups: &[Vec<(usize, PartKind)>], order: Option<(usize, bool)>) -> String {
    let predicate = groups
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|(property, kind)| format!("{}{}", PROPERTIES[*property], kind.canonical_keyword()))
                .collect::<Vec<_>>()
                .join("And")
        })
        .collect::<Vec<_>>()
        .join("Or");
    let mut name = format!("findBy{predicate}");
    if let Some((property, descending)) = order {
        let direction = if descending { "Desc" } else { "Asc" };
        name.push_str(&format!("OrderBy{}{direction}", PROPERTIES[property]));
    }
    name
}

fn shape(tree: &PartTree) -> Vec<Vec<(String, PartKind)>> {
    tree.iter()
        .map(|group| {
            group
                .iter()
                .map(|part| (part.property().dot_path(), part.kind()))
                .collect()
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_part_tree_survives_descriptive_round_trip(
        groups in arb_tree(),
        order in prop::option::of((0..PROPERTIES.len(), any::<bool>())),
    ) {
        let name = method_name(&groups, order);
        let tree = PartTree::parse(&name, None).unwrap();

        prop_assert_eq!(tree.or_parts().len(), groups.len());
        for (parsed, expected) in tree.iter().zip(&groups) {
            prop_assert_eq!(parsed.len(), expected.len());
            for (part, (_, kind)) in parsed.iter().zip(expected) {
                prop_assert_eq!(part.kind(), *kind);
            }
        }

        let reparsed = PartTree::parse(&tree.to_string(), None).unwrap();
        prop_assert_eq!(shape(&reparsed), shape(&tree));
        prop_assert_eq!(reparsed.sort(), tree.sort());
    }

    #[test]
    fn prop_limit_keyword_needs_a_word_boundary(
        keyword in prop::sample::select(vec!["First", "Top"]),
        suffix in "[a-z]{1,6}",
        limit in prop::option::of(1usize..50),
    ) {
        let word = format!("{keyword}{suffix}");
        let tree = PartTree::parse(&format!("find{word}ByLastname"), None).unwrap();
        prop_assert_eq!(tree.max_results(), None);

        let digits = limit.map(|n| n.to_string()).unwrap_or_default();
        let tree = PartTree::parse(&format!("find{keyword}{digits}UsersByLastname"), None).unwrap();
        prop_assert_eq!(tree.max_results(), Some(limit.unwrap_or(1)));
    }

    #[test]
    fn prop_special_roles_are_exclusive(params in prop::collection::vec(arb_param(), 0..8)) {
        let mut method = MethodSignature::new("findAll", TypeRef::list(TypeRef::named("User")));
        for param in &params {
            let ty = match param {
                Param::Value => TypeRef::string(),
                Param::Special(special) => TypeRef::Special(*special),
            };
            method = method.with_parameter(ParameterDecl::new(ty));
        }
        let specials: Vec<SpecialType> = params
            .iter()
            .filter_map(|param| match param {
                Param::Special(special) => Some(*special),
                Param::Value => None,
            })
            .collect();
        let duplicated = specials
            .iter()
            .enumerate()
            .any(|(i, special)| specials[..i].contains(special));

        match Parameters::from_method(&method, "User", &TypeRegistry::new()) {
            Ok(parameters) => {
                prop_assert!(!duplicated);
                let roles: Vec<ParameterRole> = parameters
                    .iter()
                    .map(|parameter| parameter.role())
                    .filter(|role| role.is_special())
                    .collect();
                for (i, role) in roles.iter().enumerate() {
                    prop_assert!(!roles[..i].contains(role));
                }
            }
            Err(err) => {
                prop_assert!(duplicated);
                prop_assert_eq!(err.code(), "DuplicateSpecialParameter");
            }
        }
    }

    #[test]
    fn prop_bindable_parameters_keep_declaration_order(
        params in prop::collection::vec(arb_param(), 0..8),
    ) {
        let mut method = MethodSignature::new("findAll", TypeRef::list(TypeRef::named("User")));
        let mut seen = Vec::new();
        for param in &params {
            let ty = match param {
                Param::Special(special) if !seen.contains(special) => {
                    seen.push(*special);
                    TypeRef::Special(*special)
                }
                _ => TypeRef::string(),
            };
            method = method.with_parameter(ParameterDecl::new(ty));
        }
        let parameters = Parameters::from_method(&method, "User", &TypeRegistry::new()).unwrap();
        let expected: Vec<usize> = parameters
            .iter()
            .filter(|parameter| parameter.is_bindable())
            .map(|parameter| parameter.index())
            .collect();

        prop_assert_eq!(parameters.number_of_bindable(), expected.len());
        for (i, index) in expected.iter().enumerate() {
            prop_assert_eq!(parameters.bindable_parameter(i).unwrap().index(), *index);
        }
        prop_assert!(parameters.bindable_parameter(expected.len()).is_err());
    }

    #[test]
    fn prop_quoted_markers_are_never_extracted(
        segments in prop::collection::vec(("[a-z ]{0,6}", any::<bool>()), 1..6),
    ) {
        let mut query = String::from("select u from User u where");
        let mut unquoted = 0;
        for (i, (text, quoted)) in segments.iter().enumerate() {
            let marker = format!(":#{{#p{i}}}");
            if *quoted {
                query.push_str(&format!(" {text}'{marker}'"));
            } else {
                query.push_str(&format!(" {text}{marker}"));
                unquoted += 1;
            }
        }

        let parsed = ExpressionQueryContext::default().parse(&query).unwrap();
        prop_assert_eq!(parsed.len(), unquoted);
        let expressions: Vec<String> = parsed.expressions().map(|(_, e)| e.to_string()).collect();
        let expected: Vec<String> = segments
            .iter()
            .enumerate()
            .filter(|(_, (_, quoted))| !quoted)
            .map(|(i, _)| format!("#p{i}"))
            .collect();
        prop_assert_eq!(expressions, expected);
        for (i, (_, quoted)) in segments.iter().enumerate() {
            let marker = format!(":#{{#p{i}}}");
            prop_assert_eq!(parsed.query().contains(&marker), *quoted);
        }
    }

    #[test]
    fn prop_point_json_round_trip(x in -4_000_000i32..4_000_000, y in -4_000_000i32..4_000_000) {
        let point = Point::new(f64::from(x) / 4.0, f64::from(y) / 4.0);
        let json = serde_json::to_string(&point).unwrap();
        let decoded: Point = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(decoded, point);
        prop_assert_eq!(serde_json::to_string(&decoded).unwrap(), json);
    }
}
