#![allow(missing_docs)]

use std::sync::Arc;

use quarry::{
    domain::{Direction, Order, Pageable, Sort},
    query::{DomainContext, PartKind, PartTree},
    repository::{MethodSignature, ParameterAccessor, ParameterDecl, QueryMethod, RepositoryMetadata},
    result::ProjectionFactory,
    types::{SpecialType, TypeDescriptor, TypeIntrospector, TypeRef, TypeRegistry, WrapperKind},
    QueryError, Value,
};

fn user_types() -> Arc<dyn TypeIntrospector> {
    Arc::new(
        TypeRegistry::new()
            .with_type(
                TypeDescriptor::class("User")
                    .with_property("lastname", TypeRef::string())
                    .with_property("firstname", TypeRef::string())
                    .with_property("age", TypeRef::named("int"))
                    .with_property("address", TypeRef::named("Address")),
            )
            .with_type(
                TypeDescriptor::class("Address")
                    .with_property("zipCode", TypeRef::string())
                    .with_property("city", TypeRef::string()),
            ),
    )
}

fn register(signature: MethodSignature) -> Result<QueryMethod, QueryError> {
    let factory = Arc::new(ProjectionFactory::new(user_types()));
    QueryMethod::new(signature, RepositoryMetadata::new("UserRepository", "User"), factory)
}

#[test]
fn and_parts_resolve_against_the_domain_type() {
    let types = user_types();
    let ctx = DomainContext::new("User", types.as_ref());
    let tree = PartTree::parse("findByLastnameAndAgeGreaterThan", Some(&ctx)).unwrap();

    assert_eq!(tree.or_parts().len(), 1);
    let parts = tree.or_parts()[0].parts();
    assert_eq!(parts.len(), 2);

    assert_eq!(parts[0].property().dot_path(), "lastname");
    assert_eq!(parts[0].kind(), PartKind::SimpleProperty);
    assert_eq!(parts[0].number_of_arguments(), 1);

    assert_eq!(parts[1].property().dot_path(), "age");
    assert_eq!(parts[1].kind(), PartKind::GreaterThan);
    assert_eq!(parts[1].number_of_arguments(), 1);
    assert_eq!(tree.number_of_arguments(), 2);
    assert!(tree.sort().is_unsorted());
}

#[test]
fn order_by_clause_yields_static_sort() {
    let tree = PartTree::parse("findByLastnameOrderByAgeDescLastnameAsc", None).unwrap();
    let parts: Vec<_> = tree.parts().collect();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].property().dot_path(), "lastname");
    assert_eq!(parts[0].kind(), PartKind::SimpleProperty);

    let orders: Vec<_> = tree
        .sort()
        .iter()
        .map(|order| (order.property().to_string(), order.direction()))
        .collect();
    assert_eq!(
        orders,
        [
            ("age".to_string(), Direction::Desc),
            ("lastname".to_string(), Direction::Asc)
        ]
    );
}

#[test]
fn nested_paths_resolve_through_camel_case() {
    let types = user_types();
    let ctx = DomainContext::new("User", types.as_ref());
    let tree = PartTree::parse("findByAddressZipCodeStartingWithOrderByAddressCityAsc", Some(&ctx)).unwrap();
    let part = tree.parts().next().unwrap();
    assert_eq!(part.property().dot_path(), "address.zipCode");
    assert_eq!(part.kind(), PartKind::StartingWith);
    assert_eq!(tree.sort().to_string(), "address.city: ASC");

    let err = PartTree::parse("findByAddressStreet", Some(&ctx)).unwrap_err();
    assert_eq!(err.code(), "PropertyNotFound");
    assert!(matches!(err, QueryError::PropertyNotFound { ref segment, .. } if segment == "street"));
}

#[test]
fn pageable_and_sort_together_fail_registration() {
    let signature = MethodSignature::new("findByLastname", TypeRef::page(TypeRef::named("User")))
        .with_parameter(ParameterDecl::new(TypeRef::string()).named("lastname"))
        .with_parameter(ParameterDecl::new(TypeRef::Special(SpecialType::Pageable)))
        .with_parameter(ParameterDecl::new(TypeRef::Special(SpecialType::Sort)));

    let err = register(signature).unwrap_err();
    assert!(err.is_bootstrap());
    assert_eq!(err.code(), "PageableAndSort");
    let message = err.to_string();
    assert!(message.contains("findByLastname"), "{message}");
    assert!(message.contains("Pageable"), "{message}");
    assert!(message.contains("Sort"), "{message}");
}

#[test]
fn duplicate_special_parameters_fail_registration() {
    let signature = MethodSignature::new("findAll", TypeRef::page(TypeRef::named("User")))
        .with_parameter(ParameterDecl::new(TypeRef::Special(SpecialType::Pageable)))
        .with_parameter(ParameterDecl::new(TypeRef::Special(SpecialType::Pageable)));
    let err = register(signature).unwrap_err();
    assert_eq!(err.code(), "DuplicateSpecialParameter");
}

#[test]
fn pageable_on_non_paging_return_types_fails_registration() {
    let cases = [
        ("findAllBy", TypeRef::wrap(WrapperKind::Set, TypeRef::named("User"))),
        ("findFirstBy", TypeRef::wrap(WrapperKind::Single, TypeRef::named("User"))),
        ("findFirstBy", TypeRef::named("User")),
    ];
    for (name, returns) in cases {
        let signature = MethodSignature::new(name, returns)
            .with_parameter(ParameterDecl::new(TypeRef::Special(SpecialType::Pageable)));
        let err = register(signature).unwrap_err();
        assert!(err.is_bootstrap());
        assert_eq!(err.code(), "PageableReturnType");
        assert!(err.to_string().contains(name), "{err}");
    }

    let streaming = MethodSignature::new("findByLastname", TypeRef::wrap(WrapperKind::Multi, TypeRef::named("User")))
        .with_parameter(ParameterDecl::new(TypeRef::string()).named("lastname"))
        .with_parameter(ParameterDecl::new(TypeRef::Special(SpecialType::Pageable)));
    assert!(register(streaming).unwrap().is_collection_query());
}

#[test]
fn unresolvable_derived_name_fails_registration() {
    let err = register(MethodSignature::new(
        "findByNoSuchProperty",
        TypeRef::list(TypeRef::named("User")),
    ))
    .unwrap_err();
    assert!(err.is_bootstrap());
    assert_eq!(err.code(), "PropertyNotFound");
    let message = err.to_string();
    assert!(message.contains("findByNoSuchProperty"), "{message}");

    let declared = MethodSignature::new("findByNoSuchProperty", TypeRef::list(TypeRef::named("User")))
        .with_declared_query("select u from User u");
    assert!(register(declared).unwrap().part_tree().is_none());
}

#[test]
fn registered_method_drives_arguments_through_the_tree() {
    let signature = MethodSignature::new(
        "findTop5ByLastnameAndAgeBetweenOrderByFirstnameAsc",
        TypeRef::list(TypeRef::named("User")),
    )
    .with_parameter(ParameterDecl::new(TypeRef::string()).named("lastname"))
    .with_parameter(ParameterDecl::new(TypeRef::named("int")).named("from"))
    .with_parameter(ParameterDecl::new(TypeRef::named("int")).named("to"))
    .with_parameter(ParameterDecl::new(TypeRef::Special(SpecialType::Sort)));
    let method = register(signature).unwrap();
    let tree = method.part_tree().unwrap();
    assert_eq!(tree.max_results(), Some(5));
    assert_eq!(tree.number_of_arguments(), method.parameters().number_of_bindable());

    let values = [
        Value::from("Matthews"),
        Value::Int(18),
        Value::Int(30),
        Value::from(Sort::by([Order::desc("age")])),
    ];
    let accessor = ParameterAccessor::new(method.parameters(), &values).unwrap();
    let mut args = accessor.bindable_values();
    for part in tree.parts() {
        let bound: Vec<_> = args.by_ref().take(part.number_of_arguments()).collect();
        assert_eq!(bound.len(), part.number_of_arguments());
    }
    assert_eq!(args.remaining(), 0);

    let combined = tree.sort().clone().and(&accessor.sort());
    assert_eq!(combined.to_string(), "firstname: ASC, age: DESC");
    assert!(!accessor.pageable().is_paged());
    assert_eq!(Pageable::unpaged().to_limit(), accessor.limit());
}
