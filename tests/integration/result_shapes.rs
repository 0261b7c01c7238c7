#![allow(missing_docs)]

use std::sync::Arc;

use futures::{executor::block_on, stream, FutureExt, StreamExt};
use quarry::{
    domain::{Page, Pageable},
    repository::{MethodSignature, ParameterAccessor, ParameterDecl, QueryMethod, RepositoryMetadata},
    result::{ProjectionFactory, QueryResult, Reactive, ResultCollection, ResultStream},
    types::{SpecialType, TypeDescriptor, TypeIntrospector, TypeRef, TypeRegistry, WrapperKind},
    Record, Value,
};

fn factory() -> Arc<ProjectionFactory> {
    let types: Arc<dyn TypeIntrospector> = Arc::new(
        TypeRegistry::new()
            .with_type(
                TypeDescriptor::class("User")
                    .with_property("firstname", TypeRef::string())
                    .with_property("lastname", TypeRef::string()),
            )
            .with_type(TypeDescriptor::interface("UserDto").with_property("lastname", TypeRef::string()))
            .with_type(
                TypeDescriptor::class("NameOnly")
                    .with_property("lastname", TypeRef::string())
                    .with_constructor(["lastname"]),
            ),
    );
    Arc::new(ProjectionFactory::new(types))
}

fn register(signature: MethodSignature) -> QueryMethod {
    QueryMethod::new(signature, RepositoryMetadata::new("UserRepository", "User"), factory()).unwrap()
}

fn user(firstname: &str, lastname: &str) -> Value {
    Record::new("User")
        .with("firstname", firstname)
        .with("lastname", lastname)
        .into()
}

fn users() -> Vec<Value> {
    vec![user("Dave", "Matthews"), user("Carter", "Beauford"), user("Boyd", "Tinsley")]
}

fn lastname(value: &Value) -> Option<&str> {
    value.property("lastname").and_then(Value::as_str)
}

#[test]
fn page_of_interface_projection_keeps_metadata() {
    let method = register(
        MethodSignature::new("findAllBy", TypeRef::page(TypeRef::named("UserDto")))
            .with_parameter(ParameterDecl::new(TypeRef::Special(SpecialType::Pageable))),
    );
    let raw = Page::new(users(), Pageable::of(0, 3).unwrap(), 10);

    let page = method
        .result_processor()
        .process_result(QueryResult::Page(raw))
        .unwrap()
        .into_page()
        .unwrap();

    assert_eq!(page.total_elements(), 10);
    assert_eq!(page.number_of_elements(), 3);
    assert_eq!(page.pageable(), &Pageable::of(0, 3).unwrap());
    for (projected, expected) in page.content().iter().zip(["Matthews", "Beauford", "Tinsley"]) {
        assert_eq!(projected.type_name(), Some("UserDto"));
        assert_eq!(lastname(projected), Some(expected));
        assert_eq!(projected.property("firstname"), None);
    }
}

#[test]
fn already_projected_values_are_returned_unchanged() {
    let method = register(MethodSignature::new("findFirstBy", TypeRef::named("UserDto")));
    let processor = method.result_processor();

    let projected = processor
        .process_result(QueryResult::Value(user("Dave", "Matthews")))
        .unwrap()
        .into_value()
        .unwrap();
    let again = processor
        .process_result(QueryResult::Value(projected.clone()))
        .unwrap()
        .into_value()
        .unwrap();
    assert_eq!(again, projected);

    let null = processor.process_result(QueryResult::Value(Value::Null)).unwrap();
    assert_eq!(null.into_value(), Some(Value::Null));
}

#[test]
fn scalar_elements_are_not_wrapped_in_projections() {
    let method = register(MethodSignature::new("findLastnamesBy", TypeRef::list(TypeRef::named("UserDto"))));
    let collection = method
        .result_processor()
        .process_result(QueryResult::Collection(ResultCollection::list(vec![
            Value::from("Matthews"),
            user("Carter", "Beauford"),
        ])))
        .unwrap()
        .into_collection()
        .unwrap();
    assert_eq!(collection.items()[0], Value::from("Matthews"));
    assert_eq!(collection.items()[1].type_name(), Some("UserDto"));
}

#[test]
fn collections_and_streams_are_projected_per_element() {
    let method = register(MethodSignature::new("findByLastname", TypeRef::list(TypeRef::named("UserDto"))));
    let collection = method
        .result_processor()
        .process_result(QueryResult::Collection(ResultCollection::list(users())))
        .unwrap()
        .into_collection()
        .unwrap();
    assert_eq!(collection.len(), 3);
    assert!(collection.items().iter().all(|item| item.type_name() == Some("UserDto")));

    let streaming = register(MethodSignature::new(
        "streamAllBy",
        TypeRef::wrap(WrapperKind::Stream, TypeRef::named("UserDto")),
    ));
    let stream = streaming
        .result_processor()
        .process_result(QueryResult::Stream(ResultStream::from_values(users())))
        .unwrap()
        .into_stream()
        .unwrap();
    let names: Vec<_> = stream
        .map(|item| item.unwrap().property("lastname").cloned())
        .collect();
    assert_eq!(
        names,
        [Some(Value::from("Matthews")), Some(Value::from("Beauford")), Some(Value::from("Tinsley"))]
    );
}

#[test]
fn reactive_publishers_are_mapped_lazily() {
    let method = register(MethodSignature::new(
        "findByFirstname",
        TypeRef::wrap(WrapperKind::Multi, TypeRef::named("UserDto")),
    ));
    let source = Reactive::Multi(stream::iter(users().into_iter().map(Ok)).boxed());
    let mapped = method
        .result_processor()
        .process_result(QueryResult::Reactive(source))
        .unwrap()
        .into_reactive()
        .unwrap();
    let Reactive::Multi(items) = mapped else {
        panic!("expected a multi-value publisher");
    };
    let items: Vec<_> = block_on(items.collect::<Vec<_>>());
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].as_ref().unwrap().type_name(), Some("UserDto"));

    let single = register(MethodSignature::new(
        "findOneByLastname",
        TypeRef::wrap(WrapperKind::Single, TypeRef::named("UserDto")),
    ));
    let source = Reactive::Single(async { Ok(user("Dave", "Matthews")) }.boxed());
    let Some(Reactive::Single(value)) = single
        .result_processor()
        .process_result(QueryResult::Reactive(source))
        .unwrap()
        .into_reactive()
    else {
        panic!("expected a single-value publisher");
    };
    let value = block_on(value).unwrap();
    assert_eq!(lastname(&value), Some("Matthews"));
}

#[test]
fn dynamic_projection_selects_the_dto_type_per_call() {
    let method = register(
        MethodSignature::new("findByLastname", TypeRef::list(TypeRef::variable("T")))
            .with_parameter(ParameterDecl::new(TypeRef::string()).named("lastname"))
            .with_parameter(ParameterDecl::new(TypeRef::class_of(TypeRef::variable("T")))),
    );
    assert!(method.parameters().has_dynamic_projection());

    let values = [Value::from("Matthews"), Value::Class("NameOnly".to_string())];
    let accessor = ParameterAccessor::new(method.parameters(), &values).unwrap();
    let processor = method.result_processor().with_dynamic_projection(&accessor);
    assert!(processor.returned_type().is_projecting());

    let collection = processor
        .process_result(QueryResult::Collection(ResultCollection::list(vec![user("Dave", "Matthews")])))
        .unwrap()
        .into_collection()
        .unwrap();
    assert_eq!(collection.items()[0].type_name(), Some("NameOnly"));
    assert_eq!(lastname(&collection.items()[0]), Some("Matthews"));
}
