#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::sync::Arc;

use quarry::{
    config::QuarryConfig,
    domain::Pageable,
    expression::{
        DefaultEvaluationContextProvider, ExpressionQueryContext, PropertyResolver, SimpleExpressionEvaluator,
    },
    repository::{MethodSignature, ParameterAccessor, ParameterDecl, ParameterSource, Parameters},
    types::{SpecialType, TypeRef, TypeRegistry},
    QueryError, Record, Value,
};

fn synthetic() -> ExpressionQueryContext {
    ExpressionQueryContext::new(
        |counter, _| format!("__$synthetic$__{counter}"),
        |prefix, name| format!("{prefix}{name}"),
    )
}

fn parameters() -> Parameters {
    let method = MethodSignature::new("findByCustomer", TypeRef::page(TypeRef::named("User")))
        .with_parameter(ParameterDecl::new(TypeRef::named("Customer")).named("customer"))
        .with_parameter(ParameterDecl::new(TypeRef::string()).named("name"))
        .with_parameter(ParameterDecl::new(TypeRef::Special(SpecialType::Pageable)));
    Parameters::from_method(&method, "User", &TypeRegistry::new()).unwrap()
}

fn provider() -> DefaultEvaluationContextProvider {
    let mut properties = BTreeMap::new();
    properties.insert("tenant".to_string(), "acme".to_string());
    let properties: Arc<dyn PropertyResolver> = Arc::new(properties);
    DefaultEvaluationContextProvider::with_properties(properties)
}

#[test]
fn named_expression_becomes_synthetic_parameter() {
    let parsed = synthetic()
        .parse("select u from User u where u.name = :#{#name}")
        .unwrap();
    assert_eq!(parsed.query(), "select u from User u where u.name = :__$synthetic$__0");
    let map: Vec<_> = parsed.expressions().collect();
    assert_eq!(map, [("__$synthetic$__0", "#name")]);
}

#[test]
fn quoted_markers_survive_and_unquoted_ones_are_extracted_once() {
    for quote in ['\'', '"'] {
        let query = format!("where a = {quote}:#{{#name}}{quote} or b = :#{{#name}}");
        let parsed = synthetic().parse(&query).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(
            parsed.query(),
            format!("where a = {quote}:#{{#name}}{quote} or b = :__$synthetic$__0")
        );
        assert!(parsed.is_quoted(11));
        assert!(!parsed.is_quoted(parsed.query().len() - 1));
    }
}

#[test]
fn unterminated_quote_fails_at_registration() {
    let err = synthetic().parse("where u.name = 'abc and u.id = :#{#id}").unwrap_err();
    assert!(err.is_bootstrap());
    assert!(matches!(err, QueryError::UnbalancedQuotes { position: 15, .. }));
}

#[test]
fn evaluates_in_extraction_order_against_invocation_arguments() {
    let parsed = synthetic()
        .parse(
            "select u from User u where u.customer = :#{#customer.id} \
             and u.name = ?#{[1]} and u.tenant = :${tenant} and u.size = :#{#pageable.size}",
        )
        .unwrap();
    assert_eq!(parsed.len(), 4);

    let parameters = parameters();
    let customer = Record::new("Customer").with("id", 7i64);
    let values = [
        Value::Record(customer),
        Value::from("Matthews"),
        Value::from(Pageable::of(0, 20).unwrap()),
    ];
    let accessor = ParameterAccessor::new(&parameters, &values).unwrap();
    let source = ParameterSource::from(accessor);

    let err = parsed
        .evaluate(&provider(), &SimpleExpressionEvaluator, &source)
        .unwrap_err();
    assert!(matches!(err, QueryError::ExpressionEvaluation { ref expression, .. } if expression == "#pageable.size"));

    let parsed = synthetic()
        .parse("where u.customer = :#{#customer.id} and u.name = ?#{[1]} and u.tenant = :${tenant}")
        .unwrap();
    let evaluated = parsed
        .evaluate(&provider(), &SimpleExpressionEvaluator, &source)
        .unwrap();
    let names: Vec<_> = evaluated.iter().map(|(name, _)| name).collect();
    assert_eq!(names, ["__$synthetic$__0", "__$synthetic$__1", "__$synthetic$__2"]);
    assert_eq!(evaluated.get("__$synthetic$__0"), Some(&Value::Int(7)));
    assert_eq!(evaluated.get("__$synthetic$__1"), Some(&Value::from("Matthews")));
    assert_eq!(evaluated.get("__$synthetic$__2"), Some(&Value::from("acme")));
}

#[test]
fn reactive_context_variables_are_visible() {
    let parameters = parameters();
    let values = [Value::Null, Value::from("Matthews"), Value::Null];
    let accessor = ParameterAccessor::new(&parameters, &values).unwrap();
    let mut context = BTreeMap::new();
    context.insert("principal".to_string(), Value::from("admin"));
    let source = ParameterSource::ReactiveContextual {
        accessor,
        context: &context,
    };

    let parsed = synthetic().parse("where u.owner = :#{#principal} and u.name = :#{#name}").unwrap();
    let evaluated = parsed
        .evaluate(&provider(), &SimpleExpressionEvaluator, &source)
        .unwrap()
        .into_vec();
    assert_eq!(
        evaluated,
        [
            ("__$synthetic$__0".to_string(), Value::from("admin")),
            ("__$synthetic$__1".to_string(), Value::from("Matthews")),
        ]
    );
}

#[test]
fn configured_prefix_names_synthetic_parameters() {
    let config = QuarryConfig::from_toml_str("[expressions]\nsynthetic_prefix = \"spel_\"\n").unwrap();
    let parsed = ExpressionQueryContext::from_options(config.expressions())
        .parse("where u.id = ?#{[0]}")
        .unwrap();
    assert_eq!(parsed.query(), "where u.id = ?spel_0");
}
