// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! End-to-end serialization: expose operations, flatten the reachable
//! graph, and check the wire document's shape.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use serde_json::{json, Value};
use typegraph_core::{
    expose, GraphError, Injection, Materializer, Policy, Runtime, SerializeError, TypeGraph,
    TypegraphParams, FORMAT_VERSION,
};

#[test]
fn expose_produces_the_four_table_document() {
    let mut g = TypeGraph::new();
    let deno = g.add_runtime(Runtime::new("deno"));
    let mat = g.add_materializer(Materializer::new("function", deno));
    let public = g.add_policy(Policy::new("public", mat));

    let name = g.string(None);
    let input = g.struct_(vec![("name".to_owned(), name)]);
    let greeting = g.string(None);
    let hello = g.func(input, greeting, mat);
    g.attach_policy(hello, public).unwrap();

    let params = TypegraphParams {
        name: "hello_world".to_owned(),
        auth: vec![json!({"provider": "basic"})],
        rate: Some(json!({"window_sec": 15})),
        cors: None,
        default_runtime: Some(deno),
    };
    let doc = expose(&mut g, &params, vec![("hello".to_owned(), hello)]).unwrap();

    let root = &doc.types[doc.root as usize];
    assert_eq!(root.kind, "struct");
    assert_eq!(root.title, "hello_world");
    let props = root.properties.as_ref().unwrap();
    assert_eq!(props.len(), 1);
    assert_eq!(props[0].0, "hello");

    let func = &doc.types[props[0].1 as usize];
    assert_eq!(func.kind, "function");
    assert_eq!(doc.types[func.input.unwrap() as usize].kind, "struct");
    assert_eq!(doc.types[func.output.unwrap() as usize].kind, "string");
    let mat_index = func.materializer.unwrap() as usize;
    assert_eq!(doc.materializers[mat_index].name, "function");
    assert_eq!(
        doc.runtimes[doc.materializers[mat_index].runtime as usize].name,
        "deno"
    );
    assert_eq!(func.policies.len(), 1);
    assert_eq!(doc.policies[func.policies[0] as usize].name, "public");

    assert_eq!(doc.meta.version, FORMAT_VERSION);
    assert_eq!(doc.meta.auth, vec![json!({"provider": "basic"})]);
    assert_eq!(doc.meta.rate, Some(json!({"window_sec": 15})));
    assert_eq!(doc.meta.cors, None);
}

#[test]
fn exposing_a_non_function_fails() {
    let mut g = TypeGraph::new();
    let deno = g.add_runtime(Runtime::new("deno"));
    let n = g.integer();
    let params = TypegraphParams {
        default_runtime: Some(deno),
        ..TypegraphParams::named("bad")
    };
    let err = expose(&mut g, &params, vec![("op".to_owned(), n)]).unwrap_err();
    assert!(matches!(err, SerializeError::InvalidExpose { name } if name == "op"));
}

#[test]
fn unresolved_proxies_fail_the_build_with_every_missing_name() {
    let mut g = TypeGraph::new();
    let deno = g.add_runtime(Runtime::new("deno"));
    let mat = g.add_materializer(Materializer::new("function", deno));
    let a = g.proxy("Ghost");
    let b = g.proxy("Phantom");
    let input = g.struct_(vec![("a".to_owned(), a)]);
    let op = g.func(input, b, mat);
    let params = TypegraphParams {
        default_runtime: Some(deno),
        ..TypegraphParams::named("haunted")
    };
    let err = expose(&mut g, &params, vec![("op".to_owned(), op)]).unwrap_err();
    let SerializeError::Graph(GraphError::UnresolvedProxies { names }) = err else {
        panic!("expected unresolved proxies, got {err:?}");
    };
    assert_eq!(names, vec!["Ghost".to_owned(), "Phantom".to_owned()]);
}

#[test]
fn reachable_node_without_a_runtime_fails() {
    let mut g = TypeGraph::new();
    let deno = g.add_runtime(Runtime::new("deno"));
    let mat = g.add_materializer(Materializer::new("function", deno));
    let out = g.integer();
    let input = g.struct_(vec![]);
    let op = g.func(input, out, mat);
    // No default runtime and no explicit assignment anywhere.
    let params = TypegraphParams::named("unowned");
    let err = expose(&mut g, &params, vec![("op".to_owned(), op)]).unwrap_err();
    assert!(matches!(err, SerializeError::UnassignedRuntime { .. }));
}

#[test]
fn shared_nodes_serialize_once_and_cycles_terminate() {
    let mut g = TypeGraph::new();
    let deno = g.add_runtime(Runtime::new("deno"));
    let mat = g.add_materializer(Materializer::new("function", deno));

    // Three structs in a reference cycle, plus one scalar shared by two of
    // them.
    let shared = g.integer();
    let b_ref = g.proxy("B");
    let a = g.struct_(vec![("n".to_owned(), shared), ("b".to_owned(), b_ref)]);
    g.name(a, "A").unwrap();
    let c_ref = g.proxy("C");
    let b = g.struct_(vec![("n".to_owned(), shared), ("c".to_owned(), c_ref)]);
    g.name(b, "B").unwrap();
    let a_ref = g.proxy("A");
    let c = g.struct_(vec![("a".to_owned(), a_ref)]);
    g.name(c, "C").unwrap();

    let out = g.boolean();
    let input = g.struct_(vec![("a".to_owned(), a)]);
    let op = g.func(input, out, mat);
    let params = TypegraphParams {
        default_runtime: Some(deno),
        ..TypegraphParams::named("cyclic")
    };
    let doc = expose(&mut g, &params, vec![("op".to_owned(), op)]).unwrap();

    // Each named struct appears exactly once.
    for title in ["A", "B", "C"] {
        let count = doc.types.iter().filter(|t| t.title == title).count();
        assert_eq!(count, 1, "{title} serialized {count} times");
    }
    // The shared scalar got one index, referenced from both A and B.
    let index_of = |title: &str| {
        doc.types
            .iter()
            .position(|t| t.title == title)
            .unwrap()
    };
    let field = |title: &str, name: &str| {
        doc.types[index_of(title)]
            .properties
            .as_ref()
            .unwrap()
            .iter()
            .find(|(f, _)| f == name)
            .unwrap()
            .1
    };
    assert_eq!(field("A", "n"), field("B", "n"));
    // The cycle closes back on A's own index.
    assert_eq!(field("C", "a"), index_of("A") as u32);
    // Every cross-reference stays in bounds.
    for t in &doc.types {
        if let Some(props) = &t.properties {
            for (_, i) in props {
                assert!((*i as usize) < doc.types.len());
            }
        }
    }
}

#[test]
fn injection_and_config_are_carried_on_the_wire() {
    let mut g = TypeGraph::new();
    let deno = g.add_runtime(Runtime::new("deno"));
    let mat = g.add_materializer(Materializer::new("function", deno));

    let token = g.string(None);
    g.inject(token, Injection::Secret("API_TOKEN".to_owned()))
        .unwrap();
    let limit = g.integer();
    g.set_config(limit, "maximum", Value::from(100)).unwrap();
    let input = g.struct_(vec![
        ("token".to_owned(), token),
        ("limit".to_owned(), limit),
    ]);
    let out = g.boolean();
    let op = g.func(input, out, mat);
    let params = TypegraphParams {
        default_runtime: Some(deno),
        ..TypegraphParams::named("carried")
    };
    let doc = expose(&mut g, &params, vec![("op".to_owned(), op)]).unwrap();

    let token_wire = doc
        .types
        .iter()
        .find(|t| t.injection.is_some())
        .unwrap();
    assert_eq!(token_wire.kind, "string");
    assert_eq!(
        token_wire.injection,
        Some(Injection::Secret("API_TOKEN".to_owned()))
    );
    let limit_wire = doc.types.iter().find(|t| !t.config.is_empty()).unwrap();
    assert_eq!(limit_wire.kind, "integer");
    assert_eq!(limit_wire.config.get("maximum"), Some(&Value::from(100)));
}

#[test]
fn document_round_trips_through_json() {
    let mut g = TypeGraph::new();
    let deno = g.add_runtime(Runtime::new("deno"));
    let mat = g.add_materializer(Materializer::new("function", deno));
    let out = g.string(None);
    let input = g.struct_(vec![]);
    let op = g.func(input, out, mat);
    let params = TypegraphParams {
        default_runtime: Some(deno),
        ..TypegraphParams::named("wire")
    };
    let doc = expose(&mut g, &params, vec![("op".to_owned(), op)]).unwrap();

    let json = doc.to_json().unwrap();
    let decoded: typegraph_core::TypegraphDoc = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, doc);
}
