//! Integration tests for remapper evaluation.

use chrono::{TimeZone, Utc};
use remapper::{remap, AppMetadata, Context, MessageCache, StaticMessages, UserInfo};
use serde_json::{json, Map, Value};
use std::sync::Arc;

fn check_in(context: &Context, expression: Value, expected: Value, input: Value) {
    let result = remap(&expression, &input, context);
    assert_eq!(result, expected, "expression: {expression}, input: {input}");
}

fn check(expression: Value, expected: Value, input: Value) {
    check_in(&Context::default(), expression, expected, input);
}

fn fixed_context() -> Context {
    let now = Utc.with_ymd_and_hms(2024, 1, 31, 9, 30, 0).unwrap();
    let mut variables = Map::new();
    variables.insert("theme".to_string(), json!("dark"));
    Context::new(AppMetadata {
        id: Some(7),
        url: "https://app.example".to_string(),
        locale: "nl".to_string(),
    })
    .with_user(UserInfo {
        sub: "u1".to_string(),
        name: Some("Ann".to_string()),
        locale: Some("de".to_string()),
        ..UserInfo::default()
    })
    .with_messages(Arc::new(StaticMessages::from_iter([("greet", "Hello {name}")])))
    .with_page(json!({ "id": "42" }))
    .with_variables(variables)
    .at(now)
}

// ----------------------------------------------------------------- Forms

#[test]
fn test_literals() {
    check(json!(42), json!(42), json!({ "a": 1 }));
    check(json!("text"), json!("text"), json!(null));
    check(json!({ "a": 1, "b": 2 }), json!({ "a": 1, "b": 2 }), json!(null));
    check(json!({}), json!({}), json!(3));
    check(json!({ "not.an.operator": 1 }), json!({ "not.an.operator": 1 }), json!(3));
}

#[test]
fn test_chains() {
    check(json!([]), json!({ "a": 1 }), json!({ "a": 1 }));
    check(json!([{ "prop": "a" }, { "prop": "b" }]), json!(2), json!({ "a": { "b": 2 } }));
    check(json!([[{ "prop": "a" }], [{ "prop": "b" }]]), json!(2), json!({ "a": { "b": 2 } }));
}

#[test]
fn test_nested_arrays_without_expressions_are_literal() {
    check(json!({ "object.from": { "list": [1, 2, 3] } }), json!({ "list": [1, 2, 3] }), json!(null));
    check(json!({ "object.from": { "empty": [] } }), json!({ "empty": [] }), json!({ "a": 1 }));
    check(
        json!({ "object.assign": { "tags": ["a", { "b": 1 }] } }),
        json!({ "x": 0, "tags": ["a", { "b": 1 }] }),
        json!({ "x": 0 }),
    );
    check(
        json!({ "if": { "condition": true, "then": [1, 2], "else": null } }),
        json!([1, 2]),
        json!(null),
    );
    check(json!({ "array.from": [[1, 2], 3] }), json!([[1, 2], 3]), json!(null));
    check(json!({ "object.from": { "v": [1, { "prop": "a" }] } }), json!({ "v": null }), json!({ "a": 1 }));
    check(json!([1, 2, 3]), json!(3), json!(null));
}

#[test]
fn test_fail_soft_continues_chain() {
    check(json!([{ "string.case": "upper" }, { "defined": { "prop": [] } }]), json!(false), json!(3));
    check(json!({ "array.map": { "prop": "a" } }), json!([]), json!("nope"));
    check(json!({ "object.assign": { "b": 1 } }), json!({}), json!(3));
    check(json!({ "math.divide": 0 }), json!(null), json!(3));
}

// ----------------------------------------------------------------- Values

#[test]
fn test_prop() {
    check(json!({ "prop": "a" }), json!(1), json!({ "a": 1 }));
    check(json!({ "prop": "a.b" }), json!(3), json!({ "a": { "b": 3 } }));
    check(json!({ "prop": ["a", 0] }), json!(5), json!({ "a": [5] }));
    check(json!({ "prop": 1 }), json!("y"), json!(["x", "y"]));
    check(json!({ "prop": -1 }), json!("y"), json!(["x", "y"]));
    check(json!({ "prop": ["a", -2] }), json!(4), json!({ "a": [4, 5] }));
    check(json!({ "prop": "missing" }), json!(null), json!({ "a": 1 }));
    check(json!({ "prop": "a" }), json!(null), json!(null));
}

#[test]
fn test_root_static_len_type() {
    check(
        json!({ "array.map": { "root": null } }),
        json!([[1, 2], [1, 2]]),
        json!([1, 2]),
    );
    check(json!({ "static": { "prop": "a" } }), json!({ "prop": "a" }), json!({ "a": 1 }));
    check(json!({ "len": null }), json!(5), json!("héllo"));
    check(json!({ "len": null }), json!(2), json!({ "a": 1, "b": 2 }));
    check(json!({ "len": null }), json!(null), json!(3));
    check(json!({ "type": null }), json!("array"), json!([]));
    check(json!({ "type": null }), json!("null"), json!(null));
    check(json!({ "log": "debug" }), json!({ "a": 1 }), json!({ "a": 1 }));
}

// ----------------------------------------------------------------- Objects

#[test]
fn test_object_from_and_assign() {
    check(
        json!({ "object.from": { "x": { "prop": "a" }, "y": "lit" } }),
        json!({ "x": 1, "y": "lit" }),
        json!({ "a": 1 }),
    );
    check(
        json!({ "object.assign": { "b": { "prop": "a" } } }),
        json!({ "a": 1, "b": 1 }),
        json!({ "a": 1 }),
    );
}

#[test]
fn test_object_omit_and_explode() {
    check(
        json!({ "object.omit": ["a", "b.c"] }),
        json!({ "b": { "d": 3 } }),
        json!({ "a": 1, "b": { "c": 2, "d": 3 } }),
    );
    check(
        json!({ "object.explode": "items" }),
        json!([{ "id": 1, "x": 1 }, { "id": 1, "x": 2 }]),
        json!({ "id": 1, "items": [{ "x": 1 }, { "x": 2 }] }),
    );
    check(json!({ "object.omit": [["a", -1]] }), json!({ "a": [1, 2] }), json!({ "a": [1, 2, 3] }));
    check(json!({ "object.explode": "items" }), json!([]), json!({ "id": 1 }));
    check(json!({ "null.strip": null }), json!({ "b": 1 }), json!({ "a": null, "b": 1 }));
}

// ----------------------------------------------------------------- Strings

#[test]
fn test_string_operators() {
    check(json!({ "string.case": "upper" }), json!("ABC"), json!("abc"));
    check(json!({ "string.case": "lower" }), json!("abc"), json!("ABC"));
    check(json!({ "string.startsWith": "he" }), json!(true), json!("hello"));
    check(json!({ "string.startsWith": "HE" }), json!(false), json!("hello"));
    check(
        json!({ "string.startsWith": { "substring": "HE", "strict": false } }),
        json!(true),
        json!("hello"),
    );
    check(json!({ "string.endsWith": "lo" }), json!(true), json!("hello"));
    check(json!({ "string.contains": "ell" }), json!(true), json!("hello"));
    check(json!({ "slice": [1, 3] }), json!("el"), json!("hello"));
    check(json!({ "slice": [-2] }), json!([3, 4]), json!([1, 2, 3, 4]));
    check(json!({ "string.replace": { "o": "0" } }), json!("f00"), json!("foo"));
    check(json!({ "string.test": { "regex": "^a", "flags": "i" } }), json!(true), json!("Abc"));
    check(json!({ "string.trim": null }), json!("x"), json!("  x "));
    check(json!({ "string.split": "," }), json!(["a", "b"]), json!("a,b"));
}

#[test]
fn test_string_format_and_translate() {
    check(
        json!({ "string.format": { "template": "Hi {name}", "values": { "name": { "prop": "n" } } } }),
        json!("Hi Bo"),
        json!({ "n": "Bo" }),
    );
    let ctx = fixed_context();
    check_in(&ctx, json!({ "translate": "greet" }), json!("Hello Ann"), json!({ "name": "Ann" }));
    check_in(&ctx, json!({ "translate": "missing" }), json!("missing"), json!(null));
    check_in(
        &ctx,
        json!({ "string.format": { "messageId": "greet", "template": "unused", "values": { "name": "Bo" } } }),
        json!("Hello Bo"),
        json!(null),
    );
}

#[test]
fn test_formatter_cache_is_shared() {
    let cache = Arc::new(MessageCache::new());
    let ctx = Context::default().with_formatters(Arc::clone(&cache));
    let expr = json!({ "string.format": { "template": "{a}-{b}", "values": { "a": 1, "b": { "prop": "b" } } } });
    check_in(&ctx, expr.clone(), json!("1-x"), json!({ "b": "x" }));
    check_in(&ctx, expr, json!("1-y"), json!({ "b": "y" }));
    assert_eq!(cache.len(), 1);
}

// ----------------------------------------------------------------- Arrays

#[test]
fn test_array_iteration() {
    check(json!({ "array.map": { "math.add": 1 } }), json!([2, 3, 4]), json!([1, 2, 3]));
    check(json!({ "array.filter": { "gt": [{ "prop": [] }, 2] } }), json!([3, 4]), json!([1, 2, 3, 4]));
    check(json!({ "array.find": { "gt": [{ "prop": [] }, 2] } }), json!(3), json!([1, 2, 3, 4]));
    check(json!({ "array.find": { "gt": [{ "prop": [] }, 9] } }), json!(null), json!([1, 2]));
    check(
        json!({ "array.sort": { "by": { "prop": "n" }, "order": "desc" } }),
        json!([{ "n": 3 }, { "n": 2 }, { "n": 1 }]),
        json!([{ "n": 1 }, { "n": 3 }, { "n": 2 }]),
    );
    check(json!({ "array.sort": {} }), json!([1, 2, 3]), json!([3, 1, 2]));
    check(json!({ "array.unique": null }), json!([1, 2]), json!([1, 1.0, 2]));
    check(
        json!({ "array.unique": { "prop": "k" } }),
        json!([{ "k": 1, "v": "a" }]),
        json!([{ "k": 1, "v": "a" }, { "k": 1, "v": "b" }]),
    );
}

#[test]
fn test_array_position() {
    check(json!({ "array.map": { "array": "index" } }), json!([0, 1]), json!(["a", "b"]));
    check(json!({ "array.map": { "array": "length" } }), json!([2, 2]), json!(["a", "b"]));
    check(json!({ "array.map": { "array": "item" } }), json!(["a", "b"]), json!(["a", "b"]));
    check(json!({ "array": "index" }), json!(null), json!(["a"]));
}

#[test]
fn test_array_construction() {
    check(json!({ "array.from": [{ "prop": "a" }, 2] }), json!([1, 2]), json!({ "a": 1 }));
    check(json!({ "array.append": [3] }), json!([1, 2, 3]), json!([1, 2]));
    check(json!({ "array.omit": [0, -1] }), json!([2]), json!([1, 2, 3]));
    check(json!({ "array.flatten": null }), json!([1, 2, 3]), json!([1, [2, [3]]]));
    check(json!({ "array.flatten": 1 }), json!([1, 2, [3]]), json!([1, [2, [3]]]));
    check(json!({ "array.join": ", " }), json!("a, 1, "), json!(["a", 1, null]));
}

// ----------------------------------------------------------------- History

#[test]
fn test_history_in_nested_maps() {
    let input = json!([[1, 2], [3, 4]]);
    check(
        json!({ "array.map": { "array.map": { "history": 1 } } }),
        json!([[[1, 2], [1, 2]], [[3, 4], [3, 4]]]),
        input.clone(),
    );
    check(
        json!({ "array.map": { "array.map": { "history": 2 } } }),
        json!([[input.clone(), input.clone()], [input.clone(), input.clone()]]),
        input.clone(),
    );
    check(json!({ "array.map": { "history": 0 } }), input.clone(), input);
    check(json!({ "history": 3 }), json!(null), json!(1));
}

#[test]
fn test_history_objects() {
    check(
        json!({ "array.map": { "from.history": { "index": 1, "props": { "all": { "len": null } } } } }),
        json!([{ "all": 2 }, { "all": 2 }]),
        json!([1, 2]),
    );
    check(
        json!({ "array.map": { "assign.history": { "index": 1, "props": { "count": { "len": null } } } } }),
        json!([{ "a": 1, "count": 1 }]),
        json!([{ "a": 1 }]),
    );
    check(
        json!({ "from.history": { "index": 0, "props": {
            "rest": { "omit.history": { "index": 1, "keys": ["b"] } }
        } } }),
        json!({ "rest": { "a": 1 } }),
        json!({ "a": 1, "b": 2 }),
    );
    check(json!({ "from.history": { "index": 4, "props": {} } }), json!({}), json!(1));
}

// ----------------------------------------------------------------- Logic

#[test]
fn test_conditionals() {
    let expr = json!({ "if": { "condition": { "prop": "a" }, "then": "yes", "else": "no" } });
    check(expr.clone(), json!("no"), json!({ "a": 0 }));
    check(expr.clone(), json!("no"), json!({ "a": "" }));
    check(expr.clone(), json!("yes"), json!({ "a": [] }));
    check(expr, json!("yes"), json!({ "a": {} }));

    let expr = json!({ "match": [
        { "case": { "equals": [{ "prop": [] }, 1] }, "value": "one" },
        { "case": true, "value": "other" }
    ] });
    check(expr.clone(), json!("one"), json!(1.0));
    check(expr, json!("other"), json!(2));
    check(json!({ "match": [{ "case": false, "value": 1 }] }), json!(null), json!(null));
}

#[test]
fn test_match_default_case() {
    let expr = json!({ "match": [
        { "case": { "equals": [{ "prop": "kind" }, "a"] }, "value": "first" },
        { "value": { "prop": "kind" } }
    ] });
    check(expr.clone(), json!("first"), json!({ "kind": "a" }));
    check(expr, json!("z"), json!({ "kind": "z" }));
    check(json!({ "match": [{ "value": "only" }] }), json!("only"), json!(null));
}

#[test]
fn test_comparisons_and_logic() {
    check(json!({ "equals": [{ "prop": [] }, 1.0] }), json!(true), json!(1));
    check(json!({ "equals": [{ "prop": "a" }, { "prop": "b" }] }), json!(false), json!({ "a": 1, "b": 2 }));
    check(json!({ "gt": [{ "prop": [] }, 1] }), json!(true), json!(2));
    check(json!({ "lt": [{ "prop": [] }, 1] }), json!(false), json!(2));
    check(json!({ "lt": ["a", "b"] }), json!(true), json!(null));
    check(json!({ "not": { "prop": "a" } }), json!(true), json!({ "a": 0 }));
    check(json!({ "and": [true, { "prop": "a" }] }), json!(false), json!({ "a": null }));
    check(json!({ "or": [false, { "prop": "a" }] }), json!(true), json!({ "a": "x" }));
    check(json!({ "defined": { "prop": "a" } }), json!(true), json!({ "a": "" }));
    check(json!({ "defined": { "prop": "a" } }), json!(true), json!({ "a": false }));
    check(json!({ "defined": { "prop": "a" } }), json!(false), json!({}));
}

// ----------------------------------------------------------------- Math

#[test]
fn test_math() {
    check(json!([{ "math.add": 2 }, { "math.multiply": 3 }]), json!(9), json!(1));
    check(json!({ "math.subtract": 2 }), json!(-1), json!(1));
    check(json!({ "math.divide": 2 }), json!(1.5), json!(3));
    check(json!({ "math.add": 1 }), json!(null), json!("3"));
}

// ----------------------------------------------------------------- Dates

#[test]
fn test_dates() {
    let ctx = fixed_context();
    check_in(&ctx, json!({ "date.now": null }), json!("2024-01-31T09:30:00.000Z"), json!(null));
    check_in(
        &ctx,
        json!([{ "date.now": null }, { "date.add": "1d" }]),
        json!("2024-02-01T09:30:00.000Z"),
        json!(null),
    );
    check(json!({ "date.add": "-2h 30m" }), json!("2024-01-31T07:00:00.000Z"), json!("2024-01-31T09:30:00Z"));
    check(json!({ "date.format": "%Y/%m/%d" }), json!("2024/01/31"), json!("2024-01-31T09:30:00Z"));
    check(json!({ "date.format": null }), json!("1970-01-01T00:00:01.000Z"), json!(1000));
    check(json!({ "date.parse": "%d-%m-%Y" }), json!("2024-01-31T00:00:00.000Z"), json!("31-01-2024"));
    check(json!({ "date.parse": null }), json!("2024-01-31T00:00:00.000Z"), json!("2024-01-31"));
    check(json!({ "date.parse": null }), json!(null), json!("yesterday"));
}

// ----------------------------------------------------------------- Context

#[test]
fn test_context_accessors() {
    let ctx = fixed_context();
    check_in(&ctx, json!({ "app": "id" }), json!(7), json!(null));
    check_in(&ctx, json!({ "app": "url" }), json!("https://app.example"), json!(null));
    check_in(&ctx, json!({ "app": "locale" }), json!("nl"), json!(null));
    check_in(&ctx, json!({ "locale": null }), json!("de"), json!(null));
    check_in(&ctx, json!({ "user": "name" }), json!("Ann"), json!(null));
    check_in(&ctx, json!({ "user": "email" }), json!(null), json!(null));
    check_in(&ctx, json!({ "page": "id" }), json!("42"), json!(null));
    check_in(&ctx, json!({ "page": null }), json!({ "id": "42" }), json!(null));
    check_in(&ctx, json!({ "variable": "theme" }), json!("dark"), json!(null));
    check_in(&ctx, json!({ "variable": "nope" }), json!(null), json!(null));

    check(json!({ "user": "name" }), json!(null), json!(null));
    check(json!({ "locale": null }), json!("en"), json!(null));
}

// ----------------------------------------------------------------- Queries

#[test]
fn test_odata_builders() {
    check(
        json!({ "filter.from": {
            "name": { "type": "String", "value": { "prop": "q" } },
            "age": { "type": "Int32", "comparator": "lt", "value": 10 }
        } }),
        json!("name eq 'O''Neil' and age lt 10"),
        json!({ "q": "O'Neil" }),
    );
    check(json!({ "filter.from": { "age": { "type": "Int32", "comparator": "lt", "value": 10 } } }), json!("age lt 10"), json!(null));
    check(json!({ "filter.from": { "a": { "type": "Int32", "comparator": "like", "value": 1 } } }), json!(null), json!(null));
    check(json!({ "order.from": { "name": "asc", "a.b": "desc" } }), json!("name asc,a/b desc"), json!(null));
}

#[test]
fn test_filter_rejects_malformed_literals() {
    let by_id = json!({ "filter.from": { "id": { "type": "Guid", "value": { "prop": "id" } } } });
    check(
        by_id.clone(),
        json!("id eq 3f2504e0-4f89-11d3-9a0c-0305e82c3301"),
        json!({ "id": "3f2504e0-4f89-11d3-9a0c-0305e82c3301" }),
    );
    check(by_id.clone(), json!(null), json!({ "id": "x or owner ne null" }));
    check(by_id, json!(null), json!({ "id": 7 }));

    let by_score = json!({ "filter.from": { "score": { "type": "Double", "comparator": "gt", "value": { "prop": "s" } } } });
    check(by_score.clone(), json!("score gt 2.5"), json!({ "s": " 2.5" }));
    check(by_score.clone(), json!(null), json!({ "s": "inf" }));
    check(by_score, json!(null), json!({ "s": "NaN" }));
}

// ----------------------------------------------------------------- Fields

#[test]
fn test_field_validate() {
    let expr = json!({ "field.validate": { "type": "string", "requirements": [{ "minLength": 2, "errorMessage": "short" }] } });
    check(expr.clone(), json!({ "code": "minLength", "index": 0, "errorMessage": "short" }), json!("a"));
    check(expr, json!(null), json!("ab"));

    let expr = json!({ "field.validate": { "type": "enum", "enum": ["", "a"], "requirements": [{ "required": true }] } });
    check(expr.clone(), json!(null), json!(""));
    check(expr, json!({ "code": "required", "index": 0, "errorMessage": null }), json!(null));
}

// ----------------------------------------------------------------- End to end

#[test]
fn test_input_is_never_mutated() {
    let input = json!({ "items": [1, 2, 3] });
    let expr = json!([{ "prop": "items" }, { "array.map": { "math.add": 1 } }]);
    let result = remap(&expr, &input, &Context::default());
    assert_eq!(result, json!([2, 3, 4]));
    assert_eq!(input, json!({ "items": [1, 2, 3] }));
}
