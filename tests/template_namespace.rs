use std::{collections::HashMap, sync::Arc, thread};

use glossa::template::{
    Association, DefaultParser, Delims, Func, FuncMap, FuncNames, Node, ParseError, Parser,
    Template, TemplateError, Tree,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn unit_names(t: &Template) -> Vec<String> {
    let mut names: Vec<String> = t.templates().iter().map(|u| u.name().to_string()).collect();
    names.sort();
    names
}

#[test]
fn define_only_parse_keeps_root_and_adds_sub() {
    let mut root = Template::new("root");
    root.parse("Hello").unwrap();

    root.parse(r#"{{define "sub"}}World{{end}}"#).unwrap();

    assert_eq!(root.render(&json!(null)).unwrap(), "Hello");
    assert!(root.lookup("sub").is_some());
    assert_eq!(root.render_template("sub", &json!(null)).unwrap(), "World");
}

#[test]
fn second_non_empty_registration_fails() {
    let mut t = Template::new("root");
    let first = Tree::new("x", vec![Node::Text("first".to_string())]);
    let second = Tree::new("x", vec![Node::Text("second".to_string())]);

    assert_eq!(t.add_parse_tree("x", first).unwrap(), Association::Stored);
    let err = t.add_parse_tree("x", second).unwrap_err();

    assert!(matches!(err, TemplateError::Redefinition { ref name } if name == "x"));
    assert_eq!(err.to_string(), "template: redefinition of template \"x\"");
    assert_eq!(t.render_template("x", &json!(null)).unwrap(), "first");
}

#[test]
fn add_parse_tree_accepts_taken_name_when_either_tree_is_empty() {
    let mut t = Template::new("root");
    let empty = || Tree::new("x", Vec::new());
    let text = |s: &str| Tree::new("x", vec![Node::Text(s.to_string())]);

    assert_eq!(t.add_parse_tree("x", empty()).unwrap(), Association::Stored);
    assert_eq!(t.add_parse_tree("x", text("body")).unwrap(), Association::Stored);
    assert_eq!(t.add_parse_tree("x", empty()).unwrap(), Association::Kept);
    assert_eq!(t.render_template("x", &json!(null)).unwrap(), "body");
}

#[test]
fn clone_adds_units_independently() {
    let mut original = Template::new("root");
    original
        .parse(r#"root{{define "a"}}A{{end}}{{define "b"}}B{{end}}"#)
        .unwrap();
    assert_eq!(original.templates().len(), 3);

    let mut copy = original.clone();
    let sibling = copy.new_sibling("c");
    copy.parse_unit(sibling, "C").unwrap();

    assert_eq!(unit_names(&original), vec!["a", "b", "root"]);
    assert_eq!(unit_names(&copy), vec!["a", "b", "c", "root"]);
    assert!(original.lookup("c").is_none());

    original
        .parse(r#"{{define "d"}}D{{end}}"#)
        .unwrap();
    assert!(copy.lookup("d").is_none());
    assert_eq!(copy.render_template("a", &json!(null)).unwrap(), "A");
}

#[test]
fn clone_of_unparsed_root_registers_root() {
    let original = Template::new("root");
    let copy = original.clone();
    assert!(original.templates().is_empty());
    assert_eq!(unit_names(&copy), vec!["root"]);
    assert!(copy.lookup("root").unwrap().is_empty());
}

#[test]
fn siblings_reference_each_other() {
    let mut t = Template::new("page");
    t.parse(r#"<{{template "header" .}}>"#).unwrap();
    let header = t.new_sibling("header");
    t.parse_unit(header, "{{.Title}}").unwrap();

    assert_eq!(t.render(&json!({"Title": "Home"})).unwrap(), "<Home>");
}

#[test]
fn empty_definition_never_overwrites() {
    let mut t = Template::new("root");
    t.parse(r#"{{define "x"}}content{{end}}"#).unwrap();
    t.parse(r#"{{define "x"}}  {{end}}"#).unwrap();
    assert_eq!(t.render_template("x", &json!(null)).unwrap(), "content");
}

#[test]
fn empty_unit_can_be_defined_later() {
    let mut t = Template::new("root");
    t.parse(r#"{{define "x"}}{{/* todo */}}{{end}}"#).unwrap();
    assert!(t.lookup("x").unwrap().is_empty());

    t.parse(r#"{{define "x"}}now defined{{end}}"#).unwrap();
    assert!(!t.lookup("x").unwrap().is_empty());
}

#[test]
fn failed_batch_leaves_namespace_untouched() {
    let mut t = Template::new("root");
    t.parse(r#"{{define "b"}}B{{end}}"#).unwrap();

    let err = t
        .parse(r#"{{define "a"}}A{{end}}{{define "b"}}other B{{end}}"#)
        .unwrap_err();

    assert!(matches!(err, TemplateError::Redefinition { .. }));
    assert!(t.lookup("a").is_none());
    assert_eq!(t.render_template("b", &json!(null)).unwrap(), "B");
}

#[test]
fn parse_error_mutates_nothing() {
    let mut t = Template::new("root");
    t.parse("ok").unwrap();
    let err = t.parse(r#"{{define "x"}}X{{end}}{{if}}"#).unwrap_err();
    assert!(matches!(err, TemplateError::Parse(_)));
    assert!(t.lookup("x").is_none());
}

#[test]
fn functions_are_shared_and_validated() {
    let mut funcs = FuncMap::new();
    funcs.insert(
        "shout".to_string(),
        Func::with_arity(1, |args: &[Value]| {
            Ok(Value::String(format!(
                "{}!",
                args[0].as_str().unwrap_or_default().to_uppercase()
            )))
        }),
    );

    let mut t = Template::new("root");
    t.funcs(funcs).unwrap();
    let sibling = t.new_sibling("greet");
    t.parse_unit(sibling, "{{shout .}}").unwrap();
    assert_eq!(t.render_template("greet", &json!("hi")).unwrap(), "HI!");

    let mut bad = FuncMap::new();
    bad.insert("ok".to_string(), Func::new(|_: &[Value]| Ok(Value::Null)));
    bad.insert("not valid".to_string(), Func::new(|_: &[Value]| Ok(Value::Null)));
    let err = t.funcs(bad).unwrap_err();
    assert!(matches!(err, TemplateError::InvalidFunction { .. }));
    assert!(!t.namespace().unwrap().syntax_funcs().contains("ok"));
}

#[test]
fn unknown_function_is_parse_error() {
    let mut t = Template::new("root");
    let err = t.parse("{{shout .}}").unwrap_err();
    assert_eq!(
        err.to_string(),
        "template: root:1: function \"shout\" not defined"
    );
}

#[test]
fn delimiters_apply_to_next_parse_and_new_siblings() {
    let mut t = Template::new("root");
    t.delims("[[", "]]");
    t.parse("[[.Name]] {{.Name}}").unwrap();
    assert_eq!(t.render(&json!({"Name": "x"})).unwrap(), "x {{.Name}}");

    let sibling = t.new_sibling("s");
    assert_eq!(sibling.delims(), &Delims::new("[[", "]]"));

    let legacy = t.new_sibling("legacy").with_delims("", "");
    t.parse_unit(legacy, "{{.Name}}").unwrap();
    assert_eq!(t.render_template("legacy", &json!({"Name": "y"})).unwrap(), "y");
}

#[test]
fn custom_parser_boundary() {
    /// Treats every line `name: text` as its own template.
    struct LineParser;

    impl Parser for LineParser {
        fn parse(
            &self,
            name: &str,
            text: &str,
            _delims: &Delims,
            _funcs: &FuncNames,
        ) -> Result<HashMap<String, Tree>, ParseError> {
            let mut trees = HashMap::new();
            trees.insert(name.to_string(), Tree::new(name, Vec::new()));
            for (index, line) in text.lines().enumerate() {
                let (unit, body) = line
                    .split_once(": ")
                    .ok_or_else(|| ParseError::new(name, index + 1, "expected `name: text`"))?;
                trees.insert(
                    unit.to_string(),
                    Tree::new(unit, vec![Node::Text(body.to_string())]),
                );
            }
            Ok(trees)
        }
    }

    let mut t = Template::new("root");
    t.parse_with(&LineParser, "a: alpha\nb: beta").unwrap();
    assert_eq!(t.render_template("b", &json!(null)).unwrap(), "beta");
    assert!(t.lookup("root").unwrap().is_empty());

    let err = t.parse_with(&LineParser, "broken").unwrap_err();
    assert_eq!(err.to_string(), "template: root:1: expected `name: text`");

    // The default parser is usable through the same boundary.
    let trees = DefaultParser
        .parse("t", "x{{define \"y\"}}Y{{end}}", &Delims::default(), &FuncNames::new())
        .unwrap();
    assert_eq!(trees.len(), 2);
}

#[test]
fn render_errors() {
    let mut t = Template::new("root");
    assert!(matches!(
        t.render(&json!(null)),
        Err(TemplateError::Exec(_))
    ));

    t.parse(r#"{{template "missing"}}"#).unwrap();
    let err = t.render(&json!(null)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "template: root:1: executing \"root\": no such template \"missing\""
    );
}

#[test]
fn execute_writes_to_writer() {
    let mut t = Template::new("root");
    t.parse("{{range .}}{{.}},{{end}}").unwrap();
    let mut out = Vec::new();
    t.execute(&mut out, &[1, 2, 3]).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "1,2,3,");
}

#[test]
fn built_template_is_shared_across_threads() {
    let mut t = Template::new("root");
    t.parse("n={{.}}").unwrap();
    let t = Arc::new(t);

    let handles: Vec<_> = (0..4)
        .map(|n| {
            let t = Arc::clone(&t);
            thread::spawn(move || t.render(&n).unwrap())
        })
        .collect();
    let mut rendered: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    rendered.sort();
    assert_eq!(rendered, vec!["n=0", "n=1", "n=2", "n=3"]);
}
