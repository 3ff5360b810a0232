//! Function tables for templates.
//!
//! Every namespace keeps two views of its functions: the names known while
//! parsing ([`FuncNames`]) and the callables bound for rendering
//! ([`FuncMap`]). Built-in functions are always available and may be
//! shadowed by registered ones.

use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
    fmt,
    sync::{Arc, LazyLock},
};

use regex::Regex;
use serde_json::Value;

/// Outcome of a template function call; the error text ends up in the
/// [`ExecError`](super::ExecError) message.
pub type FuncResult = Result<Value, String>;

/// Names usable in function position while parsing.
pub type FuncNames = HashSet<String>;

/// Callables keyed by the name templates invoke them with.
pub type FuncMap = HashMap<String, Func>;

type Callable = dyn Fn(&[Value]) -> FuncResult + Send + Sync;

/// A template function.
#[derive(Clone)]
pub struct Func {
    arity: Option<usize>,
    call: Arc<Callable>,
}

impl Func {
    /// A variadic function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> FuncResult + Send + Sync + 'static,
    {
        Self {
            arity: None,
            call: Arc::new(f),
        }
    }

    /// A function taking exactly `arity` arguments.
    pub fn with_arity<F>(arity: usize, f: F) -> Self
    where
        F: Fn(&[Value]) -> FuncResult + Send + Sync + 'static,
    {
        Self {
            arity: Some(arity),
            call: Arc::new(f),
        }
    }

    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    pub fn call(&self, args: &[Value]) -> FuncResult {
        if let Some(want) = self.arity
            && want != args.len()
        {
            return Err(format!(
                "wrong number of args: want {} got {}",
                want,
                args.len()
            ));
        }
        (self.call)(args)
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Func").field("arity", &self.arity).finish()
    }
}

const KEYWORDS: &[&str] = &[
    "if", "else", "end", "range", "with", "template", "define", "true", "false", "nil",
];

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Check that `name` can be called from a template.
pub fn validate_name(name: &str) -> Result<(), String> {
    if !IDENTIFIER.is_match(name) {
        return Err("function name is not a valid identifier".to_string());
    }
    if KEYWORDS.contains(&name) {
        return Err("function name is a reserved keyword".to_string());
    }
    Ok(())
}

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains_key(name)
}

pub(crate) fn builtin(name: &str) -> Option<&'static Func> {
    BUILTINS.get(name)
}

/// Truth value of data: false, 0, "", null and empty collections are false.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Text form of a value as printed by an action.
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => "<no value>".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

static BUILTINS: LazyLock<HashMap<&'static str, Func>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, Func> = HashMap::new();
    m.insert("and", Func::new(and));
    m.insert("or", Func::new(or));
    m.insert("not", Func::with_arity(1, |a| Ok(Value::Bool(!truthy(&a[0])))));
    m.insert("len", Func::with_arity(1, len));
    m.insert("index", Func::new(index));
    m.insert("print", Func::new(|a| Ok(Value::String(print(a)))));
    m.insert("println", Func::new(println));
    m.insert("eq", Func::new(eq));
    m.insert(
        "ne",
        Func::with_arity(2, |a| Ok(Value::Bool(!values_equal(&a[0], &a[1])))),
    );
    m.insert("lt", Func::with_arity(2, |a| compare_with(a, Ordering::is_lt)));
    m.insert("le", Func::with_arity(2, |a| compare_with(a, Ordering::is_le)));
    m.insert("gt", Func::with_arity(2, |a| compare_with(a, Ordering::is_gt)));
    m.insert("ge", Func::with_arity(2, |a| compare_with(a, Ordering::is_ge)));
    m.insert("join", Func::with_arity(2, join));
    m.insert(
        "upper",
        Func::with_arity(1, |a| Ok(Value::String(display(&a[0]).to_uppercase()))),
    );
    m.insert(
        "lower",
        Func::with_arity(1, |a| Ok(Value::String(display(&a[0]).to_lowercase()))),
    );
    m.insert(
        "trim",
        Func::with_arity(1, |a| Ok(Value::String(display(&a[0]).trim().to_string()))),
    );
    m
});

fn and(args: &[Value]) -> FuncResult {
    let Some(last) = args.last() else {
        return Err("and requires at least one argument".to_string());
    };
    Ok(args
        .iter()
        .find(|v| !truthy(v))
        .unwrap_or(last)
        .clone())
}

fn or(args: &[Value]) -> FuncResult {
    let Some(last) = args.last() else {
        return Err("or requires at least one argument".to_string());
    };
    Ok(args.iter().find(|v| truthy(v)).unwrap_or(last).clone())
}

fn len(args: &[Value]) -> FuncResult {
    let n = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::Array(a) => a.len(),
        Value::Object(o) => o.len(),
        other => return Err(format!("len of {}", type_name(other))),
    };
    Ok(Value::from(n))
}

fn index(args: &[Value]) -> FuncResult {
    let Some((first, keys)) = args.split_first() else {
        return Err("index requires at least one argument".to_string());
    };
    let mut current = first.clone();
    for key in keys {
        current = match (&current, key) {
            (Value::Array(items), Value::Number(n)) => {
                let i = n
                    .as_u64()
                    .ok_or_else(|| format!("index out of range: {}", n))?;
                items
                    .get(i as usize)
                    .cloned()
                    .ok_or_else(|| format!("index out of range: {}", i))?
            }
            (Value::Object(map), Value::String(k)) => map.get(k).cloned().unwrap_or(Value::Null),
            (Value::Null, _) => return Err("index of untyped nil".to_string()),
            (container, key) => {
                return Err(format!(
                    "cannot index {} with {}",
                    type_name(container),
                    type_name(key)
                ));
            }
        };
    }
    Ok(current)
}

fn print(args: &[Value]) -> String {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        // Operands are separated by a space only when neither is a string.
        if i > 0 && !args[i - 1].is_string() && !arg.is_string() {
            out.push(' ');
        }
        out.push_str(&display(arg));
    }
    out
}

fn println(args: &[Value]) -> FuncResult {
    let mut out = args.iter().map(display).collect::<Vec<_>>().join(" ");
    out.push('\n');
    Ok(Value::String(out))
}

fn eq(args: &[Value]) -> FuncResult {
    let Some((first, rest)) = args.split_first() else {
        return Err("missing argument for comparison".to_string());
    };
    if rest.is_empty() {
        return Err("missing argument for comparison".to_string());
    }
    Ok(Value::Bool(rest.iter().any(|v| values_equal(first, v))))
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare_with(args: &[Value], accept: fn(Ordering) -> bool) -> FuncResult {
    let ordering = match (&args[0], &args[1]) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y)
                .ok_or_else(|| "incomparable numbers".to_string())?
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (a, b) => {
            return Err(format!(
                "incompatible types for comparison: {} and {}",
                type_name(a),
                type_name(b)
            ));
        }
    };
    Ok(Value::Bool(accept(ordering)))
}

fn join(args: &[Value]) -> FuncResult {
    let sep = display(&args[0]);
    match &args[1] {
        Value::Array(items) => Ok(Value::String(
            items.iter().map(display).collect::<Vec<_>>().join(&sep),
        )),
        other => Err(format!("join of {}", type_name(other))),
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "nil",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}
