//! Tree execution against `serde_json::Value` data.

use serde_json::{Number, Value};

use super::{
    Namespace,
    error::ExecError,
    funcs::{builtin, display, truthy, type_name},
    tree::{Arg, Branch, Command, Node, Pipeline, TemplateCall},
};

/// Nesting limit for `{{template}}` calls, so a self-referencing template
/// fails instead of exhausting the stack.
pub const MAX_TEMPLATE_DEPTH: usize = 256;

/// Largest integer `range` will count up to.
pub const MAX_RANGE_COUNT: u64 = 1_000_000;

static NULL: Value = Value::Null;

/// Renders the unit registered as `name` into a string.
pub(crate) fn execute(ns: &Namespace, name: &str, data: &Value) -> Result<String, ExecError> {
    let Some(tree) = ns.lookup(name).and_then(|unit| unit.tree()) else {
        return Err(ExecError::new(
            name,
            0,
            format!("{:?} is an incomplete or empty template", name),
        ));
    };
    let mut state = State {
        ns,
        out: String::new(),
        depth: 0,
    };
    let scope = Scope { name, root: data };
    state.walk(&scope, tree.nodes(), data)?;
    Ok(state.out)
}

/// The template being walked and its `$`.
struct Scope<'s> {
    name: &'s str,
    root: &'s Value,
}

struct State<'a> {
    ns: &'a Namespace,
    out: String,
    depth: usize,
}

impl<'a> State<'a> {
    fn walk(&mut self, scope: &Scope<'_>, nodes: &[Node], dot: &Value) -> Result<(), ExecError> {
        for node in nodes {
            match node {
                Node::Text(text) => self.out.push_str(text),
                Node::Action(pipe) => {
                    let value = self.eval_pipeline(scope, pipe, dot)?;
                    self.out.push_str(&display(&value));
                }
                Node::If(branch) => {
                    let value = self.eval_pipeline(scope, &branch.pipe, dot)?;
                    if truthy(&value) {
                        self.walk(scope, &branch.list, dot)?;
                    } else {
                        self.walk_else(scope, branch, dot)?;
                    }
                }
                Node::With(branch) => {
                    let value = self.eval_pipeline(scope, &branch.pipe, dot)?;
                    if truthy(&value) {
                        self.walk(scope, &branch.list, &value)?;
                    } else {
                        self.walk_else(scope, branch, dot)?;
                    }
                }
                Node::Range(branch) => self.walk_range(scope, branch, dot)?,
                Node::Template(call) => self.walk_template(scope, call, dot)?,
            }
        }
        Ok(())
    }

    fn walk_else(
        &mut self,
        scope: &Scope<'_>,
        branch: &Branch,
        dot: &Value,
    ) -> Result<(), ExecError> {
        match &branch.else_list {
            Some(list) => self.walk(scope, list, dot),
            None => Ok(()),
        }
    }

    fn walk_range(
        &mut self,
        scope: &Scope<'_>,
        branch: &Branch,
        dot: &Value,
    ) -> Result<(), ExecError> {
        let value = self.eval_pipeline(scope, &branch.pipe, dot)?;
        let items: Vec<Value> = match value {
            Value::Array(items) => items,
            Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
            Value::Number(n) => return self.walk_count(scope, branch, dot, &n),
            Value::Null | Value::Bool(false) => Vec::new(),
            other => {
                return Err(ExecError::new(
                    scope.name,
                    branch.line,
                    format!("range can't iterate over {}", type_name(&other)),
                ));
            }
        };
        if items.is_empty() {
            return self.walk_else(scope, branch, dot);
        }
        for item in &items {
            self.walk(scope, &branch.list, item)?;
        }
        Ok(())
    }

    /// `range` over an integer visits `0..n`, one value at a time.
    fn walk_count(
        &mut self,
        scope: &Scope<'_>,
        branch: &Branch,
        dot: &Value,
        n: &Number,
    ) -> Result<(), ExecError> {
        let count = match n.as_u64() {
            Some(count) if count <= MAX_RANGE_COUNT => count,
            Some(count) => {
                return Err(ExecError::new(
                    scope.name,
                    branch.line,
                    format!(
                        "range count {} exceeds the limit of {}",
                        count, MAX_RANGE_COUNT
                    ),
                ));
            }
            None => {
                return Err(ExecError::new(
                    scope.name,
                    branch.line,
                    format!("range can't iterate over {}", n),
                ));
            }
        };
        if count == 0 {
            return self.walk_else(scope, branch, dot);
        }
        for i in 0..count {
            self.walk(scope, &branch.list, &Value::from(i))?;
        }
        Ok(())
    }

    fn walk_template(
        &mut self,
        scope: &Scope<'_>,
        call: &TemplateCall,
        dot: &Value,
    ) -> Result<(), ExecError> {
        let data = match &call.pipe {
            Some(pipe) => self.eval_pipeline(scope, pipe, dot)?,
            None => Value::Null,
        };
        let ns: &'a Namespace = self.ns;
        let Some(tree) = ns.lookup(&call.name).and_then(|unit| unit.tree()) else {
            return Err(ExecError::new(
                scope.name,
                call.line,
                format!("no such template {:?}", call.name),
            ));
        };
        if self.depth >= MAX_TEMPLATE_DEPTH {
            return Err(ExecError::new(
                scope.name,
                call.line,
                format!("exceeded maximum template depth ({})", MAX_TEMPLATE_DEPTH),
            ));
        }
        self.depth += 1;
        let inner = Scope {
            name: &call.name,
            root: &data,
        };
        let result = self.walk(&inner, tree.nodes(), &data);
        self.depth -= 1;
        result
    }

    fn eval_pipeline(
        &mut self,
        scope: &Scope<'_>,
        pipe: &Pipeline,
        dot: &Value,
    ) -> Result<Value, ExecError> {
        let mut piped = None;
        for command in &pipe.commands {
            piped = Some(self.eval_command(scope, pipe.line, command, dot, piped.take())?);
        }
        Ok(piped.unwrap_or(Value::Null))
    }

    fn eval_command(
        &mut self,
        scope: &Scope<'_>,
        line: usize,
        command: &Command,
        dot: &Value,
        piped: Option<Value>,
    ) -> Result<Value, ExecError> {
        let Some((first, rest)) = command.args.split_first() else {
            return Err(ExecError::new(scope.name, line, "empty command"));
        };
        if let Arg::Func(name) = first {
            let mut args = rest
                .iter()
                .map(|arg| self.eval_arg(scope, line, arg, dot))
                .collect::<Result<Vec<_>, _>>()?;
            args.extend(piped);
            return self.call(scope, line, name, &args);
        }
        if !rest.is_empty() || piped.is_some() {
            return Err(ExecError::new(
                scope.name,
                line,
                "can't give argument to non-function",
            ));
        }
        self.eval_arg(scope, line, first, dot)
    }

    fn eval_arg(
        &mut self,
        scope: &Scope<'_>,
        line: usize,
        arg: &Arg,
        dot: &Value,
    ) -> Result<Value, ExecError> {
        Ok(match arg {
            Arg::Dot => dot.clone(),
            Arg::Field(path) => resolve(scope, line, dot, path)?,
            Arg::Root(path) => resolve(scope, line, scope.root, path)?,
            Arg::Func(name) => self.call(scope, line, name, &[])?,
            Arg::String(s) => Value::String(s.clone()),
            Arg::Int(n) => Value::from(*n),
            Arg::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Arg::Bool(b) => Value::Bool(*b),
            Arg::Nil => Value::Null,
            Arg::Pipe(pipe) => self.eval_pipeline(scope, pipe, dot)?,
        })
    }

    fn call(
        &self,
        scope: &Scope<'_>,
        line: usize,
        name: &str,
        args: &[Value],
    ) -> Result<Value, ExecError> {
        let func = self
            .ns
            .exec_funcs
            .get(name)
            .or_else(|| builtin(name))
            .ok_or_else(|| {
                ExecError::new(scope.name, line, format!("function {:?} not defined", name))
            })?;
        func.call(args).map_err(|message| {
            ExecError::new(
                scope.name,
                line,
                format!("error calling {}: {}", name, message),
            )
        })
    }
}

fn resolve(
    scope: &Scope<'_>,
    line: usize,
    value: &Value,
    path: &[String],
) -> Result<Value, ExecError> {
    let mut current = value;
    for field in path {
        current = match current {
            Value::Object(map) => map.get(field).unwrap_or(&NULL),
            Value::Null => {
                return Err(ExecError::new(
                    scope.name,
                    line,
                    format!("nil data; no entry for key {:?}", field),
                ));
            }
            other => {
                return Err(ExecError::new(
                    scope.name,
                    line,
                    format!("can't evaluate field {} in type {}", field, type_name(other)),
                ));
            }
        };
    }
    Ok(current.clone())
}
