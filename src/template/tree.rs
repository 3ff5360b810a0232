//! Parsed template representation.
//!
//! A [`Tree`] is produced once by a [`Parser`](super::Parser) and never
//! mutated afterwards; namespaces share trees through `Arc<Tree>`.

/// The parsed content of one named template.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    pub(crate) name: String,
    pub(crate) root: Vec<Node>,
}

impl Tree {
    pub fn new(name: impl Into<String>, root: Vec<Node>) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }

    /// Name the tree was parsed under.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[Node] {
        &self.root
    }

    /// Whether the tree has no productions besides whitespace.
    ///
    /// Comments and `define` blocks never reach the tree, so a source made
    /// only of those is empty as well.
    pub fn is_empty(&self) -> bool {
        self.root.iter().all(Node::is_empty)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text emitted verbatim.
    Text(String),
    /// `{{pipeline}}`
    Action(Pipeline),
    /// `{{if}}`
    If(Branch),
    /// `{{range}}`
    Range(Branch),
    /// `{{with}}`
    With(Branch),
    /// `{{template "name" pipeline}}`
    Template(TemplateCall),
}

impl Node {
    fn is_empty(&self) -> bool {
        match self {
            Node::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }
}

/// Shared shape of `if`, `range` and `with`.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub line: usize,
    pub pipe: Pipeline,
    pub list: Vec<Node>,
    pub else_list: Option<Vec<Node>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateCall {
    pub line: usize,
    pub name: String,
    pub pipe: Option<Pipeline>,
}

/// Commands chained with `|`; each result is passed as the final argument
/// of the next command.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub line: usize,
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub args: Vec<Arg>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// `.`
    Dot,
    /// `.A.B`
    Field(Vec<String>),
    /// `$` or `$.A.B`
    Root(Vec<String>),
    /// A function name.
    Func(String),
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Nil,
    /// `( pipeline )`
    Pipe(Pipeline),
}
