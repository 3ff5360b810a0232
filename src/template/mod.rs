//! Named template namespaces.
//!
//! A [`Template`] is the root handle of a namespace: an arena of named
//! [`Unit`]s plus the function tables they share. Units reference each other
//! by name (`{{template "name" .}}`), so everything parsed through one root
//! (including nested `{{define}}` blocks) lands in the same arena.
//!
//! ## Redefinition
//!
//! A name may be associated more than once only while at most one of the
//! trees has content. An empty tree never replaces anything; a non-empty
//! tree replaces an empty one; two non-empty trees are a
//! [`TemplateError::Redefinition`].
//!
//! ## Cloning
//!
//! Cloning a `Template` copies the arena. Trees and functions are shared
//! (they are immutable), membership is not: templates added to the clone
//! never show up in the original.
//!
//! ## Action language
//!
//! The [`DefaultParser`] understands text, comments (`{{/* */}}`), trim
//! markers (`{{- ` and ` -}}`), pipelines over `.`, `.Field`, `$`, literals
//! and functions, `if`/`else if`/`else`, `range`, `with`, `template` and
//! top-level `define`.

mod error;
mod exec;
mod funcs;
mod parse;
mod tree;

use std::{collections::HashMap, io::Write, sync::Arc};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

pub use error::{ExecError, ParseError, TemplateError};
pub use exec::{MAX_RANGE_COUNT, MAX_TEMPLATE_DEPTH};
pub use funcs::{Func, FuncMap, FuncNames, FuncResult, display, truthy, validate_name};
pub use parse::{DefaultParser, Parser};
pub use tree::{Arg, Branch, Command, Node, Pipeline, TemplateCall, Tree};

pub const DEFAULT_LEFT_DELIM: &str = "{{";
pub const DEFAULT_RIGHT_DELIM: &str = "}}";

/// Action delimiters; an empty side means the default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delims {
    left: String,
    right: String,
}

impl Delims {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn left(&self) -> &str {
        if self.left.is_empty() {
            DEFAULT_LEFT_DELIM
        } else {
            &self.left
        }
    }

    pub fn right(&self) -> &str {
        if self.right.is_empty() {
            DEFAULT_RIGHT_DELIM
        } else {
            &self.right
        }
    }
}

/// One named template.
#[derive(Debug, Clone)]
pub struct Unit {
    name: String,
    tree: Option<Arc<Tree>>,
    delims: Delims,
}

impl Unit {
    fn new(name: impl Into<String>, delims: Delims) -> Self {
        Self {
            name: name.into(),
            tree: None,
            delims,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tree(&self) -> Option<&Arc<Tree>> {
        self.tree.as_ref()
    }

    pub fn delims(&self) -> &Delims {
        &self.delims
    }

    /// Delimiters for the next parse of this unit.
    pub fn with_delims(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.delims = Delims::new(left, right);
        self
    }

    /// No tree yet, or a tree without content.
    pub fn is_empty(&self) -> bool {
        self.tree.as_ref().is_none_or(|tree| tree.is_empty())
    }
}

/// Outcome of associating a parsed tree with a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Association {
    /// The tree is now the content of the name.
    Stored,
    /// The incoming tree was empty; the existing unit stays.
    Kept,
}

/// Shared state of a group of templates.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    units: HashMap<String, Unit>,
    syntax_funcs: FuncNames,
    exec_funcs: FuncMap,
}

impl Namespace {
    /// Decides how `tree` would be associated with `name` without mutating.
    pub fn check_association(&self, name: &str, tree: &Tree) -> Result<Association, TemplateError> {
        let Some(existing) = self.units.get(name) else {
            return Ok(Association::Stored);
        };
        if tree.is_empty() {
            return Ok(Association::Kept);
        }
        if !existing.is_empty() {
            return Err(TemplateError::Redefinition {
                name: name.to_string(),
            });
        }
        Ok(Association::Stored)
    }

    /// Registers `unit` with `tree` as its content if the redefinition rules
    /// allow it.
    pub fn associate(
        &mut self,
        mut unit: Unit,
        tree: Arc<Tree>,
    ) -> Result<Association, TemplateError> {
        let association = self.check_association(&unit.name, &tree)?;
        if association == Association::Stored {
            unit.tree = Some(tree);
            self.units.insert(unit.name.clone(), unit);
        }
        Ok(association)
    }

    pub fn lookup(&self, name: &str) -> Option<&Unit> {
        self.units.get(name)
    }

    /// Snapshot of the registered units, in no particular order.
    pub fn units(&self) -> Vec<Unit> {
        self.units.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn syntax_funcs(&self) -> &FuncNames {
        &self.syntax_funcs
    }

    pub fn exec_funcs(&self) -> &FuncMap {
        &self.exec_funcs
    }
}

/// Root handle of a template namespace.
#[derive(Debug)]
pub struct Template {
    name: String,
    delims: Delims,
    ns: Option<Namespace>,
}

impl Template {
    /// A root template; its namespace is created on first use.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            delims: Delims::default(),
            ns: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&Namespace> {
        self.ns.as_ref()
    }

    fn init(&mut self) -> &mut Namespace {
        self.ns.get_or_insert_with(|| {
            trace!(root = %self.name, "Template::init: creating namespace");
            Namespace::default()
        })
    }

    /// A unit sharing this namespace and the current delimiters.
    ///
    /// The unit is not registered; it becomes visible once a parse or
    /// [`Template::add_parse_tree`] associates a tree with it.
    pub fn new_sibling(&mut self, name: impl Into<String>) -> Unit {
        let delims = self.delims.clone();
        self.init();
        Unit::new(name, delims)
    }

    /// Sets the delimiters used by the next parse and inherited by siblings
    /// created afterwards.
    pub fn delims(&mut self, left: impl Into<String>, right: impl Into<String>) -> &mut Self {
        self.delims = Delims::new(left, right);
        self
    }

    /// Adds each function to both tables; later entries overwrite earlier
    /// ones. Nothing is added if any name is invalid.
    pub fn funcs(&mut self, funcs: FuncMap) -> Result<&mut Self, TemplateError> {
        for name in funcs.keys() {
            validate_name(name).map_err(|reason| TemplateError::InvalidFunction {
                name: name.clone(),
                reason,
            })?;
        }
        let ns = self.init();
        for (name, func) in funcs {
            debug!(%name, "Template::funcs: registering function");
            ns.syntax_funcs.insert(name.clone());
            ns.exec_funcs.insert(name, func);
        }
        Ok(self)
    }

    /// Associates an already parsed tree with `name`.
    ///
    /// Follows the same rule as `parse`, so a taken name is not an error by
    /// itself: an empty tree is dropped in favour of the stored one, and only
    /// a second non-empty tree fails with [`TemplateError::Redefinition`].
    pub fn add_parse_tree(
        &mut self,
        name: impl Into<String>,
        tree: Tree,
    ) -> Result<Association, TemplateError> {
        let unit = self.new_sibling(name);
        self.init().associate(unit, Arc::new(tree))
    }

    /// Parses `text` as the content of the root template.
    pub fn parse(&mut self, text: &str) -> Result<&mut Self, TemplateError> {
        self.parse_with(&DefaultParser, text)
    }

    pub fn parse_with<P: Parser + ?Sized>(
        &mut self,
        parser: &P,
        text: &str,
    ) -> Result<&mut Self, TemplateError> {
        let root = Unit::new(self.name.clone(), self.delims.clone());
        self.parse_into(parser, root, text)?;
        Ok(self)
    }

    /// Parses `text` as the content of a sibling from [`Template::new_sibling`].
    pub fn parse_unit(&mut self, unit: Unit, text: &str) -> Result<&mut Self, TemplateError> {
        self.parse_unit_with(&DefaultParser, unit, text)
    }

    pub fn parse_unit_with<P: Parser + ?Sized>(
        &mut self,
        parser: &P,
        unit: Unit,
        text: &str,
    ) -> Result<&mut Self, TemplateError> {
        self.parse_into(parser, unit, text)?;
        Ok(self)
    }

    /// Every tree is checked against the namespace before any is stored, so
    /// a failed parse leaves the namespace as it was.
    fn parse_into<P: Parser + ?Sized>(
        &mut self,
        parser: &P,
        target: Unit,
        text: &str,
    ) -> Result<(), TemplateError> {
        let ns = self.init();
        let trees = parser.parse(&target.name, text, &target.delims, &ns.syntax_funcs)?;

        let mut staged = Vec::with_capacity(trees.len());
        for (name, tree) in trees {
            let association = ns.check_association(&name, &tree)?;
            staged.push((name, tree, association));
        }

        for (name, tree, association) in staged {
            match association {
                Association::Stored => {
                    debug!(%name, empty = tree.is_empty(), "Template::parse: storing tree");
                    let unit = Unit {
                        name: name.clone(),
                        tree: Some(Arc::new(tree)),
                        delims: target.delims.clone(),
                    };
                    ns.units.insert(name, unit);
                }
                Association::Kept => {
                    trace!(%name, "Template::parse: empty tree, keeping existing unit");
                }
            }
        }
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Unit> {
        self.ns.as_ref()?.lookup(name)
    }

    /// Snapshot of every unit in the namespace, the root included once it
    /// has been registered.
    pub fn templates(&self) -> Vec<Unit> {
        self.ns.as_ref().map(Namespace::units).unwrap_or_default()
    }

    /// Content of the root, if parsed.
    pub fn tree(&self) -> Option<&Arc<Tree>> {
        self.lookup(&self.name)?.tree()
    }

    /// Renders the root template.
    pub fn execute<W: Write, T: Serialize + ?Sized>(
        &self,
        writer: &mut W,
        data: &T,
    ) -> Result<(), TemplateError> {
        self.execute_template(writer, &self.name, data)
    }

    /// Renders the template registered as `name`.
    pub fn execute_template<W: Write, T: Serialize + ?Sized>(
        &self,
        writer: &mut W,
        name: &str,
        data: &T,
    ) -> Result<(), TemplateError> {
        let rendered = self.render_template(name, data)?;
        writer.write_all(rendered.as_bytes())?;
        Ok(())
    }

    pub fn render<T: Serialize + ?Sized>(&self, data: &T) -> Result<String, TemplateError> {
        self.render_template(&self.name, data)
    }

    pub fn render_template<T: Serialize + ?Sized>(
        &self,
        name: &str,
        data: &T,
    ) -> Result<String, TemplateError> {
        let data = serde_json::to_value(data)?;
        self.render_value(name, &data)
    }

    /// Renders `name` with data that is already a JSON value.
    pub fn render_value(&self, name: &str, data: &Value) -> Result<String, TemplateError> {
        let Some(ns) = self.ns.as_ref() else {
            return Err(ExecError::new(
                name,
                0,
                format!("{:?} is an incomplete or empty template", name),
            )
            .into());
        };
        Ok(exec::execute(ns, name, data)?)
    }
}

impl Clone for Template {
    /// Copies the namespace; the copy registers the root under its own name
    /// even if it was never parsed.
    fn clone(&self) -> Self {
        let mut ns = self.ns.clone().unwrap_or_default();
        ns.units
            .entry(self.name.clone())
            .or_insert_with(|| Unit::new(self.name.clone(), self.delims.clone()));
        trace!(root = %self.name, units = ns.len(), "Template::clone: copied namespace");
        Self {
            name: self.name.clone(),
            delims: self.delims.clone(),
            ns: Some(ns),
        }
    }
}
