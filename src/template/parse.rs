//! Parser boundary and the default action-language parser.
//!
//! The namespace engine only relies on the [`Parser`] trait: source text in,
//! one tree per template name out. [`DefaultParser`] implements the small
//! action language documented on [`crate::template`].

use std::collections::HashMap;

use tracing::trace;

use super::{
    Delims,
    error::ParseError,
    funcs::{FuncNames, is_builtin},
    tree::{Arg, Branch, Command, Node, Pipeline, TemplateCall, Tree},
};

/// Turns source text into the trees it defines.
///
/// The returned map holds the tree for `name` (the top-level content) plus
/// one tree per nested `define`.
pub trait Parser {
    fn parse(
        &self,
        name: &str,
        text: &str,
        delims: &Delims,
        funcs: &FuncNames,
    ) -> Result<HashMap<String, Tree>, ParseError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultParser;

impl Parser for DefaultParser {
    fn parse(
        &self,
        name: &str,
        text: &str,
        delims: &Delims,
        funcs: &FuncNames,
    ) -> Result<HashMap<String, Tree>, ParseError> {
        let items = Lexer::new(name, text, delims).run()?;
        trace!(name, items = items.len(), "parse: lexed");
        TreeBuilder {
            name,
            funcs,
            items,
            pos: 0,
            trees: HashMap::new(),
        }
        .build()
    }
}

// ============================================================
// Lexer
// ============================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LeftParen,
    RightParen,
    Pipe,
    Dot,
    Field(Vec<String>),
    Root(Vec<String>),
    Ident(String),
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Nil,
}

#[derive(Debug)]
enum Item {
    Text(String),
    Action { line: usize, tokens: Vec<Token> },
}

struct Lexer<'a> {
    name: &'a str,
    src: &'a str,
    left: &'a str,
    right: &'a str,
    pos: usize,
    line: usize,
    items: Vec<Item>,
    trim_next: bool,
}

impl<'a> Lexer<'a> {
    fn new(name: &'a str, src: &'a str, delims: &'a Delims) -> Self {
        Self {
            name,
            src,
            left: delims.left(),
            right: delims.right(),
            pos: 0,
            line: 1,
            items: Vec::new(),
            trim_next: false,
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.name, self.line, message)
    }

    fn run(mut self) -> Result<Vec<Item>, ParseError> {
        while self.pos < self.src.len() {
            let rest = &self.src[self.pos..];
            let Some(offset) = rest.find(self.left) else {
                self.push_text(rest);
                self.pos = self.src.len();
                break;
            };
            self.push_text(&rest[..offset]);
            self.pos += offset + self.left.len();
            self.lex_action()?;
        }
        Ok(self.items)
    }

    fn push_text(&mut self, text: &str) {
        self.line += text.matches('\n').count();
        let text = if std::mem::take(&mut self.trim_next) {
            text.trim_start()
        } else {
            text
        };
        if !text.is_empty() {
            self.items.push(Item::Text(text.to_string()));
        }
    }

    /// `{{- ` trims the whitespace before the action.
    fn trim_previous_text(&mut self) {
        if let Some(Item::Text(text)) = self.items.last_mut() {
            let trimmed = text.trim_end().len();
            text.truncate(trimmed);
            if text.is_empty() {
                self.items.pop();
            }
        }
    }

    fn at_right_delim(&self) -> Option<usize> {
        let rest = &self.src[self.pos..];
        if rest.starts_with(self.right) {
            return Some(0);
        }
        // ` -}}`
        let trimmed = rest.trim_start_matches([' ', '\t', '\r', '\n']);
        let ws = rest.len() - trimmed.len();
        if ws > 0
            && let Some(after) = trimmed.strip_prefix('-')
            && after.starts_with(self.right)
        {
            return Some(ws + 1);
        }
        None
    }

    fn close_action(&mut self, marker: usize) {
        let consumed = &self.src[self.pos..self.pos + marker];
        self.line += consumed.matches('\n').count();
        if marker > 0 {
            self.trim_next = true;
        }
        self.pos += marker + self.right.len();
    }

    fn lex_action(&mut self) -> Result<(), ParseError> {
        let line = self.line;
        let rest = &self.src[self.pos..];
        if rest.starts_with('-') && rest[1..].starts_with([' ', '\t', '\r', '\n']) {
            self.trim_previous_text();
            self.pos += 1;
        }

        let body = &self.src[self.pos..];
        let body_trimmed = body.trim_start();
        if body_trimmed.starts_with("/*") {
            return self.lex_comment();
        }

        let mut tokens = Vec::new();
        loop {
            if let Some(marker) = self.at_right_delim() {
                self.close_action(marker);
                break;
            }
            let Some(c) = self.src[self.pos..].chars().next() else {
                return Err(self.error("unclosed action"));
            };
            match c {
                '\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                c if c.is_whitespace() => self.pos += c.len_utf8(),
                '(' => self.single(&mut tokens, Token::LeftParen),
                ')' => self.single(&mut tokens, Token::RightParen),
                '|' => self.single(&mut tokens, Token::Pipe),
                '"' => tokens.push(self.lex_quoted()?),
                '`' => tokens.push(self.lex_raw()?),
                '.' => tokens.push(self.lex_field()?),
                '$' => {
                    self.pos += 1;
                    let path = self.lex_path()?;
                    tokens.push(Token::Root(path));
                }
                c if c.is_ascii_digit() || c == '-' || c == '+' => tokens.push(self.lex_number()?),
                c if c.is_alphabetic() || c == '_' => tokens.push(self.lex_ident()),
                other => return Err(self.error(format!("unexpected {:?} in action", other))),
            }
        }
        self.items.push(Item::Action { line, tokens });
        Ok(())
    }

    fn lex_comment(&mut self) -> Result<(), ParseError> {
        let body = &self.src[self.pos..];
        let Some(end) = body.find("*/") else {
            return Err(self.error("unclosed comment"));
        };
        let comment = &body[..end];
        self.line += comment.matches('\n').count();
        self.pos += end + 2;
        match self.at_right_delim() {
            Some(marker) => {
                self.close_action(marker);
                Ok(())
            }
            None => Err(self.error("comment ends before closing delimiter")),
        }
    }

    fn single(&mut self, tokens: &mut Vec<Token>, token: Token) {
        tokens.push(token);
        self.pos += 1;
    }

    fn lex_quoted(&mut self) -> Result<Token, ParseError> {
        let mut out = String::new();
        let mut chars = self.src[self.pos + 1..].char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += i + 2;
                    return Ok(Token::String(out));
                }
                '\\' => {
                    let escaped = match chars.next() {
                        Some((_, 'n')) => '\n',
                        Some((_, 't')) => '\t',
                        Some((_, 'r')) => '\r',
                        Some((_, '"')) => '"',
                        Some((_, '\\')) => '\\',
                        Some((_, other)) => {
                            return Err(self.error(format!("unknown escape sequence \\{}", other)));
                        }
                        None => break,
                    };
                    out.push(escaped);
                }
                '\n' => break,
                c => out.push(c),
            }
        }
        Err(self.error("unterminated quoted string"))
    }

    fn lex_raw(&mut self) -> Result<Token, ParseError> {
        let body = &self.src[self.pos + 1..];
        let Some(end) = body.find('`') else {
            return Err(self.error("unterminated raw quoted string"));
        };
        let raw = &body[..end];
        self.line += raw.matches('\n').count();
        self.pos += end + 2;
        Ok(Token::String(raw.to_string()))
    }

    fn lex_field(&mut self) -> Result<Token, ParseError> {
        let path = self.lex_path()?;
        if path.is_empty() {
            Ok(Token::Dot)
        } else {
            Ok(Token::Field(path))
        }
    }

    /// Reads `.A.B` segments; a bare `.` yields an empty path.
    fn lex_path(&mut self) -> Result<Vec<String>, ParseError> {
        let mut path = Vec::new();
        while self.src[self.pos..].starts_with('.') {
            self.pos += 1;
            let ident = self.take_while(|c| c.is_alphanumeric() || c == '_');
            if ident.is_empty() {
                if path.is_empty() {
                    break;
                }
                return Err(self.error("bad field syntax"));
            }
            path.push(ident.to_string());
        }
        Ok(path)
    }

    fn lex_number(&mut self) -> Result<Token, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let text = self.take_while(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_');
        let text = format!("{}{}", &self.src[start..start + 1], text);
        let cleaned = text.trim_start_matches('+').replace('_', "");
        if let Ok(n) = cleaned.parse::<i64>() {
            return Ok(Token::Int(n));
        }
        cleaned
            .parse::<f64>()
            .map(Token::Float)
            .map_err(|_| self.error(format!("bad number syntax: {:?}", text)))
    }

    fn lex_ident(&mut self) -> Token {
        let ident = self.take_while(|c| c.is_alphanumeric() || c == '_');
        match ident {
            "true" => Token::Bool(true),
            "false" => Token::Bool(false),
            "nil" => Token::Nil,
            other => Token::Ident(other.to_string()),
        }
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> &'a str {
        let src: &'a str = self.src;
        let rest = &src[self.pos..];
        let len = rest.find(|c: char| !keep(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }
}

// ============================================================
// Tree construction
// ============================================================

enum Terminator {
    End,
    Else(Vec<Token>),
    Eof,
}

struct TreeBuilder<'a> {
    name: &'a str,
    funcs: &'a FuncNames,
    items: Vec<Item>,
    pos: usize,
    trees: HashMap<String, Tree>,
}

impl TreeBuilder<'_> {
    fn build(mut self) -> Result<HashMap<String, Tree>, ParseError> {
        let (root, terminator) = self.parse_list(true)?;
        match terminator {
            Terminator::Eof => {}
            Terminator::End => return Err(self.error(self.last_line(), "unexpected {{end}}")),
            Terminator::Else(_) => return Err(self.error(self.last_line(), "unexpected {{else}}")),
        }
        let tree = Tree::new(self.name, root);
        let name = self.name.to_string();
        self.add_tree(name, tree, 1)?;
        Ok(self.trees)
    }

    fn error(&self, line: usize, message: impl Into<String>) -> ParseError {
        ParseError::new(self.name, line, message)
    }

    fn last_line(&self) -> usize {
        match self.items.get(self.pos.saturating_sub(1)) {
            Some(Item::Action { line, .. }) => *line,
            _ => 1,
        }
    }

    /// Registers a tree produced by this parse; one source text may define a
    /// name twice only if at most one definition has content.
    fn add_tree(&mut self, name: String, tree: Tree, line: usize) -> Result<(), ParseError> {
        match self.trees.get(&name) {
            Some(existing) if !existing.is_empty() && !tree.is_empty() => Err(self.error(
                line,
                format!("template: multiple definition of template {:?}", name),
            )),
            Some(_) if tree.is_empty() => Ok(()),
            _ => {
                self.trees.insert(name, tree);
                Ok(())
            }
        }
    }

    fn parse_list(&mut self, top_level: bool) -> Result<(Vec<Node>, Terminator), ParseError> {
        let mut nodes = Vec::new();
        while self.pos < self.items.len() {
            let item = std::mem::replace(&mut self.items[self.pos], Item::Text(String::new()));
            self.pos += 1;
            let (line, mut tokens) = match item {
                Item::Text(text) => {
                    nodes.push(Node::Text(text));
                    continue;
                }
                Item::Action { line, tokens } => (line, tokens),
            };
            let keyword = match tokens.first() {
                Some(Token::Ident(word)) => word.clone(),
                None => return Err(self.error(line, "missing value for command")),
                _ => String::new(),
            };
            match keyword.as_str() {
                "end" => {
                    if tokens.len() > 1 {
                        return Err(self.error(line, "unexpected arguments in {{end}}"));
                    }
                    return Ok((nodes, Terminator::End));
                }
                "else" => {
                    tokens.remove(0);
                    return Ok((nodes, Terminator::Else(tokens)));
                }
                "define" => {
                    if !top_level {
                        return Err(self.error(line, "{{define}} is only allowed at top level"));
                    }
                    self.parse_define(line, tokens)?;
                }
                "if" | "range" | "with" => {
                    tokens.remove(0);
                    nodes.push(self.parse_branch(&keyword, line, tokens)?);
                }
                "template" => {
                    tokens.remove(0);
                    nodes.push(self.parse_template_call(line, tokens)?);
                }
                _ => nodes.push(Node::Action(self.parse_pipeline(line, &tokens)?)),
            }
        }
        Ok((nodes, Terminator::Eof))
    }

    fn parse_define(&mut self, line: usize, tokens: Vec<Token>) -> Result<(), ParseError> {
        let name = match tokens.as_slice() {
            [_, Token::String(name)] => name.clone(),
            _ => return Err(self.error(line, "{{define}} expects a single quoted name")),
        };
        let (list, terminator) = self.parse_list(false)?;
        if !matches!(terminator, Terminator::End) {
            return Err(self.error(line, format!("unclosed {{{{define {:?}}}}}", name)));
        }
        let tree = Tree::new(name.clone(), list);
        self.add_tree(name, tree, line)
    }

    fn parse_branch(
        &mut self,
        keyword: &str,
        line: usize,
        tokens: Vec<Token>,
    ) -> Result<Node, ParseError> {
        let pipe = self.parse_pipeline(line, &tokens)?;
        let (list, terminator) = self.parse_list(false)?;
        let else_list = match terminator {
            Terminator::End => None,
            Terminator::Eof => {
                return Err(self.error(line, format!("unexpected EOF in {{{{{}}}}}", keyword)));
            }
            Terminator::Else(rest) if rest.is_empty() => {
                let (else_list, terminator) = self.parse_list(false)?;
                if !matches!(terminator, Terminator::End) {
                    return Err(self.error(line, format!("expected {{{{end}}}} for {}", keyword)));
                }
                Some(else_list)
            }
            Terminator::Else(mut rest) => {
                // `{{else if ...}}` nests an if that owns the shared {{end}}.
                if keyword != "if" || rest.first() != Some(&Token::Ident("if".to_string())) {
                    return Err(self.error(line, "unexpected tokens after {{else}}"));
                }
                rest.remove(0);
                Some(vec![self.parse_branch("if", line, rest)?])
            }
        };
        let branch = Branch {
            line,
            pipe,
            list,
            else_list,
        };
        Ok(match keyword {
            "if" => Node::If(branch),
            "range" => Node::Range(branch),
            _ => Node::With(branch),
        })
    }

    fn parse_template_call(&self, line: usize, tokens: Vec<Token>) -> Result<Node, ParseError> {
        let Some((Token::String(name), rest)) = tokens.split_first() else {
            return Err(self.error(line, "{{template}} expects a quoted name"));
        };
        let pipe = if rest.is_empty() {
            None
        } else {
            Some(self.parse_pipeline(line, rest)?)
        };
        Ok(Node::Template(TemplateCall {
            line,
            name: name.clone(),
            pipe,
        }))
    }

    fn parse_pipeline(&self, line: usize, tokens: &[Token]) -> Result<Pipeline, ParseError> {
        let mut pos = 0;
        let pipe = self.pipeline_until(line, tokens, &mut pos, false)?;
        if pos != tokens.len() {
            return Err(self.error(line, "unexpected \")\" in operand"));
        }
        Ok(pipe)
    }

    fn pipeline_until(
        &self,
        line: usize,
        tokens: &[Token],
        pos: &mut usize,
        in_paren: bool,
    ) -> Result<Pipeline, ParseError> {
        let mut commands = Vec::new();
        let mut args = Vec::new();
        loop {
            match tokens.get(*pos) {
                None if in_paren => return Err(self.error(line, "unclosed left paren")),
                None => break,
                Some(Token::RightParen) if in_paren => {
                    *pos += 1;
                    break;
                }
                Some(Token::RightParen) => break,
                Some(Token::Pipe) => {
                    *pos += 1;
                    if args.is_empty() {
                        return Err(self.error(line, "missing command before |"));
                    }
                    commands.push(Command {
                        args: std::mem::take(&mut args),
                    });
                }
                Some(Token::LeftParen) => {
                    *pos += 1;
                    args.push(Arg::Pipe(self.pipeline_until(line, tokens, pos, true)?));
                }
                Some(token) => {
                    *pos += 1;
                    args.push(self.operand(line, token)?);
                }
            }
        }
        if args.is_empty() {
            return Err(self.error(line, "missing value for command"));
        }
        commands.push(Command { args });
        Ok(Pipeline { line, commands })
    }

    fn operand(&self, line: usize, token: &Token) -> Result<Arg, ParseError> {
        Ok(match token {
            Token::Dot => Arg::Dot,
            Token::Field(path) => Arg::Field(path.clone()),
            Token::Root(path) => Arg::Root(path.clone()),
            Token::String(s) => Arg::String(s.clone()),
            Token::Int(n) => Arg::Int(*n),
            Token::Float(f) => Arg::Float(*f),
            Token::Bool(b) => Arg::Bool(*b),
            Token::Nil => Arg::Nil,
            Token::Ident(name) => {
                if !is_builtin(name) && !self.funcs.contains(name) {
                    return Err(self.error(line, format!("function {:?} not defined", name)));
                }
                Arg::Func(name.clone())
            }
            Token::LeftParen | Token::RightParen | Token::Pipe => {
                return Err(self.error(line, "unexpected token in operand"));
            }
        })
    }
}
