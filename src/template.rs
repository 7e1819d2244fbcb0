//! Django-style template engine for the bundled UI page.
//!
//! Templates are compiled into the binary with `include_str!`; nothing is
//! read from disk at request time.
//!
//! Workflow:
//! 1. `tokenize_template` splits content into Text, Variable, and Tag tokens.
//! 2. `parse_tokens` and `parse_nodes` build an AST of `Node`.
//! 3. `render_nodes` walks the AST and outputs HTML, resolving variables
//!    (HTML-escaped), `if` conditions and `for` loops.
//!
//! Runtime logging is controlled via `set_display_logs`.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// The single-page product entry UI.
pub const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");

/// Global switch for enabling/disabling internal template logs
static DISPLAY_LOGS: Lazy<AtomicBool> = Lazy::new(|| AtomicBool::new(false));

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)(\{\{.*?\}\}|\{%.*?%\})").unwrap());

/// Enable or disable internal debug logs for the template engine
pub fn set_display_logs(enabled: bool) {
    DISPLAY_LOGS.store(enabled, Ordering::Relaxed);
}

/// Internal debug: logs only if DISPLAY_LOGS is true
macro_rules! tdebug {
    ($($arg:tt)+) => {
        if DISPLAY_LOGS.load(Ordering::Relaxed) {
            debug!($($arg)+);
        }
    }
}

/// Supported value types for template context
#[derive(Clone, Debug, PartialEq)]
pub enum TemplateValue {
    String(String),
    Bool(bool),
    Number(f64),
    List(Vec<TemplateValue>),
    Object(HashMap<String, TemplateValue>),
}

impl TemplateValue {
    /// Convert the value to a string for rendering
    pub fn as_string(&self) -> String {
        match self {
            TemplateValue::String(s) => s.clone(),
            TemplateValue::Bool(b) => b.to_string(),
            TemplateValue::Number(n) => n.to_string(),
            TemplateValue::List(_) | TemplateValue::Object(_) => String::new(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            TemplateValue::String(s) => !s.is_empty(),
            TemplateValue::Bool(b) => *b,
            TemplateValue::Number(n) => *n != 0.0,
            TemplateValue::List(items) => !items.is_empty(),
            TemplateValue::Object(map) => !map.is_empty(),
        }
    }
}

impl fmt::Display for TemplateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl From<&str> for TemplateValue {
    fn from(value: &str) -> Self {
        TemplateValue::String(value.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(value: String) -> Self {
        TemplateValue::String(value)
    }
}

impl From<bool> for TemplateValue {
    fn from(value: bool) -> Self {
        TemplateValue::Bool(value)
    }
}

impl From<usize> for TemplateValue {
    fn from(value: usize) -> Self {
        TemplateValue::Number(value as f64)
    }
}

/// Token types extracted from the template
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Text(String),     // Plain text
    Variable(String), // {{ variable }}
    Tag(String),      // {% tag %}
}

/// AST node types for the template engine
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Variable(String),
    If {
        condition: String,
        then_body: Vec<Node>,
        else_body: Vec<Node>,
    },
    For {
        var_name: String,
        list_name: String,
        body: Vec<Node>,
    },
}

/// Tokenizes the template content into a Vec<Token>
pub fn tokenize_template(content: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut last_end = 0;
    for mat in TOKEN_RE.find_iter(content) {
        let start = mat.start();
        let end = mat.end();
        if start > last_end {
            tokens.push(Token::Text(content[last_end..start].to_string()));
        }
        let m = mat.as_str();
        if m.starts_with("{{") {
            let inner = m
                .trim_start_matches("{{")
                .trim_end_matches("}}")
                .trim()
                .to_string();
            tdebug!("tokenize: Variable '{}'", inner);
            tokens.push(Token::Variable(inner));
        } else {
            let inner = m
                .trim_start_matches("{%")
                .trim_end_matches("%}")
                .trim()
                .to_string();
            tdebug!("tokenize: Tag '{}'", inner);
            tokens.push(Token::Tag(inner));
        }
        last_end = end;
    }
    if last_end < content.len() {
        tokens.push(Token::Text(content[last_end..].to_string()));
    }
    tokens
}

/// Parses a sequence of Token into an AST of Node
pub fn parse_tokens(tokens: &[Token]) -> Vec<Node> {
    let mut idx = 0;
    parse_nodes(tokens, &mut idx, &[])
}

/// Recursive parser: consumes tokens until an `end_tag` is found
fn parse_nodes(tokens: &[Token], idx: &mut usize, end_tags: &[&str]) -> Vec<Node> {
    let mut nodes = Vec::new();
    while *idx < tokens.len() {
        match &tokens[*idx] {
            Token::Text(t) => {
                nodes.push(Node::Text(t.clone()));
                *idx += 1;
            }
            Token::Variable(v) => {
                nodes.push(Node::Variable(v.clone()));
                *idx += 1;
            }
            Token::Tag(tag) => {
                let t = tag.trim();
                if end_tags.contains(&t) {
                    break;
                }
                // Handle if/else/endif
                if let Some(cond) = t.strip_prefix("if ") {
                    *idx += 1;
                    let then_body = parse_nodes(tokens, idx, &["else", "endif"]);
                    let mut else_body = Vec::new();
                    if let Some(Token::Tag(tt)) = tokens.get(*idx) {
                        if tt.trim() == "else" {
                            *idx += 1;
                            else_body = parse_nodes(tokens, idx, &["endif"]);
                        }
                    }
                    *idx += 1; // skip endif
                    nodes.push(Node::If {
                        condition: cond.trim().to_string(),
                        then_body,
                        else_body,
                    });
                    continue;
                }
                // Handle for/endfor
                if let Some(rest) = t.strip_prefix("for ") {
                    let parts: Vec<&str> = rest.split_whitespace().collect();
                    if parts.len() == 3 && parts[1] == "in" {
                        *idx += 1;
                        let body = parse_nodes(tokens, idx, &["endfor"]);
                        *idx += 1; // skip endfor
                        nodes.push(Node::For {
                            var_name: parts[0].to_string(),
                            list_name: parts[2].to_string(),
                            body,
                        });
                        continue;
                    }
                }
                // Unknown tag: skip
                tdebug!("parse: skipping unknown tag '{}'", t);
                *idx += 1;
            }
        }
    }
    nodes
}

/// Resolves a dotted variable path 'a.b.c' within the context
fn resolve_variable<'a>(
    name: &str,
    context: &'a HashMap<String, TemplateValue>,
) -> Option<&'a TemplateValue> {
    let mut current: Option<&TemplateValue> = None;
    for (i, key) in name.split('.').enumerate() {
        if i == 0 {
            current = context.get(key);
        } else if let Some(TemplateValue::Object(map)) = current {
            current = map.get(key);
        } else {
            return None;
        }
    }
    current
}

/// Escape text for inclusion in HTML content or attribute values.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders the AST into HTML string using the context
pub fn render_nodes(nodes: &[Node], context: &HashMap<String, TemplateValue>) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Variable(name) => {
                if let Some(val) = resolve_variable(name, context) {
                    out.push_str(&escape_html(&val.as_string()));
                }
            }
            Node::If {
                condition,
                then_body,
                else_body,
            } => {
                let (negate, name) = match condition.strip_prefix("not ") {
                    Some(rest) => (true, rest.trim()),
                    None => (false, condition.as_str()),
                };
                let truthy = resolve_variable(name, context)
                    .map(TemplateValue::is_truthy)
                    .unwrap_or(false);
                if truthy != negate {
                    out.push_str(&render_nodes(then_body, context));
                } else {
                    out.push_str(&render_nodes(else_body, context));
                }
            }
            Node::For {
                var_name,
                list_name,
                body,
            } => {
                if let Some(TemplateValue::List(items)) = resolve_variable(list_name, context) {
                    for item in items {
                        let mut local = context.clone();
                        local.insert(var_name.clone(), item.clone());
                        out.push_str(&render_nodes(body, &local));
                    }
                }
            }
        }
    }
    out
}

/// Tokenize, parse and render a template source in one go.
pub fn render_str(source: &str, context: &HashMap<String, TemplateValue>) -> String {
    let nodes = parse_tokens(&tokenize_template(source));
    tdebug!("AST: {:?}", nodes);
    render_nodes(&nodes, context)
}
