//! Template rendering with Tera.
//!
//! # Layout Resolution
//!
//! | Item declares         | Template tried                 | Missing |
//! |-----------------------|--------------------------------|---------|
//! | `layout: post`        | `post.html`                    | error   |
//! | `type: note`          | `note.html`, then `page.html`  | error if `page.html` is missing |
//! | section `posts`       | `posts.html`, then `page.html` | error if `page.html` is missing |
//!
//! # Undefined Values
//!
//! Tera fails on any lookup of a value that is not in the context. Under
//! `[build] undefined = "empty"` every use of the missing path gets a leading
//! `default(value="")` filter in a copy of the parsed templates, and the
//! template is rendered again, so the reference prints nothing. The context
//! itself is left alone: `{% if page.cover %}` still sees an absent cover.
//! Under `"strict"` the first missing value aborts the build.

pub mod context;
pub mod listing;

pub use context::ContextBuilder;
pub use listing::Listing;

use crate::{
    config::{SiteConfig, UndefinedPolicy},
    content::ContentItem,
    error::{Error, Result},
    log,
};
use regex::Regex;
use serde_json::Value;
use std::{collections::HashMap, error::Error as _, sync::LazyLock};
use tera::{
    Context, Tera,
    ast::{Expr, ExprVal, FunctionCall, Node},
};

/// Fallback template of content pages.
pub const DEFAULT_LAYOUT: &str = "page";

/// Distinct undefined references substituted within one render.
const MAX_SUBSTITUTIONS: usize = 256;

static UNDEFINED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Variable `([^`]+)` not found in context").unwrap());

pub struct Renderer {
    tera: Tera,
    policy: UndefinedPolicy,
}

impl Renderer {
    /// Load every `*.html` template under `[build] templates`.
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let glob = config.build.templates.join("**").join("*.html");
        let tera = Tera::new(&glob.to_string_lossy()).map_err(Error::TemplateSyntax)?;
        Ok(Self::with_tera(tera, config.build.undefined))
    }

    pub fn with_tera(tera: Tera, policy: UndefinedPolicy) -> Self {
        Self { tera, policy }
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|t| t == name)
    }

    /// Template of a content item; see the module docs.
    pub fn template_for(&self, item: &ContentItem) -> Result<String> {
        if let Some(layout) = &item.front.layout {
            let name = template_name(layout);
            return if self.has_template(&name) {
                Ok(name)
            } else {
                Err(Error::TemplateNotFound {
                    layout: layout.clone(),
                    source_name: item.paths.relative.clone(),
                })
            };
        }

        item.front
            .kind
            .iter()
            .chain(item.section.iter())
            .map(|name| template_name(name))
            .chain(std::iter::once(template_name(DEFAULT_LAYOUT)))
            .find(|name| self.has_template(name))
            .ok_or_else(|| Error::TemplateNotFound {
                layout: DEFAULT_LAYOUT.to_owned(),
                source_name: item.paths.relative.clone(),
            })
    }

    /// Render `template` with `context`, applying the undefined-value policy.
    pub fn render(&self, template: &str, context: Value, source_name: &str) -> Result<String> {
        let ctx = Context::from_value(context).map_err(|err| Error::Render {
            source_name: source_name.to_owned(),
            message: error_chain(&err),
        })?;
        let mut rewritten: Option<Tera> = None;

        for _ in 0..=MAX_SUBSTITUTIONS {
            let tera = rewritten.as_ref().unwrap_or(&self.tera);
            let err = match tera.render(template, &ctx) {
                Ok(html) => return Ok(html),
                Err(err) => err,
            };

            let Some(reference) = undefined_reference(&err) else {
                return Err(Error::Render {
                    source_name: source_name.to_owned(),
                    message: error_chain(&err),
                });
            };

            if self.policy == UndefinedPolicy::Strict {
                return Err(Error::UndefinedReference {
                    reference,
                    source_name: source_name.to_owned(),
                });
            }

            let tera = rewritten.get_or_insert_with(|| self.tera.clone());
            if !default_to_empty(tera, &reference) {
                return Err(Error::Render {
                    source_name: source_name.to_owned(),
                    message: format!("cannot substitute undefined `{reference}`: {}", error_chain(&err)),
                });
            }
            log!("warn"; "{source_name}: `{reference}` is undefined, rendered as empty");
        }

        Err(Error::Render {
            source_name: source_name.to_owned(),
            message: "too many undefined references".to_owned(),
        })
    }
}

/// `post` → `post.html`; names already ending in `.html` are kept.
fn template_name(layout: &str) -> String {
    if layout.ends_with(".html") {
        layout.to_owned()
    } else {
        format!("{layout}.html")
    }
}

/// Full error message including every source.
fn error_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Dotted path of a missing value, if that is what `err` is about.
fn undefined_reference(err: &tera::Error) -> Option<String> {
    let mut current: Option<&dyn std::error::Error> = Some(err);
    while let Some(cause) = current {
        if let Some(caps) = UNDEFINED.captures(&cause.to_string()) {
            return Some(caps[1].to_owned());
        }
        current = cause.source();
    }
    None
}

/// Give every use of `reference` in `tera` a leading `default(value="")`.
///
/// Returns `false` when no use was left to rewrite.
fn default_to_empty(tera: &mut Tera, reference: &str) -> bool {
    let mut changed = false;
    for template in tera.templates.values_mut() {
        changed |= rewrite_nodes(&mut template.ast, reference);
        for block in template.blocks.values_mut() {
            changed |= rewrite_nodes(&mut block.body, reference);
        }
        for (_, block) in template.blocks_definitions.values_mut().flatten() {
            changed |= rewrite_nodes(&mut block.body, reference);
        }
        for definition in template.macros.values_mut() {
            changed |= rewrite_nodes(&mut definition.body, reference);
            for arg in definition.args.values_mut().flatten() {
                changed |= rewrite_expr(arg, reference);
            }
        }
    }
    changed
}

fn empty_default() -> FunctionCall {
    FunctionCall {
        name: "default".to_owned(),
        args: HashMap::from([("value".to_owned(), Expr::new(ExprVal::String(String::new())))]),
    }
}

fn rewrite_nodes(nodes: &mut [Node], reference: &str) -> bool {
    nodes
        .iter_mut()
        .fold(false, |changed, node| rewrite_node(node, reference) | changed)
}

fn rewrite_node(node: &mut Node, reference: &str) -> bool {
    match node {
        Node::VariableBlock(_, expr) => rewrite_expr(expr, reference),
        Node::Set(_, set) => rewrite_expr(&mut set.value, reference),
        Node::FilterSection(_, section, _) => {
            rewrite_args(&mut section.filter.args, reference) | rewrite_nodes(&mut section.body, reference)
        }
        Node::Block(_, block, _) => rewrite_nodes(&mut block.body, reference),
        Node::MacroDefinition(_, definition, _) => rewrite_nodes(&mut definition.body, reference),
        Node::Forloop(_, forloop, _) => {
            let mut changed = rewrite_expr(&mut forloop.container, reference);
            changed |= rewrite_nodes(&mut forloop.body, reference);
            if let Some(body) = &mut forloop.empty_body {
                changed |= rewrite_nodes(body, reference);
            }
            changed
        }
        Node::If(branches, _) => {
            let mut changed = false;
            for (_, condition, body) in &mut branches.conditions {
                changed |= rewrite_expr(condition, reference) | rewrite_nodes(body, reference);
            }
            if let Some((_, body)) = &mut branches.otherwise {
                changed |= rewrite_nodes(body, reference);
            }
            changed
        }
        _ => false,
    }
}

fn rewrite_expr(expr: &mut Expr, reference: &str) -> bool {
    let mut changed = false;
    if matches!(&expr.val, ExprVal::Ident(name) if name.as_str() == reference) && !expr.has_default_filter() {
        expr.filters.insert(0, empty_default());
        changed = true;
    }
    for filter in &mut expr.filters {
        changed |= rewrite_args(&mut filter.args, reference);
    }
    changed | rewrite_val(&mut expr.val, reference)
}

fn rewrite_val(val: &mut ExprVal, reference: &str) -> bool {
    match val {
        ExprVal::Math(math) => rewrite_expr(&mut math.lhs, reference) | rewrite_expr(&mut math.rhs, reference),
        ExprVal::Logic(logic) => rewrite_expr(&mut logic.lhs, reference) | rewrite_expr(&mut logic.rhs, reference),
        ExprVal::In(within) => rewrite_expr(&mut within.lhs, reference) | rewrite_expr(&mut within.rhs, reference),
        ExprVal::Test(test) => test
            .args
            .iter_mut()
            .fold(false, |changed, arg| rewrite_expr(arg, reference) | changed),
        ExprVal::MacroCall(call) => rewrite_args(&mut call.args, reference),
        ExprVal::FunctionCall(call) => rewrite_args(&mut call.args, reference),
        ExprVal::Array(items) => items
            .iter_mut()
            .fold(false, |changed, item| rewrite_expr(item, reference) | changed),
        // Concatenated idents carry no filters; the ident becomes an empty literal.
        ExprVal::StringConcat(concat) => concat.values.iter_mut().fold(false, |changed, value| {
            if matches!(value, ExprVal::Ident(name) if name.as_str() == reference) {
                *value = ExprVal::String(String::new());
                true
            } else {
                changed
            }
        }),
        _ => false,
    }
}

fn rewrite_args(args: &mut HashMap<String, Expr>, reference: &str) -> bool {
    args.values_mut()
        .fold(false, |changed, arg| rewrite_expr(arg, reference) | changed)
}
