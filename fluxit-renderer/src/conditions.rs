//! Names read by `{% if %}` / `{% elif %}` conditions.
//!
//! Tera evaluates an unknown name in a condition as false instead of failing,
//! so a misspelled flag would silently pick the other branch. The renderer
//! collects every free name a condition reads and checks it against the
//! variable context before rendering.
//!
//! A name is not free when it is bound by the template itself (loop
//! variables, `set` targets, macro arguments) or guarded by an
//! `is defined` / `is undefined` test in the same condition. A name whose
//! first filter is `default` is exempt as well.

use std::collections::HashSet;

use tera::ast::{Expr, ExprVal, Node};

const CONTEXT_NAME: &str = "__tera_context";
const GUARD_TESTS: [&str; 2] = ["defined", "undefined"];

/// Free names read by conditions in `ast`, first occurrence first.
pub(crate) fn free_condition_names(ast: &[Node]) -> Vec<String> {
    let mut globals = HashSet::new();
    collect_set_targets(ast, &mut globals);

    let mut walker = Walker {
        globals,
        scopes: Vec::new(),
        found: Vec::new(),
    };
    walker.nodes(ast);
    walker.found
}

/// The context key an identifier starts with: `a` for `a.b[0]`.
fn root(ident: &str) -> &str {
    ident
        .split(|c| c == '.' || c == '[')
        .next()
        .unwrap_or(ident)
        .trim()
}

fn collect_set_targets(nodes: &[Node], out: &mut HashSet<String>) {
    for node in nodes {
        match node {
            Node::Set(_, set) => {
                out.insert(set.key.clone());
            }
            Node::If(branches, _) => {
                for (_, _, body) in &branches.conditions {
                    collect_set_targets(body, out);
                }
                if let Some((_, body)) = &branches.otherwise {
                    collect_set_targets(body, out);
                }
            }
            Node::Forloop(_, for_loop, _) => {
                collect_set_targets(&for_loop.body, out);
                if let Some(body) = &for_loop.empty_body {
                    collect_set_targets(body, out);
                }
            }
            Node::Block(_, block, _) => collect_set_targets(&block.body, out),
            Node::FilterSection(_, section, _) => collect_set_targets(&section.body, out),
            Node::MacroDefinition(_, def, _) => collect_set_targets(&def.body, out),
            _ => {}
        }
    }
}

/// Names guarded by an `is defined` / `is undefined` test anywhere in the
/// `and`/`or` chain of a condition.
fn guarded_names(expr: &Expr, out: &mut HashSet<String>) {
    match &expr.val {
        ExprVal::Test(test) if GUARD_TESTS.contains(&test.name.as_str()) => {
            out.insert(root(&test.ident).to_string());
        }
        ExprVal::Logic(logic) => {
            guarded_names(&logic.lhs, out);
            guarded_names(&logic.rhs, out);
        }
        _ => {}
    }
}

struct Walker {
    globals: HashSet<String>,
    scopes: Vec<HashSet<String>>,
    found: Vec<String>,
}

impl Walker {
    fn is_bound(&self, name: &str) -> bool {
        name == CONTEXT_NAME
            || self.globals.contains(name)
            || self.scopes.iter().any(|scope| scope.contains(name))
    }

    fn scoped(&mut self, names: HashSet<String>, body: &[Node]) {
        self.scopes.push(names);
        self.nodes(body);
        self.scopes.pop();
    }

    fn nodes(&mut self, nodes: &[Node]) {
        for node in nodes {
            match node {
                Node::If(branches, _) => {
                    for (_, condition, body) in &branches.conditions {
                        let mut guarded = HashSet::new();
                        guarded_names(condition, &mut guarded);
                        self.scopes.push(guarded);
                        self.expr(condition);
                        self.nodes(body);
                        self.scopes.pop();
                    }
                    if let Some((_, body)) = &branches.otherwise {
                        self.nodes(body);
                    }
                }
                Node::Forloop(_, for_loop, _) => {
                    let mut names = HashSet::from(["loop".to_string(), for_loop.value.clone()]);
                    names.extend(for_loop.key.clone());
                    self.scoped(names, &for_loop.body);
                    if let Some(body) = &for_loop.empty_body {
                        self.nodes(body);
                    }
                }
                Node::MacroDefinition(_, def, _) => {
                    self.scoped(def.args.keys().cloned().collect(), &def.body);
                }
                Node::Block(_, block, _) => self.nodes(&block.body),
                Node::FilterSection(_, section, _) => self.nodes(&section.body),
                _ => {}
            }
        }
    }

    fn expr(&mut self, expr: &Expr) {
        let defaulted = expr
            .filters
            .first()
            .map_or(false, |filter| filter.name == "default");
        if !(defaulted && matches!(expr.val, ExprVal::Ident(_))) {
            self.val(&expr.val);
        }
        for filter in &expr.filters {
            for arg in filter.args.values() {
                self.expr(arg);
            }
        }
    }

    fn val(&mut self, val: &ExprVal) {
        match val {
            ExprVal::Ident(ident) => self.ident(ident),
            ExprVal::Math(math) => {
                self.expr(&math.lhs);
                self.expr(&math.rhs);
            }
            ExprVal::Logic(logic) => {
                self.expr(&logic.lhs);
                self.expr(&logic.rhs);
            }
            ExprVal::In(cond) => {
                self.expr(&cond.lhs);
                self.expr(&cond.rhs);
            }
            ExprVal::Test(test) => {
                if !GUARD_TESTS.contains(&test.name.as_str()) {
                    self.ident(&test.ident);
                }
                for arg in &test.args {
                    self.expr(arg);
                }
            }
            ExprVal::MacroCall(call) => {
                for arg in call.args.values() {
                    self.expr(arg);
                }
            }
            ExprVal::FunctionCall(call) => {
                for arg in call.args.values() {
                    self.expr(arg);
                }
            }
            ExprVal::Array(items) => {
                for item in items {
                    self.expr(item);
                }
            }
            ExprVal::StringConcat(concat) => {
                for value in &concat.values {
                    self.val(value);
                }
            }
            ExprVal::String(_) | ExprVal::Int(_) | ExprVal::Float(_) | ExprVal::Bool(_) => {}
        }
    }

    fn ident(&mut self, ident: &str) {
        let name = root(ident);
        if name.is_empty() || self.is_bound(name) {
            return;
        }
        if !self.found.iter().any(|f| f == name) {
            self.found.push(name.to_string());
        }
    }
}
