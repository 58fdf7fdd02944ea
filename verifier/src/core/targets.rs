//! Compile-time checks that the parser leaves to the compiler.
//!
//! The grammar accepts any expression on the left of `=`, `+=`, `:` and
//! `del`, and any generator as a call argument. The interpreter rejects the
//! invalid forms as `SyntaxError` before running anything, so they are
//! rejected here with the interpreter's wording.

use rustpython_ast::Visitor;
use rustpython_parser::ast::{self, Expr, Ranged};

/// First invalid target or bare generator argument in `suite`.
///
/// Returns the message and the byte offset of the offending expression.
/// `source` is the text `suite` was parsed from.
pub fn first_invalid_target(source: &str, suite: ast::Suite) -> Option<(String, usize)> {
    let mut check = TargetCheck {
        source,
        error: None,
    };
    for stmt in suite {
        if check.error.is_some() {
            break;
        }
        check.visit_stmt(stmt);
    }
    check.error
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetKind {
    /// `=`, `for`, `with ... as`, comprehension `for`.
    Store,
    Delete,
    Augmented,
    Annotated,
}

struct TargetCheck<'a> {
    source: &'a str,
    error: Option<(String, usize)>,
}

impl TargetCheck<'_> {
    fn fail(&mut self, message: String, expr: &Expr) {
        if self.error.is_none() {
            self.error = Some((message, usize::from(expr.start())));
        }
    }

    fn check_target(&mut self, target: &Expr, kind: TargetKind) {
        match target {
            Expr::Name(_) | Expr::Attribute(_) | Expr::Subscript(_) => {}
            Expr::Tuple(ast::ExprTuple { elts, .. }) | Expr::List(ast::ExprList { elts, .. }) => {
                match kind {
                    TargetKind::Store | TargetKind::Delete => {
                        for elt in elts {
                            self.check_target(elt, kind);
                        }
                    }
                    TargetKind::Augmented => self.fail(augmented_message(target), target),
                    TargetKind::Annotated => self.fail(
                        format!("only single target (not {}) can be annotated", describe(target)),
                        target,
                    ),
                }
            }
            Expr::Starred(ast::ExprStarred { value, .. }) if kind == TargetKind::Store => {
                self.check_target(value, kind);
            }
            other => {
                let message = match kind {
                    TargetKind::Store => format!("cannot assign to {}", describe(other)),
                    TargetKind::Delete => format!("cannot delete {}", describe(other)),
                    TargetKind::Augmented => augmented_message(other),
                    TargetKind::Annotated => "illegal target for annotation".to_string(),
                };
                self.fail(message, other);
            }
        }
    }

    /// A generator argument without its own parentheses.
    fn is_bare_generator(&self, arg: &Expr) -> bool {
        let Expr::GeneratorExp(generator) = arg else {
            return false;
        };
        let start = usize::from(generator.range.start());
        let end = usize::from(generator.range.end());
        let bytes = self.source.as_bytes();
        let opens = bytes.get(start) == Some(&b'(');
        let closes = end > 0 && bytes.get(end - 1) == Some(&b')');
        !(opens && closes)
    }
}

impl Visitor for TargetCheck<'_> {
    fn visit_stmt_assign(&mut self, node: ast::StmtAssign) {
        for target in &node.targets {
            self.check_target(target, TargetKind::Store);
        }
        self.generic_visit_stmt_assign(node);
    }

    fn visit_stmt_aug_assign(&mut self, node: ast::StmtAugAssign) {
        self.check_target(&node.target, TargetKind::Augmented);
        self.generic_visit_stmt_aug_assign(node);
    }

    fn visit_stmt_ann_assign(&mut self, node: ast::StmtAnnAssign) {
        self.check_target(&node.target, TargetKind::Annotated);
        self.generic_visit_stmt_ann_assign(node);
    }

    fn visit_stmt_delete(&mut self, node: ast::StmtDelete) {
        for target in &node.targets {
            self.check_target(target, TargetKind::Delete);
        }
        self.generic_visit_stmt_delete(node);
    }

    fn visit_stmt_for(&mut self, node: ast::StmtFor) {
        self.check_target(&node.target, TargetKind::Store);
        self.generic_visit_stmt_for(node);
    }

    fn visit_stmt_async_for(&mut self, node: ast::StmtAsyncFor) {
        self.check_target(&node.target, TargetKind::Store);
        self.generic_visit_stmt_async_for(node);
    }

    // The generated walkers stop at the nodes below, so descend by hand.

    fn visit_withitem(&mut self, node: ast::WithItem) {
        if let Some(vars) = &node.optional_vars {
            self.check_target(vars, TargetKind::Store);
        }
        self.visit_expr(node.context_expr);
        if let Some(vars) = node.optional_vars {
            self.visit_expr(*vars);
        }
    }

    fn visit_comprehension(&mut self, node: ast::Comprehension) {
        self.check_target(&node.target, TargetKind::Store);
        self.visit_expr(node.target);
        self.visit_expr(node.iter);
        for condition in node.ifs {
            self.visit_expr(condition);
        }
    }

    fn visit_keyword(&mut self, node: ast::Keyword) {
        self.visit_expr(node.value);
    }

    fn visit_match_case(&mut self, node: ast::MatchCase) {
        if let Some(guard) = node.guard {
            self.visit_expr(*guard);
        }
        for stmt in node.body {
            self.visit_stmt(stmt);
        }
    }

    fn visit_expr_call(&mut self, node: ast::ExprCall) {
        let bare = if node.args.len() + node.keywords.len() > 1 {
            node.args.iter().find(|arg| self.is_bare_generator(arg))
        } else {
            None
        };
        if let Some(generator) = bare {
            self.fail("Generator expression must be parenthesized".to_string(), generator);
        }
        self.generic_visit_expr_call(node);
    }
}

fn augmented_message(target: &Expr) -> String {
    format!(
        "'{}' is an illegal expression for augmented assignment",
        describe(target)
    )
}

/// The interpreter's name for an expression kind in target errors.
fn describe(expr: &Expr) -> &'static str {
    match expr {
        Expr::Call(_) => "function call",
        Expr::Compare(_) => "comparison",
        Expr::Constant(_) => "literal",
        Expr::Lambda(_) => "lambda",
        Expr::NamedExpr(_) => "named expression",
        Expr::IfExp(_) => "conditional expression",
        Expr::Dict(_) => "dict literal",
        Expr::Set(_) => "set display",
        Expr::ListComp(_) => "list comprehension",
        Expr::SetComp(_) => "set comprehension",
        Expr::DictComp(_) => "dict comprehension",
        Expr::GeneratorExp(_) => "generator expression",
        Expr::Await(_) => "await expression",
        Expr::Yield(_) | Expr::YieldFrom(_) => "yield expression",
        Expr::JoinedStr(_) | Expr::FormattedValue(_) => "f-string expression",
        Expr::Attribute(_) => "attribute",
        Expr::Subscript(_) => "subscript",
        Expr::Starred(_) => "starred",
        Expr::Name(_) => "name",
        Expr::List(_) => "list",
        Expr::Tuple(_) => "tuple",
        Expr::Slice(_) => "slice",
        Expr::BoolOp(_) | Expr::BinOp(_) | Expr::UnaryOp(_) => "expression",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustpython_parser::Parse;

    fn check(source: &str) -> Option<(String, usize)> {
        let suite = ast::Suite::parse(source, "t.py").expect("parses");
        first_invalid_target(source, suite)
    }

    fn message(source: &str) -> String {
        check(source).expect("invalid target").0
    }

    #[test]
    fn valid_targets_pass() {
        for source in [
            "a = b = 1\n",
            "a, *rest = [1, 2, 3]\n",
            "obj.attr, items[0] = 1, 2\n",
            "[x, (y, z)] = 1, (2, 3)\n",
            "count += 1\n",
            "obj.total -= 1\n",
            "x: int = 1\n",
            "del a, b[0], c.d, (e, f)\n",
            "for i, (j, k) in pairs:\n    pass\n",
            "with open(p) as (a, b):\n    pass\n",
            "squares = [n * n for n, _ in pairs]\n",
        ] {
            assert_eq!(check(source), None, "{source}");
        }
    }

    #[test]
    fn call_as_assignment_target() {
        assert_eq!(message("f() = 1\n"), "cannot assign to function call");
    }

    #[test]
    fn nested_invalid_store_target() {
        assert_eq!(message("a, 1 = x\n"), "cannot assign to literal");
        assert_eq!(message("for f() in y:\n    pass\n"), "cannot assign to function call");
        assert_eq!(message("with cm() as g():\n    pass\n"), "cannot assign to function call");
        assert_eq!(message("[0 for f() in y]\n"), "cannot assign to function call");
    }

    #[test]
    fn invalid_delete_target() {
        assert_eq!(message("del f()\n"), "cannot delete function call");
    }

    #[test]
    fn invalid_augmented_targets() {
        assert_eq!(
            message("x + 1 += 2\n"),
            "'expression' is an illegal expression for augmented assignment"
        );
        assert_eq!(
            message("(a, b) += 1\n"),
            "'tuple' is an illegal expression for augmented assignment"
        );
    }

    #[test]
    fn invalid_annotated_targets() {
        assert_eq!(
            message("[a]: int = 1\n"),
            "only single target (not list) can be annotated"
        );
    }

    #[test]
    fn bare_generator_with_other_arguments() {
        assert_eq!(
            message("f(x for x in y, 1)\n"),
            "Generator expression must be parenthesized"
        );
        assert_eq!(
            message("f(1, key=(x for x in y), z for z in w)\n"),
            "Generator expression must be parenthesized"
        );
    }

    #[test]
    fn generator_alone_or_parenthesized_passes() {
        assert_eq!(check("f(x for x in y)\n"), None);
        assert_eq!(check("f((x for x in y), 1)\n"), None);
        assert_eq!(check("sorted((x for x in y), key=len)\n"), None);
    }

    #[test]
    fn checks_nested_bodies() {
        let source = "def outer():\n    if flag:\n        f() = 1\n";
        let (text, offset) = check(source).expect("invalid target");
        assert_eq!(text, "cannot assign to function call");
        assert_eq!(&source[offset..offset + 3], "f()");
    }
}
