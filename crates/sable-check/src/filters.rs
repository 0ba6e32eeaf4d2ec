//! Validation of partial-evaluation filters.
//!
//! Filters are evaluated for predicate-style dispatch and must stay pure:
//! no assignments, no short-circuiting logic, no mutable state, no calls
//! other than array indexing. Violations come with a fix suggestion.

use sable_ast::{BinOp, ExprId, ExprKind, UnOp};
use sable_diag::{Category, Diagnostic, Sink};
use sable_types::TypeKind;

use crate::TypeChecker;

impl<S: Sink> TypeChecker<'_, S> {
    /// Type a filter expression as `bool` and validate its shape.
    pub(crate) fn check_filter(&mut self, filter: ExprId) {
        let bool_ty = self.table.bool_type();
        self.coerce(filter, bool_ty);
        self.check_filter_value(filter);
    }

    fn check_filter_value(&mut self, expr: ExprId) -> bool {
        let mut is_logic_and = false;
        let mut is_logic_or = false;
        let mut is_mutable = false;

        match &self.ast.expr(expr).kind {
            ExprKind::Binary { op, lhs, rhs } => {
                is_logic_and = *op == BinOp::LogicAnd;
                is_logic_or = *op == BinOp::LogicOr;
                if !op.is_assign() && !is_logic_and && !is_logic_or {
                    let (lhs, rhs) = (*lhs, *rhs);
                    return self.check_filter_value(lhs) && self.check_filter_value(rhs);
                }
            }
            ExprKind::Unary { op, arg } => {
                if matches!(op, UnOp::Not | UnOp::Plus | UnOp::Minus) {
                    let arg = *arg;
                    return self.check_filter_value(arg);
                }
            }
            ExprKind::Call { callee, arg } => {
                // Array indexing is the only call allowed inside filters.
                let (callee, arg) = (*callee, *arg);
                let indexes_array = self
                    .result
                    .expr_type(callee)
                    .map(|ty| {
                        let (_, stripped) = self.remove_ref(ty);
                        matches!(
                            self.table.kind(stripped),
                            TypeKind::SizedArray { .. } | TypeKind::UnsizedArray { .. }
                        )
                    })
                    .unwrap_or(false);
                return indexes_array
                    && self.check_filter_value(callee)
                    && self.check_filter_value(arg);
            }
            ExprKind::Path(_) => {
                match self.result.expr_type(expr).map(|ty| self.remove_ref(ty)) {
                    Some((Some(addr), _)) if addr.is_mut => is_mutable = true,
                    _ => return true,
                }
            }
            ExprKind::Lit(_) => return true,
            ExprKind::Proj { base, .. } => {
                // Needed to inspect struct and tuple members.
                let base = *base;
                return self.check_filter_value(base);
            }
            _ => {}
        }

        let span = self.ast.expr(expr).span;
        let mut diag = Diagnostic::error(
            Category::ContextMismatch,
            "unsupported expression in filter",
        )
        .at(self.loc(span));
        if is_logic_or {
            diag = diag.with_note("use '|' instead of '||'");
        } else if is_logic_and {
            diag = diag.with_note("use '&' instead of '&&'");
        } else if is_mutable {
            diag = diag.with_note("cannot use mutable variables in filters");
        }
        self.emit(diag);
        false
    }
}
