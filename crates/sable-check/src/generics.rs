//! Local type-argument inference for generic calls.
//!
//! Given the forall at a call site and the argument's (try-coerced) type,
//! each missing type argument is picked from the interval its occurrences
//! in the domain induce, directed by its variance in the codomain. See
//! "Local Type Inference" (Pierce and Turner); the invariant case takes the
//! lower bound, following "Colored Local Type Inference" (Odersky et al.).

use sable_ast::Span;
use sable_diag::Sink;
use sable_types::{TypeId, TypeKind, Variance};

use crate::TypeChecker;

impl<S: Sink> TypeChecker<'_, S> {
    /// Fill the `None` entries of `type_args` from the argument type.
    /// User-supplied entries are validated against the derived bounds.
    /// Returns false if any parameter stays unresolved or unsatisfiable.
    pub(crate) fn infer_type_args(
        &mut self,
        span: Span,
        forall: TypeId,
        arg_type: TypeId,
        type_args: &mut [Option<TypeId>],
    ) -> bool {
        let params = self.table.forall_def(forall).params.clone();
        let Some((dom, codom)) = self.forall_fn(forall) else {
            self.cannot_infer(span, "call to this function");
            return false;
        };
        let bounds = self.table.bounds(dom, arg_type);
        let variance = self.table.variance(codom, true);

        for (&var, &bound) in &bounds {
            let index = params
                .iter()
                .position(|&p| p == var)
                .expect("bound variable not in parameter list");

            // Arguments the caller wrote must fit the derived interval.
            if let Some(given) = type_args[index] {
                if !self.table.subtype(given, bound.upper)
                    || !self.table.subtype(bound.lower, given)
                {
                    self.invalid_constraint(span, var, Some(given), bound);
                    return false;
                }
                continue;
            }

            if !self.table.subtype(bound.lower, bound.upper)
                || matches!(self.table.kind(bound.lower), TypeKind::Top)
                || matches!(self.table.kind(bound.upper), TypeKind::Bottom)
            {
                self.invalid_constraint(span, var, None, bound);
                return false;
            }

            type_args[index] = Some(
                match variance.get(&var).copied().unwrap_or(Variance::Constant) {
                    Variance::Constant | Variance::Covariant | Variance::Invariant => bound.lower,
                    Variance::Contravariant => bound.upper,
                },
            );
        }

        for (index, arg) in type_args.iter().enumerate() {
            if arg.is_none() {
                let var = params[index];
                let message = format!(
                    "cannot infer type argument for type variable '{}'",
                    self.table.display(var)
                );
                self.plain_error(sable_diag::Category::CannotInfer, span, message);
                return false;
            }
        }
        true
    }
}
