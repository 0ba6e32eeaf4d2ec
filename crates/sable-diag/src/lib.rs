//! Error reporting and diagnostics for Sable.
//!
//! This crate provides structured diagnostics with source location tracking.
//! Diagnostics are created by the semantic analysis crates and rendered here
//! for display; the `serde` derives let tooling and language-server clients
//! consume them as JSON.
//!
//! The checker reports through the abstract [`Sink`] trait; [`Diagnostics`]
//! is the buffering implementation used by the driver and by tests.

use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Diagnostic severity and categories
// ---------------------------------------------------------------------------

/// How severe a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Note,
}

/// Broad category for diagnostics. Used for filtering and grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Type `T` found where type `U` was expected.
    TypeMismatch,
    /// A described construct found where type `U` was expected.
    ContextMismatch,
    /// A type of the wrong kind (e.g. "integer or floating-point" needed).
    KindMismatch,
    /// Named member not present in a user type.
    UnknownMember,
    /// The type of a construct cannot be synthesized.
    CannotInfer,
    /// Code after a statement that never returns.
    UnreachableCode,
    /// Write target is not a mutable reference.
    MutableExpected,
    /// Wrong number of arguments, elements, or type arguments.
    ArityMismatch,
    /// Disallowed `as` conversion.
    InvalidCast,
    /// Non-primitive element in a SIMD array.
    InvalidSimd,
    /// Trivial pattern expected but refutable given, or vice versa.
    Refutability,
    /// Unsatisfiable type-argument constraint.
    TypeArgConstraint,
    /// Unknown or malformed attribute.
    InvalidAttribute,
    /// Recursive type without indirection.
    UnsizedType,
    /// Value declaration that recursively needs its own type.
    RecursiveDecl,
    /// Statement or cast with no effect (warning).
    NoEffect,
}

impl Category {
    pub const ALL: [Category; 16] = [
        Category::TypeMismatch,
        Category::ContextMismatch,
        Category::KindMismatch,
        Category::UnknownMember,
        Category::CannotInfer,
        Category::UnreachableCode,
        Category::MutableExpected,
        Category::ArityMismatch,
        Category::InvalidCast,
        Category::InvalidSimd,
        Category::Refutability,
        Category::TypeArgConstraint,
        Category::InvalidAttribute,
        Category::UnsizedType,
        Category::RecursiveDecl,
        Category::NoEffect,
    ];

    pub fn all() -> &'static [Category] {
        &Self::ALL
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::TypeMismatch => "type_mismatch",
            Category::ContextMismatch => "context_mismatch",
            Category::KindMismatch => "kind_mismatch",
            Category::UnknownMember => "unknown_member",
            Category::CannotInfer => "cannot_infer",
            Category::UnreachableCode => "unreachable_code",
            Category::MutableExpected => "mutable_expected",
            Category::ArityMismatch => "arity_mismatch",
            Category::InvalidCast => "invalid_cast",
            Category::InvalidSimd => "invalid_simd",
            Category::Refutability => "refutability",
            Category::TypeArgConstraint => "type_arg_constraint",
            Category::InvalidAttribute => "invalid_attribute",
            Category::UnsizedType => "unsized_type",
            Category::RecursiveDecl => "recursive_decl",
            Category::NoEffect => "no_effect",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Category::TypeMismatch => "E0001",
            Category::ContextMismatch => "E0002",
            Category::KindMismatch => "E0003",
            Category::UnknownMember => "E0004",
            Category::CannotInfer => "E0005",
            Category::UnreachableCode => "E0006",
            Category::MutableExpected => "E0007",
            Category::ArityMismatch => "E0008",
            Category::InvalidCast => "E0009",
            Category::InvalidSimd => "E0010",
            Category::Refutability => "E0011",
            Category::TypeArgConstraint => "E0012",
            Category::InvalidAttribute => "E0013",
            Category::UnsizedType => "E0014",
            Category::RecursiveDecl => "E0015",
            Category::NoEffect => "W0001",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Category::TypeMismatch => "Expression type does not match the expected type.",
            Category::ContextMismatch => {
                "A construct of the wrong shape appears where a specific type is expected."
            }
            Category::KindMismatch => "A type of the wrong kind appears in this position.",
            Category::UnknownMember => "A referenced member is not part of the user type.",
            Category::CannotInfer => "The type of this construct cannot be inferred.",
            Category::UnreachableCode => "Code after a statement that never returns.",
            Category::MutableExpected => "The target of a write is not a mutable reference.",
            Category::ArityMismatch => "Wrong number of arguments or elements.",
            Category::InvalidCast => "The source type cannot be cast to the target type.",
            Category::InvalidSimd => "SIMD arrays require a primitive element type.",
            Category::Refutability => {
                "A pattern's refutability does not match what the context requires."
            }
            Category::TypeArgConstraint => {
                "A type-argument constraint derived from the call is unsatisfiable."
            }
            Category::InvalidAttribute => "An attribute is unknown or malformed.",
            Category::UnsizedType => "A recursive type has no pointer indirection.",
            Category::RecursiveDecl => {
                "A value declaration needs its own type while it is being inferred."
            }
            Category::NoEffect => "This code has no observable effect.",
        }
    }
}

// ---------------------------------------------------------------------------
// Source locations (independent of sable-ast's Span)
// ---------------------------------------------------------------------------

/// A source location for diagnostics.
///
/// Uses byte offsets. Callers convert from `sable-ast` spans to this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceLocation {
    pub file_id: u32,
    pub start: u32,
    pub end: u32,
}

// ---------------------------------------------------------------------------
// Text styling hints
// ---------------------------------------------------------------------------

/// Simple styling hints for fragments embedded in messages. The plain
/// renderer quotes; richer sinks may colorize instead.
pub mod style {
    pub fn keyword(text: &str) -> String {
        format!("'{text}'")
    }

    pub fn literal(text: &str) -> String {
        format!("'{text}'")
    }
}

// ---------------------------------------------------------------------------
// Diagnostic
// ---------------------------------------------------------------------------

/// A structured diagnostic message.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    /// Stable diagnostic code (e.g. E0001).
    pub code: Option<String>,
    pub severity: Severity,
    pub category: Category,
    /// Primary message: what went wrong.
    pub message: String,
    /// Where it went wrong.
    pub location: Option<SourceLocation>,
    /// Attached notes (e.g. "after this statement").
    pub notes: Vec<DiagNote>,
}

/// A secondary note attached to a diagnostic.
#[derive(Debug, Clone, Serialize)]
pub struct DiagNote {
    pub location: Option<SourceLocation>,
    pub message: String,
}

impl Diagnostic {
    fn new(severity: Severity, category: Category, message: impl Into<String>) -> Self {
        Self {
            code: Some(category.code().to_string()),
            severity,
            category,
            message: message.into(),
            location: None,
            notes: Vec::new(),
        }
    }

    pub fn error(category: Category, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, category, message)
    }

    pub fn warning(category: Category, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, category, message)
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_note(mut self, message: impl Into<String>) -> Self {
        self.notes.push(DiagNote {
            location: None,
            message: message.into(),
        });
        self
    }

    pub fn with_note_at(mut self, location: SourceLocation, message: impl Into<String>) -> Self {
        self.notes.push(DiagNote {
            location: Some(location),
            message: message.into(),
        });
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
        };
        if let Some(code) = &self.code {
            write!(f, "{prefix}[{code}]: {}", self.message)?;
        } else {
            write!(f, "{prefix}: {}", self.message)?;
        }
        for note in &self.notes {
            write!(f, "\n  note: {}", note.message)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Abstract diagnostics consumer. The checker only ever talks to this.
pub trait Sink {
    fn report(&mut self, diag: Diagnostic);
}

/// Buffering sink with severity counts and an optional error cap.
///
/// Once `max_errors` is reached further errors are dropped; the count keeps
/// incrementing so callers still learn the total.
#[derive(Debug, Default)]
pub struct Diagnostics {
    diags: Vec<Diagnostic>,
    errors: usize,
    warnings: usize,
    max_errors: Option<usize>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_errors(max_errors: usize) -> Self {
        Self {
            max_errors: Some(max_errors),
            ..Self::default()
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.diags.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diags
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diags
    }
}

impl Sink for Diagnostics {
    fn report(&mut self, diag: Diagnostic) {
        match diag.severity {
            Severity::Error => {
                self.errors += 1;
                if let Some(max) = self.max_errors {
                    if self.errors > max {
                        return;
                    }
                }
            }
            Severity::Warning => self.warnings += 1,
            Severity::Note => {}
        }
        self.diags.push(diag);
    }
}

// ---------------------------------------------------------------------------
// Error type for crates that produce diagnostics
// ---------------------------------------------------------------------------

/// Error type wrapping one or more diagnostics.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}", .0.first().map(|d| d.to_string()).unwrap_or_default())]
pub struct DiagnosticError(pub Vec<Diagnostic>);

impl DiagnosticError {
    pub fn single(diag: Diagnostic) -> Self {
        Self(vec![diag])
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLocation {
        SourceLocation {
            file_id: 0,
            start: 10,
            end: 20,
        }
    }

    #[test]
    fn diagnostic_builder() {
        let diag = Diagnostic::error(Category::TypeMismatch, "expected type 'u64', but got 'i32'")
            .at(loc())
            .with_note("removing the last semicolon may solve this issue");

        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.code.as_deref(), Some("E0001"));
        assert_eq!(diag.notes.len(), 1);
    }

    #[test]
    fn diagnostic_display() {
        let diag = Diagnostic::error(Category::UnknownMember, "no member 'z' in 'Vec2'");
        assert!(format!("{diag}").starts_with("error[E0004]: no member 'z'"));
    }

    #[test]
    fn category_metadata_is_stable_and_unique() {
        let mut codes = std::collections::BTreeSet::new();
        for cat in Category::all() {
            assert!(!cat.as_str().is_empty());
            assert!(!cat.description().is_empty());
            assert!(
                codes.insert(cat.code()),
                "duplicate diagnostic code detected: {}",
                cat.code()
            );
        }
    }

    #[test]
    fn error_cap_drops_but_keeps_counting() {
        let mut sink = Diagnostics::with_max_errors(1);
        sink.report(Diagnostic::error(Category::TypeMismatch, "first"));
        sink.report(Diagnostic::error(Category::TypeMismatch, "second"));
        sink.report(Diagnostic::warning(Category::NoEffect, "still recorded"));
        assert_eq!(sink.error_count(), 2);
        assert_eq!(sink.diagnostics().len(), 2);
        assert_eq!(sink.warning_count(), 1);
    }
}
