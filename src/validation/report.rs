//! Validation report types for structured error reporting.
//!
//! This module provides rich, structured validation results that can be
//! displayed to users, written to files, or processed programmatically.

use std::fmt;

use serde::Serialize;

/// The result of validating a result array.
///
/// Contains all issues found during validation, categorized by severity.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ValidationReport {
    /// All issues found during validation.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Adds an issue to the report.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Returns the number of errors in the report.
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    /// Returns the number of warnings in the report.
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// Returns true if there are no issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues carrying `code`.
    pub fn with_code(&self, code: IssueCode) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.code == code)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(f, "Validation passed: no issues found");
        }

        writeln!(
            f,
            "Validation completed with {} error(s) and {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;
        writeln!(f)?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// A single validation issue (error or warning).
#[derive(Clone, Debug, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,

    /// A stable code for the issue type.
    pub code: IssueCode,

    pub message: String,

    /// Where in the result array the issue occurred.
    #[serde(serialize_with = "serialize_context")]
    pub context: IssueContext,
}

impl ValidationIssue {
    pub fn new(
        severity: Severity,
        code: IssueCode,
        message: impl Into<String>,
        context: IssueContext,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            context,
        }
    }

    pub fn error(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Error, code, message, context)
    }

    pub fn warning(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Warning, code, message, context)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        write!(
            f,
            "[{}] {:?} in {}: {}",
            severity, self.code, self.context, self.message
        )
    }
}

fn serialize_context<S: serde::Serializer>(
    context: &IssueContext,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(context)
}

/// The severity of a validation issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// The entry loads, but probably not as intended.
    Warning,
    /// The entry is dropped on import.
    Error,
}

/// A stable code identifying the type of validation issue.
///
/// These codes can be used for filtering, ignoring specific issues,
/// or programmatic handling of validation results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IssueCode {
    // Identity
    /// A result has no `id`; it will load as a region of its own.
    MissingId,
    /// A result has an empty `from_name` or `to_name`.
    EmptyName,

    // Control resolution
    /// The `type` is not a known result type.
    UnknownResultType,
    /// The `(from_name, to_name)` pair matches no control/object.
    UnresolvedControl,
    /// The control exists but produces a different result type.
    ControlTypeMismatch,

    // Values
    /// The `value` is missing fields or has fields of the wrong type.
    InvalidValue,
    /// Geometry contains NaN or infinite numbers.
    GeometryNotFinite,
    /// Percent geometry lies outside the 0..100 canvas.
    GeometryOutOfBounds,
    /// Width, height or radius is zero or negative.
    InvalidGeometrySize,
    /// Results sharing one id describe different shape kinds.
    ConflictingShapes,

    // Relations
    /// A relation endpoint does not match any region id.
    DanglingRelation,
    /// A relation links a region to itself or repeats another relation.
    InvalidRelation,
}

/// Where a validation issue occurred.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IssueContext {
    /// Issue with the array as a whole.
    ResultArray,
    /// Issue with the entry at `index`.
    Result { index: usize, id: Option<String> },
    /// Issue with all entries sharing one region id.
    Region { id: String },
    /// Issue with the relation entry at `index`.
    Relation { index: usize },
}

impl fmt::Display for IssueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueContext::ResultArray => write!(f, "result array"),
            IssueContext::Result { index, id: Some(id) } => {
                write!(f, "result[{}] (id {})", index, id)
            }
            IssueContext::Result { index, id: None } => write!(f, "result[{}]", index),
            IssueContext::Region { id } => write!(f, "region {}", id),
            IssueContext::Relation { index } => write!(f, "relation result[{}]", index),
        }
    }
}
