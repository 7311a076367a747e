//! Datatypes to represent diagnostics emitted while reading and verifying a
//! database.
//!
//! This is an enum-based representation suited for programmatic
//! interpretation and testing; the `Display` impl produces the human-readable
//! message the CLI prints to standard error.  Every diagnostic is fatal to
//! the run: the reader and verifier stop at the first error (proofs are very
//! fragile and there are very few situations where errors are recoverable).

use crate::statement::{as_str, format_statement, Statement, Token};
use std::fmt;
use std::io;

/// List of all diagnostic codes.  For the message text of each, see the
/// `Display` impl.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Diagnostic {
    BadFloating(Statement),
    BadLabel(Token),
    ConstantIsVariable(Token),
    ConstantRedeclared(Token),
    DuplicateLabel(Token),
    EmptyMathString(&'static str),
    EssentialNotActive(Statement),
    FloatNotConstant(Token),
    FloatNotVariable(Token),
    FloatRedeclared(Token),
    InactiveHypothesis(Token),
    IoError(String),
    MissingLabel(&'static str),
    NestedComment(Token),
    NotActiveSymbol(Token),
    ProofBadCharacter(u8),
    ProofDvViolation(Token, Token),
    ProofExcessEnd,
    ProofIncomplete,
    ProofInvalidSave,
    ProofNoSteps,
    ProofStepOutOfRange(usize),
    ProofTruncatedNumber,
    ProofUnderflow(Token),
    ProofUnterminatedRoster,
    ProofWrongConclusion(Statement, Statement),
    RepeatedLabel(Token, Token),
    SpuriousLabel(Token),
    StepEssenWrong(Statement, Statement),
    StepFloatWrongType(Statement, Token, Token),
    StrayCommentEnd,
    UnclosedComment,
    UnclosedInclude,
    UnclosedScope,
    UnclosedStatement(&'static str),
    UnknownKeyword(Token),
    UnknownLabel(Token),
    UnmatchedCloseGroup,
    VariableIsConstant(Token),
    VariableMissingFloat(Token),
    VariableRedeclared(Token),
}
use self::Diagnostic::*;

impl From<io::Error> for Diagnostic {
    fn from(err: io::Error) -> Diagnostic {
        IoError(format!("{err}"))
    }
}

impl std::error::Error for Diagnostic {}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BadFloating(stmt) => write!(
                f,
                "a $f statement must have exactly two math tokens, got `{}`",
                format_statement(stmt)
            ),
            BadLabel(label) => write!(
                f,
                "label `{}` may contain only alphanumeric characters and - _ .",
                as_str(label)
            ),
            ConstantIsVariable(tok) => write!(
                f,
                "constant `{}` is already declared as an active variable",
                as_str(tok)
            ),
            ConstantRedeclared(tok) => {
                write!(f, "constant `{}` is already declared", as_str(tok))
            }
            DuplicateLabel(label) => {
                write!(f, "label `{}` is already defined", as_str(label))
            }
            EmptyMathString(kind) => {
                write!(f, "a {kind} statement must not have an empty math string")
            }
            EssentialNotActive(stmt) => write!(
                f,
                "no active $e hypothesis has the statement `{}`",
                format_statement(stmt)
            ),
            FloatNotConstant(tok) => write!(
                f,
                "typecode `{}` in $f statement is not a declared constant",
                as_str(tok)
            ),
            FloatNotVariable(tok) => write!(
                f,
                "`{}` in $f statement is not an active variable",
                as_str(tok)
            ),
            FloatRedeclared(tok) => write!(
                f,
                "variable `{}` is already typed by an active $f statement",
                as_str(tok)
            ),
            InactiveHypothesis(label) => write!(
                f,
                "label `{}` names a hypothesis which is not active in this scope",
                as_str(label)
            ),
            IoError(err) => write!(f, "I/O error: {err}"),
            MissingLabel(kind) => write!(f, "a {kind} statement requires a label"),
            NestedComment(tok) => write!(
                f,
                "comment marker may not appear inside a comment, in token `{}`",
                as_str(tok)
            ),
            NotActiveSymbol(tok) => {
                write!(f, "token `{}` is not an active symbol", as_str(tok))
            }
            ProofBadCharacter(ch) => write!(
                f,
                "invalid character `{}` in compressed proof",
                char::from(*ch)
            ),
            ProofDvViolation(x, y) => write!(
                f,
                "disjoint variable violation: `{}` and `{}` are not known to be disjoint",
                as_str(x),
                as_str(y)
            ),
            ProofExcessEnd => {
                write!(f, "proof stack has more than one entry at end of proof")
            }
            ProofIncomplete => write!(f, "proof contains a `?` placeholder step"),
            ProofInvalidSave => write!(f, "cannot save a step from an empty proof stack"),
            ProofNoSteps => write!(f, "proof stack is empty at end of proof"),
            ProofStepOutOfRange(step) => write!(
                f,
                "compressed proof step {step} is out of range of the label list and saved steps"
            ),
            ProofTruncatedNumber => {
                write!(f, "compressed proof body ends in the middle of a number")
            }
            ProofUnderflow(label) => write!(
                f,
                "proof stack underflow while applying `{}`",
                as_str(label)
            ),
            ProofUnterminatedRoster => {
                write!(f, "compressed proof label list is missing its closing `)`")
            }
            ProofWrongConclusion(got, want) => write!(
                f,
                "proof proves `{}` but the statement claims `{}`",
                format_statement(got),
                format_statement(want)
            ),
            RepeatedLabel(second, first) => write!(
                f,
                "label `{}` found while label `{}` is still pending",
                as_str(second),
                as_str(first)
            ),
            SpuriousLabel(label) => write!(
                f,
                "label `{}` is not followed by a statement which takes a label",
                as_str(label)
            ),
            StepEssenWrong(entry, want) => write!(
                f,
                "proof stack entry `{}` does not match essential hypothesis `{}`",
                format_statement(entry),
                format_statement(want)
            ),
            StepFloatWrongType(entry, typecode, var) => write!(
                f,
                "proof stack entry `{}` does not match floating hypothesis `{} {}`",
                format_statement(entry),
                as_str(typecode),
                as_str(var)
            ),
            StrayCommentEnd => write!(f, "`$)` found outside any comment"),
            UnclosedComment => write!(f, "comment is still open at end of input"),
            UnclosedInclude => {
                write!(f, "`$[` must be followed by a filename and `$]`")
            }
            UnclosedScope => write!(f, "`${{` scope is still open at end of input"),
            UnclosedStatement(kind) => {
                write!(f, "{kind} statement is still open at end of input")
            }
            UnknownKeyword(tok) => write!(f, "unknown keyword `{}`", as_str(tok)),
            UnknownLabel(label) => {
                write!(f, "no statement is labelled `{}`", as_str(label))
            }
            UnmatchedCloseGroup => write!(f, "`$}}` found without a matching `${{`"),
            VariableIsConstant(tok) => write!(
                f,
                "variable `{}` is already declared as a constant",
                as_str(tok)
            ),
            VariableMissingFloat(tok) => write!(
                f,
                "variable `{}` is not typed by an active $f statement",
                as_str(tok)
            ),
            VariableRedeclared(tok) => {
                write!(f, "variable `{}` is already an active variable", as_str(tok))
            }
        }
    }
}
