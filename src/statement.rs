//! The core data model: tokens, math statements, hypotheses, and assertions.
//!
//! Everything a Metamath database contains is ultimately a sequence of
//! whitespace-delimited byte tokens, so the representations here stay close to
//! that: a [`Token`] is an owned byte string, a [`Statement`] is an owned
//! sequence of tokens, and an [`Assertion`] is the four-tuple of disjointness
//! conditions, floating hypotheses, essential hypotheses, and conclusion that
//! the verifier operates on.
//!
//! Statements double as map keys when the scope checker needs to find the
//! label of an active `$e` hypothesis by content.  For that purpose a
//! statement is flattened to a canonical byte encoding by [`statement_key`];
//! the key is a fresh allocation and never aliases the token sequence it was
//! built from.

use itertools::Itertools;
use std::fmt;

/// Semantic type for tokens which have been copied onto the heap.
///
/// Tokens are expected to be non-empty and consist of ASCII graphic
/// characters; the tokenizer never produces anything else.
pub type Token = Box<[u8]>;

/// Semantic type for tokens which have not been copied.
pub type TokenPtr<'a> = &'a [u8];

/// Transmutes a token into a Rust string for display purposes.
#[must_use]
pub fn as_str(ptr: TokenPtr<'_>) -> &str {
    std::str::from_utf8(ptr).expect("tokens are supposed to be ASCII")
}

/// An ordered sequence of math tokens.
pub type Statement = Vec<Token>;

/// Flattens a statement into a canonical byte string usable as a map key.
///
/// Tokens cannot contain whitespace, so a newline separator is unambiguous.
#[must_use]
pub fn statement_key(stmt: &[Token]) -> Token {
    stmt.iter().map(|tok| &**tok).collect::<Vec<_>>().join(&b'\n').into()
}

/// Renders a statement as its source text, tokens separated by single spaces.
#[must_use]
pub fn format_statement(stmt: &[Token]) -> String {
    stmt.iter().map(|tok| as_str(tok)).format(" ").to_string()
}

/// A floating hypothesis: this variable has this typecode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fhyp {
    /// The constant naming the syntactic category.
    pub typecode: Token,
    /// The variable being typed.
    pub var: Token,
}

/// A disjoint-variable pair, stored canonically with `first < second` under
/// lexicographic byte order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DisjointPair {
    /// The lexicographically smaller variable.
    pub first: Token,
    /// The lexicographically larger variable.
    pub second: Token,
}

impl DisjointPair {
    /// Canonicalizes an unordered pair of distinct variables.
    ///
    /// Callers must filter out `x == y` pairs before construction.
    #[must_use]
    pub fn new(x: TokenPtr<'_>, y: TokenPtr<'_>) -> Self {
        assert!(x != y, "disjoint pairs relate distinct variables");
        let (first, second) = if x < y { (x, y) } else { (y, x) };
        DisjointPair {
            first: first.into(),
            second: second.into(),
        }
    }
}

/// The frame of an `$a` or `$p` statement: everything a later proof step
/// needs in order to apply it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Assertion {
    /// Mandatory disjoint-variable conditions, sorted and deduplicated.
    pub disjoint: Box<[DisjointPair]>,
    /// Mandatory floating hypotheses, in declaration order.
    pub floating: Box<[Fhyp]>,
    /// Mandatory essential hypotheses, in declaration order.
    pub essential: Box<[Statement]>,
    /// The conclusion.
    pub conclusion: Statement,
}

impl Assertion {
    /// Number of stack entries an application of this assertion consumes.
    #[inline]
    #[must_use]
    pub fn hyp_count(&self) -> usize {
        self.floating.len() + self.essential.len()
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pair in &*self.disjoint {
            write!(f, "$d {} {} ", as_str(&pair.first), as_str(&pair.second))?;
        }
        for fhyp in &*self.floating {
            write!(f, "$f {} {} ", as_str(&fhyp.typecode), as_str(&fhyp.var))?;
        }
        for ehyp in &*self.essential {
            write!(f, "$e {} ", format_statement(ehyp))?;
        }
        write!(f, "=> {}", format_statement(&self.conclusion))
    }
}

/// A labelled statement in the global label map.
///
/// The proof checker needs to discriminate hypothesis from assertion in one
/// step, so the two shapes are a single tagged type.
#[derive(Clone, Debug)]
pub enum LabelEntry {
    /// A `$f` statement; always two tokens.
    Floating(Statement),
    /// An `$e` statement.
    Essential(Statement),
    /// An `$a` statement with its computed frame.
    Axiom(Assertion),
    /// A `$p` statement with its computed frame.
    Provable(Assertion),
}

impl LabelEntry {
    /// Returns true for the hypothesis variants (`$f`, `$e`).
    #[inline]
    #[must_use]
    pub const fn is_hypothesis(&self) -> bool {
        matches!(self, LabelEntry::Floating(_) | LabelEntry::Essential(_))
    }
}
