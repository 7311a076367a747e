//! The database reader: drives the grammar of top-level statements.
//!
//! The reader pulls tokens from a [`TokenStream`], maintains the pending
//! label slot, and dispatches on the statement keywords `$c $v $f $e $a $p
//! $d ${ $}`.  Declarations are wired into the [`FrameStack`]; each `$a` and
//! `$p` is captured as an [`Assertion`] into the global label map, and `$p`
//! proofs are handed to the verifier as they are read.
//!
//! Reading is strictly single pass.  The first error terminates the run.

use crate::diag::Diagnostic;
use crate::parser::{is_valid_label, TokenStream};
use crate::scopeck::FrameStack;
use crate::statement::{as_str, LabelEntry, Statement, Token};
use crate::util::HashMap;
use crate::verify::verify_proof;

type Result<T> = std::result::Result<T, Diagnostic>;

/// Options which affect how a database is read.
#[derive(Default, Debug, Clone)]
pub struct DbOptions {
    /// Proof verification is disabled until this label is bound.
    pub begin_label: Option<String>,
    /// Reading halts cleanly when this label is seen.
    pub stop_label: Option<String>,
}

/// A Metamath database in the process of being read and verified.
#[derive(Debug)]
pub struct Database {
    scopes: FrameStack,
    labels: HashMap<Token, LabelEntry>,
    begin_label: Option<Token>,
    stop_label: Option<Token>,
    verify_proofs: bool,
    assertion_count: usize,
    verified_count: usize,
}

impl Default for Database {
    fn default() -> Self {
        Database::new(DbOptions::default())
    }
}

impl Database {
    /// Creates an empty database.  With a `begin_label`, proof verification
    /// starts disabled.
    #[must_use]
    pub fn new(options: DbOptions) -> Database {
        Database {
            scopes: FrameStack::default(),
            labels: HashMap::default(),
            verify_proofs: options.begin_label.is_none(),
            begin_label: options.begin_label.map(|label| label.into_bytes().into()),
            stop_label: options.stop_label.map(|label| label.into_bytes().into()),
            assertion_count: 0,
            verified_count: 0,
        }
    }

    /// The recorded statement for a label, if any.
    #[must_use]
    pub fn label_entry(&self, label: &[u8]) -> Option<&LabelEntry> {
        self.labels.get(label)
    }

    /// Number of assertions (`$a` and `$p`) read.
    #[must_use]
    pub fn assertion_count(&self) -> usize {
        self.assertion_count
    }

    /// Number of proofs actually verified.
    #[must_use]
    pub fn verified_count(&self) -> usize {
        self.verified_count
    }

    /// Reads the whole token stream, verifying proofs as they appear.
    pub fn read(&mut self, stream: &mut TokenStream) -> Result<()> {
        let mut pending: Option<Token> = None;
        while let Some(tok) = stream.next()? {
            match &*tok {
                b"$c" => {
                    reject_label(&mut pending)?;
                    for sym in self.read_math("$c", stream, b"$.")? {
                        self.scopes.add_constant(sym)?;
                    }
                }
                b"$v" => {
                    reject_label(&mut pending)?;
                    for sym in self.read_math("$v", stream, b"$.")? {
                        self.scopes.add_variable(sym)?;
                    }
                }
                b"$f" => {
                    let label = pending.take().ok_or(Diagnostic::MissingLabel("$f"))?;
                    let stmt = self.read_math("$f", stream, b"$.")?;
                    if stmt.len() != 2 {
                        return Err(Diagnostic::BadFloating(stmt));
                    }
                    self.scopes
                        .add_floating(stmt[0].clone(), stmt[1].clone(), label.clone())?;
                    self.labels.insert(label, LabelEntry::Floating(stmt));
                }
                b"$e" => {
                    let label = pending.take().ok_or(Diagnostic::MissingLabel("$e"))?;
                    let stmt = self.read_math("$e", stream, b"$.")?;
                    if stmt.is_empty() {
                        return Err(Diagnostic::EmptyMathString("$e"));
                    }
                    self.scopes.add_essential(stmt.clone(), label.clone());
                    self.labels.insert(label, LabelEntry::Essential(stmt));
                }
                b"$a" => {
                    let label = pending.take().ok_or(Diagnostic::MissingLabel("$a"))?;
                    let stmt = self.read_math("$a", stream, b"$.")?;
                    if stmt.is_empty() {
                        return Err(Diagnostic::EmptyMathString("$a"));
                    }
                    let assertion = self.scopes.make_assertion(stmt);
                    self.labels.insert(label, LabelEntry::Axiom(assertion));
                    self.assertion_count += 1;
                }
                b"$p" => {
                    let label = pending.take().ok_or(Diagnostic::MissingLabel("$p"))?;
                    let conclusion = self.read_math("$p", stream, b"$=")?;
                    if conclusion.is_empty() {
                        return Err(Diagnostic::EmptyMathString("$p"));
                    }
                    let proof = read_proof(stream)?;
                    let assertion = self.scopes.make_assertion(conclusion);
                    if self.verify_proofs {
                        verify_proof(&self.labels, &self.scopes, &label, &assertion, &proof)?;
                        self.verified_count += 1;
                    }
                    self.labels.insert(label, LabelEntry::Provable(assertion));
                    self.assertion_count += 1;
                }
                b"$d" => {
                    reject_label(&mut pending)?;
                    let vars = self.read_math("$d", stream, b"$.")?;
                    self.scopes.add_disjoint(&vars);
                }
                b"${" => {
                    reject_label(&mut pending)?;
                    self.scopes.push();
                }
                b"$}" => {
                    reject_label(&mut pending)?;
                    if self.scopes.depth() == 1 {
                        return Err(Diagnostic::UnmatchedCloseGroup);
                    }
                    self.scopes.pop();
                }
                b"$)" => return Err(Diagnostic::StrayCommentEnd),
                _ if !tok.starts_with(b"$") => {
                    if let Some(first) = pending {
                        return Err(Diagnostic::RepeatedLabel(tok, first));
                    }
                    if self.stop_label.as_deref() == Some(&*tok) {
                        log::info!("stopping at label {}", as_str(&tok));
                        return self.finish();
                    }
                    if !is_valid_label(&tok) {
                        return Err(Diagnostic::BadLabel(tok));
                    }
                    if self.labels.contains_key(&tok) {
                        return Err(Diagnostic::DuplicateLabel(tok));
                    }
                    if self.begin_label.as_deref() == Some(&*tok) {
                        log::info!("verification enabled at label {}", as_str(&tok));
                        self.verify_proofs = true;
                    }
                    pending = Some(tok);
                }
                _ => return Err(Diagnostic::UnknownKeyword(tok)),
            }
        }
        if let Some(label) = pending {
            return Err(Diagnostic::SpuriousLabel(label));
        }
        if self.scopes.depth() > 1 {
            return Err(Diagnostic::UnclosedScope);
        }
        self.scopes.pop();
        self.finish()
    }

    fn finish(&self) -> Result<()> {
        log::info!(
            "{} assertions read, {} proofs verified",
            self.assertion_count,
            self.verified_count
        );
        Ok(())
    }

    /// Reads the math tokens of a statement up to the terminator.
    ///
    /// For `$d $e $a $p` statements every token must be an active symbol,
    /// and for `$e $a $p` every variable must be typed by an active `$f`.
    /// `$c $v $f` tokens are returned raw; the first two introduce new
    /// symbols and `$f` is validated by the frame stack when it is added.
    fn read_math(
        &self,
        kind: &'static str,
        stream: &mut TokenStream,
        terminator: &[u8],
    ) -> Result<Statement> {
        let mut stmt = Vec::new();
        loop {
            let tok = stream
                .next()?
                .ok_or(Diagnostic::UnclosedStatement(kind))?;
            if *tok == *terminator {
                break;
            }
            if matches!(kind, "$d" | "$e" | "$a" | "$p") {
                let is_var = self.scopes.lookup_variable(&tok);
                if !is_var && !self.scopes.lookup_constant(&tok) {
                    return Err(Diagnostic::NotActiveSymbol(tok));
                }
                if is_var && kind != "$d" && self.scopes.lookup_floating(&tok).is_none() {
                    return Err(Diagnostic::VariableMissingFloat(tok));
                }
            }
            stmt.push(tok);
        }
        log::debug!(
            "{kind} statement: {}",
            crate::statement::format_statement(&stmt)
        );
        Ok(stmt)
    }
}

/// Reads the proof token list of a `$p` statement, up to `$.`.  Proof tokens
/// are labels (or compressed-proof material), not math symbols, so no
/// activity checks apply.
fn read_proof(stream: &mut TokenStream) -> Result<Vec<Token>> {
    let mut proof = Vec::new();
    loop {
        let tok = stream
            .next()?
            .ok_or(Diagnostic::UnclosedStatement("$p"))?;
        if &*tok == b"$." {
            return Ok(proof);
        }
        proof.push(tok);
    }
}

fn reject_label(pending: &mut Option<Token>) -> Result<()> {
    match pending.take() {
        Some(label) => Err(Diagnostic::SpuriousLabel(label)),
        None => Ok(()),
    }
}
