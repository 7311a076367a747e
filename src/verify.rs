//! The proof verifier itself.
//!
//! Checking a proof is a kind of interpretation: there is a stack of known
//! results, and each step is an operation which pushes a hypothesis or pops
//! the hypotheses of a previously recorded assertion, checks them against a
//! substitution, and pushes the substituted conclusion.  A correct proof
//! leaves exactly one statement on the stack, equal to the conclusion of the
//! `$p` statement under verification.
//!
//! Two proof encodings share the step evaluator.  A normal proof is a flat
//! list of labels.  A compressed proof packs its labels into a leading
//! `( ... )` roster and encodes step references as base-5/base-20 character
//! runs, with a `Z` marker to save the current stack top for later reuse;
//! [`decode_proof_chars`] turns the character stream into step references as
//! a pure function, decoupled from execution, which is the natural place to
//! test the scheme.
//!
//! Substitution is literal token replacement with no capture avoidance;
//! that is the Metamath inference rule, not a shortcut.

use crate::diag::Diagnostic;
use crate::scopeck::FrameStack;
use crate::statement::{as_str, format_statement, Assertion, LabelEntry, Statement, Token, TokenPtr};
use crate::util::HashMap;

type Result<T> = std::result::Result<T, Diagnostic>;

// Proofs are very fragile and there are very few situations where errors are
// recoverable, so we bail out using Result on any error.
macro_rules! try_assert {
    ( $cond:expr , $($arg:tt)+ ) => {
        if !$cond {
            return Err($($arg)+);
        }
    }
}

/// One decoded step of a compressed proof body.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CompressedStep {
    /// Reference to entry `k` of the label roster plus saved-step list.
    Ref(usize),
    /// Save the current stack top for later reuse (the `Z` marker).
    Save,
}

/// Decodes the character stream of a compressed proof body.
///
/// `U`-`Y` accumulate a high-order base-5 prefix, `A`-`T` complete a number
/// in base 20, and `Z` marks a save point.  The caller concatenates the body
/// tokens; whitespace between them carries no meaning.
pub fn decode_proof_chars(chars: impl Iterator<Item = u8>) -> Result<Vec<CompressedStep>> {
    let mut steps = Vec::new();
    let mut cur = 0usize;
    for ch in chars {
        match ch {
            b'U'..=b'Y' => {
                cur = 5 * cur + usize::from(ch - b'T');
                // an absurdly long run of prefix characters would overflow
                try_assert!(cur < usize::MAX / 20, Diagnostic::ProofStepOutOfRange(cur));
            }
            b'A'..=b'T' => {
                steps.push(CompressedStep::Ref(20 * cur + usize::from(ch - b'A')));
                cur = 0;
            }
            b'Z' => steps.push(CompressedStep::Save),
            b'?' => return Err(Diagnostic::ProofIncomplete),
            _ => return Err(Diagnostic::ProofBadCharacter(ch)),
        }
    }
    try_assert!(cur == 0, Diagnostic::ProofTruncatedNumber);
    Ok(steps)
}

/// Applies a substitution to a statement by literal token replacement.
///
/// Tokens in the substitution's domain are replaced by their image; all
/// other tokens are copied through.  The result is a fresh statement.
#[must_use]
pub fn apply_subst(stmt: &[Token], subst: &HashMap<Token, Statement>) -> Statement {
    let mut result = Vec::with_capacity(stmt.len());
    for tok in stmt {
        match subst.get(tok) {
            Some(replacement) => result.extend(replacement.iter().cloned()),
            None => result.push(tok.clone()),
        }
    }
    result
}

/// Working state for checking one proof.
struct ProofChecker<'a> {
    /// All statements recorded so far, by label.
    labels: &'a HashMap<Token, LabelEntry>,
    /// The scopes active at the `$p` statement, for disjointness and
    /// hypothesis-label queries.
    scopes: &'a FrameStack,
    /// The stack of partially constructed statements.
    stack: Vec<Statement>,
}

/// Checks that `proof` witnesses `assertion`, which must have been built in
/// the currently active scope.  `label` names the `$p` statement and is used
/// only in diagnostics.
pub(crate) fn verify_proof(
    labels: &HashMap<Token, LabelEntry>,
    scopes: &FrameStack,
    label: TokenPtr<'_>,
    assertion: &Assertion,
    proof: &[Token],
) -> Result<()> {
    log::debug!("verifying proof of {}", as_str(label));
    let mut checker = ProofChecker {
        labels,
        scopes,
        stack: Vec::new(),
    };
    if proof.first().is_some_and(|tok| &**tok == b"(") {
        checker.treat_compressed_proof(assertion, proof)?;
    } else {
        checker.treat_normal_proof(proof)?;
    }
    checker.finalize(assertion)
}

impl ProofChecker<'_> {
    /// Evaluates a normal proof: a flat sequence of labels.
    fn treat_normal_proof(&mut self, proof: &[Token]) -> Result<()> {
        let labels = self.labels;
        let active = self.scopes.active_hypothesis_labels();
        for label in proof {
            try_assert!(&**label != b"?", Diagnostic::ProofIncomplete);
            let entry = labels
                .get(label)
                .ok_or_else(|| Diagnostic::UnknownLabel(label.clone()))?;
            if entry.is_hypothesis() {
                try_assert!(
                    active.contains(label),
                    Diagnostic::InactiveHypothesis(label.clone())
                );
            }
            self.treat_step(label, entry)?;
        }
        Ok(())
    }

    /// Evaluates a compressed proof: a `( ... )` label roster followed by
    /// character-coded step references.
    fn treat_compressed_proof(&mut self, assertion: &Assertion, proof: &[Token]) -> Result<()> {
        let labels = self.labels;
        let close = proof
            .iter()
            .position(|tok| &**tok == b")")
            .ok_or(Diagnostic::ProofUnterminatedRoster)?;

        // The implicit prefix of the roster: the labels of the mandatory
        // hypotheses, floating then essential, in declaration order.
        let mut plabels: Vec<Token> = Vec::new();
        for fhyp in &*assertion.floating {
            let label = self
                .scopes
                .lookup_floating(&fhyp.var)
                .ok_or_else(|| Diagnostic::UnknownLabel(fhyp.var.clone()))?;
            plabels.push(label.clone());
        }
        for ehyp in &*assertion.essential {
            plabels.push(self.scopes.lookup_essential(ehyp)?.clone());
        }
        plabels.extend(proof[1..close].iter().cloned());
        let label_end = plabels.len();
        log::trace!("compressed proof roster has {label_end} labels");

        let body = proof[close + 1..].iter().flat_map(|tok| tok.iter().copied());
        let steps = decode_proof_chars(body)?;

        let mut saved: Vec<Statement> = Vec::new();
        for step in steps {
            match step {
                CompressedStep::Save => {
                    let top = self.stack.last().ok_or(Diagnostic::ProofInvalidSave)?;
                    log::trace!("saving step {}", format_statement(top));
                    saved.push(top.clone());
                }
                CompressedStep::Ref(k) if k < label_end => {
                    let label = &plabels[k];
                    let entry = labels
                        .get(label)
                        .ok_or_else(|| Diagnostic::UnknownLabel(label.clone()))?;
                    self.treat_step(label, entry)?;
                }
                CompressedStep::Ref(k) if k < label_end + saved.len() => {
                    // An already proved step is reused as a rule with no
                    // hypotheses and no disjointness conditions, which
                    // amounts to pushing it back verbatim.
                    let stmt = saved[k - label_end].clone();
                    log::trace!("reusing step {}", format_statement(&stmt));
                    self.stack.push(stmt);
                }
                CompressedStep::Ref(k) => return Err(Diagnostic::ProofStepOutOfRange(k)),
            }
        }
        Ok(())
    }

    /// Evaluates one proof step.  Hypotheses are pushed; assertions consume
    /// their mandatory hypotheses from the stack and push their substituted
    /// conclusion.
    fn treat_step(&mut self, label: &Token, entry: &LabelEntry) -> Result<()> {
        log::trace!("proof step {}", as_str(label));
        match entry {
            LabelEntry::Floating(stmt) | LabelEntry::Essential(stmt) => {
                self.stack.push(stmt.clone());
                Ok(())
            }
            LabelEntry::Axiom(assertion) | LabelEntry::Provable(assertion) => {
                self.apply_assertion(label, assertion)
            }
        }
    }

    fn apply_assertion(&mut self, label: &Token, assertion: &Assertion) -> Result<()> {
        let needed = assertion.hyp_count();
        try_assert!(
            self.stack.len() >= needed,
            Diagnostic::ProofUnderflow(label.clone())
        );
        let mut sp = self.stack.len() - needed;

        let mut subst: HashMap<Token, Statement> = HashMap::default();
        for fhyp in &*assertion.floating {
            let entry = &self.stack[sp];
            try_assert!(
                entry.first() == Some(&fhyp.typecode),
                Diagnostic::StepFloatWrongType(
                    entry.clone(),
                    fhyp.typecode.clone(),
                    fhyp.var.clone()
                )
            );
            subst.insert(fhyp.var.clone(), entry[1..].to_vec());
            sp += 1;
        }

        for ehyp in &*assertion.essential {
            let want = apply_subst(ehyp, &subst);
            let entry = &self.stack[sp];
            try_assert!(
                *entry == want,
                Diagnostic::StepEssenWrong(entry.clone(), want)
            );
            sp += 1;
        }

        for pair in &*assertion.disjoint {
            // mandatory disjoint variables are always in the substitution's
            // domain; they are typed by the assertion's floating hypotheses
            let image_x = &subst[&pair.first];
            let image_y = &subst[&pair.second];
            for x in image_x.iter().filter(|tok| self.scopes.lookup_variable(tok)) {
                for y in image_y.iter().filter(|tok| self.scopes.lookup_variable(tok)) {
                    try_assert!(
                        x != y,
                        Diagnostic::ProofDvViolation(x.clone(), y.clone())
                    );
                    try_assert!(
                        self.scopes.lookup_disjoint(x, y),
                        Diagnostic::ProofDvViolation(x.clone(), y.clone())
                    );
                }
            }
        }

        let base = self.stack.len() - needed;
        self.stack.truncate(base);
        self.stack.push(apply_subst(&assertion.conclusion, &subst));
        Ok(())
    }

    /// After the last step the stack must hold exactly the conclusion.
    fn finalize(&self, assertion: &Assertion) -> Result<()> {
        try_assert!(self.stack.len() <= 1, Diagnostic::ProofExcessEnd);
        let top = self.stack.last().ok_or(Diagnostic::ProofNoSteps)?;
        try_assert!(
            *top == assertion.conclusion,
            Diagnostic::ProofWrongConclusion(top.clone(), assertion.conclusion.clone())
        );
        Ok(())
    }
}
