//! Scoped declaration tracking: the frame stack.
//!
//! Every `${ ... $}` group in a database opens a lexical scope.  Variables,
//! hypotheses, and disjoint-variable conditions declared inside the group
//! become inactive when it closes; constants are global and live until the
//! end of the database.  The [`FrameStack`] records all of this and answers
//! the membership and lookup queries every other component relies on, and it
//! computes the frame (the mandatory hypothesis set) of each assertion via
//! [`FrameStack::make_assertion`].
//!
//! Lookups are linear walks over the active frames.  Nesting depth in real
//! databases is tiny (rarely more than two), so this is not a hotspot.

use crate::diag::Diagnostic;
use crate::statement::{
    statement_key, Assertion, DisjointPair, Fhyp, Statement, Token, TokenPtr,
};
use crate::util::{HashMap, HashSet};
use itertools::Itertools;

type Result<T> = std::result::Result<T, Diagnostic>;

/// The set of declarations active at one lexical scope.
#[derive(Default, Debug)]
struct Frame {
    /// Variables declared at this scope.
    vars: HashSet<Token>,
    /// Canonical disjoint-variable pairs declared at this scope.
    disjoint: HashSet<DisjointPair>,
    /// `$f` hypotheses in declaration order.
    floating: Vec<Fhyp>,
    /// Variable name to `$f` label.
    float_labels: HashMap<Token, Token>,
    /// `$e` statements in declaration order.
    essential: Vec<Statement>,
    /// Canonical statement key to `$e` label; the first label recorded for a
    /// given statement wins.
    essential_labels: HashMap<Token, Token>,
}

/// The stack of active frames, plus the global constant set.
///
/// The file-root frame is pushed at construction and remains until the
/// database reader pops it at end of input, so the stack is never empty
/// while reading is in progress.
#[derive(Debug)]
pub struct FrameStack {
    constants: HashSet<Token>,
    frames: Vec<Frame>,
}

impl Default for FrameStack {
    fn default() -> Self {
        FrameStack {
            constants: HashSet::default(),
            frames: vec![Frame::default()],
        }
    }
}

impl FrameStack {
    /// Opens a new scope.
    pub fn push(&mut self) {
        self.frames.push(Frame::default());
    }

    /// Closes the innermost scope, deactivating its declarations.
    pub fn pop(&mut self) {
        self.frames.pop().expect("pop on an empty frame stack");
    }

    /// Number of open scopes, counting the file-root frame.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    fn top(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("frame stack is never empty")
    }

    /// Records a new global constant.
    pub fn add_constant(&mut self, tok: Token) -> Result<()> {
        if self.constants.contains(&tok) {
            return Err(Diagnostic::ConstantRedeclared(tok));
        }
        if self.lookup_variable(&tok) {
            return Err(Diagnostic::ConstantIsVariable(tok));
        }
        self.constants.insert(tok);
        Ok(())
    }

    /// Records a new variable in the innermost scope.
    pub fn add_variable(&mut self, tok: Token) -> Result<()> {
        if self.lookup_variable(&tok) {
            return Err(Diagnostic::VariableRedeclared(tok));
        }
        if self.constants.contains(&tok) {
            return Err(Diagnostic::VariableIsConstant(tok));
        }
        self.top().vars.insert(tok);
        Ok(())
    }

    /// Records a floating hypothesis `typecode var` in the innermost scope.
    pub fn add_floating(&mut self, typecode: Token, var: Token, label: Token) -> Result<()> {
        if !self.lookup_variable(&var) {
            return Err(Diagnostic::FloatNotVariable(var));
        }
        if !self.lookup_constant(&typecode) {
            return Err(Diagnostic::FloatNotConstant(typecode));
        }
        if self.lookup_floating(&var).is_some() {
            return Err(Diagnostic::FloatRedeclared(var));
        }
        let frame = self.top();
        frame.float_labels.insert(var.clone(), label);
        frame.floating.push(Fhyp { typecode, var });
        Ok(())
    }

    /// Records an essential hypothesis in the innermost scope.
    pub fn add_essential(&mut self, stmt: Statement, label: Token) {
        let frame = self.top();
        frame.essential_labels.entry(statement_key(&stmt)).or_insert(label);
        frame.essential.push(stmt);
    }

    /// Records the canonical pair for every two distinct variables drawn
    /// from the list.  Pairs relating a variable to itself are dropped.
    pub fn add_disjoint(&mut self, vars: &[Token]) {
        let mut pairs = HashSet::default();
        for (x, y) in vars.iter().tuple_combinations() {
            if x == y {
                log::warn!(
                    "$d lists variable {} twice; the self-pair is ignored",
                    crate::statement::as_str(x)
                );
                continue;
            }
            pairs.insert(DisjointPair::new(x, y));
        }
        self.top().disjoint.extend(pairs);
    }

    /// Is the token an active variable in any scope?
    #[must_use]
    pub fn lookup_variable(&self, tok: TokenPtr<'_>) -> bool {
        self.frames.iter().rev().any(|frame| frame.vars.contains(tok))
    }

    /// Is the token a declared constant?
    #[must_use]
    pub fn lookup_constant(&self, tok: TokenPtr<'_>) -> bool {
        self.constants.contains(tok)
    }

    /// Is the canonical pair `{x, y}` active in any scope?
    #[must_use]
    pub fn lookup_disjoint(&self, x: TokenPtr<'_>, y: TokenPtr<'_>) -> bool {
        let pair = DisjointPair::new(x, y);
        self.frames.iter().rev().any(|frame| frame.disjoint.contains(&pair))
    }

    /// The label of the innermost active `$f` typing this variable.
    #[must_use]
    pub fn lookup_floating(&self, var: TokenPtr<'_>) -> Option<&Token> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.float_labels.get(var))
    }

    /// The label of the earliest active `$e` with this statement.
    pub fn lookup_essential(&self, stmt: &[Token]) -> Result<&Token> {
        let key = statement_key(stmt);
        self.frames
            .iter()
            .find_map(|frame| frame.essential_labels.get(&key))
            .ok_or_else(|| Diagnostic::EssentialNotActive(stmt.to_vec()))
    }

    /// The labels of every active hypothesis, `$f` and `$e` alike.
    #[must_use]
    pub fn active_hypothesis_labels(&self) -> HashSet<Token> {
        let mut labels = HashSet::default();
        for frame in &self.frames {
            labels.extend(frame.float_labels.values().cloned());
            labels.extend(frame.essential_labels.values().cloned());
        }
        labels
    }

    /// Builds the assertion frame for a conclusion statement.
    ///
    /// The essential hypotheses are the concatenation of every active
    /// frame's `$e` list, outermost first.  A variable is mandatory if it
    /// appears in the conclusion or in any of those hypotheses; the floating
    /// hypotheses are the active `$f`s of the mandatory variables, in
    /// declaration order, and the disjoint conditions are the active pairs
    /// with both variables mandatory.
    #[must_use]
    pub fn make_assertion(&self, conclusion: Statement) -> Assertion {
        let essential: Vec<Statement> = self
            .frames
            .iter()
            .flat_map(|frame| frame.essential.iter().cloned())
            .collect();

        let mut mandatory: HashSet<Token> = HashSet::default();
        for stmt in essential.iter().chain(std::iter::once(&conclusion)) {
            for tok in stmt {
                if self.lookup_variable(tok) {
                    mandatory.insert(tok.clone());
                }
            }
        }

        let mut disjoint: Vec<DisjointPair> = self
            .frames
            .iter()
            .flat_map(|frame| frame.disjoint.iter())
            .filter(|pair| mandatory.contains(&pair.first) && mandatory.contains(&pair.second))
            .cloned()
            .collect();
        disjoint.sort();
        disjoint.dedup();

        let mut floating = Vec::new();
        for frame in &self.frames {
            for fhyp in &frame.floating {
                if mandatory.remove(&fhyp.var) {
                    floating.push(fhyp.clone());
                }
            }
        }

        let assertion = Assertion {
            disjoint: disjoint.into(),
            floating: floating.into(),
            essential: essential.into(),
            conclusion,
        };
        log::debug!("make assertion: {assertion}");
        assertion
    }
}
