//! The low-level token source for Metamath databases.
//!
//! A database is a whitespace-separated token stream spread over one or more
//! files: a `$[ filename $]` directive splices the named file into the stream
//! at the point of the directive, and `$( ... $)` comments are skipped
//! entirely.  [`TokenStream`] presents the flattened, comment-free stream one
//! token at a time, so the database reader never sees either construct.
//!
//! Internally the stream owns a stack of scanners, one per open file, plus a
//! buffer holding the unread tokens of the current physical line (kept in
//! reverse so a pop yields the leftmost unseen token).  When an inclusion is
//! encountered mid-line, the remainder of the line is preserved as a
//! synthetic one-line scanner beneath the included file's scanner, so the
//! outer file resumes exactly where it left off.
//!
//! Comment skipping sits *above* inclusion processing in the layering below,
//! which makes `$[` inside a comment plain text, and makes a comment unable
//! to span the boundary of an included file.
//!
//! Errors at this level are all fatal; no recovery inside a malformed
//! comment or inclusion is attempted.

use crate::diag::Diagnostic;
use crate::statement::{as_str, Token};
use crate::util::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

type Result<T> = std::result::Result<T, Diagnostic>;

/// Splits one physical line into owned tokens.
fn tokenize_line(line: &[u8]) -> Vec<Token> {
    line.split(|byte| byte.is_ascii_whitespace())
        .filter(|tok| !tok.is_empty())
        .map(Token::from)
        .collect()
}

/// One source of physical lines: an open file, or an in-memory block.
#[derive(Debug)]
enum Scanner {
    File {
        reader: BufReader<File>,
        /// Reused between lines to avoid reallocating.
        line: Vec<u8>,
    },
    /// Lines in reverse order, so a pop yields the next line.
    Memory(Vec<Vec<Token>>),
}

impl Scanner {
    fn open(path: &Path) -> Result<Scanner> {
        let file = File::open(path).map_err(|err| {
            Diagnostic::IoError(format!("cannot open `{}`: {err}", path.display()))
        })?;
        Ok(Scanner::File {
            reader: BufReader::new(file),
            line: Vec::new(),
        })
    }

    fn from_bytes(text: &[u8]) -> Scanner {
        let mut lines: Vec<Vec<Token>> = text.split(|&byte| byte == b'\n').map(tokenize_line).collect();
        lines.reverse();
        Scanner::Memory(lines)
    }

    /// Returns the tokens of the next physical line, or `None` when the
    /// scanner is exhausted.
    fn next_line(&mut self) -> Result<Option<Vec<Token>>> {
        match self {
            Scanner::File { reader, line } => {
                line.clear();
                if reader.read_until(b'\n', line)? == 0 {
                    Ok(None)
                } else {
                    Ok(Some(tokenize_line(line)))
                }
            }
            Scanner::Memory(lines) => Ok(lines.pop()),
        }
    }
}

/// A cursor over the flattened token stream of a root file and its
/// transitively included files, with comments removed.
#[derive(Debug)]
pub struct TokenStream {
    /// Stack of open scanners; the last entry is the active one.  Popping a
    /// file scanner drops it, which closes the underlying handle.
    scanners: Vec<Scanner>,
    /// Unread tokens of the active physical line, rightmost first.
    line_buf: Vec<Token>,
    /// Absolute paths already spliced into the stream; a given file is read
    /// at most once per run.
    imported: HashSet<PathBuf>,
}

impl TokenStream {
    /// Creates a token stream rooted at the given file.
    pub fn open(path: &Path) -> Result<TokenStream> {
        let canonical = canonicalize(path)?;
        let scanner = Scanner::open(&canonical)?;
        let mut imported = HashSet::default();
        imported.insert(canonical);
        Ok(TokenStream {
            scanners: vec![scanner],
            line_buf: Vec::new(),
            imported,
        })
    }

    /// Creates a token stream over an in-memory buffer, as used for standard
    /// input.  Inclusion directives are resolved relative to the working
    /// directory.
    #[must_use]
    pub fn from_bytes(text: &[u8]) -> TokenStream {
        TokenStream {
            scanners: vec![Scanner::from_bytes(text)],
            line_buf: Vec::new(),
            imported: HashSet::default(),
        }
    }

    /// Returns the next token of the stream, or `None` at end of input.
    pub fn next(&mut self) -> Result<Option<Token>> {
        let mut tok = self.read_expanded()?;
        while let Some(ref t) = tok {
            if &**t != b"$(" {
                break;
            }
            self.skip_comment()?;
            tok = self.read_expanded()?;
        }
        if let Some(ref t) = tok {
            log::trace!("token: {}", as_str(t));
        }
        Ok(tok)
    }

    /// Reads one raw token, refilling the line buffer and popping exhausted
    /// scanners as needed.  No comment or inclusion handling.
    fn read_raw(&mut self) -> Result<Option<Token>> {
        while self.line_buf.is_empty() {
            let Some(scanner) = self.scanners.last_mut() else {
                return Ok(None);
            };
            match scanner.next_line()? {
                Some(mut tokens) => {
                    tokens.reverse();
                    self.line_buf = tokens;
                }
                None => {
                    self.scanners.pop();
                }
            }
        }
        Ok(self.line_buf.pop())
    }

    /// Reads one token with `$[ filename $]` directives expanded.
    fn read_expanded(&mut self) -> Result<Option<Token>> {
        let mut tok = self.read_raw()?;
        while let Some(ref t) = tok {
            if &**t != b"$[" {
                break;
            }
            let filename = self.read_raw()?.ok_or(Diagnostic::UnclosedInclude)?;
            let close = self.read_raw()?.ok_or(Diagnostic::UnclosedInclude)?;
            if &*close != b"$]" {
                return Err(Diagnostic::UnclosedInclude);
            }
            self.push_include(&filename)?;
            tok = self.read_raw()?;
        }
        Ok(tok)
    }

    /// Splices the named file into the stream, unless its canonical path has
    /// been read before.
    fn push_include(&mut self, filename: &Token) -> Result<()> {
        let canonical = canonicalize(Path::new(as_str(filename)))?;
        if !self.imported.insert(canonical.clone()) {
            log::debug!("skipping already included file {}", canonical.display());
            return Ok(());
        }
        // Preserve the rest of the current line so it resumes after the
        // included file is exhausted.
        if !self.line_buf.is_empty() {
            let mut rest = std::mem::take(&mut self.line_buf);
            rest.reverse();
            self.scanners.push(Scanner::Memory(vec![rest]));
        }
        log::info!("including file {}", canonical.display());
        self.scanners.push(Scanner::open(&canonical)?);
        Ok(())
    }

    /// Skips a comment body after its `$(` opener has been read.
    fn skip_comment(&mut self) -> Result<()> {
        loop {
            let tok = self.read_raw()?.ok_or(Diagnostic::UnclosedComment)?;
            if &*tok == b"$)" {
                return Ok(());
            }
            if contains_marker(&tok, b"$(") || contains_marker(&tok, b"$)") {
                return Err(Diagnostic::NestedComment(tok));
            }
        }
    }
}

/// Checks if a token is a valid statement label.
#[must_use]
pub fn is_valid_label(label: &[u8]) -> bool {
    label
        .iter()
        .all(|&c| c == b'.' || c == b'-' || c == b'_' || c.is_ascii_alphanumeric())
}

fn contains_marker(tok: &[u8], marker: &[u8; 2]) -> bool {
    tok.windows(2).any(|window| window == marker)
}

fn canonicalize(path: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(path).map_err(|err| {
        Diagnostic::IoError(format!("cannot resolve `{}`: {err}", path.display()))
    })
}
