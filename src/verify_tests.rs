use crate::diag::Diagnostic;
use crate::statement::{Statement, Token};
use crate::util::HashMap;
use crate::verify::{apply_subst, decode_proof_chars, CompressedStep};
use crate::verify::CompressedStep::{Ref, Save};
use assert_matches::assert_matches;

fn decode(body: &[u8]) -> Result<Vec<CompressedStep>, Diagnostic> {
    decode_proof_chars(body.iter().copied())
}

#[test]
fn test_decode_single_letters() {
    assert!(decode(b"").unwrap().is_empty());
    assert_eq!(decode(b"A").unwrap(), [Ref(0)]);
    assert_eq!(decode(b"B").unwrap(), [Ref(1)]);
    assert_eq!(decode(b"T").unwrap(), [Ref(19)]);
    assert_eq!(decode(b"Z").unwrap(), [Save]);
}

#[test]
fn test_decode_prefixed_numbers() {
    // U..Y contribute base-5 digits 1..5 above the base-20 final digit
    assert_eq!(decode(b"UA").unwrap(), [Ref(20)]);
    assert_eq!(decode(b"UT").unwrap(), [Ref(39)]);
    assert_eq!(decode(b"VA").unwrap(), [Ref(40)]);
    assert_eq!(decode(b"YT").unwrap(), [Ref(119)]);
    assert_eq!(decode(b"UUA").unwrap(), [Ref(120)]);
}

#[test]
fn test_decode_sequences() {
    assert_eq!(decode(b"AZB").unwrap(), [Ref(0), Save, Ref(1)]);
    assert_eq!(decode(b"ABUAZC").unwrap(), [Ref(0), Ref(1), Ref(20), Save, Ref(2)]);
}

#[test]
fn test_decode_errors() {
    assert_matches!(decode(b"a"), Err(Diagnostic::ProofBadCharacter(b'a')));
    assert_matches!(decode(b"A1"), Err(Diagnostic::ProofBadCharacter(b'1')));
    assert_matches!(decode(b"?"), Err(Diagnostic::ProofIncomplete));
    assert_matches!(decode(b"U"), Err(Diagnostic::ProofTruncatedNumber));
    assert_matches!(decode(b"AUU"), Err(Diagnostic::ProofTruncatedNumber));
}

/// Inverse of the decoder, for the round-trip test below.
fn encode_step(n: usize, out: &mut Vec<u8>) {
    let mut prefix = Vec::new();
    let mut rest = n / 20;
    while rest > 0 {
        prefix.push(b'T' + ((rest - 1) % 5 + 1) as u8);
        rest = (rest - 1) / 5;
    }
    prefix.reverse();
    out.extend(prefix);
    out.push(b'A' + (n % 20) as u8);
}

#[test]
fn test_decode_round_trip() {
    let mut body = Vec::new();
    let mut expected = Vec::new();
    for n in 0..700 {
        encode_step(n, &mut body);
        expected.push(Ref(n));
        if n % 7 == 0 {
            body.push(b'Z');
            expected.push(Save);
        }
    }
    assert_eq!(decode(&body).unwrap(), expected);
}

fn stmt(text: &str) -> Statement {
    text.split_whitespace().map(|sym| sym.as_bytes().into()).collect()
}

fn subst_of(pairs: &[(&str, &str)]) -> HashMap<Token, Statement> {
    pairs
        .iter()
        .map(|&(var, image)| (var.as_bytes().into(), stmt(image)))
        .collect()
}

#[test]
fn test_apply_subst() {
    let subst = subst_of(&[("x", "( a b )"), ("y", "")]);
    assert_eq!(apply_subst(&stmt("|- x = x"), &subst), stmt("|- ( a b ) = ( a b )"));
    // substitution images may be empty
    assert_eq!(apply_subst(&stmt("|- x y"), &subst), stmt("|- ( a b )"));
    // tokens outside the domain pass through untouched
    assert_eq!(apply_subst(&stmt("|- z"), &subst), stmt("|- z"));
    assert_eq!(apply_subst(&[], &subst), stmt(""));
}

#[test]
fn test_apply_subst_is_concatenation_homomorphism() {
    let subst = subst_of(&[("x", "u v"), ("y", "w")]);
    let left = stmt("|- x");
    let right = stmt("y = x");
    let mut joined = left.clone();
    joined.extend(right.iter().cloned());
    let mut piecewise = apply_subst(&left, &subst);
    piecewise.extend(apply_subst(&right, &subst));
    assert_eq!(apply_subst(&joined, &subst), piecewise);
}
