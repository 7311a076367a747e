use crate::database::{Database, DbOptions};
use crate::diag::Diagnostic;
use crate::parser::TokenStream;
use crate::statement::LabelEntry;
use assert_matches::assert_matches;

fn read_db_opts(text: &[u8], options: DbOptions) -> Result<Database, Diagnostic> {
    let mut db = Database::new(options);
    let mut stream = TokenStream::from_bytes(text);
    db.read(&mut stream).map(|()| db)
}

fn read_db(text: &[u8]) -> Result<Database, Diagnostic> {
    read_db_opts(text, DbOptions::default())
}

macro_rules! accept_test {
    ($name:ident, $text:expr) => {
        #[test]
        fn $name() {
            read_db($text).unwrap();
        }
    };
}

macro_rules! reject_test {
    ($name:ident, $text:expr, $pat:pat) => {
        #[test]
        fn $name() {
            assert_matches!(read_db($text), Err($pat));
        }
    };
}

accept_test!(test_empty_database, b"");
accept_test!(test_comment_only_database, b"$( just a comment $)");
accept_test!(test_empty_scopes, b"${ ${ $} $}");

const MINIMAL: &[u8] = b"
    $c wff $.  $c |- $.  $v ph $.
    wph $f wff ph $.
    idi.1 $e |- ph $.
    idi $p |- ph $= ( ) B $.
";

#[test]
fn test_minimal_compressed_accept() {
    let db = read_db(MINIMAL).unwrap();
    assert_eq!(db.assertion_count(), 1);
    assert_eq!(db.verified_count(), 1);
    assert_matches!(db.label_entry(b"wph"), Some(LabelEntry::Floating(_)));
    assert_matches!(db.label_entry(b"idi.1"), Some(LabelEntry::Essential(_)));
    assert_matches!(db.label_entry(b"idi"), Some(LabelEntry::Provable(_)));
}

accept_test!(
    test_minimal_normal_accept,
    b"
    $c wff $.  $c |- $.  $v ph $.
    wph $f wff ph $.
    idi.1 $e |- ph $.
    idi $p |- ph $= idi.1 $.
"
);

reject_test!(
    test_undeclared_symbol,
    b"$c a $. foo $a a c $.",
    Diagnostic::NotActiveSymbol(_)
);

#[test]
fn test_untyped_variable() {
    // the variable b is hit before the undeclared c
    assert_matches!(
        read_db(b"$c a $. $v b $. foo $a a b c $."),
        Err(Diagnostic::VariableMissingFloat(tok)) if &*tok == b"b"
    );
}

reject_test!(
    test_duplicate_label,
    b"$c a $.  t $a a $.  t $a a $.",
    Diagnostic::DuplicateLabel(_)
);

// reader structure errors

reject_test!(test_unknown_keyword, b"$q", Diagnostic::UnknownKeyword(_));
reject_test!(test_stray_comment_end, b"$)", Diagnostic::StrayCommentEnd);
reject_test!(test_unmatched_close_group, b"$}", Diagnostic::UnmatchedCloseGroup);
reject_test!(test_unclosed_scope, b"${ $c a $.", Diagnostic::UnclosedScope);
reject_test!(test_unclosed_constant, b"$c a", Diagnostic::UnclosedStatement("$c"));
reject_test!(
    test_unclosed_assertion,
    b"$c a $. foo $a a",
    Diagnostic::UnclosedStatement("$a")
);
reject_test!(
    test_unclosed_proof,
    b"$c a $. foo $p a $= ",
    Diagnostic::UnclosedStatement("$p")
);
reject_test!(test_missing_label, b"$c wff $. $v x $. $f wff x $.", Diagnostic::MissingLabel("$f"));
reject_test!(test_spurious_label, b"foo $c a $.", Diagnostic::SpuriousLabel(_));
reject_test!(test_dangling_label, b"$c a $. foo", Diagnostic::SpuriousLabel(_));
reject_test!(test_repeated_label, b"foo bar $c a $.", Diagnostic::RepeatedLabel(_, _));
reject_test!(test_bad_label, b"fo!o $c a $.", Diagnostic::BadLabel(_));
reject_test!(
    test_bad_floating_length,
    b"$c wff $. $v x $. wx $f wff x x $.",
    Diagnostic::BadFloating(_)
);
reject_test!(
    test_empty_essential,
    b"$c wff $. foo $e $.",
    Diagnostic::EmptyMathString("$e")
);
reject_test!(
    test_double_typing,
    b"$c wff $. $v x $. wx $f wff x $. wx2 $f wff x $.",
    Diagnostic::FloatRedeclared(_)
);

#[test]
fn test_variable_inactive_after_scope() {
    assert_matches!(
        read_db(b"$c wff $. ${ $v x $. wx $f wff x $. $} ax $a wff x $."),
        Err(Diagnostic::NotActiveSymbol(tok)) if &*tok == b"x"
    );
}

// proof checking

const AX_PREAMBLE: &[u8] = b"
    $c |- wff $.
    $v x y $.
    wx $f wff x $.
    wy $f wff y $.
    ${ idi.1 $e |- x $. idi $a |- x $. $}
    ax $a |- x $.
";

fn with_preamble(rest: &[u8]) -> Vec<u8> {
    let mut text = AX_PREAMBLE.to_vec();
    text.extend_from_slice(rest);
    text
}

#[test]
fn test_essential_hypothesis_accept() {
    read_db(&with_preamble(b"good $p |- x $= wx wx ax idi $.")).unwrap();
}

#[test]
fn test_essential_hypothesis_mismatch() {
    assert_matches!(
        read_db(&with_preamble(b"bad $p |- y $= wy wx ax idi $.")),
        Err(Diagnostic::StepEssenWrong(_, _))
    );
}

#[test]
fn test_float_typecode_mismatch() {
    assert_matches!(
        read_db(&with_preamble(b"bad $p |- x $= wx ax ax $.")),
        Err(Diagnostic::StepFloatWrongType(_, _, _))
    );
}

#[test]
fn test_proof_stack_underflow() {
    assert_matches!(
        read_db(&with_preamble(b"bad $p |- x $= ax $.")),
        Err(Diagnostic::ProofUnderflow(label)) if &*label == b"ax"
    );
}

#[test]
fn test_unknown_proof_label() {
    assert_matches!(
        read_db(&with_preamble(b"bad $p |- x $= nope $.")),
        Err(Diagnostic::UnknownLabel(_))
    );
}

#[test]
fn test_inactive_hypothesis() {
    // idi.1 went out of scope with its group
    assert_matches!(
        read_db(&with_preamble(b"bad $p |- x $= idi.1 $.")),
        Err(Diagnostic::InactiveHypothesis(_))
    );
}

#[test]
fn test_incomplete_proof() {
    assert_matches!(
        read_db(&with_preamble(b"bad $p |- x $= ? $.")),
        Err(Diagnostic::ProofIncomplete)
    );
}

#[test]
fn test_final_stack_excess() {
    assert_matches!(
        read_db(&with_preamble(b"bad $p |- x $= wx wx $.")),
        Err(Diagnostic::ProofExcessEnd)
    );
}

#[test]
fn test_final_stack_wrong_conclusion() {
    assert_matches!(
        read_db(&with_preamble(b"bad $p |- x $= wx $.")),
        Err(Diagnostic::ProofWrongConclusion(_, _))
    );
}

#[test]
fn test_final_stack_empty() {
    assert_matches!(
        read_db(&with_preamble(b"bad $p |- x $= $.")),
        Err(Diagnostic::ProofNoSteps)
    );
}

// disjoint variable conditions

const DV_PREAMBLE: &[u8] = b"
    $c |- wff $.
    $v x y z w $.
    wx $f wff x $.
    wy $f wff y $.
    wz $f wff z $.
    ww $f wff w $.
    $d x y $.
    axd $a |- x y $.
";

fn with_dv_preamble(rest: &[u8]) -> Vec<u8> {
    let mut text = DV_PREAMBLE.to_vec();
    text.extend_from_slice(rest);
    text
}

#[test]
fn test_dv_violation_same_variable() {
    assert_matches!(
        read_db(&with_dv_preamble(b"bad $p |- z z $= wz wz axd $.")),
        Err(Diagnostic::ProofDvViolation(_, _))
    );
}

#[test]
fn test_dv_violation_missing_pair() {
    assert_matches!(
        read_db(&with_dv_preamble(b"bad $p |- z w $= wz ww axd $.")),
        Err(Diagnostic::ProofDvViolation(_, _))
    );
}

#[test]
fn test_dv_pair_satisfied() {
    read_db(&with_dv_preamble(b"$d z w $. good $p |- z w $= wz ww axd $.")).unwrap();
}

#[test]
fn test_dv_not_retroactive() {
    // a $d appearing after a proof places no condition on it
    read_db(
        b"
        $c term |- R $.
        $v x y $.
        tx $f term x $.
        ty $f term y $.
        r-any $a |- x R y $.
        r-id $p |- x R x $= tx tx r-any $.
        $v z $.
        tz $f term z $.
        $d x y $.
    ",
    )
    .unwrap();
}

// compressed proofs

const WI_PREAMBLE: &[u8] = b"
    $c wff ( ) -> $.
    $v p q $.
    wp $f wff p $.
    wq $f wff q $.
    wi $a wff ( p -> q ) $.
";

fn with_wi_preamble(rest: &[u8]) -> Vec<u8> {
    let mut text = WI_PREAMBLE.to_vec();
    text.extend_from_slice(rest);
    text
}

#[test]
fn test_compressed_roster_label() {
    read_db(&with_preamble(b"thm $p |- x $= ( ax ) AB $.")).unwrap();
}

#[test]
fn test_compressed_save_and_reuse() {
    let db = read_db(&with_wi_preamble(b"wii $p wff ( p -> p ) $= ( wi ) AZCB $.")).unwrap();
    assert_eq!(db.verified_count(), 1);
}

#[test]
fn test_compressed_step_out_of_range() {
    assert_matches!(
        read_db(&with_wi_preamble(b"wii $p wff ( p -> p ) $= ( wi ) AZE $.")),
        Err(Diagnostic::ProofStepOutOfRange(4))
    );
}

#[test]
fn test_compressed_save_on_empty_stack() {
    assert_matches!(
        read_db(&with_wi_preamble(b"wii $p wff ( p -> p ) $= ( wi ) ZAB $.")),
        Err(Diagnostic::ProofInvalidSave)
    );
}

#[test]
fn test_compressed_unterminated_roster() {
    assert_matches!(
        read_db(&with_wi_preamble(b"wii $p wff ( p -> p ) $= ( wi AB $.")),
        Err(Diagnostic::ProofUnterminatedRoster)
    );
}

#[test]
fn test_compressed_bad_character() {
    assert_matches!(
        read_db(&with_wi_preamble(b"wii $p wff ( p -> p ) $= ( wi ) Ab $.")),
        Err(Diagnostic::ProofBadCharacter(b'b'))
    );
}

#[test]
fn test_compressed_truncated_number() {
    assert_matches!(
        read_db(&with_wi_preamble(b"wii $p wff ( p -> p ) $= ( wi ) AU $.")),
        Err(Diagnostic::ProofTruncatedNumber)
    );
}

// begin and stop labels

const GATED: &[u8] = b"
    $c |- wff $.
    $v x $.
    wx $f wff x $.
    ax $a |- x $.
    bad $p |- x $= wx $.
    good $p |- x $= wx ax $.
";

#[test]
fn test_all_proofs_verified_by_default() {
    assert_matches!(read_db(GATED), Err(Diagnostic::ProofWrongConclusion(_, _)));
}

#[test]
fn test_begin_label_skips_earlier_proofs() {
    let options = DbOptions {
        begin_label: Some("good".to_owned()),
        ..DbOptions::default()
    };
    let db = read_db_opts(GATED, options).unwrap();
    assert_eq!(db.assertion_count(), 3);
    assert_eq!(db.verified_count(), 1);
}

#[test]
fn test_stop_label_halts_processing() {
    let options = DbOptions {
        stop_label: Some("bad".to_owned()),
        ..DbOptions::default()
    };
    let db = read_db_opts(GATED, options).unwrap();
    assert_eq!(db.assertion_count(), 1);
    assert_eq!(db.verified_count(), 0);
    assert!(db.label_entry(b"bad").is_none());
}

#[test]
fn test_stop_label_inside_open_scope_is_clean() {
    let options = DbOptions {
        stop_label: Some("zz".to_owned()),
        ..DbOptions::default()
    };
    read_db_opts(b"$c a $. ${ zz $v b $.", options).unwrap();
}
