//! Tokenizer behaviour over realistic class source.

use unrealscript_core::{ConstValue, LexError};
use unrealscript_parser::{Lexer, TokenKind};

const PAWN: &str = r#"
class Pawn extends Actor
    native
    config(Game);

/** Current health. */
var() int Health; // shown in the editor

function TakeDamage(int Damage, optional name DamageType = 'Fell')
{
    Health -= Damage;
    if (Health <= 0 && DamageType != '')
    {
        GotoState('Dying');
    }
}
"#;

fn collect(source: &str) -> Result<Vec<(TokenKind, String)>, LexError> {
    let mut lexer = Lexer::new(source);
    let mut out = Vec::new();
    loop {
        let token = lexer.get_token(false)?;
        if token.is_eof() {
            return Ok(out);
        }
        out.push((token.kind, token.text));
    }
}

#[test]
fn tokenizes_class_source() {
    let tokens = collect(PAWN).unwrap();
    let texts: Vec<&str> = tokens.iter().map(|(_, t)| t.as_str()).collect();
    assert_eq!(&texts[..6], ["class", "Pawn", "extends", "Actor", "native", "config"]);
    assert!(texts.contains(&"-="));
    assert!(texts.contains(&"<="));
    assert!(texts.contains(&"&&"));
    assert!(texts.contains(&"!="));
    let names = tokens
        .iter()
        .filter(|(kind, text)| *kind == TokenKind::Const && text.starts_with('\''))
        .count();
    assert_eq!(names, 3);
}

#[test]
fn doc_comment_and_trailing_comment_around_declaration() {
    let mut lexer = Lexer::new(PAWN);
    while !lexer.get_token(true).unwrap().matches_identifier("var") {}
    assert_eq!(lexer.take_comment().as_deref(), Some("Current health."));
    for _ in 0..5 {
        lexer.get_token(true).unwrap();
    }
    assert_eq!(lexer.trailing_comment().as_deref(), Some("shown in the editor"));
}

#[test]
fn default_parameter_text_is_captured_raw() {
    let mut lexer = Lexer::new(PAWN);
    while !lexer.get_token(true).unwrap().matches_symbol("=") {}
    let raw = lexer.read_raw_until(&[',', ')']).unwrap();
    assert_eq!(raw, "'Fell'");
}

#[test]
fn function_body_can_be_skipped_and_revisited() {
    let mut lexer = Lexer::new(PAWN);
    while !lexer.get_token(true).unwrap().matches_symbol("{") {}
    let body_start = lexer.position();
    lexer.skip_braces().unwrap();
    assert!(lexer.get_token(true).unwrap().is_eof());

    lexer.seek(body_start);
    let first = lexer.get_token(false).unwrap();
    assert!(first.matches_identifier("Health"));
    assert_eq!(first.span.line, 11);
}

#[test]
fn bytes_and_ints_share_int_constants() {
    let mut lexer = Lexer::new("255 256");
    let a = lexer.get_token(false).unwrap();
    let b = lexer.get_token(false).unwrap();
    assert_eq!(a.value, Some(ConstValue::Int(255)));
    assert_eq!(b.int_value(), Some(256));
}
