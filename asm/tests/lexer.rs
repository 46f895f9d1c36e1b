use subleq_asm::lexer::{Line, Token, Tokenizer};

fn case(src: &str, expects: Vec<(&str, usize)>) {
    let mut tokens = Tokenizer::new(src);
    let mut found = Vec::new();
    while let Some(tok) = tokens.next_token() {
        found.push(tok);
    }

    println!("{:?} -> {:?}", src, found);
    assert_eq!(found.len(), expects.len());
    for (tok, (text, line)) in found.iter().zip(&expects) {
        assert_eq!(tok.text, *text);
        assert_eq!(tok.line, Line::Source(*line));
    }
}

#[test]
fn whitespace_and_lines() {
    case("a b\nc", vec![("a", 1), ("b", 1), ("c", 2)]);
    case("  a\t\tb  ", vec![("a", 1), ("b", 1)]);
    case("\n\n  x", vec![("x", 3)]);
    case("", vec![]);
}

#[test]
fn line_ending_styles() {
    // CR, LF and CRLF all advance the line exactly once.
    case("a\r\nb\rc\nd", vec![("a", 1), ("b", 2), ("c", 3), ("d", 4)]);
    case("a\r\n\r\nb", vec![("a", 1), ("b", 3)]);
}

#[test]
fn comments() {
    case("a / comment\nb", vec![("a", 1), ("b", 2)]);
    case("/ whole line\nx", vec![("x", 2)]);
    // A token in progress completes before the comment is skipped.
    case("abc/ comment\ndef", vec![("abc", 1), ("def", 2)]);
    case("a / trailing comment", vec![("a", 1)]);
    case("// nothing at all", vec![]);
}

#[test]
fn token_line_is_where_it_ended() {
    // The terminating line break belongs to the token's own line.
    case("one\ntwo three\nfour", vec![
        ("one", 1),
        ("two", 2),
        ("three", 2),
        ("four", 3),
    ]);
}

#[test]
fn pushback() {
    let mut tokens = Tokenizer::new("a b");
    let a = tokens.next_token().unwrap();
    assert_eq!(a.text, "a");
    tokens.unread(a.clone());
    assert_eq!(tokens.next_token().unwrap(), a);

    // Injected tokens come out in order, ahead of the raw stream.
    tokens.inject(vec![
        Token {
            text: "x".to_string(),
            line: Line::Synth(1),
        },
        Token {
            text: "y".to_string(),
            line: Line::Synth(1),
        },
    ]);
    assert_eq!(tokens.next_token().unwrap().text, "x");
    assert_eq!(tokens.next_token().unwrap().text, "y");
    assert_eq!(tokens.next_token().unwrap().text, "b");
    assert!(tokens.next_token().is_none());
}
