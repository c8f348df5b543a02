use ucc::{
    compile,
    error::ErrorKind,
    lex::{Identifier, Keyword, LexerError, Token},
    source::Located,
};

fn lex(text: &str) -> Vec<Token> {
    compile::tokenize(text.as_bytes(), "test")
        .expect("source should lex")
        .tokens
        .into_iter()
        .map(Located::into_inner)
        .collect()
}

fn id(name: &str) -> Token {
    Token::Id(Identifier::new(name))
}

#[test]
fn keywords_are_not_identifier_prefixes() {
    assert_eq!(
        lex("int main while whileX _a1 returned"),
        vec![
            Token::Keyword(Keyword::Int),
            id("main"),
            Token::Keyword(Keyword::While),
            id("whileX"),
            id("_a1"),
            id("returned"),
        ]
    );
}

#[test]
fn operators_use_longest_match() {
    use Token::*;

    assert_eq!(
        lex("a+=b++ - -c && !d || e<=f==g!=h"),
        vec![
            id("a"),
            PlusAssign,
            id("b"),
            Increment,
            Minus,
            Minus,
            id("c"),
            And,
            Not,
            id("d"),
            Or,
            id("e"),
            LessEqual,
            id("f"),
            Equal,
            id("g"),
            NotEqual,
            id("h"),
        ]
    );
}

#[test]
fn literals_resolve_to_values() {
    assert_eq!(
        lex(r#"42 3.25 .5 'a' '\n' "hi\t""#),
        vec![
            Token::IntLiteral(42),
            Token::FloatLiteral(3.25),
            Token::FloatLiteral(0.5),
            Token::CharLiteral('a'),
            Token::CharLiteral('\n'),
            Token::StrLiteral("hi\t".into()),
        ]
    );
}

#[test]
fn comments_are_discarded() {
    let tokens = lex("x // line comment\n/* block\n comment */ y /= 2");
    assert_eq!(tokens, vec![id("x"), id("y"), Token::DivideAssign, Token::IntLiteral(2)]);
}

#[test]
fn tokens_carry_their_positions() {
    let tokens = compile::tokenize("int x;\n  x = 1;".as_bytes(), "test")
        .unwrap()
        .tokens;

    let x = &tokens[3];
    assert_eq!(x.val(), &id("x"));
    assert_eq!(x.location().start().line(), 2);
    assert_eq!(x.location().start().column(), 3);
}

#[test]
fn errors_do_not_stop_the_next_line() {
    let source = "int a = 1 $ 2;\nchar c = '';\nint b = 99999999999;\n";
    let diagnostics = compile::tokenize(source.as_bytes(), "test").unwrap_err();

    assert_eq!(diagnostics.len(), 3);
    assert!(diagnostics.kinds().iter().all(|&kind| kind == ErrorKind::Lexical));

    let lines: Vec<u32> = diagnostics
        .iter()
        .map(|error| error.location().start().line())
        .collect();

    assert_eq!(lines, vec![1, 2, 3]);
}

#[test]
fn unterminated_constructs() {
    let strings = compile::tokenize("\"abc\n".as_bytes(), "test").unwrap_err();
    assert_eq!(strings.len(), 1);

    let comments = compile::tokenize("/* never closed".as_bytes(), "test").unwrap_err();
    assert_eq!(comments.len(), 1);
}

#[test]
fn lone_ampersand_is_rejected() {
    let (start, stream) = ucc::source::consume("a & b".as_bytes(), "test");
    let errors = ucc::lex::Lexer::new(start, stream)
        .try_exhaustive()
        .unwrap_err();

    assert!(matches!(errors[0].val(), LexerError::Expected('&')));
}
