//! Pattern-matcher integration tests.
//!
//! Covers the documented matching scenarios plus the bracket-aware
//! traversals over realistic token sequences.

use ccflow::{TokenId, TokenStream};

fn ids(stream: &TokenStream) -> Vec<TokenId> {
    stream.token_ids().collect()
}

#[test]
fn test_alternation_scenario() {
    let stream = TokenStream::from_words("int x = 3 ;");
    let front = stream.front();
    assert!(stream
        .pattern_match(front, "int|long %name% = %num% ;", 0)
        .unwrap());
    assert!(!stream
        .pattern_match(front, "int|long %num% = %num% ;", 0)
        .unwrap());
}

#[test]
fn test_negation_with_no_token() {
    let stream = TokenStream::from_words("");
    assert!(stream.front().is_none());
    assert!(stream.pattern_match(None, "!!else", 0).unwrap());
}

#[test]
fn test_find_closing_bracket_nested_and_shift() {
    let stream = TokenStream::from_words("< A < B > > ;");
    let v = ids(&stream);
    // Outer `<` pairs with the outer `>`, inner with the inner one.
    assert_eq!(stream.find_closing_bracket(v[0]), Some(v[5]));
    assert_eq!(stream.find_closing_bracket(v[2]), Some(v[4]));

    let stream = TokenStream::from_words("< A < B >> ;");
    let v = ids(&stream);
    // The `>>` token closes both levels at once.
    assert_eq!(stream.find_closing_bracket(v[0]), Some(v[4]));
}

#[test]
fn test_match_after_mutation() {
    // Matching keeps working across stream mutation, exercising the
    // combination simplification passes rely on.
    let mut stream = TokenStream::from_words("x = y + 0 ;");
    let front = stream.front().unwrap();
    let plus = stream
        .find_match(front, "+ 0 ;", None, 0)
        .unwrap()
        .unwrap();
    // Simplify `y + 0` to `y`.
    let before = stream.prev(plus).unwrap();
    stream.delete_next(before, 2);
    assert!(stream.simple_match(Some(front), "x = y ;"));
    assert!(stream
        .pattern_match(Some(front), "%name% = %name% ;", 0)
        .unwrap());
}

#[test]
fn test_varid_matching_over_assignment() {
    let mut stream = TokenStream::from_words("a = a + 1 ;");
    let v = ids(&stream);
    stream.tok_mut(v[0]).set_var_id(5);
    stream.tok_mut(v[2]).set_var_id(5);
    let front = stream.front();
    assert!(stream
        .pattern_match(front, "%varid% = %varid% + %num%", 5)
        .unwrap());
    assert!(!stream
        .pattern_match(front, "%varid% = %varid% + %num%", 6)
        .unwrap());
}

#[test]
fn test_argument_iteration_over_call() {
    let mut stream = TokenStream::from_words("f ( a , b ( c , d ) , e ) ;");
    stream.create_links();
    let v = ids(&stream);
    let mut args = Vec::new();
    let mut arg = Some(v[2]);
    while let Some(a) = arg {
        args.push(stream.text(a).to_string());
        arg = stream.next_argument(a);
    }
    assert_eq!(args, vec!["a", "b", "e"]);
}
