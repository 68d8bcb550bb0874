//! Token-stream integration tests.
//!
//! Exercises the list mutators end-to-end and checks the structural
//! invariants after every step of longer mutation sequences.

use ccflow::{Insert, TokenId, TokenStream};

fn texts(stream: &TokenStream) -> Vec<String> {
    stream
        .token_ids()
        .map(|id| stream.text(id).to_string())
        .collect()
}

fn check_invariants(stream: &TokenStream) {
    let ids: Vec<TokenId> = stream.token_ids().collect();
    if let (Some(&first), Some(&last)) = (ids.first(), ids.last()) {
        assert_eq!(stream.front(), Some(first));
        assert_eq!(stream.back(), Some(last));
        assert_eq!(stream.prev(first), None);
        assert_eq!(stream.next(last), None);
    }
    for pair in ids.windows(2) {
        assert_eq!(stream.next(pair[0]), Some(pair[1]), "next/prev out of sync");
        assert_eq!(stream.prev(pair[1]), Some(pair[0]), "next/prev out of sync");
    }
    for &id in &ids {
        if let Some(partner) = stream.link(id) {
            assert_eq!(stream.link(partner), Some(id), "bracket link not mutual");
        }
    }
}

#[test]
fn test_delete_this_keeps_external_pointer_usable() {
    // Holding a handle to `b`, erasing `b` leaves the handle reading `c`.
    let mut stream = TokenStream::from_words("a b c");
    let ids: Vec<TokenId> = stream.token_ids().collect();
    let b = ids[1];
    stream.delete_this(b);
    assert_eq!(texts(&stream), vec!["a", "c"]);
    assert_eq!(stream.text(b), "c");
    check_invariants(&stream);
}

#[test]
fn test_delete_this_on_last_token_leaves_erased_sentinel() {
    let mut stream = TokenStream::from_words("x");
    let x = stream.front().unwrap();
    stream.delete_this(x);
    assert_eq!(stream.text(x), "");
    assert!(stream.front().is_some());
}

#[test]
fn test_mutation_storm_preserves_invariants() {
    let mut stream = TokenStream::from_words("void f ( int a , int b ) { return a + b ; }");
    stream.create_links();
    let front = stream.front().unwrap();
    stream.assign_progress_values(front);
    check_invariants(&stream);

    // Delete an argument.
    let comma = stream.find_simple_match(front, ",", None).unwrap();
    stream.delete_next(comma, 2);
    check_invariants(&stream);

    // Insert a qualifier up front.
    stream.insert_token(front, "static", None, Insert::Before);
    check_invariants(&stream);

    // Swap two tokens.
    let ret = stream.find_simple_match(stream.front().unwrap(), "return", None).unwrap();
    stream.swap_with_next(ret);
    check_invariants(&stream);

    // Delete a bracket and confirm its partner pointer was cleared.
    let open = stream
        .find_simple_match(stream.front().unwrap(), "(", None)
        .unwrap();
    let close = stream.link(open).unwrap();
    let before_close = stream.prev(close).unwrap();
    stream.delete_next(before_close, 1);
    assert_eq!(stream.link(open), None);
    check_invariants(&stream);
}

#[test]
fn test_progress_values_bounds() {
    let mut stream = TokenStream::from_words("a b c d e f g");
    let front = stream.front().unwrap();
    stream.assign_progress_values(front);
    let values: Vec<u32> = stream.token_ids().map(|id| stream.tok(id).progress).collect();
    assert_eq!(values[0], 0);
    assert!(values.windows(2).all(|w| w[0] <= w[1]));
    assert!(*values.last().unwrap() <= 100);
}

#[test]
fn test_replace_preserves_range_links() {
    let mut stream = TokenStream::from_words("x ; ( a ) end");
    stream.create_links();
    let ids: Vec<TokenId> = stream.token_ids().collect();
    let (target, start, end) = (ids[0], ids[2], ids[4]);
    stream.replace(target, start, end);
    assert_eq!(texts(&stream), vec!["(", "a", ")", ";", "end"]);
    // The moved range keeps its internal bracket pairing.
    let open = stream.front().unwrap();
    assert_eq!(stream.text(stream.link(open).unwrap()), ")");
    check_invariants(&stream);
}

#[test]
fn test_stringify_list_with_line_numbers() {
    let mut stream = TokenStream::from_words("int x ;");
    let ids: Vec<TokenId> = stream.token_ids().collect();
    for id in &ids {
        stream.tok_mut(*id).line = 3;
    }
    let rendered = stream.stringify(false);
    assert!(rendered.contains("3: int x ;"));
}
