//! Per-token payload: lexeme, classification, flags, source location and
//! symbol back-references.
//!
//! A token's classification is *derived* state: it is recomputed from the
//! lexeme (plus the variable id and bracket-partner presence) every time
//! the lexeme changes. Callers never set `TokenKind` directly except
//! through the back-reference setters, which keep kind and refs coupled.

use bitflags::bitflags;
use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::stream::TokenId;
use crate::symbols::{FunctionRef, ScopeRef, SymbolLookup, TypeRef, VariableRef};
use crate::valueflow::Value;

/// Classification of a token, derived from its lexeme and attached ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Empty lexeme (the erased sentinel).
    #[default]
    None,
    /// Identifier not yet resolved to anything more specific.
    Name,
    Keyword,
    Variable,
    Type,
    Function,
    Lambda,
    Number,
    Boolean,
    String,
    Char,
    ArithOp,
    BitOp,
    LogicalOp,
    ComparisonOp,
    AssignOp,
    IncDecOp,
    Bracket,
    ExtendedOp,
    Other,
}

bitflags! {
    /// Boolean token properties that are cheap to test and expensive to derive.
    ///
    /// `CONTROL_FLOW_KEYWORD` and `STANDARD_TYPE` are recomputed on every
    /// lexeme change; the rest are stamped by the tokenizer front-end or
    /// by literal-prefix handling and survive reclassification.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct TokenFlags: u16 {
        const CONTROL_FLOW_KEYWORD = 1 << 0;
        const STANDARD_TYPE = 1 << 1;
        const EXPANDED_MACRO = 1 << 2;
        const LONG = 1 << 3;
        const UNSIGNED = 1 << 4;
        const SIGNED = 1 << 5;
        const COMPLEX = 1 << 6;
        const LITERAL = 1 << 7;
        const ENUM_TYPE = 1 << 8;
    }
}

/// Signedness of a token's expression type, used when rendering values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sign {
    #[default]
    Unknown,
    Signed,
    Unsigned,
}

/// Expression type attached to a token by the type-inference pass.
///
/// The core only needs the signedness (for dump rendering) and a display
/// string; everything else stays in the symbol database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueTypeInfo {
    pub sign: Sign,
    /// Human-readable type, e.g. `"signed int"`.
    pub name: String,
}

static CONTROL_FLOW_KEYWORDS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "goto", "do", "if", "else", "for", "while", "switch", "case", "break", "continue",
        "return",
    ]
    .into_iter()
    .collect()
});

static STD_TYPES: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "bool", "_Bool", "char", "double", "float", "int", "long", "short", "size_t", "void",
        "wchar_t",
    ]
    .into_iter()
    .collect()
});

const LITERAL_PREFIXES: [&str; 4] = ["u8", "u", "U", "L"];

fn is_string_char_literal(s: &str, quote: char) -> bool {
    if !s.ends_with(quote) {
        return false;
    }
    if s.starts_with(quote) && s.len() > 1 {
        return true;
    }
    LITERAL_PREFIXES.iter().any(|p| {
        s.len() > p.len() && s[p.len()..].starts_with(quote)
            && s.starts_with(p)
    })
}

/// The mutable per-token state owned by a [`crate::stream::TokenStream`].
#[derive(Debug, Clone, Default)]
pub struct TokenData {
    text: String,
    kind: TokenKind,
    pub flags: TokenFlags,

    pub file_index: u32,
    pub line: u32,
    pub column: u32,

    var_id: u32,
    /// Percentile 0..100, non-decreasing along the stream.
    pub progress: u32,
    /// Gap-free ordinal, assigned on demand.
    pub index: u32,

    pub original_name: Option<String>,

    // Non-owning symbol-database back-references.
    pub variable: Option<VariableRef>,
    pub function: Option<FunctionRef>,
    pub user_type: Option<TypeRef>,
    pub scope: Option<ScopeRef>,

    /// Expression type set by type inference; owned by the token.
    pub value_type: Option<ValueTypeInfo>,

    // Stream links (arena handles).
    pub(crate) prev: Option<TokenId>,
    pub(crate) next: Option<TokenId>,
    pub(crate) link: Option<TokenId>,

    // AST links.
    pub(crate) ast_op1: Option<TokenId>,
    pub(crate) ast_op2: Option<TokenId>,
    pub(crate) ast_parent: Option<TokenId>,

    /// Value-flow facts; an empty list is represented as `None`.
    pub(crate) values: Option<Vec<Value>>,
}

impl TokenData {
    pub(crate) fn new(text: &str) -> Self {
        let mut tok = TokenData::default();
        tok.set_str(text);
        tok
    }

    /// The lexeme.
    #[inline]
    pub fn str(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    #[inline]
    pub fn var_id(&self) -> u32 {
        self.var_id
    }

    /// Replace the lexeme and rederive kind, the standard-type flag and
    /// the control-flow-keyword flag. All other attributes are preserved.
    pub fn set_str(&mut self, s: &str) {
        self.text = s.to_string();
        self.update_properties();
    }

    /// Fuse an adjacent string-literal lexeme into this one: the closing
    /// quote of this lexeme and the opening quote of `b` are dropped.
    pub fn concat_str(&mut self, b: &str) {
        self.text.pop();
        self.text.push_str(&b[1..]);
        self.update_properties();
    }

    /// Set the variable id. A nonzero id forces `Variable` classification.
    pub fn set_var_id(&mut self, id: u32) {
        self.var_id = id;
        if id != 0 {
            self.kind = TokenKind::Variable;
            self.flags.remove(TokenFlags::STANDARD_TYPE);
        } else {
            self.update_properties();
        }
    }

    /// Attach or clear the function back-reference, keeping kind coupled:
    /// a lambda classifies as `Lambda`, any other function as `Function`,
    /// and clearing demotes `Function` back to `Name`.
    pub fn set_function(&mut self, f: Option<FunctionRef>, symbols: &dyn SymbolLookup) {
        self.function = f;
        match f {
            Some(fref) => {
                self.kind = if symbols.is_lambda(fref) {
                    TokenKind::Lambda
                } else {
                    TokenKind::Function
                };
            }
            None => {
                if self.kind == TokenKind::Function {
                    self.kind = TokenKind::Name;
                }
            }
        }
    }

    /// Attach or clear the user-type back-reference, keeping kind and the
    /// enum-type flag coupled.
    pub fn set_user_type(&mut self, t: Option<TypeRef>, symbols: &dyn SymbolLookup) {
        self.user_type = t;
        match t {
            Some(tref) => {
                self.kind = TokenKind::Type;
                self.flags
                    .set(TokenFlags::ENUM_TYPE, symbols.is_enum_type(tref));
            }
            None => {
                if self.kind == TokenKind::Type {
                    self.kind = TokenKind::Name;
                }
            }
        }
    }

    /// Mark the token as a language keyword.
    pub fn set_keyword(&mut self) {
        self.kind = TokenKind::Keyword;
    }

    // ------------------------------------------------------------------
    // Classification
    // ------------------------------------------------------------------

    /// Rederive classification after a lexeme change.
    fn update_properties(&mut self) {
        self.flags.set(
            TokenFlags::CONTROL_FLOW_KEYWORD,
            CONTROL_FLOW_KEYWORDS.contains(self.text.as_str()),
        );

        if self.text.is_empty() {
            self.kind = TokenKind::None;
        } else {
            let bytes = self.text.as_bytes();
            let first = bytes[0];
            if self.text == "true" || self.text == "false" {
                self.kind = TokenKind::Boolean;
            } else if is_string_char_literal(&self.text, '"') {
                self.kind = TokenKind::String;
            } else if is_string_char_literal(&self.text, '\'') {
                self.kind = TokenKind::Char;
            } else if first.is_ascii_alphabetic() || first == b'_' || first == b'$' {
                if self.var_id != 0 {
                    self.kind = TokenKind::Variable;
                } else if !matches!(
                    self.kind,
                    TokenKind::Variable | TokenKind::Function | TokenKind::Type | TokenKind::Keyword
                ) {
                    self.kind = TokenKind::Name;
                }
            } else if first.is_ascii_digit()
                || (bytes.len() > 1 && first == b'-' && bytes[1].is_ascii_digit())
            {
                self.kind = TokenKind::Number;
            } else if self.text == "=" || self.text == "<<=" || self.text == ">>="
                || (bytes.len() == 2 && bytes[1] == b'=' && b"+-*/%&^|".contains(&first))
            {
                self.kind = TokenKind::AssignOp;
            } else if bytes.len() == 1 && b",[]()?:".contains(&first) {
                self.kind = TokenKind::ExtendedOp;
            } else if self.text == "<<" || self.text == ">>"
                || (bytes.len() == 1 && b"+-*/%".contains(&first))
            {
                self.kind = TokenKind::ArithOp;
            } else if bytes.len() == 1 && b"&|^~".contains(&first) {
                self.kind = TokenKind::BitOp;
            } else if self.text == "&&" || self.text == "||" || self.text == "!" {
                self.kind = TokenKind::LogicalOp;
            } else if self.link.is_none()
                && matches!(self.text.as_str(), "==" | "!=" | "<" | "<=" | ">" | ">=")
            {
                self.kind = TokenKind::ComparisonOp;
            } else if self.text == "++" || self.text == "--" {
                self.kind = TokenKind::IncDecOp;
            } else if bytes.len() == 1
                && (b"{}".contains(&first) || (self.link.is_some() && b"<>".contains(&first)))
            {
                self.kind = TokenKind::Bracket;
            } else {
                self.kind = TokenKind::Other;
            }
        }

        self.update_literal_prefix();
        self.update_standard_type();
    }

    /// Strip a recognized literal prefix (`u8`, `u`, `U`, `L`) from a
    /// quoted literal; every prefix except `u8` marks the literal long.
    fn update_literal_prefix(&mut self) {
        if !matches!(self.kind, TokenKind::String | TokenKind::Char) {
            return;
        }
        let quote = if self.kind == TokenKind::String { '"' } else { '\'' };
        for p in &LITERAL_PREFIXES {
            if self.text.starts_with(p) && self.text[p.len()..].starts_with(quote) {
                self.text.drain(..p.len());
                self.flags.set(TokenFlags::LONG, *p != "u8");
                break;
            }
        }
    }

    fn update_standard_type(&mut self) {
        self.flags.remove(TokenFlags::STANDARD_TYPE);
        if self.text.len() < 3 {
            return;
        }
        if STD_TYPES.contains(self.text.as_str()) {
            self.flags.insert(TokenFlags::STANDARD_TYPE);
            self.kind = TokenKind::Type;
        }
    }

    // ------------------------------------------------------------------
    // Predicates
    // ------------------------------------------------------------------

    /// Identifier-shaped token: name, type, variable, function or keyword.
    #[inline]
    pub fn is_name(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Name
                | TokenKind::Type
                | TokenKind::Variable
                | TokenKind::Function
                | TokenKind::Keyword
        )
    }

    #[inline]
    pub fn is_keyword(&self) -> bool {
        self.kind == TokenKind::Keyword
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        self.kind == TokenKind::Number
    }

    #[inline]
    pub fn is_boolean(&self) -> bool {
        self.kind == TokenKind::Boolean
    }

    #[inline]
    pub fn is_arithmetical_op(&self) -> bool {
        self.kind == TokenKind::ArithOp
    }

    #[inline]
    pub fn is_comparison_op(&self) -> bool {
        self.kind == TokenKind::ComparisonOp
    }

    #[inline]
    pub fn is_assignment_op(&self) -> bool {
        self.kind == TokenKind::AssignOp
    }

    /// Operator without side effects: arithmetic, logical, comparison or bit.
    #[inline]
    pub fn is_const_op(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::ArithOp | TokenKind::LogicalOp | TokenKind::ComparisonOp | TokenKind::BitOp
        )
    }

    /// Any operator, including assignment and increment/decrement.
    #[inline]
    pub fn is_op(&self) -> bool {
        self.is_const_op() || self.is_assignment_op() || self.kind == TokenKind::IncDecOp
    }

    #[inline]
    pub fn is_control_flow_keyword(&self) -> bool {
        self.flags.contains(TokenFlags::CONTROL_FLOW_KEYWORD)
    }

    #[inline]
    pub fn is_standard_type(&self) -> bool {
        self.flags.contains(TokenFlags::STANDARD_TYPE)
    }

    #[inline]
    pub fn is_expanded_macro(&self) -> bool {
        self.flags.contains(TokenFlags::EXPANDED_MACRO)
    }

    #[inline]
    pub fn is_literal(&self) -> bool {
        self.flags.contains(TokenFlags::LITERAL)
    }

    /// Name token whose lexeme contains no lowercase character.
    pub fn is_upper_case_name(&self) -> bool {
        self.is_name() && !self.text.chars().any(|c| c.is_lowercase())
    }

    // ------------------------------------------------------------------
    // String-literal helpers
    // ------------------------------------------------------------------

    /// Decode a string-literal lexeme into its content.
    ///
    /// Recognized escapes are `\n`, `\r`, `\t`; any other escape encodes
    /// exactly the escaped character. An embedded `\0` truncates: the
    /// prefix before it is returned.
    pub fn str_value(&self) -> String {
        debug_assert_eq!(self.kind, TokenKind::String);
        let inner = &self.text[1..self.text.len().saturating_sub(1).max(1)];
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('0') => return out,
                Some(other) => out.push(other),
                None => break,
            }
        }
        out
    }

    /// Number of characters in a string literal, escapes counted as one.
    /// Counting stops at an embedded `\0`; the terminator is not counted.
    pub fn str_length(&self) -> usize {
        debug_assert_eq!(self.kind, TokenKind::String);
        let b = self.text.as_bytes();
        let end = b.len() - 1;
        let mut i = 1;
        let mut len = 0;
        while i < end {
            if b[i] == b'\\' {
                i += 1;
                if b[i] == b'0' {
                    return len;
                }
            }
            if b[i] == 0 {
                return len;
            }
            i += 1;
            len += 1;
        }
        len
    }

    /// Size in bytes of a string literal including the terminator, each
    /// escape pair counted as one byte. Unlike [`TokenData::str_length`]
    /// this does not stop at an embedded `\0`.
    pub fn str_size(&self) -> usize {
        debug_assert_eq!(self.kind, TokenKind::String);
        let b = self.text.as_bytes();
        let mut size = 1;
        let mut i = 1;
        while i < b.len() - 1 {
            if b[i] == b'\\' {
                i += 1;
            }
            i += 1;
            size += 1;
        }
        size
    }

    /// The `index`-th character of a string literal, escapes counted as
    /// one; `"\0"` past the end.
    pub fn char_at(&self, mut index: i64) -> String {
        let b = self.text.as_bytes();
        let end = b.len() - 1;
        let mut i = 1;
        while i < end {
            if index == 0 {
                if b[i] == 0 {
                    return "\\0".to_string();
                }
                if b[i] == b'\\' {
                    return self.text[i..i + 2].to_string();
                }
                return self.text[i..i + 1].to_string();
            }
            if b[i] == b'\\' {
                i += 1;
            }
            i += 1;
            index -= 1;
        }
        debug_assert_eq!(index, 0);
        "\\0".to_string()
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Append the token's display form to `out`.
    ///
    /// With `attributes`, signedness and long prefixes are emitted (`L`
    /// for wide literals, `long ` otherwise). With `macro_marker`, tokens
    /// that came out of a macro expansion get a `$` prefix. An embedded
    /// `\0` in a string lexeme is escaped. With `varid`, a nonzero
    /// variable id is appended as `@<id>`.
    pub fn stringify(&self, out: &mut String, varid: bool, attributes: bool, macro_marker: bool) {
        if attributes {
            if self.flags.contains(TokenFlags::UNSIGNED) {
                out.push_str("unsigned ");
            } else if self.flags.contains(TokenFlags::SIGNED) {
                out.push_str("signed ");
            }
            if self.flags.contains(TokenFlags::COMPLEX) {
                out.push_str("_Complex ");
            }
            if self.flags.contains(TokenFlags::LONG) {
                if matches!(self.kind, TokenKind::String | TokenKind::Char) {
                    out.push('L');
                } else {
                    out.push_str("long ");
                }
            }
        }
        if macro_marker && self.is_expanded_macro() {
            out.push('$');
        }
        if self.is_name() && self.text.contains(' ') {
            out.extend(self.text.chars().filter(|&c| c != ' '));
        } else if !self.text.starts_with('"') || !self.text.contains('\0') {
            out.push_str(&self.text);
        } else {
            for c in self.text.chars() {
                if c == '\0' {
                    out.push_str("\\0");
                } else {
                    out.push(c);
                }
            }
        }
        if varid && self.var_id != 0 {
            out.push('@');
            out.push_str(&self.var_id.to_string());
        }
    }
}
