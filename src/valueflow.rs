//! Value-flow facts attached to tokens, and the bounded queries
//! checkers run over them.
//!
//! A token owns at most one list of [`Value`] records; an empty list is
//! represented as no list at all. [`TokenStream::add_value`] is the
//! single normative merge rule: a Known value purges same-typed
//! predecessors, lists are capped at ten entries, duplicates are
//! rejected, and a non-inconclusive arrival replaces an inconclusive
//! twin in place.
//!
//! Every query selects among matching values the same way: the first
//! non-inconclusive, non-conditional hit wins outright; otherwise a
//! non-inconclusive value beats an inconclusive one and an unconditional
//! one beats a conditional one. What survives is then gated by the
//! caller's settings capability.

use serde::{Deserialize, Serialize};

use crate::settings::QuerySettings;
use crate::stream::{TokenId, TokenStream};
use crate::symbols::{ScopeKind, ScopeRef, SymbolLookup};
use crate::token::{Sign, TokenKind};

/// What kind of fact a [`Value`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Int,
    Tok,
    Float,
    Moved,
    Uninit,
    ContainerSize,
    Lifetime,
    BufferSize,
}

/// Confidence attached to a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// This value is possible; unlisted values may be possible too.
    Possible,
    /// Only listed values are possible.
    Known,
    /// Heuristic result.
    Inconclusive,
}

/// Moved-from state of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveKind {
    NonMoved,
    Moved,
    Forwarded,
}

impl MoveKind {
    /// Dump-format rendering.
    pub fn as_str(self) -> &'static str {
        match self {
            MoveKind::NonMoved => "NonMovedVariable",
            MoveKind::Moved => "MovedVariable",
            MoveKind::Forwarded => "ForwardedVariable",
        }
    }
}

/// What object a lifetime value tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifetimeKind {
    Object,
    Lambda,
    Iterator,
    Address,
}

/// Where the tracked lifetime comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifetimeScope {
    Local,
    Argument,
}

/// One value-flow fact: what an expression could be at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Value {
    pub value_type: ValueType,

    /// Int, buffer-size and container-size payload.
    pub intvalue: i64,
    /// Token alias payload: the token that has the value (pointer
    /// aliases, string aliases, lifetimes).
    pub tokvalue: Option<TokenId>,
    /// Float payload.
    pub float_value: f64,
    /// Moved payload.
    pub move_kind: MoveKind,

    /// For calculated values: the variable value this one depends on.
    pub varvalue: i64,
    /// The condition this value depends on, when it is conditional.
    pub condition: Option<TokenId>,
    /// Steps explaining how the value arose, for error messages.
    pub error_path: Vec<(TokenId, String)>,
    /// For calculated values: the variable id this one depends on.
    pub var_id: u32,
    /// Conditional value.
    pub conditional: bool,
    /// Passed as a default argument.
    pub default_arg: bool,

    pub lifetime_kind: LifetimeKind,
    pub lifetime_scope: LifetimeScope,

    pub value_kind: ValueKind,
}

impl Default for Value {
    fn default() -> Self {
        Value::new(0)
    }
}

impl Value {
    /// A possible int value.
    pub fn new(val: i64) -> Self {
        Value {
            value_type: ValueType::Int,
            intvalue: val,
            tokvalue: None,
            float_value: 0.0,
            move_kind: MoveKind::NonMoved,
            varvalue: val,
            condition: None,
            error_path: Vec::new(),
            var_id: 0,
            conditional: false,
            default_arg: false,
            lifetime_kind: LifetimeKind::Object,
            lifetime_scope: LifetimeScope::Local,
            value_kind: ValueKind::Possible,
        }
    }

    /// An int value that depends on `condition`.
    pub fn with_condition(condition: TokenId, val: i64) -> Self {
        Value {
            condition: Some(condition),
            ..Value::new(val)
        }
    }

    #[inline]
    pub fn is_int_value(&self) -> bool {
        self.value_type == ValueType::Int
    }

    #[inline]
    pub fn is_tok_value(&self) -> bool {
        self.value_type == ValueType::Tok
    }

    #[inline]
    pub fn is_float_value(&self) -> bool {
        self.value_type == ValueType::Float
    }

    #[inline]
    pub fn is_moved_value(&self) -> bool {
        self.value_type == ValueType::Moved
    }

    #[inline]
    pub fn is_uninit_value(&self) -> bool {
        self.value_type == ValueType::Uninit
    }

    #[inline]
    pub fn is_container_size_value(&self) -> bool {
        self.value_type == ValueType::ContainerSize
    }

    #[inline]
    pub fn is_lifetime_value(&self) -> bool {
        self.value_type == ValueType::Lifetime
    }

    #[inline]
    pub fn is_buffer_size_value(&self) -> bool {
        self.value_type == ValueType::BufferSize
    }

    pub fn is_local_lifetime_value(&self) -> bool {
        self.is_lifetime_value() && self.lifetime_scope == LifetimeScope::Local
    }

    pub fn is_argument_lifetime_value(&self) -> bool {
        self.is_lifetime_value() && self.lifetime_scope == LifetimeScope::Argument
    }

    #[inline]
    pub fn is_known(&self) -> bool {
        self.value_kind == ValueKind::Known
    }

    #[inline]
    pub fn is_possible(&self) -> bool {
        self.value_kind == ValueKind::Possible
    }

    #[inline]
    pub fn is_inconclusive(&self) -> bool {
        self.value_kind == ValueKind::Inconclusive
    }

    pub fn set_known(&mut self) {
        self.value_kind = ValueKind::Known;
    }

    pub fn set_possible(&mut self) {
        self.value_kind = ValueKind::Possible;
    }

    pub fn set_inconclusive(&mut self, inconclusive: bool) {
        if inconclusive {
            self.value_kind = ValueKind::Inconclusive;
        }
    }

    pub fn change_known_to_possible(&mut self) {
        if self.is_known() {
            self.value_kind = ValueKind::Possible;
        }
    }

    /// Unconditional, non-default values are reported at error severity.
    pub fn error_severity(&self) -> bool {
        self.condition.is_none() && !self.default_arg
    }

    /// Chainable known/possible/inconclusive marker, handy in tests and
    /// value-flow passes.
    pub fn with_kind(mut self, kind: ValueKind) -> Self {
        self.value_kind = kind;
        self
    }
}

impl PartialEq for Value {
    fn eq(&self, rhs: &Value) -> bool {
        if self.value_type != rhs.value_type {
            return false;
        }
        match self.value_type {
            ValueType::Int | ValueType::BufferSize | ValueType::ContainerSize => {
                if self.intvalue != rhs.intvalue {
                    return false;
                }
            }
            ValueType::Tok | ValueType::Lifetime => {
                if self.tokvalue != rhs.tokvalue {
                    return false;
                }
            }
            ValueType::Float => {
                // Deliberately not `!=`: NaN payloads compare equal here.
                if self.float_value > rhs.float_value || self.float_value < rhs.float_value {
                    return false;
                }
            }
            ValueType::Moved => {
                if self.move_kind != rhs.move_kind {
                    return false;
                }
            }
            ValueType::Uninit => {}
        }

        self.varvalue == rhs.varvalue
            && self.condition == rhs.condition
            && self.var_id == rhs.var_id
            && self.conditional == rhs.conditional
            && self.default_arg == rhs.default_arg
            && self.value_kind == rhs.value_kind
    }
}

/// Pick the best among matching values: the first non-inconclusive,
/// non-conditional hit wins; otherwise prefer non-inconclusive, then
/// unconditional.
fn select_value<'a>(values: &'a [Value], matches: impl Fn(&Value) -> bool) -> Option<&'a Value> {
    let mut ret: Option<&Value> = None;
    for value in values {
        if !matches(value) {
            continue;
        }
        let take = match ret {
            None => true,
            Some(r) => r.is_inconclusive() || (r.condition.is_some() && !value.is_inconclusive()),
        };
        if take {
            ret = Some(value);
        }
        if let Some(r) = ret {
            if !r.is_inconclusive() && r.condition.is_none() {
                break;
            }
        }
    }
    ret
}

/// Gate a selected value by the caller's settings capability.
fn settings_filter<'a>(
    ret: Option<&'a Value>,
    settings: Option<&dyn QuerySettings>,
) -> Option<&'a Value> {
    let value = ret?;
    if let Some(s) = settings {
        if value.is_inconclusive() && !s.inconclusive_enabled() {
            return None;
        }
        if value.condition.is_some() && !s.warning_enabled() {
            return None;
        }
    }
    Some(value)
}

impl TokenStream {
    /// The token's value list; empty when it has none.
    pub fn values(&self, tok: TokenId) -> &[Value] {
        self.tok(tok).values.as_deref().unwrap_or(&[])
    }

    /// Attach a value to the token, applying the merge rules:
    ///
    /// 1. A Known value first drops every existing value of its type.
    /// 2. Lists hold at most ten values; further ones are rejected.
    /// 3. A value equal in type, int payload and (for aliases) target
    ///    token replaces an inconclusive twin, or is dropped as a
    ///    duplicate.
    /// 4. Otherwise the value is stored, Known ints at the front, with
    ///    the token's own variable id stamped on a zero `var_id`.
    ///
    /// Returns whether the token's list changed.
    pub fn add_value(&mut self, tok: TokenId, value: Value) -> bool {
        let token_var_id = self.tok(tok).var_id();

        if value.is_known() {
            if let Some(values) = self.tok_mut(tok).values.as_mut() {
                values.retain(|x| x.value_type != value.value_type);
            }
        }

        let mut values = self.tok_mut(tok).values.take();
        let mut mutated = true;
        match values.as_mut() {
            None => {
                let mut v = value;
                if v.var_id == 0 {
                    v.var_id = token_var_id;
                }
                values = Some(vec![v]);
            }
            Some(list) => {
                if list.len() >= 10 {
                    mutated = false;
                } else {
                    let mut handled = false;
                    for i in 0..list.len() {
                        let existing = &list[i];
                        if existing.intvalue != value.intvalue {
                            continue;
                        }
                        if existing.value_type != value.value_type {
                            continue;
                        }
                        if value.is_tok_value() || value.is_lifetime_value() {
                            let same_target = match (existing.tokvalue, value.tokvalue) {
                                (Some(a), Some(b)) => a == b || self.text(a) == self.text(b),
                                (None, None) => true,
                                _ => false,
                            };
                            if !same_target {
                                continue;
                            }
                        }
                        if existing.is_inconclusive() && !value.is_inconclusive() {
                            // Same value, but the old one is inconclusive:
                            // replace it in place.
                            list[i] = value.clone();
                            if list[i].var_id == 0 {
                                list[i].var_id = token_var_id;
                            }
                        } else {
                            mutated = false;
                        }
                        handled = true;
                        break;
                    }
                    if !handled {
                        let mut v = value;
                        if v.var_id == 0 {
                            v.var_id = token_var_id;
                        }
                        if v.is_known() && v.is_int_value() {
                            list.insert(0, v);
                        } else {
                            list.push(v);
                        }
                    }
                }
            }
        }
        self.tok_mut(tok).values = values;
        mutated
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// First int value `<= val` by the shared selection rule.
    pub fn get_value_le(
        &self,
        tok: TokenId,
        val: i64,
        settings: Option<&dyn QuerySettings>,
    ) -> Option<&Value> {
        let values = self.tok(tok).values.as_deref()?;
        let ret = select_value(values, |v| v.is_int_value() && v.intvalue <= val);
        settings_filter(ret, settings)
    }

    /// First int value `>= val` by the shared selection rule.
    pub fn get_value_ge(
        &self,
        tok: TokenId,
        val: i64,
        settings: Option<&dyn QuerySettings>,
    ) -> Option<&Value> {
        let values = self.tok(tok).values.as_deref()?;
        let ret = select_value(values, |v| v.is_int_value() && v.intvalue >= val);
        settings_filter(ret, settings)
    }

    /// First value that is invalid as argument `argnr` of the function
    /// called at `ftok`, per the library knowledge in `settings`.
    pub fn get_invalid_value(
        &self,
        tok: TokenId,
        ftok: TokenId,
        argnr: usize,
        settings: Option<&dyn QuerySettings>,
    ) -> Option<&Value> {
        let s = settings?;
        let values = self.tok(tok).values.as_deref()?;
        let fname = self.text(ftok);
        let ret = select_value(values, |v| {
            (v.is_int_value() && !s.is_int_arg_valid(fname, argnr, v.intvalue))
                || (v.is_float_value() && !s.is_float_arg_valid(fname, argnr, v.float_value))
        });
        settings_filter(ret, settings)
    }

    /// Among token-alias values pointing at string literals, the one
    /// with the smallest byte size (terminator included).
    pub fn get_value_token_min_str_size(&self, tok: TokenId) -> Option<TokenId> {
        let values = self.tok(tok).values.as_deref()?;
        let mut ret: Option<TokenId> = None;
        let mut minsize = usize::MAX;
        for value in values {
            if !value.is_tok_value() {
                continue;
            }
            let Some(tv) = value.tokvalue else { continue };
            if self.tok(tv).kind() != TokenKind::String {
                continue;
            }
            let size = self.tok(tv).str_size();
            if ret.is_none() || size < minsize {
                minsize = size;
                ret = Some(tv);
            }
        }
        ret
    }

    /// Among token-alias values pointing at string literals, the one
    /// with the greatest character length (stopping at embedded `\0`).
    pub fn get_value_token_max_str_length(&self, tok: TokenId) -> Option<TokenId> {
        let values = self.tok(tok).values.as_deref()?;
        let mut ret: Option<TokenId> = None;
        let mut maxlength = 0usize;
        for value in values {
            if !value.is_tok_value() {
                continue;
            }
            let Some(tv) = value.tokvalue else { continue };
            if self.tok(tv).kind() != TokenKind::String {
                continue;
            }
            let length = self.tok(tv).str_length();
            if ret.is_none() || length > maxlength {
                maxlength = length;
                ret = Some(tv);
            }
        }
        ret
    }

    fn function_scope_of(
        &self,
        symbols: &dyn SymbolLookup,
        mut scope: Option<ScopeRef>,
    ) -> Option<ScopeRef> {
        while let Some(s) = scope {
            if symbols.scope_kind(s) == ScopeKind::Function {
                return Some(s);
            }
            scope = symbols.nested_in(s);
        }
        None
    }

    /// First pointer-alias value whose pointee's scope is not an
    /// ancestor of the query token's scope within the same function:
    /// the address outlives the object. Static and reference variables
    /// are ignored, as are union members of the enclosing scope.
    pub fn get_value_token_dead_pointer(
        &self,
        tok: TokenId,
        symbols: &dyn SymbolLookup,
    ) -> Option<TokenId> {
        let tok_scope = self.tok(tok).scope;
        let functionscope = self.function_scope_of(symbols, tok_scope);

        for value in self.values(tok) {
            // Pointer aliases only.
            if !value.is_tok_value() {
                continue;
            }
            let Some(tv) = value.tokvalue else { continue };
            if self.text(tv) != "&" {
                continue;
            }
            let Some(vartok) = self.tok(tv).ast_op1 else { continue };
            if !self.tok(vartok).is_name() {
                continue;
            }
            let Some(var) = self.tok(vartok).variable else { continue };
            if symbols.is_static(var) || symbols.is_reference(var) {
                continue;
            }
            let Some(var_scope) = symbols.variable_scope(var) else {
                return None;
            };
            if symbols.scope_kind(var_scope) == ScopeKind::Union
                && symbols.nested_in(var_scope) == tok_scope
            {
                continue;
            }
            // The variable must live in the same function, not a callee.
            if functionscope != self.function_scope_of(symbols, Some(var_scope)) {
                continue;
            }
            // Defined in this scope or an enclosing one?
            let mut s = tok_scope;
            while let Some(cur) = s {
                if cur == var_scope {
                    break;
                }
                s = symbols.nested_in(cur);
            }
            if s.is_none() {
                return Some(tv);
            }
        }
        None
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Render every token's value list, as XML (`<valueflow>` with one
    /// `<values>` block per token) or as readable text grouped by line.
    pub fn print_value_flow(&self, xml: bool) -> String {
        let mut out = String::new();
        let mut line = 0u32;
        if xml {
            out.push_str("  <valueflow>\n");
        } else {
            out.push_str("\n\n##Value flow\n");
        }
        for id in self.token_ids() {
            let t = self.tok(id);
            let Some(values) = t.values.as_deref() else { continue };
            if values.is_empty() {
                continue;
            }
            if xml {
                out.push_str(&format!("    <values id=\"{}\">\n", id.0));
            } else if line != t.line {
                out.push_str(&format!("Line {}\n", t.line));
            }
            line = t.line;
            if !xml {
                out.push_str("  ");
                out.push_str(t.str());
                out.push_str(if values[0].is_known() {
                    " always "
                } else {
                    " possible "
                });
                if values.len() > 1 {
                    out.push('{');
                }
            }
            let unsigned_tok = matches!(
                t.value_type.as_ref().map(|vt| vt.sign),
                Some(Sign::Unsigned)
            );
            for (i, value) in values.iter().enumerate() {
                if xml {
                    out.push_str("      <value ");
                    match value.value_type {
                        ValueType::Int => {
                            if unsigned_tok {
                                out.push_str(&format!("intvalue=\"{}\"", value.intvalue as u64));
                            } else {
                                out.push_str(&format!("intvalue=\"{}\"", value.intvalue));
                            }
                        }
                        ValueType::Tok => {
                            if let Some(tv) = value.tokvalue {
                                out.push_str(&format!("tokvalue=\"{}\"", tv.0));
                            }
                        }
                        ValueType::Float => {
                            out.push_str(&format!("floatvalue=\"{}\"", value.float_value));
                        }
                        ValueType::Moved => {
                            out.push_str(&format!("movedvalue=\"{}\"", value.move_kind.as_str()));
                        }
                        ValueType::Uninit => out.push_str("uninit=\"1\""),
                        ValueType::BufferSize => {
                            out.push_str(&format!("buffer-size=\"{}\"", value.intvalue));
                        }
                        ValueType::ContainerSize => {
                            out.push_str(&format!("container-size=\"{}\"", value.intvalue));
                        }
                        ValueType::Lifetime => {
                            if let Some(tv) = value.tokvalue {
                                out.push_str(&format!("lifetime=\"{}\"", tv.0));
                            }
                        }
                    }
                    if let Some(condition) = value.condition {
                        out.push_str(&format!(
                            " condition-line=\"{}\"",
                            self.tok(condition).line
                        ));
                    }
                    match value.value_kind {
                        ValueKind::Known => out.push_str(" known=\"true\""),
                        ValueKind::Possible => out.push_str(" possible=\"true\""),
                        ValueKind::Inconclusive => out.push_str(" inconclusive=\"true\""),
                    }
                    out.push_str("/>\n");
                } else {
                    if i > 0 {
                        out.push(',');
                    }
                    match value.value_type {
                        ValueType::Int => {
                            if unsigned_tok {
                                out.push_str(&(value.intvalue as u64).to_string());
                            } else {
                                out.push_str(&value.intvalue.to_string());
                            }
                        }
                        ValueType::Tok => {
                            if let Some(tv) = value.tokvalue {
                                out.push_str(self.text(tv));
                            }
                        }
                        ValueType::Float => out.push_str(&value.float_value.to_string()),
                        ValueType::Moved => out.push_str(value.move_kind.as_str()),
                        ValueType::Uninit => out.push_str("Uninit"),
                        ValueType::BufferSize | ValueType::ContainerSize => {
                            out.push_str(&format!("size={}", value.intvalue));
                        }
                        ValueType::Lifetime => {
                            if let Some(tv) = value.tokvalue {
                                out.push_str(&format!("lifetime={}", self.text(tv)));
                            }
                        }
                    }
                }
            }
            if xml {
                out.push_str("    </values>\n");
            } else if values.len() > 1 {
                out.push_str("}\n");
            } else {
                out.push('\n');
            }
        }
        if xml {
            out.push_str("  </valueflow>\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Library, Settings};
    use crate::symbols::{ScopeKind, SymbolTable};

    fn int_value(val: i64, kind: ValueKind) -> Value {
        Value::new(val).with_kind(kind)
    }

    #[test]
    fn test_add_value_stores_and_dedups() {
        let mut stream = TokenStream::from_words("x");
        let x = stream.front().unwrap();
        assert!(stream.add_value(x, int_value(5, ValueKind::Possible)));
        // The identical value again is a duplicate.
        assert!(!stream.add_value(x, int_value(5, ValueKind::Possible)));
        assert_eq!(stream.values(x).len(), 1);
    }

    #[test]
    fn test_add_value_known_replaces_inconclusive() {
        let mut stream = TokenStream::from_words("x");
        let x = stream.front().unwrap();
        assert!(stream.add_value(x, int_value(5, ValueKind::Inconclusive)));
        assert!(stream.add_value(x, int_value(5, ValueKind::Known)));
        let values = stream.values(x);
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].intvalue, 5);
        assert!(values[0].is_known());
    }

    #[test]
    fn test_add_value_known_purges_same_type() {
        let mut stream = TokenStream::from_words("x");
        let x = stream.front().unwrap();
        assert!(stream.add_value(x, int_value(1, ValueKind::Possible)));
        assert!(stream.add_value(x, int_value(2, ValueKind::Possible)));
        let mut moved = Value::new(0);
        moved.value_type = ValueType::Moved;
        moved.move_kind = MoveKind::Moved;
        assert!(stream.add_value(x, moved));
        // Known int clears the other ints but not the moved value.
        assert!(stream.add_value(x, int_value(7, ValueKind::Known)));
        let values = stream.values(x);
        assert_eq!(values.len(), 2);
        // Known ints are front-inserted.
        assert_eq!(values[0].intvalue, 7);
        assert!(values[0].is_known());
        assert!(values[1].is_moved_value());
    }

    #[test]
    fn test_add_value_cap_at_ten() {
        let mut stream = TokenStream::from_words("x");
        let x = stream.front().unwrap();
        for i in 0..10 {
            assert!(stream.add_value(x, int_value(i, ValueKind::Possible)));
        }
        assert!(!stream.add_value(x, int_value(999, ValueKind::Possible)));
        assert_eq!(stream.values(x).len(), 10);
    }

    #[test]
    fn test_add_value_stamps_var_id() {
        let mut stream = TokenStream::from_words("x");
        let x = stream.front().unwrap();
        stream.tok_mut(x).set_var_id(42);
        stream.add_value(x, int_value(1, ValueKind::Possible));
        assert_eq!(stream.values(x)[0].var_id, 42);
    }

    #[test]
    fn test_add_value_tok_alias_dedup_by_lexeme() {
        let mut stream = TokenStream::from_words("p \"abc\" \"abc\"");
        let v: Vec<TokenId> = stream.token_ids().collect();
        let mut alias = Value::new(0);
        alias.value_type = ValueType::Tok;
        alias.tokvalue = Some(v[1]);
        assert!(stream.add_value(v[0], alias.clone()));
        // A different token with the same lexeme is still a duplicate.
        let mut alias2 = alias.clone();
        alias2.tokvalue = Some(v[2]);
        assert!(!stream.add_value(v[0], alias2));
        assert_eq!(stream.values(v[0]).len(), 1);
    }

    #[test]
    fn test_value_equality_float_nan_identity() {
        let mut a = Value::new(0);
        a.value_type = ValueType::Float;
        a.float_value = f64::NAN;
        let mut b = a.clone();
        b.float_value = f64::NAN;
        // `a > b || a < b` is false for NaN, so the records compare equal.
        assert!(a == b);
        b.float_value = 1.0;
        assert!(a == b);
        a.float_value = 2.0;
        assert!(a != b);
    }

    #[test]
    fn test_get_value_le_ge() {
        let mut stream = TokenStream::from_words("x");
        let x = stream.front().unwrap();
        stream.add_value(x, int_value(5, ValueKind::Possible));
        stream.add_value(x, int_value(10, ValueKind::Possible));
        assert_eq!(stream.get_value_le(x, 7, None).unwrap().intvalue, 5);
        assert_eq!(stream.get_value_ge(x, 7, None).unwrap().intvalue, 10);
        assert!(stream.get_value_le(x, 4, None).is_none());
        assert!(stream.get_value_ge(x, 11, None).is_none());
    }

    #[test]
    fn test_query_selection_prefers_unconditional() {
        let mut stream = TokenStream::from_words("if x");
        let v: Vec<TokenId> = stream.token_ids().collect();
        let (cond, x) = (v[0], v[1]);
        stream.add_value(x, Value::with_condition(cond, 3));
        stream.add_value(x, int_value(2, ValueKind::Possible));
        // Both match <= 5; the unconditional one wins.
        let hit = stream.get_value_le(x, 5, None).unwrap();
        assert_eq!(hit.intvalue, 2);
        assert!(hit.condition.is_none());
    }

    #[test]
    fn test_query_settings_gate_inconclusive_and_conditional() {
        let mut stream = TokenStream::from_words("if x y");
        let v: Vec<TokenId> = stream.token_ids().collect();
        let (cond, x, y) = (v[0], v[1], v[2]);

        stream.add_value(x, int_value(3, ValueKind::Inconclusive));
        let off = Settings::new();
        assert!(stream.get_value_le(x, 5, Some(&off)).is_none());
        let mut on = Settings::new();
        on.inconclusive = true;
        assert!(stream.get_value_le(x, 5, Some(&on)).is_some());

        stream.add_value(y, Value::with_condition(cond, 3));
        assert!(stream.get_value_le(y, 5, Some(&off)).is_none());
        let mut warn = Settings::new();
        warn.add_enabled("warning").unwrap();
        assert!(stream.get_value_le(y, 5, Some(&warn)).is_some());
    }

    #[test]
    fn test_get_invalid_value() {
        let mut stream = TokenStream::from_words("memset ( p , 0 , n )");
        let v: Vec<TokenId> = stream.token_ids().collect();
        let ftok = v[0];
        let arg = v[5];
        stream.add_value(arg, int_value(-1, ValueKind::Possible));

        let mut settings = Settings::new();
        settings.library = {
            let mut library = Library::new();
            library.set_valid_int_args("memset", 3, vec![(0, i64::MAX)]);
            library
        };
        let hit = stream.get_invalid_value(arg, ftok, 3, Some(&settings));
        assert_eq!(hit.unwrap().intvalue, -1);
        // Without settings there is no library to consult.
        assert!(stream.get_invalid_value(arg, ftok, 3, None).is_none());
    }

    #[test]
    fn test_min_str_size_and_max_str_length() {
        let mut stream = TokenStream::from_words("p \"abc\" \"a\\0bcdef\"");
        let v: Vec<TokenId> = stream.token_ids().collect();
        for tv in [v[1], v[2]] {
            let mut alias = Value::new(0);
            alias.value_type = ValueType::Tok;
            alias.tokvalue = Some(tv);
            // Distinct intvalue keeps them from deduplicating.
            alias.intvalue = tv.0 as i64;
            alias.varvalue = alias.intvalue;
            stream.add_value(v[0], alias);
        }
        // "abc" is 4 bytes with terminator; "a\0bcdef" is 8.
        assert_eq!(stream.get_value_token_min_str_size(v[0]), Some(v[1]));
        // Length of "a\0bcdef" stops at the embedded \0 (1), "abc" is 3.
        assert_eq!(stream.get_value_token_max_str_length(v[0]), Some(v[1]));
    }

    #[test]
    fn test_dead_pointer_detection() {
        // p = & x, queried from outside x's block scope.
        let mut symbols = SymbolTable::new();
        let global = symbols.add_scope(ScopeKind::Global, None);
        let function = symbols.add_scope(ScopeKind::Function, Some(global));
        let block = symbols.add_scope(ScopeKind::Block, Some(function));
        let var = symbols.add_variable(Some(block), false, false);

        let mut stream = TokenStream::from_words("& x ; p");
        let v: Vec<TokenId> = stream.token_ids().collect();
        let (amp, x, use_site) = (v[0], v[1], v[3]);
        stream.set_ast_operand1(amp, Some(x)).unwrap();
        stream.tok_mut(x).set_var_id(1);
        stream.tok_mut(x).variable = Some(var);
        stream.tok_mut(use_site).scope = Some(function);

        let mut alias = Value::new(0);
        alias.value_type = ValueType::Tok;
        alias.tokvalue = Some(amp);
        stream.add_value(use_site, alias);

        // The block scope is not on the use site's ancestor chain.
        assert_eq!(
            stream.get_value_token_dead_pointer(use_site, &symbols),
            Some(amp)
        );

        // From inside the block the pointer is fine.
        stream.tok_mut(use_site).scope = Some(block);
        assert_eq!(stream.get_value_token_dead_pointer(use_site, &symbols), None);

        // Static variables never dangle this way.
        let static_var = symbols.add_variable(Some(block), true, false);
        stream.tok_mut(x).variable = Some(static_var);
        stream.tok_mut(use_site).scope = Some(function);
        assert_eq!(stream.get_value_token_dead_pointer(use_site, &symbols), None);
    }

    #[test]
    fn test_print_value_flow_xml() {
        let mut stream = TokenStream::from_words("x y");
        let v: Vec<TokenId> = stream.token_ids().collect();
        stream.add_value(v[0], int_value(5, ValueKind::Known));
        let mut uninit = Value::new(0);
        uninit.value_type = ValueType::Uninit;
        stream.add_value(v[1], uninit);

        let xml = stream.print_value_flow(true);
        assert!(xml.starts_with("  <valueflow>\n"));
        assert!(xml.contains(&format!("    <values id=\"{}\">\n", v[0].0)));
        assert!(xml.contains("<value intvalue=\"5\" known=\"true\"/>"));
        assert!(xml.contains("<value uninit=\"1\" possible=\"true\"/>"));
        assert!(xml.ends_with("  </valueflow>\n"));
    }

    #[test]
    fn test_print_value_flow_xml_unsigned_rendering() {
        use crate::token::{Sign, ValueTypeInfo};
        let mut stream = TokenStream::from_words("x");
        let x = stream.front().unwrap();
        stream.tok_mut(x).value_type = Some(ValueTypeInfo {
            sign: Sign::Unsigned,
            name: "unsigned int".to_string(),
        });
        stream.add_value(x, int_value(-1, ValueKind::Known));
        let xml = stream.print_value_flow(true);
        assert!(xml.contains(&format!("intvalue=\"{}\"", u64::MAX)));
    }

    #[test]
    fn test_print_value_flow_text() {
        let mut stream = TokenStream::from_words("x");
        let x = stream.front().unwrap();
        stream.add_value(x, int_value(1, ValueKind::Possible));
        stream.add_value(x, int_value(2, ValueKind::Possible));
        let text = stream.print_value_flow(false);
        assert!(text.contains("##Value flow"));
        assert!(text.contains("Line 1"));
        assert!(text.contains("  x possible {1,2}"));
    }

    #[test]
    fn test_condition_line_attribute() {
        let mut stream = TokenStream::from_words("if x");
        let v: Vec<TokenId> = stream.token_ids().collect();
        stream.tok_mut(v[0]).line = 7;
        stream.add_value(v[1], Value::with_condition(v[0], 3));
        let xml = stream.print_value_flow(true);
        assert!(xml.contains("condition-line=\"7\""));
    }
}
