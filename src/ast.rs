//! Expression-tree links and queries on the token stream.
//!
//! AST structure is stored intrusively on the tokens themselves
//! (`ast_op1`/`ast_op2`/`ast_parent`); the functions here maintain those
//! links and answer the queries checkers ask of them. Because the tree
//! is mutated in place over a shared token graph, operand assignment
//! guards against parent cycles with a visited set — a cycle is an
//! internal error, never a hang.

use rustc_hash::FxHashSet;

use crate::error::{CcflowError, Result};
use crate::stream::{TokenId, TokenStream};

impl TokenStream {
    /// First AST operand.
    #[inline]
    pub fn ast_op1(&self, tok: TokenId) -> Option<TokenId> {
        self.tok(tok).ast_op1
    }

    /// Second AST operand.
    #[inline]
    pub fn ast_op2(&self, tok: TokenId) -> Option<TokenId> {
        self.tok(tok).ast_op2
    }

    /// Operator this token is an operand of.
    #[inline]
    pub fn ast_parent(&self, tok: TokenId) -> Option<TokenId> {
        self.tok(tok).ast_parent
    }

    /// Root of the expression this token belongs to.
    pub fn ast_top(&self, tok: TokenId) -> TokenId {
        let mut cur = tok;
        while let Some(parent) = self.tok(cur).ast_parent {
            cur = parent;
        }
        cur
    }

    /// Set the first AST operand of `tok`.
    ///
    /// The operand's topmost ancestor becomes a child of `tok`; walking
    /// to that ancestor is guarded against parent cycles.
    ///
    /// # Errors
    ///
    /// A cycle on the parent chain is an internal error.
    pub fn set_ast_operand1(&mut self, tok: TokenId, operand: Option<TokenId>) -> Result<()> {
        if let Some(old) = self.tok(tok).ast_op1 {
            self.tok_mut(old).ast_parent = None;
        }
        if let Some(op) = operand {
            let root = self.ast_root_checked(tok, op)?;
            self.tok_mut(root).ast_parent = Some(tok);
        }
        self.tok_mut(tok).ast_op1 = operand;
        Ok(())
    }

    /// Set the second AST operand of `tok`. Same contract as
    /// [`TokenStream::set_ast_operand1`].
    pub fn set_ast_operand2(&mut self, tok: TokenId, operand: Option<TokenId>) -> Result<()> {
        if let Some(old) = self.tok(tok).ast_op2 {
            self.tok_mut(old).ast_parent = None;
        }
        if let Some(op) = operand {
            let root = self.ast_root_checked(tok, op)?;
            self.tok_mut(root).ast_parent = Some(tok);
        }
        self.tok_mut(tok).ast_op2 = operand;
        Ok(())
    }

    /// Walk to the parent-chain root of `from`, failing on a cycle.
    fn ast_root_checked(&self, at: TokenId, from: TokenId) -> Result<TokenId> {
        let mut visited: FxHashSet<TokenId> = FxHashSet::default();
        let mut cur = from;
        while let Some(parent) = self.tok(cur).ast_parent {
            if !visited.insert(parent) {
                return Err(CcflowError::internal(
                    Some(at),
                    self.text(at),
                    "cyclic dependency in syntax tree",
                ));
            }
            cur = parent;
        }
        Ok(cur)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// End of the lambda whose introducer `[` is `first`: the `}` closing
    /// its body, when `first` actually starts a lambda.
    pub fn find_lambda_end_token(&self, first: TokenId) -> Option<TokenId> {
        if self.text(first) != "[" {
            return None;
        }
        let close = self.tok(first).link?;
        let after = self.tok(close).next?;
        if !matches!(self.text(after), "(" | "{") {
            return None;
        }
        if self.tok(first).ast_op1 != Some(after) {
            return None;
        }
        let mut tok = first;
        if let Some(op1) = self.tok(tok).ast_op1 {
            if self.text(op1) == "(" {
                tok = op1;
            }
        }
        if let Some(op1) = self.tok(tok).ast_op1 {
            if self.text(op1) == "{" {
                return self.tok(op1).link;
            }
        }
        None
    }

    /// The minimal contiguous token range `[start, end]` covering the
    /// expression subtree rooted at `tok`, with balancing parentheses
    /// skipped at both ends and `{...}` bodies (including lambdas)
    /// extended through their closing brace.
    pub fn find_expression_start_end(&self, tok: TokenId) -> (TokenId, TokenId) {
        let top = tok;

        let mut start = top;
        loop {
            let t = self.tok(start);
            let Some(op1) = t.ast_op1 else { break };
            if t.ast_op2.is_some()
                || !self.is_unary_pre_op(start)
                || self.simple_match(Some(start), "( )")
                || t.str() == "{"
            {
                start = op1;
            } else {
                break;
            }
        }

        let mut end = top;
        loop {
            let t = self.tok(end);
            let Some(op1) = t.ast_op1 else { break };
            if t.ast_op2.is_none() && !self.is_unary_pre_op(end) {
                break;
            }
            if t.str() == "[" {
                if let Some(lambda_end) = self.find_lambda_end_token(end) {
                    end = lambda_end;
                    break;
                }
            }
            if matches!(t.str(), "(" | "[")
                && !(self.pattern_match(Some(end), "( %type%", 0).unwrap_or(false)
                    && t.ast_op2.is_none())
            {
                if let Some(partner) = t.link {
                    end = partner;
                }
                break;
            }
            end = t.ast_op2.unwrap_or(op1);
        }

        let start = self.go_to_left_parenthesis(start, end);
        let end = self.go_to_right_parenthesis(start, end);
        let end = match self.tok(end).link {
            Some(partner) if self.text(end) == "{" => partner,
            _ => end,
        };
        (start, end)
    }

    /// Move `start` back to the left parenthesis in expressions like
    /// `(*it).x` where the subtree walk landed inside the group.
    fn go_to_left_parenthesis(&self, mut start: TokenId, end: TokenId) -> TokenId {
        let mut par = 0u32;
        let mut cur = Some(start);
        while let Some(id) = cur {
            if id == end {
                break;
            }
            match self.text(id) {
                "(" => par += 1,
                ")" => {
                    if par == 0 {
                        if let Some(partner) = self.tok(id).link {
                            start = partner;
                        }
                    } else {
                        par -= 1;
                    }
                }
                _ => {}
            }
            cur = self.tok(id).next;
        }
        start
    }

    /// Mirror of [`Self::go_to_left_parenthesis`] for `2>(x+1)` shapes.
    fn go_to_right_parenthesis(&self, start: TokenId, mut end: TokenId) -> TokenId {
        let mut par = 0u32;
        let mut cur = Some(end);
        while let Some(id) = cur {
            if id == start {
                break;
            }
            match self.text(id) {
                ")" => par += 1,
                "(" => {
                    if par == 0 {
                        if let Some(partner) = self.tok(id).link {
                            end = partner;
                        }
                    } else {
                        par -= 1;
                    }
                }
                _ => {}
            }
            cur = self.tok(id).prev;
        }
        end
    }

    /// Textual rendering of the expression rooted at `tok` with minimal
    /// spacing: a space only between adjacent name/number tokens.
    pub fn expression_string(&self, tok: TokenId) -> String {
        let (start, end) = self.find_expression_start_end(tok);
        let stop = self.tok(end).next;
        let mut ret = String::new();
        let mut cur = Some(start);
        while let Some(id) = cur {
            if Some(id) == stop {
                break;
            }
            let t = self.tok(id);
            if t.flags.contains(crate::token::TokenFlags::UNSIGNED) {
                ret.push_str("unsigned ");
            }
            if t.flags.contains(crate::token::TokenFlags::LONG) {
                ret.push_str(if t.is_literal() { "L" } else { "long " });
            }
            match &t.original_name {
                Some(name)
                    if !t.flags.contains(crate::token::TokenFlags::UNSIGNED)
                        && !t.flags.contains(crate::token::TokenFlags::LONG) =>
                {
                    ret.push_str(name);
                }
                _ => ret.push_str(t.str()),
            }
            if t.is_name() || t.is_number() {
                if let Some(n) = t.next {
                    let nt = self.tok(n);
                    if nt.is_name() || nt.is_number() {
                        ret.push(' ');
                    }
                }
            }
            cur = t.next;
        }
        ret
    }

    /// Is this operator an actual calculation?
    ///
    /// Unary `*`/`&` without a second operand, over a `[`-group, or whose
    /// descendants carry neither a number nor a variable id is a
    /// dereference, address-of or type specification instead.
    pub fn is_calculation(&self, tok: TokenId) -> bool {
        let t = self.tok(tok);
        if !(t.is_const_op() || matches!(t.str(), "++" | "--")) {
            return false;
        }

        if matches!(t.str(), "*" | "&") {
            let Some(op2) = t.ast_op2 else { return false };
            if self.text(op2) == "[" {
                return false;
            }

            let mut operands = vec![tok];
            while let Some(op) = operands.pop() {
                let o = self.tok(op);
                if o.is_number() || o.var_id() > 0 {
                    return true;
                }
                if let Some(op1) = o.ast_op1 {
                    operands.push(op1);
                }
                if let Some(op2) = o.ast_op2 {
                    operands.push(op2);
                } else if matches!(o.str(), "*" | "&") {
                    return false;
                }
            }
            return false;
        }

        true
    }

    /// Does this token apply as a prefix operator? True when operand 1
    /// exists, operand 2 does not, and (for `++`/`--`) the operand sits
    /// to the token's right, tie-broken by a bounded neighbor scan.
    pub fn is_unary_pre_op(&self, tok: TokenId) -> bool {
        let t = self.tok(tok);
        let Some(op1) = t.ast_op1 else { return false };
        if t.ast_op2.is_some() {
            return false;
        }
        if !matches!(t.str(), "++" | "--") {
            return true;
        }
        let mut before = t.prev;
        let mut after = t.next;
        for _distance in 1..10 {
            let Some(b) = before else { break };
            if b == op1 {
                return false;
            }
            if after == Some(op1) {
                return true;
            }
            before = self.tok(b).prev;
            after = after.and_then(|a| self.tok(a).prev);
        }
        false
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Post-order rendering of the subtree rooted at `tok`; every token
    /// is preceded by `sep`.
    pub fn ast_string(&self, tok: TokenId, sep: &str) -> String {
        let mut ret = String::new();
        self.ast_string_into(tok, sep, &mut ret);
        ret
    }

    fn ast_string_into(&self, tok: TokenId, sep: &str, ret: &mut String) {
        let t = self.tok(tok);
        if let Some(op1) = t.ast_op1 {
            self.ast_string_into(op1, sep, ret);
        }
        if let Some(op2) = t.ast_op2 {
            self.ast_string_into(op2, sep, ret);
        }
        ret.push_str(sep);
        ret.push_str(t.str());
    }

    /// Depth-indented tree rendering of the subtree rooted at `tok`,
    /// using `|-` and `` `- `` connectors. Expanded-macro tokens carry a
    /// `$` prefix; a known expression type is appended in quotes.
    pub fn ast_string_verbose(&self, tok: TokenId) -> String {
        let mut ret = String::new();
        self.ast_string_verbose_into(tok, 0, 0, &mut ret);
        ret
    }

    fn ast_string_verbose_into(&self, tok: TokenId, indent1: u32, indent2: u32, ret: &mut String) {
        let t = self.tok(tok);
        if t.is_expanded_macro() {
            ret.push('$');
        }
        ret.push_str(t.str());
        if let Some(vt) = &t.value_type {
            ret.push_str(" '");
            ret.push_str(&vt.name);
            ret.push('\'');
        }
        ret.push('\n');

        fn indent(ret: &mut String, indent1: u32, indent2: u32) {
            for _ in 0..indent1 {
                ret.push(' ');
            }
            let mut i = indent1;
            while i < indent2 {
                ret.push_str("| ");
                i += 2;
            }
        }

        if let Some(op1) = t.ast_op1 {
            let mut i1 = indent1;
            let i2 = indent2 + 2;
            if indent1 == indent2 && t.ast_op2.is_none() {
                i1 += 2;
            }
            indent(ret, indent1, indent2);
            ret.push_str(if t.ast_op2.is_some() { "|-" } else { "`-" });
            self.ast_string_verbose_into(op1, i1, i2, ret);
        }
        if let Some(op2) = t.ast_op2 {
            let mut i1 = indent1;
            let i2 = indent2 + 2;
            if indent1 == indent2 {
                i1 += 2;
            }
            indent(ret, indent1, indent2);
            ret.push_str("`-");
            self.ast_string_verbose_into(op2, i1, i2, ret);
        }
    }

    fn ast_string_xml_into(&self, tok: TokenId, indent: usize, out: &mut String) {
        let pad = " ".repeat(indent);
        let t = self.tok(tok);
        out.push_str(&pad);
        out.push_str("<token str=\"");
        out.push_str(t.str());
        out.push('"');
        if t.var_id() > 0 {
            out.push_str(&format!(" varId=\"{}\"", t.var_id()));
        }
        if let Some(v) = t.variable {
            out.push_str(&format!(" variable=\"{}\"", v.0));
        }
        if let Some(f) = t.function {
            out.push_str(&format!(" function=\"{}\"", f.0));
        }
        if let Some(values) = &t.values {
            if !values.is_empty() {
                out.push_str(&format!(" values=\"{}\"", values.len()));
            }
        }
        if t.ast_op1.is_none() && t.ast_op2.is_none() {
            out.push_str("/>\n");
        } else {
            out.push_str(">\n");
            if let Some(op1) = t.ast_op1 {
                self.ast_string_xml_into(op1, indent + 2, out);
            }
            if let Some(op2) = t.ast_op2 {
                self.ast_string_xml_into(op2, indent + 2, out);
            }
            out.push_str(&pad);
            out.push_str("</token>\n");
        }
    }

    /// Render every expression tree in the stream, verbose
    /// (depth-indented), compact (post-order) or as XML.
    pub fn print_ast(&self, verbose: bool, xml: bool) -> String {
        let mut out = String::new();
        let mut printed: FxHashSet<TokenId> = FxHashSet::default();
        let mut cur = self.front();
        while let Some(id) = cur {
            let t = self.tok(id);
            if t.ast_parent.is_none() && t.ast_op1.is_some() {
                if printed.is_empty() && !xml {
                    out.push_str("\n\n##AST\n");
                } else if printed.contains(&id) {
                    cur = t.next;
                    continue;
                }
                printed.insert(id);

                if xml {
                    out.push_str(&format!(
                        "<ast fileIndex=\"{}\" linenr=\"{}\" col=\"{}\">\n",
                        t.file_index, t.line, t.column
                    ));
                    self.ast_string_xml_into(id, 2, &mut out);
                    out.push_str("</ast>\n");
                } else if verbose {
                    out.push_str(&self.ast_string_verbose(id));
                    out.push('\n');
                } else {
                    out.push_str(&self.ast_string(id, " "));
                    out.push('\n');
                }
                if t.str() == "(" {
                    if let Some(partner) = t.link {
                        cur = self.tok(partner).next;
                        continue;
                    }
                }
            }
            cur = self.tok(id).next;
        }
        out
    }
}
