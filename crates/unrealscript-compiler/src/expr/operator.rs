//! Operators.
//!
//! Operators are script functions declared with `operator`, `preoperator`
//! or `postoperator`. An application picks the visible overload whose
//! parameters the operands convert to most cheaply. Binary operators bind by
//! precedence: a lower number binds tighter, and the right operand of an
//! operator only takes operators that bind tighter still, so chains
//! associate to the left.
//!
//! Struct and delegate comparisons without a matching overload compile to
//! built-in tokens.

use unrealscript_core::limits::MAX_OPERATOR_PRECEDENCE;
use unrealscript_core::{
    FunctionFlags, FunctionId, ObjectRef, PropertyBase, PropertyFlags, PropertyId, PropertyType,
};
use unrealscript_parser::Token;

use super::CallKind;
use crate::bytecode::ExprToken;
use crate::compiler::{Result, ScriptCompiler, token_error, value_type};
use crate::conversion::{
    Conversion, ConversionKind, conversion_cost, find_conversion, same_type, signatures_match,
};
use crate::expr_info::ExprInfo;

/// Operator arity, from how the function was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fixity {
    Prefix,
    Postfix,
    Binary,
}

impl<'a> ScriptCompiler<'a> {
    /// Whether `symbol` names a visible prefix operator.
    pub(crate) fn has_prefix_operator(&self, symbol: &str) -> bool {
        !self.operator_candidates(symbol, Fixity::Prefix).is_empty()
    }

    /// A prefix operator applied to the operand that follows it.
    pub(crate) fn compile_prefix_operator(&mut self, token: &Token) -> Result<ExprInfo> {
        let candidates = self.operator_candidates(&token.text, Fixity::Prefix);
        let context = format!("operator '{}'", token.text);
        let operand = self
            .compile_expr_prec(None, 0)?
            .filter(|o| !o.is_void())
            .ok_or_else(|| {
                token_error(token, format!("Bad or missing expression after '{}'", token.text))
            })?;
        let function = self.resolve_operator(token, &candidates, &[&operand])?.ok_or_else(|| {
            token_error(
                token,
                format!(
                    "No {} for '{}'",
                    context,
                    self.describe_type(&operand.ty)
                ),
            )
        })?;
        let start = operand.start;
        self.emit_operator_call(function, vec![operand], start)
    }

    /// Apply postfix, binary and `?:` operators to `left` while they bind
    /// tighter than `max_prec`.
    pub(crate) fn compile_operators(
        &mut self,
        mut left: ExprInfo,
        hint: Option<&PropertyBase>,
        max_prec: u8,
    ) -> Result<ExprInfo> {
        loop {
            let token = self.peek()?;
            if !(token.is_symbol() || token.is_identifier()) {
                return Ok(left);
            }

            if token.matches_symbol("?") {
                if max_prec < MAX_OPERATOR_PRECEDENCE {
                    return Ok(left);
                }
                self.get_word()?;
                return self.compile_conditional(left, hint);
            }

            let postfix = self.operator_candidates(&token.text, Fixity::Postfix);
            if !postfix.is_empty()
                && !left.is_void()
                && let Some(function) = self.resolve_operator(&token, &postfix, &[&left])?
            {
                self.get_word()?;
                let start = left.start;
                left = self.emit_operator_call(function, vec![left], start)?;
                continue;
            }

            let binary: Vec<FunctionId> = self
                .operator_candidates(&token.text, Fixity::Binary)
                .into_iter()
                .filter(|f| self.registry.function(*f).operator_precedence < max_prec)
                .collect();
            let Some(precedence) = binary
                .iter()
                .map(|f| self.registry.function(*f).operator_precedence)
                .min()
            else {
                return Ok(left);
            };
            self.get_word()?;
            if left.is_void() {
                return Err(token_error(
                    &token,
                    format!("Left operand of '{}' does not return a value", token.text),
                ));
            }

            let right_hint = value_type(&left.ty);
            let right = self
                .compile_expr_prec(Some(&right_hint), precedence)?
                .filter(|r| !r.is_void())
                .ok_or_else(|| {
                    token_error(
                        &token,
                        format!("Bad or missing expression after '{}'", token.text),
                    )
                })?;

            left = match self.resolve_operator(&token, &binary, &[&left, &right])? {
                Some(function) => {
                    let start = left.start;
                    self.emit_operator_call(function, vec![left, right], start)?
                }
                None => self.compile_builtin_comparison(&token, left, right)?,
            };
        }
    }

    /// `cond ? a : b`, after the `?`. `b` is converted to the type of `a`.
    fn compile_conditional(
        &mut self,
        cond: ExprInfo,
        hint: Option<&PropertyBase>,
    ) -> Result<ExprInfo> {
        let start = cond.start;
        let cond = self.coerce(cond, &Self::bool_type(), false, "'?' condition")?;
        self.buffer.insert(cond.start, &[ExprToken::Conditional.byte()]);

        let skip_true = self.buffer.emit_skip();
        let when_true = self.require_value(hint, "'?' true branch")?;
        self.buffer.finish_skip(skip_true);
        self.require_symbol(":", "'?' expression")?;

        let skip_false = self.buffer.emit_skip();
        let false_hint = if when_true.ty.ty.is_null_object() {
            hint.cloned()
        } else {
            Some(value_type(&when_true.ty))
        };
        let when_false = self.require_value(false_hint.as_ref(), "'?' false branch")?;
        let ty = if when_true.ty.ty.is_null_object() {
            // Only the one-byte `None` literal is in the finished branch;
            // a delegate conversion rewrites it in place.
            let dest = value_type(&when_false.ty);
            match find_conversion(self.registry, &dest, &when_true.ty, false).map(|c| c.kind) {
                Some(kind @ ConversionKind::NullDelegate) => {
                    self.insert_conversion(when_true.start, kind);
                }
                Some(ConversionKind::Identity) => {}
                _ => {
                    return Err(self.type_error(format!(
                        "Type mismatch in '?' expression: 'None' vs '{}'",
                        self.describe_type(&dest)
                    )));
                }
            }
            dest
        } else {
            let dest = value_type(&when_true.ty);
            self.coerce(when_false.clone(), &dest, false, "'?' false branch")?;
            dest
        };
        self.buffer.finish_skip(skip_false);

        Ok(ExprInfo {
            side_effect: cond.side_effect || when_true.side_effect || when_false.side_effect,
            ..ExprInfo::rvalue(ty, start)
        })
    }

    /// Operator functions named `symbol` of the given arity that the class
    /// being compiled can see.
    fn operator_candidates(&self, symbol: &str, fixity: Fixity) -> Vec<FunctionId> {
        self.registry
            .operators(symbol)
            .iter()
            .copied()
            .filter(|f| {
                let entry = self.registry.function(*f);
                let matches = match fixity {
                    Fixity::Prefix => entry.flags.contains(FunctionFlags::PRE_OPERATOR),
                    Fixity::Postfix => {
                        !entry.flags.contains(FunctionFlags::PRE_OPERATOR) && entry.params.len() == 1
                    }
                    Fixity::Binary => entry.params.len() == 2,
                };
                matches && self.registry.is_child_of(self.class, self.registry.function_class(*f))
            })
            .collect()
    }

    /// The cheapest candidate for `operands`, `None` if none applies.
    fn resolve_operator(
        &self,
        token: &Token,
        candidates: &[FunctionId],
        operands: &[&ExprInfo],
    ) -> Result<Option<FunctionId>> {
        let mut best: Option<(FunctionId, u32)> = None;
        let mut tied: Option<FunctionId> = None;
        for &candidate in candidates {
            let params = &self.registry.function(candidate).params;
            if params.len() != operands.len() {
                continue;
            }
            let cost = params
                .iter()
                .zip(operands)
                .map(|(p, o)| self.operand_cost(*p, o))
                .try_fold(0u32, |sum, c| (c != Conversion::COST_MAX).then(|| sum.saturating_add(c)));
            let Some(cost) = cost else { continue };
            match best {
                Some((_, best_cost)) if cost > best_cost => {}
                Some((current, best_cost)) if cost == best_cost => {
                    if !signatures_match(self.registry, current, candidate) {
                        tied = Some(candidate);
                    }
                }
                _ => {
                    best = Some((candidate, cost));
                    tied = None;
                }
            }
        }
        if let (Some((function, _)), Some(other)) = (best, tied) {
            return Err(token_error(
                token,
                format!(
                    "Ambiguous operator '{}': '{}' and '{}' match equally well",
                    token.text,
                    self.operator_signature(function),
                    self.operator_signature(other)
                ),
            ));
        }
        Ok(best.map(|(f, _)| f))
    }

    fn operand_cost(&self, param: PropertyId, operand: &ExprInfo) -> u32 {
        let base = self.registry.property(param).base();
        if base.is_out() {
            return if operand.is_assignable() && same_type(&value_type(&base), &operand.ty) {
                Conversion::COST_EXACT
            } else {
                Conversion::COST_MAX
            };
        }
        let coerce = base.flags.contains(PropertyFlags::COERCE_PARM);
        conversion_cost(self.registry, &value_type(&base), &value_type(&operand.ty), coerce)
    }

    fn operator_signature(&self, function: FunctionId) -> String {
        let entry = self.registry.function(function);
        let params: Vec<String> = entry
            .params
            .iter()
            .map(|p| self.describe_type(&self.registry.property(*p).base()))
            .collect();
        format!("{}({})", entry.name, params.join(", "))
    }

    /// Emit the call of an operator around operands that are already in the
    /// buffer, from the last operand back to the first.
    fn emit_operator_call(
        &mut self,
        function: FunctionId,
        operands: Vec<ExprInfo>,
        start: usize,
    ) -> Result<ExprInfo> {
        let entry = self.registry.function(function).clone();
        let mut writes_operand = false;
        for (param, operand) in entry.params.iter().zip(&operands).rev() {
            let base = self.registry.property(*param).base();
            if base.is_out() {
                writes_operand = true;
                continue;
            }
            let coerce = base.flags.contains(PropertyFlags::COERCE_PARM);
            let dest = value_type(&base);
            if let Some(conversion) = find_conversion(self.registry, &dest, &value_type(&operand.ty), coerce) {
                self.insert_conversion(operand.start, conversion.kind);
            }
            if base.flags.contains(PropertyFlags::SKIP_PARM) {
                let size = self.buffer.len() - operand.start;
                let mut skip = vec![ExprToken::Skip.byte()];
                skip.extend_from_slice(&(size as u16).to_le_bytes());
                self.buffer.insert(operand.start, &skip);
            }
        }

        let header = self.call_header(function, CallKind::Final);
        self.buffer.insert(start, &header);
        self.buffer.emit_token(ExprToken::EndFunctionParms);
        self.session.referenced.insert(function);

        for (param, operand) in entry.params.iter().zip(&operands) {
            if self.registry.property(*param).base().is_out() {
                self.note_assigned(operand);
            }
        }
        let ret = entry
            .return_param
            .map(|r| value_type(&self.registry.property(r).base()))
            .unwrap_or_else(PropertyBase::none);
        Ok(ExprInfo {
            side_effect: writes_operand || operands.iter().any(|o| o.side_effect),
            ..ExprInfo::call(ret, start, function)
        })
    }

    /// `==` and `!=` on two values of one struct type, or on delegates,
    /// when no script operator matches.
    fn compile_builtin_comparison(
        &mut self,
        token: &Token,
        left: ExprInfo,
        right: ExprInfo,
    ) -> Result<ExprInfo> {
        let equal = token.matches_symbol("==");
        let mismatch = format!(
            "Type mismatch in '{}': '{}' vs '{}'",
            token.text,
            self.describe_type(&left.ty),
            self.describe_type(&right.ty)
        );
        if !(equal || token.matches_symbol("!=")) {
            return Err(token_error(token, mismatch));
        }
        let start = left.start;
        match (&left.ty.ty, &right.ty.ty) {
            (PropertyType::Struct(a), PropertyType::Struct(b))
                if a == b && !left.ty.is_fixed_array() && !right.ty.is_fixed_array() =>
            {
                let mut header = vec![if equal {
                    ExprToken::StructCmpEq.byte()
                } else {
                    ExprToken::StructCmpNe.byte()
                }];
                header.extend_from_slice(&ObjectRef::from(*a).raw().to_le_bytes());
                self.buffer.insert(start, &header);
            }
            (PropertyType::Delegate { .. }, PropertyType::Delegate { .. })
            | (PropertyType::Delegate { .. }, PropertyType::Object { class: None, .. }) => {
                if right.ty.ty.is_null_object() {
                    self.buffer.patch_u8(right.start, ExprToken::EmptyDelegate.byte());
                }
                let names_function = self.buffer.as_bytes().get(right.start).copied()
                    == Some(ExprToken::InstanceDelegate.byte());
                let op = match (equal, names_function) {
                    (true, false) => ExprToken::EqualEqualDelDel,
                    (false, false) => ExprToken::NotEqualDelDel,
                    (true, true) => ExprToken::EqualEqualDelFunc,
                    (false, true) => ExprToken::NotEqualDelFunc,
                };
                self.buffer.insert(start, &[op.byte()]);
                self.buffer.emit_token(ExprToken::EndFunctionParms);
            }
            _ => return Err(token_error(token, mismatch)),
        }
        Ok(ExprInfo {
            side_effect: left.side_effect || right.side_effect,
            ..ExprInfo::rvalue(Self::bool_type(), start)
        })
    }
}
