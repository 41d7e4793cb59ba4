//! Function, event, delegate and operator declarations.

use unrealscript_core::limits::MAX_NATIVE_INDEX;
use unrealscript_core::{
    FieldOwner, FunctionFlags, FunctionId, Name, PropertyFlags, PropertyType,
};
use unrealscript_parser::{SourcePos, Token};
use unrealscript_registry::{FunctionEntry, PropertyEntry, Registry};

use crate::compiler::{Result, ScriptCompiler, token_error};
use crate::metadata::{DefaultValueText, FunctionData, TokenData};

/// Which operator form a declaration uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperatorForm {
    Binary,
    Pre,
    Post,
}

/// Specifiers read before the function name.
#[derive(Debug, Default)]
struct FunctionSpecifiers {
    flags: FunctionFlags,
    native_index: u16,
    precedence: u8,
    operator: Option<OperatorForm>,
    /// `reliable` (true) or `unreliable` (false), when given.
    reliability: Option<bool>,
}

/// Word used for an operator symbol in friendly names.
fn operator_word(symbol: &str) -> Option<&'static str> {
    Some(match symbol {
        "+" => "Add",
        "-" => "Subtract",
        "*" => "Multiply",
        "/" => "Divide",
        "%" => "Percent",
        "==" => "EqualEqual",
        "!=" => "NotEqual",
        "<" => "Less",
        ">" => "Greater",
        "<=" => "LessEqual",
        ">=" => "GreaterEqual",
        "&&" => "AndAnd",
        "||" => "OrOr",
        "^^" => "XorXor",
        "!" => "Not",
        "~" => "Complement",
        "&" => "And",
        "|" => "Or",
        "^" => "Xor",
        "<<" => "LessLess",
        ">>" => "GreaterGreater",
        ">>>" => "GreaterGreaterGreater",
        "+=" => "AddEqual",
        "-=" => "SubtractEqual",
        "*=" => "MultiplyEqual",
        "/=" => "DivideEqual",
        "++" => "AddAdd",
        "--" => "SubtractSubtract",
        "$" => "Concat",
        "@" => "At",
        "$=" => "ConcatEqual",
        "@=" => "AtEqual",
        "~=" => "ComplementEqual",
        "**" => "MultiplyMultiply",
        _ => return None,
    })
}

fn type_word(registry: &Registry, ty: &PropertyType) -> String {
    match ty {
        PropertyType::None => String::new(),
        PropertyType::Byte { .. } => "Byte".into(),
        PropertyType::Int => "Int".into(),
        PropertyType::Bool => "Bool".into(),
        PropertyType::Float => "Float".into(),
        PropertyType::Name => "Name".into(),
        PropertyType::String => "Str".into(),
        PropertyType::Struct(s) => registry.script_struct(*s).name.to_string(),
        PropertyType::Object { .. } | PropertyType::Interface(_) => "Object".into(),
        PropertyType::Delegate { .. } => "Delegate".into(),
        PropertyType::Array(_) => "Array".into(),
        PropertyType::Map { .. } => "Map".into(),
    }
}

/// Unique name of an operator overload, such as `Add_IntInt` or
/// `Subtract_PreFloat`.
fn operator_friendly_name(registry: &Registry, function: FunctionId) -> Name {
    let entry = registry.function(function);
    let word = operator_word(entry.name.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| entry.name.to_string());
    let mut name = format!("{}_", word);
    if entry.flags.contains(FunctionFlags::PRE_OPERATOR) {
        name.push_str("Pre");
    }
    for param in &entry.params {
        name.push_str(&type_word(registry, &registry.property(*param).ty));
    }
    Name::new(&name)
}

impl<'a> ScriptCompiler<'a> {
    /// A whole function declaration, starting at its first specifier. The
    /// body is skipped and its position recorded.
    pub(crate) fn compile_function_declaration(&mut self) -> Result<FunctionId> {
        let comment = self.lexer.take_comment();
        let declared_line = self.peek()?.span.line;
        let specifiers = self.compile_function_specifiers()?;
        let mut flags = specifiers.flags;

        let return_type = self.compile_return_type()?;
        let name_token = self.compile_function_name(specifiers.operator.is_some())?;
        let name = Name::new(&name_token.text);

        let owner = match self.state {
            Some(state) => FieldOwner::State(state),
            None => FieldOwner::Class(self.class),
        };
        if specifiers.operator.is_none() {
            self.check_function_redefinition(owner, &name_token)?;
        }
        if flags.contains(FunctionFlags::DELEGATE) && self.state.is_some() {
            return Err(token_error(&name_token, "Delegates can't be declared in states"));
        }
        if self.class_entry().is_interface() && flags.contains(FunctionFlags::STATIC) {
            return Err(token_error(&name_token, "Interface functions can't be static"));
        }

        let mut entry = FunctionEntry::new(name.clone(), owner);
        entry.flags = flags;
        entry.native_index = specifiers.native_index;
        entry.operator_precedence = specifiers.precedence;
        let function = self.registry.add_function(entry);

        self.require_symbol("(", "function declaration")?;
        flags |= self.compile_parameters(function, specifiers.operator.is_some())?;

        if !return_type.is_none() {
            let mut ret = PropertyEntry::new(
                Name::new("ReturnValue"),
                FieldOwner::Function(function),
                return_type.clone(),
            );
            ret.flags = PropertyFlags::PARM | PropertyFlags::OUT_PARM | PropertyFlags::RETURN_PARM;
            if ret.ty.needs_ctor_link() {
                ret.flags |= PropertyFlags::NEED_CTOR_LINK;
            }
            let id = self.registry.add_property(ret);
            let data = TokenData {
                declared_line,
                ..TokenData::default()
            };
            self.session.metadata.add_property(self.class, id, data);
        }

        if self.match_identifier("const")? {
            flags |= FunctionFlags::CONST;
        }
        if flags.contains(FunctionFlags::CONST) && !flags.contains(FunctionFlags::NATIVE) {
            return Err(token_error(&name_token, "Only native functions can be const"));
        }
        self.registry.function_mut(function).flags = flags;

        if let Some(form) = specifiers.operator {
            self.validate_operator(function, form, &name_token)?;
            flags |= FunctionFlags::FINAL;
            self.registry.function_mut(function).flags = flags;
        } else {
            self.registry.function_mut(function).friendly_name = name.clone();
        }

        if specifiers.native_index > 0 {
            self.register_native_index(function, specifiers.native_index, &name_token)?;
        }

        let body = self.compile_function_body(function, &name_token)?;

        if flags.contains(FunctionFlags::DELEGATE) {
            let ty = PropertyType::Delegate {
                function: Some(function),
            };
            let property = PropertyEntry::new(
                Name::new(&format!("__{}__Delegate", name)),
                FieldOwner::Class(self.class),
                ty,
            );
            let id = self.registry.add_property(property);
            let data = TokenData {
                declared_line,
                ..TokenData::default()
            };
            self.session.metadata.add_property(self.class, id, data);
        }

        if specifiers.operator.is_none() {
            self.bind_override(function, &name_token)?;
        }
        self.registry.link_function(function);

        let mut data = FunctionData {
            body,
            declared_line,
            ..FunctionData::default()
        };
        if let Some(text) = comment {
            data.metadata.insert("ToolTip".into(), text);
        }
        self.session.metadata.add_function(self.class, function, data);
        tracing::trace!(function = %name, "function declared");
        Ok(function)
    }

    fn compile_function_specifiers(&mut self) -> Result<FunctionSpecifiers> {
        let mut spec = FunctionSpecifiers::default();
        loop {
            let token = self.get_word()?;
            if !token.is_identifier() {
                return Err(token_error(
                    &token,
                    format!("Missing 'function' before '{}'", token.text),
                ));
            }
            let word = token.text.to_ascii_lowercase();
            match word.as_str() {
                "function" => break,
                "event" => {
                    spec.flags |= FunctionFlags::EVENT;
                    break;
                }
                "delegate" => {
                    spec.flags |= FunctionFlags::DELEGATE;
                    break;
                }
                "operator" => {
                    self.require_symbol("(", "operator precedence")?;
                    let precedence = self.get_token()?;
                    let value = precedence
                        .int_value()
                        .filter(|v| (0..=i32::from(u8::MAX)).contains(v))
                        .ok_or_else(|| token_error(&precedence, "Bad operator precedence"))?;
                    self.require_symbol(")", "operator precedence")?;
                    spec.precedence = value as u8;
                    spec.operator = Some(OperatorForm::Binary);
                    spec.flags |= FunctionFlags::OPERATOR;
                    break;
                }
                "preoperator" => {
                    spec.operator = Some(OperatorForm::Pre);
                    spec.flags |= FunctionFlags::OPERATOR | FunctionFlags::PRE_OPERATOR;
                    break;
                }
                "postoperator" => {
                    spec.operator = Some(OperatorForm::Post);
                    spec.flags |= FunctionFlags::OPERATOR;
                    break;
                }
                "static" => spec.flags |= FunctionFlags::STATIC,
                "final" => spec.flags |= FunctionFlags::FINAL,
                "native" => {
                    spec.flags |= FunctionFlags::NATIVE;
                    if self.match_symbol("(")? {
                        let index = self.get_token()?;
                        let value = index
                            .int_value()
                            .filter(|v| *v > 0 && (*v as u32) <= MAX_NATIVE_INDEX)
                            .ok_or_else(|| {
                                token_error(
                                    &index,
                                    format!("Bad native function index '{}'", index.text),
                                )
                            })?;
                        self.require_symbol(")", "native index")?;
                        spec.native_index = value as u16;
                    }
                }
                "simulated" => spec.flags |= FunctionFlags::SIMULATED,
                "latent" => spec.flags |= FunctionFlags::LATENT,
                "iterator" => spec.flags |= FunctionFlags::ITERATOR,
                "singular" => spec.flags |= FunctionFlags::SINGULAR,
                "exec" => spec.flags |= FunctionFlags::EXEC,
                "server" => spec.flags |= FunctionFlags::NET | FunctionFlags::NET_SERVER,
                "client" => {
                    spec.flags |=
                        FunctionFlags::NET | FunctionFlags::NET_CLIENT | FunctionFlags::SIMULATED;
                }
                "reliable" => {
                    spec.reliability = Some(true);
                    spec.flags |= FunctionFlags::NET_RELIABLE;
                }
                "unreliable" => spec.reliability = Some(false),
                "private" => spec.flags |= FunctionFlags::PRIVATE | FunctionFlags::FINAL,
                "protected" => spec.flags |= FunctionFlags::PROTECTED,
                "public" => spec.flags |= FunctionFlags::PUBLIC,
                "virtual" => spec.flags |= FunctionFlags::VIRTUAL,
                "noexport" => spec.flags |= FunctionFlags::NO_EXPORT,
                "dllimport" => spec.flags |= FunctionFlags::DLL_IMPORT,
                _ => {
                    return Err(token_error(
                        &token,
                        format!("Unknown function specifier '{}'", token.text),
                    ));
                }
            }
        }
        self.validate_specifiers(&spec)?;
        Ok(spec)
    }

    fn validate_specifiers(&self, spec: &FunctionSpecifiers) -> Result<()> {
        let flags = spec.flags;
        let net = flags.contains(FunctionFlags::NET);
        if net && spec.reliability.is_none() {
            return Err(self.declaration_error(
                "Replicated functions must be declared reliable or unreliable",
            ));
        }
        if !net && spec.reliability.is_some() {
            return Err(self.declaration_error(
                "'reliable' and 'unreliable' require 'server' or 'client'",
            ));
        }
        if net && flags.contains(FunctionFlags::STATIC) {
            return Err(self.declaration_error("Static functions can't be replicated"));
        }
        let native = flags.contains(FunctionFlags::NATIVE);
        if flags.contains(FunctionFlags::LATENT) && !native {
            return Err(self.declaration_error("Only native functions can be latent"));
        }
        if flags.contains(FunctionFlags::ITERATOR) && !native {
            return Err(self.declaration_error("Only native functions can be iterators"));
        }
        if native && spec.native_index == 0 && !self.class_entry().is_native() {
            return Err(self.declaration_error(
                "Native functions in non-native classes need a native index",
            ));
        }
        if flags.contains(FunctionFlags::PRIVATE) && flags.contains(FunctionFlags::PROTECTED) {
            return Err(self.declaration_error("Functions can't be both private and protected"));
        }
        Ok(())
    }

    /// The return type, or `None` when the next word is the function name.
    fn compile_return_type(&mut self) -> Result<PropertyType> {
        let checkpoint = self.lexer.checkpoint();
        let first = self.get_word()?;
        if first.is_identifier() && self.peek_symbol("(")? {
            self.lexer.restore(checkpoint);
            return Ok(PropertyType::None);
        }
        self.lexer.restore(checkpoint);
        self.get_var_type(FieldOwner::Class(self.class), PropertyFlags::empty(), "return type")
    }

    fn compile_function_name(&mut self, operator: bool) -> Result<Token> {
        let mut token = self.get_word()?;
        if operator && token.is_symbol() {
            // `>>>` is read as `>>` then `>`.
            if token.text == ">>" && self.match_symbol(">")? {
                token.text = ">>>".into();
            }
            if operator_word(&token.text).is_none() {
                return Err(token_error(
                    &token,
                    format!("Invalid operator '{}'", token.text),
                ));
            }
            return Ok(token);
        }
        if !token.is_identifier() {
            return Err(token_error(
                &token,
                format!("Missing function name, found '{}'", token.text),
            ));
        }
        Ok(token)
    }

    fn check_function_redefinition(&self, owner: FieldOwner, token: &Token) -> Result<()> {
        let existing = match owner {
            FieldOwner::State(state) => self
                .registry
                .state(state)
                .functions
                .iter()
                .any(|f| self.registry.function(*f).name == token.text.as_str()),
            _ => self.registry.find_own_function(self.class, &token.text).is_some(),
        };
        if existing {
            return Err(token_error(
                token,
                format!("'{}' conflicts with a previously defined function", token.text),
            ));
        }
        Ok(())
    }

    /// The parameter list after `(`, through `)`. Returns the function flags
    /// the parameters imply.
    fn compile_parameters(&mut self, function: FunctionId, operator: bool) -> Result<FunctionFlags> {
        let owner = FieldOwner::Function(function);
        let mut implied = FunctionFlags::empty();
        let mut saw_optional = false;
        if self.match_symbol(")")? {
            return Ok(implied);
        }
        loop {
            let mut flags = PropertyFlags::PARM;
            loop {
                let token = self.peek()?;
                let word = token.text.to_ascii_lowercase();
                let flag = match word.as_str() {
                    "optional" => PropertyFlags::OPTIONAL_PARM,
                    "out" => PropertyFlags::OUT_PARM,
                    "coerce" => PropertyFlags::COERCE_PARM,
                    "const" => PropertyFlags::CONST,
                    "init" => PropertyFlags::INIT,
                    "skip" if operator => PropertyFlags::SKIP_PARM,
                    "skip" => {
                        return Err(token_error(&token, "'skip' is only allowed on operators"));
                    }
                    _ => break,
                };
                flags |= flag;
                self.get_word()?;
            }

            let ty = self.get_var_type(owner, flags, "parameter")?;
            let name_token = self.expect_name("parameter name")?;
            if self.registry.find_own_property(owner, &name_token.text).is_some() {
                return Err(token_error(
                    &name_token,
                    format!("Duplicate parameter '{}'", name_token.text),
                ));
            }
            let mut array_dim = 1;
            if self.match_symbol("[")? {
                array_dim = self.compile_array_dim()?;
                self.require_symbol("]", "parameter array dimension")?;
            }

            let optional = flags.contains(PropertyFlags::OPTIONAL_PARM);
            if saw_optional && !optional {
                return Err(token_error(
                    &name_token,
                    "Parameters after an optional parameter must also be optional",
                ));
            }
            saw_optional |= optional;
            if optional {
                implied |= FunctionFlags::HAS_OPTIONAL_PARMS;
            }
            if flags.contains(PropertyFlags::OUT_PARM) {
                implied |= FunctionFlags::HAS_OUT_PARMS;
            }
            if ty.needs_ctor_link() {
                flags |= PropertyFlags::NEED_CTOR_LINK;
            }

            let mut data = TokenData {
                declared_line: name_token.span.line,
                ..TokenData::default()
            };
            if self.match_symbol("=")? {
                if !optional {
                    return Err(token_error(
                        &name_token,
                        "Only optional parameters can have default values",
                    ));
                }
                let pos = self.lexer.position();
                let text = self.lexer.read_raw_until(&[',', ')'])?;
                if text.is_empty() {
                    return Err(token_error(&name_token, "Missing default value"));
                }
                data.default_value = Some(DefaultValueText { text, pos });
                implied |= FunctionFlags::HAS_DEFAULTS;
            }

            let mut entry = PropertyEntry::new(Name::new(&name_token.text), owner, ty);
            entry.flags = flags;
            entry.array_dim = array_dim;
            let id = self.registry.add_property(entry);
            self.session.metadata.add_property(self.class, id, data);

            if self.match_symbol(",")? {
                continue;
            }
            self.require_symbol(")", "parameter list")?;
            return Ok(implied);
        }
    }

    fn validate_operator(&mut self, function: FunctionId, form: OperatorForm, token: &Token) -> Result<()> {
        let entry = self.registry.function(function);
        let params = entry.params.len();
        let message = match form {
            OperatorForm::Binary if params != 2 => Some("Binary operators must have two parameters"),
            OperatorForm::Pre | OperatorForm::Post if params != 1 => {
                Some("Unary operators must have one parameter")
            }
            _ => None,
        };
        if let Some(message) = message {
            return Err(token_error(token, message));
        }
        if entry.return_param.is_none() {
            return Err(token_error(token, "Operators must have a return value"));
        }

        let friendly = operator_friendly_name(self.registry, function);
        let duplicate = self.class_entry().functions.iter().any(|f| {
            *f != function
                && self.registry.function(*f).is_operator()
                && self.registry.function(*f).friendly_name == friendly
        });
        if duplicate {
            return Err(token_error(
                token,
                format!("Duplicate operator '{}' ({})", token.text, friendly),
            ));
        }
        self.registry.function_mut(function).friendly_name = friendly;
        Ok(())
    }

    fn register_native_index(&mut self, function: FunctionId, index: u16, token: &Token) -> Result<()> {
        if let Some(existing) = self.session.native_indices.get(&index).copied() {
            let same = existing == function
                || (self.registry.function_class(existing) == self.class
                    && self.registry.function(existing).friendly_name
                        == self.registry.function(function).friendly_name);
            if !same {
                return Err(token_error(
                    token,
                    format!(
                        "Duplicate native index {} ('{}' already uses it)",
                        index,
                        self.registry.function(existing).name
                    ),
                ));
            }
        }
        self.session.native_indices.insert(index, function);
        Ok(())
    }

    /// `{` records the body and skips it; `;` declares only.
    fn compile_function_body(&mut self, function: FunctionId, token: &Token) -> Result<Option<SourcePos>> {
        if !self.match_symbol("{")? {
            self.require_semicolon("function declaration")?;
            return Ok(None);
        }
        let flags = self.registry.function(function).flags;
        if flags.contains(FunctionFlags::NATIVE) {
            return Err(token_error(token, "Native functions can't have a body"));
        }
        if self.class_entry().is_interface() {
            return Err(token_error(token, "Interface functions can't have a body"));
        }
        let body = self.lexer.position();
        self.registry.function_mut(function).flags |= FunctionFlags::DEFINED;
        self.lexer.skip_braces()?;
        self.match_symbol(";")?;
        Ok(Some(body))
    }

    /// The function `function` overrides, searching the state's parents,
    /// then the class, then the parent classes.
    fn find_overridden(&self, function: FunctionId) -> Option<FunctionId> {
        let name = self.registry.function(function).name.clone();
        let in_state = self.state.and_then(|state| {
            self.registry
                .state(state)
                .super_state
                .and_then(|s| self.registry.find_state_function(s, name.as_str()))
                .or_else(|| self.registry.find_own_function(self.class, name.as_str()))
        });
        in_state
            .or_else(|| {
                let parent = self.class_entry().super_class?;
                self.registry.find_class_function(parent, name.as_str())
            })
            .filter(|f| *f != function)
            .filter(|f| {
                let entry = self.registry.function(*f);
                !entry.is_operator() && !entry.flags.contains(FunctionFlags::PRIVATE)
            })
    }

    /// Check `function` against the function it overrides and link them.
    fn bind_override(&mut self, function: FunctionId, token: &Token) -> Result<()> {
        let Some(parent) = self.find_overridden(function) else {
            return Ok(());
        };
        let parent_entry = self.registry.function(parent);
        let parent_flags = parent_entry.flags;
        if parent_flags.contains(FunctionFlags::FINAL) {
            return Err(token_error(
                token,
                format!("Function '{}' can't override a final function", token.text),
            ));
        }

        let mut flags = self.registry.function(function).flags;
        flags |= parent_flags & FunctionFlags::INHERIT;
        if parent_flags.contains(FunctionFlags::NET) {
            if flags.contains(FunctionFlags::NET) {
                return Err(token_error(
                    token,
                    format!(
                        "Function '{}' is already replicated; only the original declaration may specify replication",
                        token.text
                    ),
                ));
            }
            flags |= parent_flags & FunctionFlags::NET_FUNC_FLAGS;
        }

        if let Some(reason) = self.signature_difference(function, parent, flags, parent_flags) {
            return Err(token_error(
                token,
                format!("Redefinition of '{}' differs from original: {}", token.text, reason),
            ));
        }

        let entry = self.registry.function_mut(function);
        entry.flags = flags;
        entry.super_function = Some(parent);
        Ok(())
    }

    fn signature_difference(
        &self,
        function: FunctionId,
        parent: FunctionId,
        flags: FunctionFlags,
        parent_flags: FunctionFlags,
    ) -> Option<String> {
        let ours = self.registry.function(function);
        let theirs = self.registry.function(parent);
        if ours.params.len() != theirs.params.len() {
            return Some("different number of parameters".into());
        }
        for (index, (a, b)) in ours.params.iter().zip(&theirs.params).enumerate() {
            let (a, b) = (self.registry.property(*a), self.registry.property(*b));
            let out_differs =
                a.flags.contains(PropertyFlags::OUT_PARM) != b.flags.contains(PropertyFlags::OUT_PARM);
            if !a.base().matches_type(&b.base()) || out_differs {
                return Some(format!("parameter {} type mismatch", index + 1));
            }
        }
        let returns_match = match (ours.return_param, theirs.return_param) {
            (None, None) => true,
            (Some(a), Some(b)) => self
                .registry
                .property(a)
                .base()
                .matches_type(&self.registry.property(b).base()),
            _ => false,
        };
        if !returns_match {
            return Some("return value mismatch".into());
        }
        let mask = FunctionFlags::OVERRIDE_MATCH
            - FunctionFlags::EXEC
            - FunctionFlags::FINAL
            - FunctionFlags::ACCESS;
        if (flags ^ parent_flags).intersects(mask) {
            return Some("function flag mismatch".into());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unrealscript_core::ClassId;

    fn registry_with_operator(flags: FunctionFlags, name: &str, params: &[PropertyType]) -> (Registry, FunctionId) {
        let mut registry = Registry::new();
        let object: ClassId = registry.add_class(Name::new("Object"), Name::new("Core")).unwrap();
        let mut entry = FunctionEntry::new(Name::new(name), FieldOwner::Class(object));
        entry.flags = flags;
        let function = registry.add_function(entry);
        for (i, ty) in params.iter().enumerate() {
            let mut parm = PropertyEntry::new(
                Name::new(&format!("P{}", i)),
                FieldOwner::Function(function),
                ty.clone(),
            );
            parm.flags = PropertyFlags::PARM;
            registry.add_property(parm);
        }
        (registry, function)
    }

    #[test]
    fn binary_friendly_name() {
        let (registry, f) = registry_with_operator(
            FunctionFlags::OPERATOR,
            "+",
            &[PropertyType::Int, PropertyType::Int],
        );
        assert_eq!(operator_friendly_name(&registry, f), "Add_IntInt");
    }

    #[test]
    fn prefix_friendly_name() {
        let (registry, f) = registry_with_operator(
            FunctionFlags::OPERATOR | FunctionFlags::PRE_OPERATOR,
            "-",
            &[PropertyType::Float],
        );
        assert_eq!(operator_friendly_name(&registry, f), "Subtract_PreFloat");
    }

    #[test]
    fn word_operators_keep_their_name() {
        let (registry, f) = registry_with_operator(
            FunctionFlags::OPERATOR,
            "Dot",
            &[PropertyType::String, PropertyType::String],
        );
        assert_eq!(operator_friendly_name(&registry, f), "Dot_StrStr");
        assert_eq!(operator_word(">>>"), Some("GreaterGreaterGreater"));
        assert_eq!(operator_word("?"), None);
    }
}
