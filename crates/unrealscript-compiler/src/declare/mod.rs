//! Declaration pass.
//!
//! Reads a class top to bottom, creating its reflection objects as it goes.
//! Function bodies, state code and the replication block are skipped; their
//! positions are recorded in the metadata store for the code pass.

mod class;
mod function;
mod header;
mod state;
mod types;
mod vars;

pub use header::{ClassHeader, parse_class_header};
pub(crate) use header::name_list;

use unrealscript_core::{ClassFlags, CompileError, FieldOwner};
use unrealscript_parser::{SourcePos, Token};

use crate::compiler::{Result, ScriptCompiler, token_error};
use crate::nest::{AllowFlags, NestKind};

/// Words that can begin a function declaration.
const FUNCTION_SPECIFIERS: &[&str] = &[
    "function",
    "event",
    "delegate",
    "operator",
    "preoperator",
    "postoperator",
    "static",
    "final",
    "native",
    "simulated",
    "latent",
    "iterator",
    "singular",
    "exec",
    "server",
    "client",
    "reliable",
    "unreliable",
    "private",
    "protected",
    "public",
    "virtual",
    "noexport",
    "dllimport",
];

pub(crate) fn is_function_specifier(token: &Token) -> bool {
    token.is_identifier() && FUNCTION_SPECIFIERS.iter().any(|w| token.matches_identifier(w))
}

impl<'a> ScriptCompiler<'a> {
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn compile_declarations(&mut self) -> Result<()> {
        let file = self.file.clone();
        self.session.metadata.add_class(self.class, file);
        self.lexer.seek(SourcePos::START);

        let kind = self.compile_class_header()?;
        loop {
            let token = self.get_word()?;
            if token.is_eof() {
                break;
            }
            self.compile_declaration(token)?;
            self.lexer.clear_comment();
        }
        self.pop_nest(kind)?;
        self.finish_declarations()
    }

    /// Read the leading `class` or `interface` statement.
    fn compile_class_header(&mut self) -> Result<NestKind> {
        loop {
            let token = self.get_word()?;
            if token.matches_symbol("#") {
                self.lexer.read_raw_until(&['\n'])?;
                continue;
            }
            if token.matches_identifier("class") {
                self.compile_class_declaration()?;
                return Ok(NestKind::Class);
            }
            if token.matches_identifier("interface") {
                self.compile_interface_declaration()?;
                return Ok(NestKind::Interface);
            }
            return Err(token_error(
                &token,
                format!("Script must begin with 'class' or 'interface', found '{}'", token.text),
            ));
        }
    }

    /// One top-level declaration, starting with `token`.
    fn compile_declaration(&mut self, token: Token) -> Result<()> {
        if token.matches_symbol(";") {
            return Ok(());
        }
        if token.matches_symbol("#") {
            // Preprocessor-style directives such as `#exec` are ignored.
            self.lexer.read_raw_until(&['\n'])?;
            return Ok(());
        }
        if !token.is_identifier() {
            return Err(token_error(&token, format!("Unexpected '{}'", token.text)));
        }

        let owner = FieldOwner::Class(self.class);
        let word = token.text.to_ascii_lowercase();
        match word.as_str() {
            "var" => {
                self.require_allowed(&token, AllowFlags::VAR_DECL)?;
                self.compile_variable_declaration(owner)?;
            }
            "enum" => {
                self.require_allowed(&token, AllowFlags::TYPE_DECL)?;
                self.compile_enum()?;
                self.match_symbol(";")?;
            }
            "struct" => {
                self.require_allowed(&token, AllowFlags::TYPE_DECL)?;
                self.compile_struct()?;
                self.match_symbol(";")?;
            }
            "const" => {
                self.require_allowed(&token, AllowFlags::CONST)?;
                self.compile_const(owner)?;
            }
            "replication" => {
                self.require_allowed(&token, AllowFlags::REPLICATION)?;
                self.record_replication()?;
            }
            "cpptext" => {
                self.require_allowed(&token, AllowFlags::CPP_TEXT)?;
                if !self.class_entry().is_native() {
                    return Err(self.declaration_error("cpptext is only allowed in native classes"));
                }
                self.require_symbol("{", "cpptext")?;
                let text = self.lexer.skip_braces()?;
                self.registry.class_mut(self.class).cpp_text = Some(text);
            }
            "defaultproperties" => {
                self.require_allowed(&token, AllowFlags::DEFAULT_PROPERTIES)?;
                self.require_symbol("{", "defaultproperties")?;
                let text = self.lexer.skip_braces()?;
                self.registry.class_mut(self.class).default_properties_text = Some(text);
            }
            "state" => {
                self.require_allowed(&token, AllowFlags::STATE)?;
                self.lexer.unget_token(&token);
                self.compile_state()?;
            }
            "auto" | "simulated" if self.state_follows(&token)? => {
                self.require_allowed(&token, AllowFlags::STATE)?;
                self.lexer.unget_token(&token);
                self.compile_state()?;
            }
            _ if is_function_specifier(&token) => {
                self.require_allowed(&token, AllowFlags::FUNCTION)?;
                self.lexer.unget_token(&token);
                self.compile_function_declaration()?;
            }
            _ => {
                return Err(token_error(&token, format!("Unexpected '{}'", token.text)));
            }
        }
        Ok(())
    }

    pub(crate) fn require_allowed(&self, token: &Token, flags: AllowFlags) -> Result<()> {
        if self.allows(flags) {
            Ok(())
        } else {
            Err(token_error(
                token,
                format!("'{}' is not allowed here", token.text),
            ))
        }
    }

    /// Whether `state` follows a run of `auto`/`simulated` words.
    fn state_follows(&mut self, first: &Token) -> Result<bool> {
        let checkpoint = self.lexer.checkpoint();
        self.lexer.unget_token(first);
        let found = loop {
            let token = self.get_word()?;
            if token.matches_identifier("auto") || token.matches_identifier("simulated") {
                continue;
            }
            break token.matches_identifier("state");
        };
        self.lexer.restore(checkpoint);
        Ok(found)
    }

    /// Remember where the replication block starts; it is compiled with the
    /// code, once every member it names has been declared.
    fn record_replication(&mut self) -> Result<()> {
        self.require_symbol("{", "replication")?;
        let start = self.lexer.position();
        let here = self.here();
        let meta = self.class_meta_mut()?;
        if meta.replication.is_some() {
            return Err(CompileError::declaration("Multiple replication blocks", here));
        }
        meta.replication = Some(start);
        self.lexer.skip_braces()?;
        Ok(())
    }

    /// Checks and layout once every declaration has been read.
    fn finish_declarations(&mut self) -> Result<()> {
        self.check_interface_contracts()?;
        self.registry.link_class(self.class);

        let entry = self.registry.class(self.class);
        if !self.session.options.no_conform
            && let Some(native_size) = entry.native_size
            && native_size != entry.properties_size
        {
            let message = format!(
                "Class {} size {} does not match native size {}",
                entry.name, entry.properties_size, native_size
            );
            self.warn(message);
            self.registry.class_mut(self.class).flags |= ClassFlags::MISALIGNED;
        }
        self.registry.class_mut(self.class).flags |= ClassFlags::PARSED;
        tracing::debug!(class = %self.class_name(), "declarations complete");
        Ok(())
    }
}
