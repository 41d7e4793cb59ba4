//! Class header pre-parse.
//!
//! The driver needs every class's parent, outer class and `DependsOn` list
//! before any class is compiled, so it can order the batch. This reads just
//! the `class ... ;` statement at the top of a source file.

use unrealscript_core::{CompileError, Name};
use unrealscript_parser::Lexer;

use crate::compiler::Result;

/// The dependency-relevant parts of a class declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassHeader {
    pub name: Name,
    pub is_interface: bool,
    pub super_name: Option<Name>,
    pub within: Option<Name>,
    pub depends_on: Vec<Name>,
    pub implements: Vec<Name>,
    pub native: bool,
}

impl ClassHeader {
    /// Every class that must finish its declaration pass before this one.
    pub fn dependencies(&self) -> impl Iterator<Item = &Name> {
        self.super_name
            .iter()
            .chain(self.within.iter())
            .chain(self.depends_on.iter())
            .chain(self.implements.iter())
    }
}

/// Read the class declaration at the top of `source`.
pub fn parse_class_header(source: &str) -> Result<ClassHeader> {
    let mut lexer = Lexer::new(source);
    let keyword = loop {
        let token = lexer.get_token(true)?;
        if token.is_eof() {
            return Err(CompileError::declaration(
                "Script contains no class declaration",
                token.span,
            ));
        }
        if token.matches_symbol("#") {
            lexer.read_raw_until(&['\n'])?;
            continue;
        }
        break token;
    };
    let is_interface = if keyword.matches_identifier("class") {
        false
    } else if keyword.matches_identifier("interface") {
        true
    } else {
        return Err(CompileError::declaration(
            format!("Script must begin with 'class' or 'interface', found '{}'", keyword.text),
            keyword.span,
        ));
    };

    let name = lexer.get_token(true)?;
    if !name.is_identifier() {
        return Err(CompileError::declaration("Missing class name", name.span));
    }
    let mut header = ClassHeader {
        name: Name::new(&name.text),
        is_interface,
        super_name: None,
        within: None,
        depends_on: Vec::new(),
        implements: Vec::new(),
        native: false,
    };

    loop {
        let token = lexer.get_token(true)?;
        if token.is_eof() {
            return Err(CompileError::declaration(
                "Missing ';' after class declaration",
                token.span,
            ));
        }
        if token.matches_symbol(";") {
            break;
        }
        if token.matches_identifier("extends") {
            let parent = lexer.get_token(true)?;
            if !parent.is_identifier() {
                return Err(CompileError::declaration("Missing parent class name", parent.span));
            }
            header.super_name = Some(Name::new(&parent.text));
        } else if token.matches_identifier("within") {
            let outer = lexer.get_token(true)?;
            if !outer.is_identifier() {
                return Err(CompileError::declaration("Missing 'within' class name", outer.span));
            }
            header.within = Some(Name::new(&outer.text));
        } else if token.matches_identifier("dependson") {
            header.depends_on.extend(name_list(&mut lexer)?);
        } else if token.matches_identifier("implements") {
            header.implements.extend(name_list(&mut lexer)?);
        } else if token.matches_identifier("native") {
            header.native = true;
            if lexer.peek_symbol("(")? {
                name_list(&mut lexer)?;
            }
        } else if lexer.peek_symbol("(")? {
            name_list(&mut lexer)?;
        }
    }
    Ok(header)
}

/// A parenthesized, comma-separated list of names.
pub(crate) fn name_list(lexer: &mut Lexer) -> Result<Vec<Name>> {
    let open = lexer.get_token(true)?;
    if !open.matches_symbol("(") {
        return Err(CompileError::declaration("Missing '(' in list", open.span));
    }
    let mut names = Vec::new();
    loop {
        let token = lexer.get_token(true)?;
        if token.matches_symbol(")") {
            break;
        }
        if token.matches_symbol(",") {
            continue;
        }
        if token.is_eof() {
            return Err(CompileError::declaration("Missing ')' in list", token.span));
        }
        names.push(Name::new(&token.text));
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_dependencies() {
        let header = parse_class_header(
            "/** Doc */\nclass Pawn extends Actor within Controller\n  native(Pawn) dependson(Weapon, Inventory) implements(IFoo);\nvar int X;",
        )
        .unwrap();
        assert_eq!(header.name, "Pawn");
        assert!(header.native);
        assert_eq!(header.super_name, Some(Name::new("Actor")));
        let deps: Vec<_> = header.dependencies().map(|n| n.to_string()).collect();
        assert_eq!(deps, ["Actor", "Controller", "Weapon", "Inventory", "IFoo"]);
    }

    #[test]
    fn interface_header() {
        let header = parse_class_header("interface Usable;").unwrap();
        assert!(header.is_interface);
        assert_eq!(header.super_name, None);
    }

    #[test]
    fn missing_class_is_an_error() {
        let err = parse_class_header("var int X;").unwrap_err();
        assert!(err.message.contains("must begin with"));
    }
}
