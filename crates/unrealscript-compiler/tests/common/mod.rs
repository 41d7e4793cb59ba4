//! Shared fixtures for compiler tests.

#![allow(dead_code)]

use unrealscript_compiler::bytecode::{self, Instruction, Opcode};
use unrealscript_compiler::{CompilationSession, CompilePass, CompileError, ScriptCompiler};
use unrealscript_core::{ClassId, FunctionId, Name};
use unrealscript_registry::Registry;

/// A cut-down `Object` with the operators and intrinsic structs the tests use.
pub const OBJECT_SOURCE: &str = r#"
class Object native;

struct Vector
{
    var float X, Y, Z;
};

struct Rotator
{
    var int Pitch, Yaw, Roll;
};

native(129) static final preoperator bool ! (bool A);
native(130) static final operator(30) bool && (bool A, skip bool B);
native(242) static final operator(24) bool == (bool A, bool B);

native(146) static final operator(20) int + (int A, int B);
native(147) static final operator(20) int - (int A, int B);
native(150) static final operator(24) bool < (int A, int B);
native(151) static final operator(24) bool > (int A, int B);
native(154) static final operator(24) bool == (int A, int B);
native(161) static final operator(34) int += (out int A, int B);
native(163) static final preoperator int ++ (out int A);
native(165) static final postoperator int ++ (out int A);

native(174) static final operator(20) float + (float A, float B);
native(180) static final operator(24) bool == (float A, float B);

native(112) static final operator(40) string $ (coerce string A, coerce string B);
native(122) static final operator(24) bool == (string A, string B);

native(254) static final operator(24) bool == (Object A, Object B);
native(119) static final operator(26) bool != (Object A, Object B);

native(305) final iterator function Range(int Count, out int Index);
native final function int Len(coerce string S);
"#;

/// A registry and session holding the compiled `Object` class.
pub struct Fixture {
    pub registry: Registry,
    pub session: CompilationSession,
    pub object: ClassId,
}

impl Fixture {
    pub fn new() -> Self {
        let mut registry = Registry::new();
        let mut session = CompilationSession::default();
        let object = registry
            .add_class(Name::new("Object"), Name::new("Core"))
            .expect("Object registers");
        for pass in [CompilePass::Declarations, CompilePass::Code] {
            ScriptCompiler::new(&mut session, &mut registry, object, OBJECT_SOURCE, "Object.uc")
                .compile(pass)
                .unwrap_or_else(|e| panic!("Object failed in {}: {}", pass.as_str(), e));
        }
        Self {
            registry,
            session,
            object,
        }
    }

    /// Register `name` and run both passes over `source`.
    pub fn compile(&mut self, name: &str, source: &str) -> Result<ClassId, CompileError> {
        let class = self.declare(name, source)?;
        self.run(class, source, CompilePass::Code)?;
        Ok(class)
    }

    /// Register `name` and run only the declarations pass.
    pub fn declare(&mut self, name: &str, source: &str) -> Result<ClassId, CompileError> {
        let class = self
            .registry
            .add_class(Name::new(name), Name::new("Tests"))
            .expect("class registers");
        self.run(class, source, CompilePass::Declarations)?;
        Ok(class)
    }

    fn run(&mut self, class: ClassId, source: &str, pass: CompilePass) -> Result<(), CompileError> {
        let file = format!("{}.uc", self.registry.class(class).name);
        ScriptCompiler::new(&mut self.session, &mut self.registry, class, source, file).compile(pass)
    }

    pub fn function(&self, class: ClassId, name: &str) -> FunctionId {
        self.registry
            .find_class_function(class, name)
            .unwrap_or_else(|| panic!("function {} not found", name))
    }

    pub fn instructions(&self, class: ClassId, name: &str) -> Vec<Instruction> {
        let script = &self.registry.function(self.function(class, name)).script;
        bytecode::disassemble(script).expect("script decodes")
    }

    pub fn opcodes(&self, class: ClassId, name: &str) -> Vec<Opcode> {
        self.instructions(class, name).into_iter().map(|i| i.opcode).collect()
    }
}

pub fn position(opcodes: &[Opcode], opcode: Opcode) -> Option<usize> {
    opcodes.iter().position(|o| *o == opcode)
}
