//! End-to-end tests: declare and compile small classes against the `Object`
//! fixture, then inspect the decoded bytecode.

mod common;

use common::{Fixture, position};
use unrealscript_compiler::bytecode::{ExprToken, Opcode, Operand};
use unrealscript_compiler::{DefaultsOutcome, import_default_properties};
use unrealscript_core::{Name, PropertyFlags, Severity};
use unrealscript_registry::PropertyValue;

fn token(t: ExprToken) -> Opcode {
    Opcode::Token(t)
}

const CONTROL_SOURCE: &str = r#"
class Control extends Object;

var array<int> Values;

function int Pick(bool B)
{
    if (B)
        return 1;
    else
        return 2;
}

function int CountUp()
{
    local int I;
    I = 0;
    while (I < 10)
        I += 1;
    return I;
}

function int Sum()
{
    local int I, T;
    T = 0;
    for (I = 0; I < 4; I++)
        T += I;
    return T;
}

function int Map(int V)
{
    switch (V)
    {
    case 1:
        return 10;
    case 2:
        return 20;
    default:
        return 0;
    }
}

function int Find()
{
    local int I;
    foreach Range(5, I)
    {
        if (I == 3)
            return I;
    }
    return -1;
}

function int Total()
{
    local int V, T;
    T = 0;
    foreach Values(V)
        T += V;
    return T;
}
"#;

#[test]
fn if_else_jumps_over_else_branch() {
    let mut fx = Fixture::new();
    let class = fx.compile("Control", CONTROL_SOURCE).expect("compiles");
    let ops = fx.opcodes(class, "Pick");

    assert_eq!(ops[0], token(ExprToken::JumpIfNot));
    assert!(ops.contains(&token(ExprToken::Jump)));
    assert!(ops.contains(&token(ExprToken::IntOne)));
    assert!(ops.contains(&token(ExprToken::IntConstByte)));
    assert_eq!(ops.last(), Some(&token(ExprToken::EndOfScript)));
}

#[test]
fn while_loop_jumps_back_to_condition() {
    let mut fx = Fixture::new();
    let class = fx.compile("Control", CONTROL_SOURCE).expect("compiles");
    let code = fx.instructions(class, "CountUp");

    let test = code
        .iter()
        .find(|i| i.opcode == token(ExprToken::JumpIfNot))
        .expect("loop condition");
    let back = code
        .iter()
        .find(|i| i.opcode == token(ExprToken::Jump))
        .expect("jump back");
    assert_eq!(back.operands, vec![Operand::U16(test.offset as u16)]);
    assert!(back.offset > test.offset);
}

#[test]
fn for_step_runs_after_body() {
    let mut fx = Fixture::new();
    let class = fx.compile("Control", CONTROL_SOURCE).expect("compiles");
    let ops = fx.opcodes(class, "Sum");

    let body = position(&ops, Opcode::Native(161)).expect("+= in body");
    let step = position(&ops, Opcode::Native(165)).expect("++ in step");
    assert!(body < step, "step must follow the body: {:?}", ops);
}

#[test]
fn switch_cases_chain_to_the_next_case() {
    let mut fx = Fixture::new();
    let class = fx.compile("Control", CONTROL_SOURCE).expect("compiles");
    let code = fx.instructions(class, "Map");

    assert_eq!(code[0].opcode, token(ExprToken::Switch));
    let cases: Vec<_> = code
        .iter()
        .filter(|i| i.opcode == token(ExprToken::Case))
        .collect();
    assert_eq!(cases.len(), 3);
    assert_eq!(cases[0].operands, vec![Operand::U16(cases[1].offset as u16)]);
    assert_eq!(cases[1].operands, vec![Operand::U16(cases[2].offset as u16)]);
    assert_eq!(cases[2].operands, vec![Operand::U16(u16::MAX)]);
}

#[test]
fn return_inside_foreach_pops_the_iterator() {
    let mut fx = Fixture::new();
    let class = fx.compile("Control", CONTROL_SOURCE).expect("compiles");
    let ops = fx.opcodes(class, "Find");

    assert_eq!(ops[0], token(ExprToken::Iterator));
    let first_return = position(&ops, token(ExprToken::Return)).expect("return");
    assert_eq!(ops[first_return - 1], token(ExprToken::IteratorPop));
    assert!(ops.contains(&token(ExprToken::IteratorNext)));
}

#[test]
fn foreach_over_dynamic_array() {
    let mut fx = Fixture::new();
    let class = fx.compile("Control", CONTROL_SOURCE).expect("compiles");
    let ops = fx.opcodes(class, "Total");

    assert!(ops.contains(&token(ExprToken::DynArrayIterator)));
    assert!(ops.contains(&token(ExprToken::IteratorNext)));
    assert!(ops.contains(&token(ExprToken::IteratorPop)));
}

#[test]
fn bare_return_in_value_function_warns() {
    let mut fx = Fixture::new();
    let source = "class Lazy extends Object;\nfunction int Nothing()\n{\n    return;\n}\n";
    fx.compile("Lazy", source).expect("compiles with a warning");
    assert!(fx.session.diagnostics.warning_count() >= 1);
}

#[test]
fn returning_a_value_from_void_function_fails() {
    let mut fx = Fixture::new();
    let source = "class Broken extends Object;\nfunction Go()\n{\n    return 5;\n}\n";
    let err = fx.compile("Broken", source).unwrap_err();
    assert!(err.message.contains("no return value"), "{}", err.message);
    assert_eq!(err.line, 4);
}

#[test]
fn break_outside_loop_fails() {
    let mut fx = Fixture::new();
    let source = "class Broken extends Object;\nfunction Go()\n{\n    break;\n}\n";
    assert!(fx.compile("Broken", source).is_err());
}

#[test]
fn final_functions_cannot_be_overridden() {
    let mut fx = Fixture::new();
    fx.compile("Base", "class Base extends Object;\nfinal function Go()\n{\n}\n")
        .expect("base compiles");
    let err = fx
        .declare("Derived", "class Derived extends Base;\nfunction Go()\n{\n}\n")
        .unwrap_err();
    assert!(err.message.contains("final"), "{}", err.message);
}

#[test]
fn missing_superclass_is_reported() {
    let mut fx = Fixture::new();
    let err = fx
        .declare("Orphan", "class Orphan extends Nowhere;\n")
        .unwrap_err();
    assert!(err.message.contains("Nowhere"), "{}", err.message);
}

const PAWN_SOURCE: &str = r#"
class Pawn extends Object;

var int Health;
var bool bAlive;
var name Tag;
var array<int> Scores;

replication
{
    reliable if (bAlive)
        Health, Tag;
}

defaultproperties
{
    Health=100
    bAlive=true
    Tag=Player
    Scores(0)=3
    Scores(1)=4
}
"#;

#[test]
fn replication_conditions_mark_properties() {
    let mut fx = Fixture::new();
    let class = fx.compile("Pawn", PAWN_SOURCE).expect("compiles");

    for name in ["Health", "Tag"] {
        let id = fx.registry.find_class_property(class, name).expect("declared");
        let entry = fx.registry.property(id);
        assert!(entry.flags.contains(PropertyFlags::NET), "{} is replicated", name);
        assert_eq!(entry.rep_offset, Some(0));
    }
    let alive = fx.registry.find_class_property(class, "bAlive").expect("declared");
    assert_eq!(fx.registry.property(alive).rep_offset, None);

    let script = &fx.registry.class(class).script;
    let ops = unrealscript_compiler::bytecode::opcodes(script).expect("decodes");
    assert_eq!(ops.first(), Some(&token(ExprToken::Return)));
    assert_eq!(ops.last(), Some(&token(ExprToken::EndOfScript)));
}

#[test]
fn replicating_an_inherited_variable_fails() {
    let mut fx = Fixture::new();
    fx.compile("Pawn", PAWN_SOURCE).expect("compiles");
    let source = "class Hero extends Pawn;\nreplication\n{\n    reliable if (true)\n        Health;\n}\n";
    let err = fx.compile("Hero", source).unwrap_err();
    assert!(err.message.contains("Health"), "{}", err.message);
}

#[test]
fn default_properties_import_after_parent() {
    let mut fx = Fixture::new();
    let class = fx.compile("Pawn", PAWN_SOURCE).expect("compiles");

    let outcome = import_default_properties(&mut fx.registry, &mut fx.session, class).expect("imports");
    assert_eq!(
        outcome,
        DefaultsOutcome::Deferred {
            waiting_on: Name::new("Object")
        }
    );

    let object = fx.object;
    assert_eq!(
        import_default_properties(&mut fx.registry, &mut fx.session, object).expect("imports"),
        DefaultsOutcome::Imported
    );
    assert_eq!(
        import_default_properties(&mut fx.registry, &mut fx.session, class).expect("imports"),
        DefaultsOutcome::Imported
    );

    let entry = fx.registry.class(class);
    let value = |name: &str| {
        let id = fx.registry.find_class_property(class, name).expect("declared");
        entry.defaults.get(id, 0).cloned()
    };
    assert_eq!(value("Health"), Some(PropertyValue::Int(100)));
    assert_eq!(value("bAlive"), Some(PropertyValue::Bool(true)));
    assert_eq!(value("Tag"), Some(PropertyValue::Name(Name::new("Player"))));
    assert_eq!(
        value("Scores"),
        Some(PropertyValue::Array(vec![PropertyValue::Int(3), PropertyValue::Int(4)]))
    );
}

#[test]
fn unknown_default_property_fails() {
    let mut fx = Fixture::new();
    let class = fx
        .compile(
            "Typo",
            "class Typo extends Object;\nvar int Health;\ndefaultproperties\n{\n    Helth=1\n}\n",
        )
        .expect("compiles");
    let object = fx.object;
    import_default_properties(&mut fx.registry, &mut fx.session, object).expect("imports");
    assert!(import_default_properties(&mut fx.registry, &mut fx.session, class).is_err());
}

#[test]
fn continue_in_for_lands_on_the_moved_step() {
    let mut fx = Fixture::new();
    let source = r#"
class Skip extends Object;

function int SkipThree()
{
    local int I, T;
    T = 0;
    for (I = 0; I < 8; I++)
    {
        if (I == 3)
            continue;
        T += I;
    }
    return T;
}
"#;
    let class = fx.compile("Skip", source).expect("compiles");
    let code = fx.instructions(class, "SkipThree");

    let condition = code
        .iter()
        .find(|i| i.opcode == token(ExprToken::JumpIfNot))
        .expect("loop condition");
    let step = code
        .iter()
        .find(|i| i.opcode == Opcode::Native(165))
        .expect("++ in step");
    let body = code
        .iter()
        .find(|i| i.opcode == Opcode::Native(161))
        .expect("+= in body");
    let jumps: Vec<_> = code
        .iter()
        .filter(|i| i.opcode == token(ExprToken::Jump))
        .collect();
    assert_eq!(jumps.len(), 2, "continue and loop back: {:?}", code);

    let (skip, back) = (jumps[0], jumps[1]);
    assert!(step.offset > body.offset, "step must follow the body");
    assert_eq!(skip.operands, vec![Operand::U16(step.offset as u16)]);
    assert_ne!(skip.operands, vec![Operand::U16(condition.offset as u16)]);
    assert_eq!(back.operands, vec![Operand::U16(condition.offset as u16)]);
    assert!(back.offset > step.offset);
}

fn warnings(fx: &Fixture) -> Vec<(u32, String)> {
    fx.session
        .diagnostics
        .with_severity(Severity::Warning)
        .map(|d| (d.line, d.message.clone()))
        .collect()
}

#[test]
fn unreferenced_local_warns_at_its_declaration() {
    let mut fx = Fixture::new();
    let source = "class Idle extends Object;\nfunction Go()\n{\n    local int Spare;\n}\n";
    fx.compile("Idle", source).expect("compiles with a warning");
    assert_eq!(
        warnings(&fx),
        vec![(4, "Unreferenced local variable 'Spare'".to_string())]
    );
}

#[test]
fn assigned_but_unread_local_warns() {
    let mut fx = Fixture::new();
    let source = "class Idle extends Object;\nfunction Go()\n{\n    local int Kept;\n    Kept = 3;\n}\n";
    fx.compile("Idle", source).expect("compiles with a warning");
    assert_eq!(
        warnings(&fx),
        vec![(4, "Local variable 'Kept' is assigned but never used".to_string())]
    );
}

#[test]
fn local_read_before_assignment_warns_at_the_read() {
    let mut fx = Fixture::new();
    let source =
        "class Idle extends Object;\nfunction int Go()\n{\n    local int Late;\n    return Late;\n}\n";
    fx.compile("Idle", source).expect("compiles with a warning");
    assert_eq!(
        warnings(&fx),
        vec![(5, "Local variable 'Late' used before assigned".to_string())]
    );
}

#[test]
fn used_locals_do_not_warn() {
    let mut fx = Fixture::new();
    fx.compile("Control", CONTROL_SOURCE).expect("compiles");
    assert_eq!(warnings(&fx), Vec::new());
}

#[test]
fn switch_on_a_struct_fails() {
    let mut fx = Fixture::new();
    let source = r#"
class Mover extends Object;

function int Pick(Vector V)
{
    switch (V)
    {
    default:
        return 0;
    }
}
"#;
    let err = fx.compile("Mover", source).unwrap_err();
    assert!(
        err.message.contains("Can't switch on a value of type 'Vector'"),
        "{}",
        err.message
    );
}

#[test]
fn switch_on_a_string_compiles() {
    let mut fx = Fixture::new();
    let source = r#"
class Mover extends Object;

function int Pick(string S)
{
    switch (S)
    {
    case "a":
        return 1;
    default:
        return 0;
    }
}
"#;
    let class = fx.compile("Mover", source).expect("compiles");
    let code = fx.instructions(class, "Pick");
    assert_eq!(code[0].opcode, token(ExprToken::Switch));
    assert!(code[0].operands.contains(&Operand::U8(12)), "{:?}", code[0]);
}
