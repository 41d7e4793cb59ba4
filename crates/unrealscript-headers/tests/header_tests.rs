use std::fs;
use std::path::PathBuf;

use unrealscript_compiler::{CompilationSession, CompilePass, ScriptCompiler};
use unrealscript_core::{ClassFlags, ClassId, Name};
use unrealscript_headers::{
    AutoAccept, AutoDecline, ExportOptions, NativeHeaderGenerator, export_package_headers,
    header_groups,
};
use unrealscript_registry::Registry;

const ACTOR_SOURCE: &str = r#"
class Actor extends Object native;

enum EState
{
    ST_Idle,
    ST_Walking
};

const MaxHealth = 100;

struct native Slot
{
    var int Index;
    var name Item;
};

var int Health;
var bool bAlive;
var string Tag;
var array<int> Scores;

native final function int Damage(int Amount, optional bool bSilent);
event Touched(Actor Other);
delegate bool OnEnter(int Id);
"#;

struct Build {
    registry: Registry,
    session: CompilationSession,
}

impl Build {
    fn new() -> Self {
        let mut build = Self {
            registry: Registry::new(),
            session: CompilationSession::default(),
        };
        build.add("Core", "Object", "class Object native;\n");
        build
    }

    fn add(&mut self, package: &str, name: &str, source: &str) -> ClassId {
        let class = self
            .registry
            .add_class(Name::new(name), Name::new(package))
            .expect("class registers");
        for pass in [CompilePass::Declarations, CompilePass::Code] {
            let file = format!("{}.uc", name);
            ScriptCompiler::new(&mut self.session, &mut self.registry, class, source, file)
                .compile(pass)
                .unwrap_or_else(|e| panic!("{} failed: {}", name, e));
        }
        class
    }

    fn header(&mut self, group: Option<&str>) -> String {
        NativeHeaderGenerator::new(
            &self.registry,
            &mut self.session,
            Name::new("Game"),
            group.map(str::to_string),
        )
        .generate()
        .text
    }

    fn export(&mut self, dir: &PathBuf, decline: bool) -> unrealscript_headers::ExportReport {
        let options = ExportOptions { delete_stale: true };
        let result = if decline {
            export_package_headers(&mut self.registry, &mut self.session, &Name::new("Game"), dir, options, &mut AutoDecline)
        } else {
            export_package_headers(&mut self.registry, &mut self.session, &Name::new("Game"), dir, options, &mut AutoAccept)
        };
        result.expect("export succeeds")
    }

    fn misaligned(&self, class: ClassId) -> bool {
        self.registry.class(class).flags.contains(ClassFlags::MISALIGNED)
    }
}

fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("unrealscript-headers-{}-{}", test, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("scratch dir");
    dir
}

#[test]
fn header_declares_members_and_natives() {
    let mut build = Build::new();
    build.add("Game", "Actor", ACTOR_SOURCE);
    let text = build.header(None);

    for expected in [
        "class AActor : public UObject",
        "    //## BEGIN PROPS Actor\n",
        "    INT Health;\n",
        "    BITFIELD bAlive:1;\n",
        "    FStringNoInit Tag;\n",
        "    TArrayNoInit<INT> Scores;\n",
        "    FScriptDelegate __OnEnter__Delegate;\n",
        "enum EState\n{",
        "#define UCONST_MaxHealth 100",
        "struct FSlot\n{\n    INT Index;\n    FName Item;\n};",
        "    INT Damage(INT Amount,UBOOL bSilent);",
        "        P_GET_UBOOL_OPTX(bSilent,FALSE);",
        "        *(INT*)Result=this->Damage(Amount,bSilent);",
        "AUTOGENERATE_FUNCTION(AActor,-1,execDamage);",
        "AUTOGENERATE_NAME(Touched)",
        "AUTOGENERATE_NAME(OnEnter)",
        "struct Actor_eventTouched_Parms\n{\n    class AActor* Other;\n",
        "        ProcessEvent(FindFunctionChecked(GAME_Touched),&Parms);",
        "        Parms.ReturnValue=FALSE;",
        "        ProcessDelegate(GAME_OnEnter,&__OnEnter__Delegate,&Parms);",
        "    DECLARE_CLASS(AActor,UObject,0,Game)",
        "    NO_DEFAULT_CONSTRUCTOR(AActor)",
        "VERIFY_CLASS_OFFSET_NODIE(A,Actor,Health)",
        "VERIFY_CLASS_SIZE_NODIE(AActor)",
        "    MAP_NATIVE(AActor,execDamage)",
    ] {
        assert!(text.contains(expected), "missing {:?} in\n{}", expected, text);
    }
    assert!(!text.contains("VERIFY_CLASS_OFFSET_NODIE(A,Actor,bAlive)"));
}

#[test]
fn parents_precede_children_in_the_same_header() {
    let mut build = Build::new();
    build.add("Game", "Zone", "class Zone extends Object native;\nvar int Depth;\n");
    build.add("Game", "Alpha", "class Alpha extends Zone native;\nvar float Speed;\n");
    let text = build.header(None);

    let zone = text.find("class UZone : public UObject").expect("zone declared");
    let alpha = text.find("class UAlpha : public UZone").expect("alpha declared");
    assert!(zone < alpha);
}

#[test]
fn bool_after_byte_is_realigned() {
    let mut build = Build::new();
    build.add("Game", "Base", "class Base extends Object native;\nvar byte Mode;\n");
    build.add("Game", "Flagged", "class Flagged extends Base native;\nvar bool bOn;\n");
    let text = build.header(None);
    assert!(text.contains("    //## BEGIN PROPS Flagged\n    SCRIPT_ALIGN;\n    BITFIELD bOn:1;\n"));
}

#[test]
fn header_groups_get_their_own_file() {
    let mut build = Build::new();
    build.add("Game", "Actor", ACTOR_SOURCE);
    build.add("Game", "Brain", "class Brain extends Object native(AI);\nvar int Mood;\n");

    let groups = header_groups(&build.registry, &Name::new("Game"));
    assert_eq!(groups, vec![None, Some("AI".to_string())]);

    let dir = scratch_dir("groups");
    let report = build.export(&dir, false);
    assert_eq!(report.written.len(), 2);
    let ai = fs::read_to_string(dir.join("GameAIClasses.h")).expect("group header");
    assert!(ai.contains("class UBrain : public UObject"));
    assert!(!ai.contains("class AActor"));
    assert!(ai.contains("INCLUDED_GAMEAI_CLASSES_H"));
}

#[test]
fn unchanged_header_is_not_rewritten_and_clears_misalignment() {
    let mut build = Build::new();
    let actor = build.add("Game", "Actor", ACTOR_SOURCE);
    let hero = build.add("Game", "Hero", "class Hero extends Actor;\nvar int Lives;\n");
    let dir = scratch_dir("unchanged");

    let first = build.export(&dir, false);
    assert_eq!(first.written.len(), 1);
    assert!(build.misaligned(actor));
    assert!(build.misaligned(hero));

    let second = build.export(&dir, false);
    assert!(second.written.is_empty());
    assert_eq!(second.unchanged.len(), 1);
    assert!(!build.misaligned(actor));
    assert!(!build.misaligned(hero));
}

#[test]
fn changed_member_block_marks_class_misaligned() {
    let mut build = Build::new();
    let actor = build.add("Game", "Actor", ACTOR_SOURCE);
    let hero = build.add("Game", "Hero", "class Hero extends Actor;\nvar int Lives;\n");
    let dir = scratch_dir("changed");
    build.export(&dir, false);
    build.export(&dir, false);
    assert!(!build.misaligned(actor));

    let path = dir.join("GameClasses.h");
    let previous = fs::read_to_string(&path).expect("header written");
    let edited = previous.replace("    INT Health;\n", "    INT Health;\n    INT Armor;\n");
    fs::write(&path, edited).expect("edit header");

    let report = build.export(&dir, false);
    assert_eq!(report.written, vec![path.clone()]);
    assert!(build.misaligned(actor));
    assert!(build.misaligned(hero));
    assert_eq!(fs::read_to_string(&path).expect("header"), previous);
}

#[test]
fn read_only_header_is_left_alone_when_declined() {
    let mut build = Build::new();
    build.add("Game", "Actor", ACTOR_SOURCE);
    let dir = scratch_dir("readonly");
    let path = dir.join("GameClasses.h");
    fs::write(&path, "// checked in\n").expect("seed header");
    let mut permissions = fs::metadata(&path).expect("metadata").permissions();
    permissions.set_readonly(true);
    fs::set_permissions(&path, permissions).expect("make read-only");

    let report = build.export(&dir, true);
    assert_eq!(report.declined, vec![path.clone()]);
    assert_eq!(fs::read_to_string(&path).expect("header"), "// checked in\n");
}

#[test]
fn stale_headers_of_the_package_are_deleted() {
    let mut build = Build::new();
    build.add("Game", "Actor", ACTOR_SOURCE);
    let dir = scratch_dir("stale");
    fs::write(dir.join("GameOldClasses.h"), "// old group\n").expect("seed stale");
    fs::write(dir.join("CoreClasses.h"), "// other package\n").expect("seed other");

    let report = build.export(&dir, false);
    assert_eq!(report.deleted, vec![dir.join("GameOldClasses.h")]);
    assert!(dir.join("CoreClasses.h").exists());
    assert!(dir.join("GameClasses.h").exists());
}
