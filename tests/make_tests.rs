//! End-to-end builds over the packages in `test_scripts/`.

use std::fs;
use std::path::{Path, PathBuf};

use unrealscript::core::{BuildError, Name, ObjectRef};
use unrealscript::headers::{AutoAccept, AutoDecline};
use unrealscript::registry::PropertyValue;
use unrealscript::{
    BuildOptions, EditorConfig, ScriptBuild, SourceClass, SourcePackage, load_package, make_scripts,
};

const PACKAGES: [&str; 3] = ["Core", "Engine", "Game"];

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("test_scripts")
}

fn copy_tree(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_tree(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}

/// A private copy of the fixture packages plus an editor ini pointing at it.
fn workspace(label: &str) -> (PathBuf, EditorConfig) {
    let root = std::env::temp_dir().join(format!("unrealscript-make-{}-{}", label, std::process::id()));
    let _ = fs::remove_dir_all(&root);
    copy_tree(&fixtures(), &root);

    let mut ini = String::from("[Editor.EditorEngine]\nEditPackagesInPath=.\nEditPackagesOutPath=Out\n");
    for package in PACKAGES {
        ini.push_str(&format!("+EditPackages={}\n", package));
    }
    let ini_path = root.join("UnrealEd.ini");
    fs::write(&ini_path, ini).unwrap();
    let config = EditorConfig::load(&ini_path).unwrap();
    (root, config)
}

fn options(switches: &str) -> BuildOptions {
    BuildOptions::parse(switches)
}

fn in_memory(package: &str, classes: &[(&str, &str)]) -> SourcePackage {
    let name = Name::new(package);
    SourcePackage {
        classes: classes
            .iter()
            .map(|(class, source)| SourceClass::new(name.clone(), PathBuf::from(format!("{}.uc", class)), *source))
            .collect(),
        name,
    }
}

fn build_with(options: BuildOptions, extra: Option<SourcePackage>) -> ScriptBuild {
    let mut build = ScriptBuild::new(options);
    build.add_package(load_package(&fixtures(), "Core").unwrap());
    if let Some(package) = extra {
        build.add_package(package);
    }
    build
}

fn names(list: &[Name]) -> Vec<String> {
    list.iter().map(|n| n.to_string()).collect()
}

#[test]
fn builds_fixture_packages_and_exports_engine_header() {
    let (root, config) = workspace("full");
    let report = make_scripts(&config, &options("-auto"), &mut AutoAccept).unwrap();

    assert!(report.succeeded(), "{:?}", report.failures);
    assert_eq!(names(&report.compiled), ["Object", "Actor", "Pawn", "GameInfo"]);
    assert!(report.up_to_date.is_empty());

    let header = fs::read_to_string(root.join("Engine/Inc/EngineClasses.h")).unwrap();
    assert!(header.contains("class AActor : public UObject"));
    assert!(header.contains("class APawn : public AActor"));
    assert!(header.contains("DECLARE_ABSTRACT_CLASS(AActor"));
    assert!(header.contains("#define UCONST_MAX_TAG_LENGTH 32"));
    assert!(header.contains("ROLE_Authority"));

    // Object is noexport and GameInfo is not native.
    assert!(!root.join("Core/Inc/CoreClasses.h").exists());
    assert!(!root.join("Game/Inc/GameClasses.h").exists());
    assert!(root.join("Out/ScriptManifest.ini").is_file());
}

#[test]
fn second_build_leaves_unchanged_packages_alone() {
    let (root, config) = workspace("incremental");
    make_scripts(&config, &options("-auto"), &mut AutoAccept).unwrap();

    let report = make_scripts(&config, &options("-auto"), &mut AutoAccept).unwrap();
    assert!(report.succeeded());
    assert_eq!(names(&report.up_to_date), PACKAGES);
    assert!(report.headers.is_empty());
    // Still compiled in memory so later packages resolve.
    assert_eq!(report.compiled.len(), 4);

    let pawn = root.join("Engine/Classes/Pawn.uc");
    let source = fs::read_to_string(&pawn).unwrap();
    fs::write(&pawn, source.replace("var float Speed;", "var float Speed;\nvar int Armor;")).unwrap();

    let report = make_scripts(&config, &options("-auto"), &mut AutoAccept).unwrap();
    assert!(report.succeeded(), "{:?}", report.failures);
    assert_eq!(names(&report.up_to_date), ["Core"]);
    let exported: Vec<String> = report.headers.iter().map(|(p, _)| p.to_string()).collect();
    assert_eq!(exported, ["Engine", "Game"]);
    let (_, engine) = &report.headers[0];
    assert_eq!(engine.written.len(), 1);
    let header = fs::read_to_string(root.join("Engine/Inc/EngineClasses.h")).unwrap();
    assert!(header.contains("INT Armor;"));
}

#[test]
fn full_build_rewrites_nothing_when_text_matches() {
    let (_root, config) = workspace("rebuild");
    make_scripts(&config, &options("-auto"), &mut AutoAccept).unwrap();

    let report = make_scripts(&config, &options("-FULL -auto"), &mut AutoAccept).unwrap();
    assert!(report.up_to_date.is_empty());
    let (package, engine) = &report.headers[1];
    assert_eq!(package.as_str(), "Engine");
    assert!(engine.written.is_empty());
    assert_eq!(engine.unchanged.len(), 1);
}

#[test]
fn declined_prompt_keeps_read_only_header() {
    let (root, config) = workspace("readonly");
    make_scripts(&config, &options("-auto"), &mut AutoAccept).unwrap();

    let header_path = root.join("Engine/Inc/EngineClasses.h");
    let mut permissions = fs::metadata(&header_path).unwrap().permissions();
    permissions.set_readonly(true);
    fs::set_permissions(&header_path, permissions).unwrap();

    let pawn = root.join("Engine/Classes/Pawn.uc");
    let source = fs::read_to_string(&pawn).unwrap();
    fs::write(&pawn, source.replace("var int Lives;", "var int Lives;\nvar int Kills;")).unwrap();

    let report = make_scripts(&config, &options("-silentbuild"), &mut AutoDecline).unwrap();
    let (_, engine) = &report.headers[0];
    assert_eq!(engine.declined.len(), 1);
    assert!(!fs::read_to_string(&header_path).unwrap().contains("Kills"));
}

#[test]
fn unreferenced_functions_are_listed() {
    let (_root, config) = workspace("unreferenced");
    let report = make_scripts(&config, &options("-LISTUNREFERENCED -auto"), &mut AutoAccept).unwrap();
    // TakeDamage is called from GameInfo; natives and events never show up.
    assert_eq!(report.unreferenced, ["GameInfo.Punish", "Pawn.IsAlive", "Pawn.Respawn"]);
}

#[test]
fn missing_package_directory_is_reported() {
    let (root, mut config) = workspace("missing");
    config.packages.push("Nowhere".to_string());
    let err = make_scripts(&config, &options("-auto"), &mut AutoAccept).unwrap_err();
    assert!(matches!(err, BuildError::Io { .. }));
    assert!(!root.join("Out/ScriptManifest.ini").exists());
}

#[test]
fn defaults_are_inherited_and_overridden() {
    let mut build = ScriptBuild::new(options(""));
    for package in PACKAGES {
        build.add_package(load_package(&fixtures(), package).unwrap());
    }
    build.compile_scripts().unwrap();
    build.compile_class_defaults().unwrap();
    assert!(build.report().succeeded(), "{:?}", build.report().failures);

    let registry = build.registry();
    let value = |class: &str, property: &str| {
        let class = registry.find_class(class).unwrap();
        let property = registry.find_class_property(class, property).unwrap();
        registry.class(class).defaults.get(property, 0).cloned()
    };

    assert_eq!(value("Actor", "Health"), Some(PropertyValue::Int(100)));
    assert_eq!(value("Pawn", "Health"), Some(PropertyValue::Int(150)));
    assert_eq!(value("Pawn", "Lives"), Some(PropertyValue::Int(3)));
    assert_eq!(value("Pawn", "Role"), Some(PropertyValue::Byte(2)));
    assert_eq!(value("GameInfo", "Health"), Some(PropertyValue::Int(1)));
    assert_eq!(value("GameInfo", "Tag"), Some(PropertyValue::Name(Name::new("Actor"))));

    let pawn = registry.find_class("Pawn").unwrap();
    assert_eq!(
        value("GameInfo", "DefaultPawnClass"),
        Some(PropertyValue::Object(ObjectRef::from(pawn)))
    );
}

#[test]
fn circular_depends_on_fails_both_classes() {
    let package = in_memory(
        "Loop",
        &[
            ("Chicken", "class Chicken extends Object dependson(Egg);"),
            ("Egg", "class Egg extends Object dependson(Chicken);"),
            ("Hen", "class Hen extends Chicken;"),
            ("Rooster", "class Rooster extends Object;"),
        ],
    );
    let mut build = build_with(options(""), Some(package));
    build.compile_scripts().unwrap();

    let report = build.report();
    assert!(report.failed("Chicken"));
    assert!(report.failed("Egg"));
    assert!(report.failed("Hen"));
    assert!(!report.failed("Rooster"));
    assert!(report.failures.iter().any(|f| f.log_line.contains("Circular dependency")));
    assert_eq!(names(&report.compiled), ["Object", "Rooster"]);
}

#[test]
fn failed_class_takes_its_children_down_but_not_its_siblings() {
    let package = in_memory(
        "Broken",
        &[
            ("Base", "class Base extends Object;\nfunction F() { local int i; i = ; }"),
            ("Child", "class Child extends Base;"),
            ("Sibling", "class Sibling extends Object;\nfunction G() { local int i; i = 1; }"),
        ],
    );
    let mut build = build_with(options(""), Some(package));
    build.compile_scripts().unwrap();

    let report = build.report();
    assert!(report.failed("Base"));
    assert!(report.failed("Child"));
    assert!(!report.failed("Sibling"));
    let base = &report.failures[0];
    assert!(base.log_line.starts_with("Base.uc("), "{}", base.log_line);
    assert!(base.log_line.contains(") : Error,"));
    // The failed class is reset.
    let registry = build.registry();
    let base = registry.find_class("Base").unwrap();
    assert!(registry.find_own_function(base, "F").is_none());
    assert!(build.package_failed(&Name::new("Broken")));
}

#[test]
fn bootstrap_stops_at_the_first_failure() {
    let package = in_memory(
        "Broken",
        &[
            ("Base", "class Base extends Object;\nfunction F() { Undefined(); }"),
            ("Later", "class Later extends Object;"),
        ],
    );
    let mut build = build_with(options("bootstrap"), Some(package));
    let err = build.compile_scripts().unwrap_err();
    match err {
        BuildError::Bootstrap { class, .. } => assert_eq!(class, "Base"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn archetype_forward_reference_waits_for_its_class() {
    let package = in_memory(
        "Arch",
        &[
            (
                "Alpha",
                "class Alpha extends Object;\nvar Object Template;\ndefaultproperties\n{\n    Template=Default__Beta\n}\n",
            ),
            ("Beta", "class Beta extends Object;\nvar int Count;\ndefaultproperties\n{\n    Count=4\n}\n"),
        ],
    );
    let mut build = build_with(options(""), Some(package));
    build.compile_scripts().unwrap();
    build.compile_class_defaults().unwrap();
    assert!(build.report().succeeded(), "{:?}", build.report().failures);

    let registry = build.registry();
    let alpha = registry.find_class("Alpha").unwrap();
    let beta = registry.find_class("Beta").unwrap();
    let template = registry.find_class_property(alpha, "Template").unwrap();
    assert_eq!(
        registry.class(alpha).defaults.get(template, 0),
        Some(&PropertyValue::Archetype(beta))
    );
    assert!(registry.class(alpha).defaults_imported);
}

#[test]
fn archetype_cycle_stalls_defaults() {
    let package = in_memory(
        "Arch",
        &[
            (
                "Left",
                "class Left extends Object;\nvar Object Other;\ndefaultproperties\n{\n    Other=Default__Right\n}\n",
            ),
            (
                "Right",
                "class Right extends Object;\nvar Object Other;\ndefaultproperties\n{\n    Other=Default__Left\n}\n",
            ),
        ],
    );
    let mut build = build_with(options(""), Some(package));
    build.compile_scripts().unwrap();
    build.compile_class_defaults().unwrap();

    let report = build.report();
    assert!(report.failed("Left"));
    assert!(report.failed("Right"));
    for failure in &report.failures {
        assert!(
            failure.log_line.contains("Left (waiting on Right)"),
            "{}",
            failure.log_line
        );
        assert!(
            failure.log_line.contains("Right (waiting on Left)"),
            "{}",
            failure.log_line
        );
    }
}
