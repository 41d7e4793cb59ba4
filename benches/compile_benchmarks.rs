//! Benchmarks for the script build.
//!
//! - Lexing: tokenizing the fixture `Object` class
//! - Compiling: both passes over the fixture packages, and over a generated
//!   package of many small classes
//! - Headers: generating the `Engine` header
//!
//! With `--features profile-with-puffin` every iteration closes a puffin
//! frame so the `profiling` scopes in the compiler can be inspected.

use std::hint::black_box;
use std::path::{Path, PathBuf};

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use unrealscript::core::Name;
use unrealscript::headers::NativeHeaderGenerator;
use unrealscript::parser::{Lexer, TokenKind};
use unrealscript::{BuildOptions, ScriptBuild, SourceClass, SourcePackage, load_package};

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

const PACKAGES: [&str; 3] = ["Core", "Engine", "Game"];

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("test_scripts")
}

fn fixture_packages() -> Vec<SourcePackage> {
    PACKAGES
        .iter()
        .map(|p| load_package(&fixtures(), p).expect("fixture package"))
        .collect()
}

/// `count` classes, each with a few properties and a loop-heavy function.
fn generated_package(count: usize) -> SourcePackage {
    let name = Name::new("Bench");
    let classes = (0..count)
        .map(|i| {
            let source = format!(
                r#"class Bench{i} extends Object;

var int Total;
var float Scale;
var array<int> Values;

function int Sum(int Limit)
{{
    local int i;

    Total = 0;
    for (i = 0; i < Limit; i++)
    {{
        Total += i * 2;
    }}
    return Total;
}}

defaultproperties
{{
    Total=1
    Scale=2.0
}}
"#
            );
            SourceClass::new(name.clone(), PathBuf::from(format!("Bench{}.uc", i)), source)
        })
        .collect();
    SourcePackage { name, classes }
}

fn compile(packages: &[SourcePackage]) -> ScriptBuild {
    let mut build = ScriptBuild::new(BuildOptions::parse("SILENTBUILD"));
    for package in packages {
        build.add_package(package.clone());
    }
    build.compile_scripts().expect("compile");
    build.compile_class_defaults().expect("defaults");
    end_profiling_frame();
    build
}

fn lexer_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer");
    let source = std::fs::read_to_string(fixtures().join("Core/Classes/Object.uc")).expect("Object.uc");
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("object_class", |b| {
        b.iter(|| {
            let mut lexer = Lexer::new(black_box(source.as_str()));
            let mut tokens = 0usize;
            while let Ok(token) = lexer.get_token(false) {
                if token.kind == TokenKind::Eof {
                    break;
                }
                tokens += 1;
            }
            black_box(tokens)
        });
    });
    group.finish();
}

fn compile_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("compile");

    let fixtures = fixture_packages();
    group.bench_function("fixture_packages", |b| {
        b.iter(|| black_box(compile(black_box(&fixtures)).report().compiled.len()));
    });

    let core = load_package(&self::fixtures(), "Core").expect("Core");
    for count in [10usize, 100] {
        let packages = vec![core.clone(), generated_package(count)];
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("generated_{}_classes", count), |b| {
            b.iter(|| black_box(compile(black_box(&packages)).report().compiled.len()));
        });
    }
    group.finish();
}

fn header_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("headers");
    let build = compile(&fixture_packages());
    let registry = build.registry().clone();
    let mut session = unrealscript::compiler::CompilationSession::default();
    let engine = Name::new("Engine");
    group.bench_function("engine_header", |b| {
        b.iter(|| {
            let header = NativeHeaderGenerator::new(&registry, &mut session, engine.clone(), None).generate();
            black_box(header.text.len())
        });
    });
    group.finish();
}

criterion_group!(benches, lexer_benchmarks, compile_benchmarks, header_benchmarks);
criterion_main!(benches);
