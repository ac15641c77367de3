use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use engine::{analyze_tree, match_pattern, scan, ScanConfig};
use loader::load_rules;
use parsers::{parse_source, Language};
use patterns::compile_pattern;
use std::fs;
use std::path::PathBuf;

fn repo_path(rel: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..").join(rel)
}

fn demo_source() -> (PathBuf, String) {
    let file = repo_path("fixtures/demo/app.py");
    let source = fs::read_to_string(&file).expect("read demo app");
    (file, source)
}

fn bench_parse(c: &mut Criterion) {
    let (file, source) = demo_source();
    c.bench_function("parse_python_demo", |b| {
        b.iter(|| parse_source(&file, Language::Python, black_box(source.clone())).unwrap())
    });
}

fn bench_compile(c: &mut Criterion) {
    c.bench_function("compile_pattern", |b| {
        b.iter(|| {
            compile_pattern(
                black_box("subprocess.$FUNC(..., shell=True, ...)"),
                Language::Python,
            )
            .unwrap()
        })
    });
}

fn bench_rules(c: &mut Criterion) {
    let (file, source) = demo_source();
    let rules = load_rules(&repo_path("rules")).expect("load rules");
    let tree = parse_source(&file, Language::Python, source).expect("parse demo app");
    c.bench_function("analyze_demo", |b| {
        b.iter(|| analyze_tree(black_box(&tree), Language::Python, &rules, None, None).unwrap())
    });
    let paths = vec![repo_path("fixtures/demo")];
    let config = ScanConfig::default();
    c.bench_function("scan_demo_dir", |b| {
        b.iter(|| scan(black_box(&paths), &rules, &config).unwrap())
    });
}

/// Ellipsis-heavy patterns against long argument lists.
fn bench_ellipsis(c: &mut Criterion) {
    let pattern = compile_pattern("f(..., $X, ..., $X, ...)", Language::Python).unwrap();
    let mut group = c.benchmark_group("ellipsis_args");
    for n in [10usize, 40, 80] {
        let args: Vec<String> = (0..n).map(|i| format!("a{i}")).collect();
        let source = format!("f({})\n", args.join(", "));
        let tree = parse_source(&PathBuf::from("f.py"), Language::Python, source).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &tree, |b, tree| {
            b.iter(|| match_pattern(black_box(&tree.root), &pattern))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_compile, bench_rules, bench_ellipsis);
criterion_main!(benches);
