use std::path::Path;

use criterion::{Criterion, criterion_group, criterion_main};
use moonc_lang_driver::{Database, InMemorySource, Phase};

const EXAMPLE: &str = include_str!("../../test/suites/success/bubblesort.src");

fn benchmark(c: &mut Criterion) {
    c.bench_function("lex bubblesort", |b| b.iter(|| moonc_lang_parser::lex(EXAMPLE)));
    c.bench_function("parse bubblesort", |b| b.iter(|| moonc_lang_parser::parse_source(EXAMPLE)));
    c.bench_function("check bubblesort", |b| {
        b.iter(|| {
            let outcome = moonc_lang_parser::parse_source(EXAMPLE);
            outcome.ast.map(|mut ast| moonc_lang_elaborator::elaborate(&mut ast))
        })
    });
    c.bench_function("build bubblesort", |b| b.iter(build));
}

fn build() -> usize {
    let mut source = InMemorySource::new();
    source.insert("bubblesort.src", EXAMPLE);
    let mut db = Database::from_source(source);
    db.errors(Path::new("bubblesort.src"), Phase::Build).map(|errors| errors.len()).unwrap_or_default()
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
