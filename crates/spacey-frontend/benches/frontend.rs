use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use spacey_frontend::{Frontend, FrontendConfig};

/// A program with `count` functions mixing loops, try and arrows.
fn program(count: usize) -> String {
    let mut source = String::from("var total = 0;\n");
    for i in 0..count {
        source.push_str(&format!(
            "function f{i}(a, b) {{\n\
             \x20 var sum = 0;\n\
             \x20 for (var k = 0; k < a; k++) {{ if (k == b) break; sum += k; }}\n\
             \x20 try {{ total = total + sum; }} finally {{ sum = 0; }}\n\
             \x20 var g = (x) => this.base + x + arguments.length;\n\
             \x20 return g(sum);\n\
             }}\n"
        ));
    }
    source
}

fn bench_validate(c: &mut Criterion) {
    let source = program(50);
    let mut group = c.benchmark_group("validate");
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("50 functions", |b| {
        b.iter(|| {
            let mut frontend = Frontend::default();
            frontend.check("bench.js", black_box(source.as_str())).unwrap()
        });
    });
    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    for count in [10, 100] {
        let source = program(count);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::new("eager", count), &source, |b, source| {
            b.iter(|| {
                let mut frontend = Frontend::default();
                frontend.compile("bench.js", black_box(source.as_str())).unwrap()
            });
        });
        group.bench_with_input(BenchmarkId::new("lazy stubs", count), &source, |b, source| {
            let config = FrontendConfig::new().with_lazy(true).with_lazy_threshold(0);
            b.iter(|| {
                let mut frontend = Frontend::new(config.clone());
                frontend.compile("bench.js", black_box(source.as_str())).unwrap()
            });
        });
    }
    group.finish();
}

fn bench_lazy_on_demand(c: &mut Criterion) {
    let source = program(100);
    let config = FrontendConfig::new().with_lazy(true).with_lazy_threshold(0);
    c.bench_function("compile one lazy function", |b| {
        b.iter_batched(
            || {
                let mut frontend = Frontend::new(config.clone());
                frontend.compile("bench.js", source.as_str()).unwrap();
                let f = frontend.find_function("f50").unwrap();
                (frontend, f)
            },
            |(mut frontend, f)| frontend.compile_lazy(f).unwrap(),
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_validate, bench_compile, bench_lazy_on_demand);
criterion_main!(benches);
