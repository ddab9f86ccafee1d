//! Benchmarks for configuration parsing and validation.
//!
//! Every mutation re-validates the whole configuration, and destination
//! overlap is checked between every pair of mappings, so these measure how
//! that scales with the number of vendors.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use git_vendor::config::{self, PathMapping, VendorConfig, VendorDefinition};

/// A configuration with `vendors` vendors of two mappings each.
fn config_with_vendors(vendors: usize) -> VendorConfig {
    let mut config = VendorConfig::new();
    for i in 0..vendors {
        config.vendors.push(VendorDefinition::new(
            &format!("vendor-{}", i),
            &format!("https://github.com/example/repo{}.git", i),
            "main",
            vec![
                PathMapping::new("src", &format!("vendor/{}/src", i)).unwrap(),
                PathMapping::new("LICENSE", &format!("vendor/{}/LICENSE", i)).unwrap(),
            ],
        ));
    }
    config
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("config_parse");

    for size in [10, 100, 500] {
        let yaml = serde_yaml::to_string(&config_with_vendors(size)).unwrap();
        group.bench_with_input(BenchmarkId::new("vendors", size), &yaml, |b, yaml| {
            b.iter(|| config::parse(black_box(yaml)).unwrap())
        });
    }

    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("config_validate");

    for size in [10, 100, 500] {
        let config = config_with_vendors(size);
        group.bench_with_input(BenchmarkId::new("vendors", size), &config, |b, config| {
            b.iter(|| config.validate())
        });
    }

    group.finish();
}

fn bench_add_vendor(c: &mut Criterion) {
    let mut group = c.benchmark_group("config_add_vendor");

    for size in [10, 100, 500] {
        let config = config_with_vendors(size);
        group.bench_with_input(BenchmarkId::new("into", size), &config, |b, config| {
            b.iter(|| {
                let mut config = config.clone();
                config
                    .add_vendor(VendorDefinition::new(
                        "new",
                        "https://github.com/example/new.git",
                        "main",
                        vec![PathMapping::new("", "third_party/new").unwrap()],
                    ))
                    .unwrap();
                config
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_validate, bench_add_vendor);
criterion_main!(benches);
