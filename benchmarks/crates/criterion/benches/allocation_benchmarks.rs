//! Benchmarks for the safety probe and full simulation runs.

#![allow(
    clippy::min_ident_chars,
    clippy::cast_possible_truncation,
    missing_docs,
    let_underscore_drop,
    reason = "Benchmarks use standard loop variables and small fixed sizes"
)]

use allocsim_core::{
    Activity, ManagerKind, ResourceId, ResourceVector, Standing, TaskId, Workload, safe_sequence,
};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

const RESOURCES: usize = 3;

/// Every task claims two units of each resource, takes them one at a time,
/// computes, and gives everything back.
fn contended_workload(tasks: usize) -> Workload {
    let capacity = ResourceVector::from(vec![tasks as u32; RESOURCES]);
    let activities = (0..tasks)
        .map(|index| {
            let mut steps = Vec::new();
            for r in 0..RESOURCES {
                steps.push(Activity::Initiate {
                    resource: ResourceId::from_index(r),
                    claim: 2,
                });
            }
            for r in 0..RESOURCES {
                let resource = ResourceId::from_index((r + index) % RESOURCES);
                steps.push(Activity::Request { resource, units: 1 });
                steps.push(Activity::Request { resource, units: 1 });
            }
            steps.push(Activity::Compute {
                cycles: (index % 4) as u32 + 1,
            });
            for r in 0..RESOURCES {
                steps.push(Activity::Release {
                    resource: ResourceId::from_index(r),
                    units: 2,
                });
            }
            steps.push(Activity::Terminate);
            steps
        })
        .collect();
    Workload::new(capacity, activities)
}

fn standings(tasks: usize) -> Vec<Standing> {
    (0..tasks)
        .map(|index| Standing {
            task: TaskId::from_index(index),
            claim: ResourceVector::from(vec![4; RESOURCES]),
            allocated: ResourceVector::from(vec![(index % 3) as u32; RESOURCES]),
        })
        .collect()
}

fn bench_safety_probe(c: &mut Criterion) {
    let mut group = c.benchmark_group("safety_probe");
    for size in &[8, 64, 256] {
        let probe = standings(*size);
        let available = ResourceVector::from(vec![4; RESOURCES]);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| safe_sequence(black_box(&probe), black_box(&available)));
        });
    }
    group.finish();
}

fn bench_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation");
    for size in &[10, 50, 200] {
        let workload = contended_workload(*size);
        group.throughput(Throughput::Elements(*size as u64));
        for manager in ManagerKind::ALL {
            group.bench_with_input(BenchmarkId::new(manager.label(), size), size, |b, _| {
                b.iter(|| manager.simulate(black_box(&workload)));
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_safety_probe, bench_simulation);
criterion_main!(benches);
