//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Benchmarks for the connection registry and protocol driver

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use parrot_protocol::{ProtocolDriver, ReadOutcome};
use parrot_server::{ConnectionRegistry, Slot};
use std::hint::black_box;
use std::io::Cursor;

// Benchmark add/remove churn at different capacities
fn bench_registry_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry_churn");

    for capacity in [5usize, 64, 1024] {
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            &capacity,
            |b, &capacity| {
                let mut registry = ConnectionRegistry::new(capacity);
                b.iter(|| {
                    while !registry.is_full() {
                        black_box(registry.add(0u64).unwrap());
                    }
                    for index in (0..capacity).step_by(2) {
                        black_box(registry.remove(Slot::new(index)));
                    }
                    for index in (1..capacity).step_by(2) {
                        black_box(registry.remove(Slot::new(index)));
                    }
                });
            },
        );
    }

    group.finish();
}

// Benchmark iterating a full registry, as the drain does
fn bench_registry_iteration(c: &mut Criterion) {
    let mut registry = ConnectionRegistry::new(1024);
    while !registry.is_full() {
        registry.add(1u64).unwrap();
    }

    c.bench_function("registry_for_each", |b| {
        b.iter(|| {
            let mut total = 0u64;
            registry.for_each(|_, value| total += value);
            black_box(total);
        });
    });
}

// Benchmark a single driver read of a full-size payload
fn bench_driver_read(c: &mut Criterion) {
    let payload = vec![b'x'; 4096];
    let mut driver = ProtocolDriver::default();

    c.bench_function("driver_read_4k", |b| {
        b.iter(|| {
            let mut reader = Cursor::new(payload.as_slice());
            match driver.on_readable(&mut reader) {
                ReadOutcome::Payload(bytes) => black_box(bytes.len()),
                _ => unreachable!(),
            };
        });
    });
}

criterion_group!(
    benches,
    bench_registry_churn,
    bench_registry_iteration,
    bench_driver_read,
);
criterion_main!(benches);
