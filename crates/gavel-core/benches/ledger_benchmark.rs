// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Criterion benchmark suite for the hash-chained ledger and control plane.
//!
//! Benchmarks cover:
//!
//! - Raw ledger append + hash chain computation
//! - Full chain verification at increasing chain lengths
//! - Policy engine evaluation (benign, risky, hard-denied inputs)
//! - The end-to-end `ControlPlane::propose` pipeline, including an
//!   escalation + approval + resubmit upgrade path
//!
//! Run with: `cargo bench --bench ledger_benchmark`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use gavel_core::control_plane::ControlPlane;
use gavel_core::ledger::Ledger;
use gavel_core::policy;
use gavel_core::storage::InMemoryStorage;

// ---------------------------------------------------------------------------
// Ledger append benchmark
// ---------------------------------------------------------------------------

/// Benchmark appending a single event onto chains of varying existing length.
///
/// Measures the cost of canonical-JSON serialization, canonical timestamp
/// formatting, and SHA-256 chaining as the chain grows.
fn ledger_append_benchmark(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("ledger_append");

    for chain_len in [0usize, 100, 1_000, 10_000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(chain_len),
            &chain_len,
            |bencher, &chain_len| {
                let mut ledger = Ledger::new(InMemoryStorage::new());
                for i in 0..chain_len {
                    ledger
                        .append(
                            "agent:bench",
                            "INBOUND_INTENT",
                            serde_json::json!({ "content": format!("warm-{i}") }),
                            "v1",
                        )
                        .unwrap();
                }

                bencher.iter(|| {
                    let event = ledger
                        .append(
                            black_box("agent:bench"),
                            black_box("INBOUND_INTENT"),
                            black_box(serde_json::json!({ "content": "src/main.rs" })),
                            black_box("v1"),
                        )
                        .unwrap();
                    black_box(event);
                });
            },
        );
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Chain verification benchmark
// ---------------------------------------------------------------------------

/// Benchmark walking the full chain to verify every link, at increasing
/// chain lengths.
fn ledger_verify_benchmark(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("ledger_verify");

    for chain_len in [100usize, 1_000, 10_000] {
        let mut ledger = Ledger::new(InMemoryStorage::new());
        for i in 0..chain_len {
            ledger
                .append(
                    "agent:bench",
                    "INBOUND_INTENT",
                    serde_json::json!({ "content": format!("event-{i}") }),
                    "v1",
                )
                .unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(chain_len), &chain_len, |bencher, _| {
            bencher.iter(|| {
                let verification = ledger.verify();
                black_box(verification);
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Policy engine benchmark
// ---------------------------------------------------------------------------

/// Benchmark the pure policy evaluation function across the three decision
/// outcomes: approved, escalated, and hard-denied.
fn policy_evaluate_benchmark(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("policy_evaluate");

    group.bench_function("approved_benign_read", |bencher| {
        bencher.iter(|| {
            let outcome = policy::evaluate(black_box("file_read"), black_box("src/main.rs"));
            black_box(outcome);
        });
    });

    group.bench_function("escalated_risky_command", |bencher| {
        bencher.iter(|| {
            let outcome = policy::evaluate(
                black_box("bash"),
                black_box("kubectl scale deployment web --replicas=3"),
            );
            black_box(outcome);
        });
    });

    group.bench_function("denied_hard_violation", |bencher| {
        bencher.iter(|| {
            let outcome = policy::evaluate(black_box("bash"), black_box("sudo rm -rf /"));
            black_box(outcome);
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Control plane pipeline benchmark
// ---------------------------------------------------------------------------

/// Benchmark the full `propose` pipeline: ledger append, policy evaluation,
/// and (on the upgrade path) approval registry projection.
fn control_plane_propose_benchmark(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("control_plane_propose");

    group.bench_function("approved_path", |bencher| {
        let mut plane = ControlPlane::new(InMemoryStorage::new());
        bencher.iter(|| {
            let outcome = plane
                .propose(black_box("agent:bench"), black_box("file_read"), black_box("src/main.rs"))
                .unwrap();
            black_box(outcome);
        });
    });

    group.bench_function("escalation_then_approved_resubmit", |bencher| {
        bencher.iter(|| {
            let mut plane = ControlPlane::new(InMemoryStorage::new());
            let first = plane
                .propose("agent:bench", "bash", "kubectl scale deployment web --replicas=3")
                .unwrap();
            plane
                .approve(first.intent_event_id, first.policy_event_id, "human:bench")
                .unwrap();
            let second = plane
                .propose("agent:bench", "bash", "kubectl scale deployment web --replicas=3")
                .unwrap();
            black_box(second);
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Criterion harness
// ---------------------------------------------------------------------------

criterion_group!(
    benches,
    ledger_append_benchmark,
    ledger_verify_benchmark,
    policy_evaluate_benchmark,
    control_plane_propose_benchmark,
);

criterion_main!(benches);
