// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for password hashing and bearer-token handling in
// the pdfworks-security crate.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use pdfworks_security::{PasswordHasher, TokenSigner};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Benchmark a hash-then-verify round trip at the production cost.
///
/// This is the work a register followed by a login costs the server.
fn bench_password_roundtrip(c: &mut Criterion) {
    let hasher = PasswordHasher::default();

    c.bench_function("password_hash_verify (default cost)", |b| {
        b.iter(|| {
            let hash = hasher.hash(black_box("correct-horse-battery-staple")).expect("hash failed");
            assert!(hasher.verify("correct-horse-battery-staple", &hash));
        });
    });
}

/// Benchmark token verification, which runs on every protected request.
fn bench_token_verify(c: &mut Criterion) {
    let signer = TokenSigner::with_ttl_hours(b"bench-secret", 24);
    let token = signer.issue("12345").expect("issue failed");

    c.bench_function("token_verify", |b| {
        b.iter(|| {
            let claims = signer.verify(black_box(&token)).expect("verify failed");
            black_box(claims);
        });
    });
}

criterion_group!(benches, bench_password_roundtrip, bench_token_verify);
criterion_main!(benches);
