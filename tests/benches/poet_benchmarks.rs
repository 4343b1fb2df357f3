//! # PoET Consensus Benchmarks
//!
//! | Area | Operation | Why it is hot |
//! |------|-----------|---------------|
//! | Attestation | quote parse / serialize | every signup verification |
//! | Enclave | wait timer draw, certificate verify | every candidate and every block |
//! | Consensus | state encode / decode | every stored block state |
//! | Consensus | Z-test | every claim once history exceeds the sample window |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use poet_attestation::{Quote, SgxStruct};
use poet_consensus::{
    z_test, ConsensusState, EstimateInfo, PoetSettings, SignupInfo, ValidatorInfo,
};
use poet_enclave::{
    EnclaveConfig, EnclaveSimulator, ManualTimeSource, PoetEnclave, WaitCertificate,
    NULL_IDENTIFIER,
};
use rand::Rng;
use std::time::Duration;

// ============================================================================
// Attestation
// ============================================================================

fn bench_quote_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("attestation");
    let quote = Quote {
        signature: vec![0xA5; 680],
        ..Quote::default()
    };
    let encoded = quote.serialize_to_bytes();

    group.throughput(Throughput::Bytes(encoded.len() as u64));
    group.bench_function("quote_parse", |b| {
        b.iter(|| Quote::parse_from_bytes(black_box(&encoded)).unwrap())
    });
    group.bench_function("quote_serialize", |b| {
        b.iter(|| black_box(&quote).serialize_to_bytes())
    });
    group.finish();
}

// ============================================================================
// Enclave
// ============================================================================

fn bench_enclave(c: &mut Criterion) {
    let mut group = c.benchmark_group("enclave");
    group.measurement_time(Duration::from_secs(5));

    let clock = ManualTimeSource::default();
    let enclave = EnclaveSimulator::new(EnclaveConfig::default())
        .unwrap()
        .with_time_source(Box::new(clock.clone()));
    let signup = enclave
        .create_signup_info("originator", NULL_IDENTIFIER)
        .unwrap();

    group.bench_function("create_wait_timer", |b| {
        b.iter(|| {
            enclave
                .create_wait_timer("validator", NULL_IDENTIFIER, black_box(20.0), 1.0)
                .unwrap()
        })
    });

    let timer = enclave
        .create_wait_timer("validator", NULL_IDENTIFIER, 20.0, 1.0)
        .unwrap();
    let certificate = enclave.create_wait_certificate(&timer, "hash").unwrap();
    group.bench_function("verify_wait_certificate", |b| {
        b.iter(|| {
            enclave
                .verify_wait_certificate(black_box(&certificate), &signup.poet_public_key)
                .unwrap()
        })
    });
    group.finish();
}

// ============================================================================
// Consensus
// ============================================================================

fn claimed_state(validators: usize, claims: usize) -> ConsensusState {
    let settings = PoetSettings::default();
    let mut rng = rand::thread_rng();
    let mut state = ConsensusState::new();
    let infos: Vec<ValidatorInfo> = (0..validators)
        .map(|i| ValidatorInfo {
            id: format!("{i:064x}"),
            name: format!("validator-{i}"),
            transaction_id: format!("txn-{i}"),
            signup_info: SignupInfo {
                poet_public_key: format!("02{i:064x}"),
                proof_data: String::new(),
                anti_sybil_id: String::new(),
                nonce: NULL_IDENTIFIER.to_string(),
            },
        })
        .collect();

    for claim in 0..claims {
        let certificate = WaitCertificate {
            previous_certificate_id: NULL_IDENTIFIER.to_string(),
            local_mean: 20.0,
            request_time: claim as f64,
            duration: rng.gen_range(1.0..60.0),
            validator_address: infos[claim % validators].id.clone(),
            nonce: String::new(),
            block_hash: String::new(),
            signature: String::new(),
        };
        state
            .validator_did_claim_block(&infos[claim % validators], &certificate, &settings)
            .unwrap();
    }
    state
}

fn bench_consensus_state_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("consensus_state");

    for validators in [10, 100, 1000] {
        let state = claimed_state(validators, 2 * validators);
        let encoded = state.to_bytes().unwrap();

        group.throughput(Throughput::Elements(validators as u64));
        group.bench_with_input(BenchmarkId::new("encode", validators), &state, |b, state| {
            b.iter(|| state.to_bytes().unwrap())
        });
        group.bench_with_input(
            BenchmarkId::new("decode", validators),
            &encoded,
            |b, encoded| b.iter(|| ConsensusState::from_bytes(black_box(encoded)).unwrap()),
        );
    }

    let state = claimed_state(100, 500);
    let settings = PoetSettings::default();
    group.bench_function("compute_local_mean", |b| {
        b.iter(|| black_box(&state).compute_local_mean(&settings))
    });
    group.finish();
}

fn bench_z_test(c: &mut Criterion) {
    let mut group = c.benchmark_group("z_test");
    let settings = PoetSettings::default();
    let mut rng = rand::thread_rng();

    for depth in [50, 500, 5000] {
        let estimates: Vec<EstimateInfo> = (0..depth)
            .map(|i| EstimateInfo {
                population_estimate: rng.gen_range(5.0..15.0),
                previous_block_id: format!("{i:064x}"),
                validator_id: format!("validator-{}", rng.gen_range(0..10)),
            })
            .collect();

        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &estimates, |b, estimates| {
            b.iter(|| z_test(black_box(estimates), "validator-3", &settings))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_quote_codec,
    bench_enclave,
    bench_consensus_state_codec,
    bench_z_test
);
criterion_main!(benches);
