//! Fixtures shared by unit tests.

use crate::domain::{Block, BlockHeader, SignupInfo, ValidatorInfo};
use poet_enclave::{
    EnclaveConfig, EnclaveSimulator, ManualTimeSource, PoetEnclave, WaitCertificate,
    NULL_IDENTIFIER,
};

pub(crate) struct TestEnclave {
    pub simulator: EnclaveSimulator,
    pub clock: ManualTimeSource,
}

impl TestEnclave {
    /// Simulator on a manual clock with a PoET key loaded.
    pub fn new() -> Self {
        let clock = ManualTimeSource::default();
        let simulator = EnclaveSimulator::new(EnclaveConfig::default())
            .unwrap()
            .with_time_source(Box::new(clock.clone()));
        simulator
            .create_signup_info("originator", NULL_IDENTIFIER)
            .unwrap();
        Self { simulator, clock }
    }

    pub fn poet_public_key(&self) -> String {
        self.simulator.poet_public_key().unwrap()
    }

    /// Signed certificate, waiting out the timer when it is not a genesis one.
    pub fn certificate(
        &self,
        validator_address: &str,
        previous_certificate_id: &str,
        local_mean: f64,
    ) -> WaitCertificate {
        let timer = self
            .simulator
            .create_wait_timer(validator_address, previous_certificate_id, local_mean, 1.0)
            .unwrap();
        if previous_certificate_id != NULL_IDENTIFIER {
            self.clock.advance(timer.duration + 0.001);
        }
        self.simulator
            .create_wait_certificate(&timer, "block_hash")
            .unwrap()
    }
}

/// Unsigned certificate, enough for code that only reads fields.
pub(crate) fn fake_certificate(local_mean: f64, duration: f64) -> WaitCertificate {
    WaitCertificate {
        previous_certificate_id: NULL_IDENTIFIER.to_string(),
        local_mean,
        request_time: 0.0,
        duration,
        validator_address: "validator".to_string(),
        nonce: "nonce".to_string(),
        block_hash: "hash".to_string(),
        signature: "00".to_string(),
    }
}

pub(crate) fn plain_block(block_id: &str, previous_block_id: &str, block_num: u64) -> Block {
    Block::new(
        block_id,
        BlockHeader {
            block_num,
            previous_block_id: previous_block_id.to_string(),
            state_root_hash: "root".to_string(),
            ..BlockHeader::default()
        },
    )
}

pub(crate) fn poet_block(
    block_id: &str,
    previous_block_id: &str,
    block_num: u64,
    signer: &str,
    certificate: &WaitCertificate,
) -> Block {
    let mut block = plain_block(block_id, previous_block_id, block_num);
    block.header.signer_public_key = signer.to_string();
    block.header.consensus = certificate.dump().unwrap().to_bytes().unwrap();
    block
}

pub(crate) fn validator_info(id: &str, poet_public_key: &str) -> ValidatorInfo {
    ValidatorInfo {
        id: id.to_string(),
        name: format!("validator-{id}"),
        transaction_id: format!("txn_{id}"),
        signup_info: SignupInfo {
            poet_public_key: poet_public_key.to_string(),
            proof_data: String::new(),
            anti_sybil_id: format!("anti_sybil_{id}"),
            nonce: String::new(),
        },
    }
}
