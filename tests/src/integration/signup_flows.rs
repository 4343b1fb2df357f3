//! # Signup Flows
//!
//! Registration evidence produced by one node's enclave must check out on
//! any other node, and a registration that misses its commit window is
//! abandoned for a fresh one.

#[cfg(test)]
mod tests {
    use super::super::network::{Chain, Node, GENESIS_ID, GENESIS_ROOT};
    use poet_attestation::{Measurement, Quote, SgxStruct};
    use poet_consensus::{block_id_to_nonce, BlockPublisher};
    use poet_enclave::config::SIMULATOR_ENCLAVE_MEASUREMENT;
    use poet_enclave::{
        expected_report_data, EnclaveConfig, EnclaveError, EnclaveSignupInfo, EnclaveSimulator,
        PoetEnclave, ProofData, VerificationReport,
    };
    use shared_crypto::sha256_hex;

    /// Register `node` on genesis and return what it submitted.
    fn register(chain: &Chain, node: &Node) -> EnclaveSignupInfo {
        let genesis = chain.block(GENESIS_ID);
        let header = node.header_on(&genesis, GENESIS_ROOT);
        assert!(!node.publisher.initialize_block(&header).unwrap());

        let submitted = node.submitter.submitted();
        assert_eq!(submitted.len(), 1);
        let (validator_id, signup) = submitted[0].clone();
        assert_eq!(validator_id, node.validator_id);
        EnclaveSignupInfo {
            poet_public_key: signup.poet_public_key,
            proof_data: signup.proof_data,
            anti_sybil_id: signup.anti_sybil_id,
            sealed_signup_data: String::new(),
        }
    }

    // =========================================================================
    // ATTESTATION EVIDENCE
    // =========================================================================

    #[test]
    fn test_registration_verifies_on_another_node() {
        let chain = Chain::new(&[]);
        let node = Node::new(&chain, "validator-0");
        let signup = register(&chain, &node);

        let originator_hash = sha256_hex(node.validator_id.as_bytes());
        assert_eq!(signup.anti_sybil_id, originator_hash);

        let peer = EnclaveSimulator::new(EnclaveConfig::default()).unwrap();
        peer.verify_signup_info(&signup, &originator_hash, block_id_to_nonce(GENESIS_ID))
            .unwrap();
    }

    #[test]
    fn test_quote_binds_poet_key_to_originator() {
        let chain = Chain::new(&[]);
        let node = Node::new(&chain, "validator-0");
        let signup = register(&chain, &node);

        let proof: ProofData = serde_json::from_str(&signup.proof_data).unwrap();
        let report: VerificationReport =
            serde_json::from_str(&proof.verification_report).unwrap();
        assert_eq!(report.nonce, GENESIS_ID);

        let quote = Quote::parse_from_base64(&report.isv_enclave_quote_body).unwrap();
        assert_eq!(
            quote.report_body.report_data,
            expected_report_data(
                &sha256_hex(node.validator_id.as_bytes()),
                &signup.poet_public_key
            )
        );
        assert_eq!(
            quote.report_body.mr_enclave,
            Measurement::new(SIMULATOR_ENCLAVE_MEASUREMENT)
        );
        assert_eq!(quote.serialize_to_base64(), report.isv_enclave_quote_body);
    }

    #[test]
    fn test_evidence_for_another_originator_rejected() {
        let chain = Chain::new(&[]);
        let node = Node::new(&chain, "validator-0");
        let mut signup = register(&chain, &node);
        signup.anti_sybil_id = sha256_hex(b"someone-else");

        let peer = EnclaveSimulator::new(EnclaveConfig::default()).unwrap();
        let err = peer
            .verify_signup_info(&signup, &signup.anti_sybil_id, GENESIS_ID)
            .unwrap_err();
        assert!(matches!(err, EnclaveError::InvalidSignupInfo(_)));
    }

    // =========================================================================
    // COMMIT WINDOW
    // =========================================================================

    #[test]
    fn test_uncommitted_registration_is_retried_after_window() {
        let chain = Chain::new(&[]);
        let node = Node::new(&chain, "validator-0");
        let first = register(&chain, &node);

        let genesis = chain.block(GENESIS_ID);
        let next = chain.append_plain_block("block-1", &genesis, GENESIS_ROOT, &[]);
        let header = node.header_on(&next, GENESIS_ROOT);
        assert!(!node.publisher.initialize_block(&header).unwrap());

        let submitted = node.submitter.submitted();
        assert_eq!(submitted.len(), 2);
        assert_eq!(submitted[1].1.nonce, "block-1");
        assert!(node.key_states.get(&first.poet_public_key).is_none());
        assert_eq!(
            node.key_states.active_key().as_deref(),
            Some(submitted[1].1.poet_public_key.as_str())
        );
    }

    #[test]
    fn test_registration_within_window_is_kept() {
        let chain = Chain::new(&[("sawtooth.poet.signup_commit_maximum_delay", "3")]);
        let node = Node::new(&chain, "validator-0");
        let first = register(&chain, &node);

        let mut head = chain.block(GENESIS_ID);
        for height in 1..=3 {
            head = chain.append_plain_block(&format!("block-{height}"), &head, GENESIS_ROOT, &[]);
            let header = node.header_on(&head, GENESIS_ROOT);
            assert!(!node.publisher.initialize_block(&header).unwrap());
        }

        assert_eq!(node.submitter.submitted().len(), 1);
        assert_eq!(
            node.key_states.active_key().as_deref(),
            Some(first.poet_public_key.as_str())
        );
    }
}
