//! # Election Round Flows
//!
//! Validators race wait timers on a shared clock. The first timer to expire
//! publishes, and every node must verify the block before it joins the chain.

#[cfg(test)]
mod tests {
    use super::super::network::{Network, Node};
    use poet_consensus::{
        Block, BlockVerifier, CertificateValidator, ConsensusError, ErrorKind, PoetSettings,
        PolicyViolation,
    };
    use poet_enclave::PoetEnclave;
    use shared_crypto::sha256_hex;
    use std::collections::HashMap;

    // =========================================================================
    // LEADER ELECTION
    // =========================================================================

    #[test]
    fn test_every_round_elects_a_verified_leader() {
        let mut network = Network::bootstrap(3, &[]);
        let mut wins: HashMap<usize, u64> = HashMap::new();

        for _ in 0..12 {
            let winner = network.round().expect("some node must arm a timer");
            *wins.entry(winner).or_default() += 1;
        }

        assert_eq!(network.head.block_num(), 13);
        assert_eq!(wins.values().sum::<u64>(), 12);

        let head = network.head.block_id.clone();
        let reference = network.nodes[0].state_at(&head).unwrap();
        assert_eq!(reference.total_block_claim_count(), 12);
        for node in &network.nodes[1..] {
            assert_eq!(node.state_at(&head).unwrap(), reference);
        }

        for (index, node) in network.nodes.iter().enumerate() {
            let info = network
                .chain
                .validator_info(&network.state_root, &node.validator_id);
            let validator_state = reference.get_validator_state(&info).unwrap();
            assert_eq!(
                validator_state.total_block_claim_count(),
                wins.get(&index).copied().unwrap_or(0)
            );
        }
    }

    #[test]
    fn test_local_mean_leaves_target_during_bootstrap() {
        let mut network = Network::bootstrap(2, &[]);
        network.round().unwrap();
        network.round().unwrap();

        let certificate = CertificateValidator::deserialize(&network.head).unwrap();
        let previous = network.chain.block(network.head.previous_block_id());
        let expected = network.nodes[0]
            .state_at(&previous.block_id)
            .unwrap()
            .compute_local_mean(&PoetSettings::default());
        assert_eq!(certificate.local_mean, expected);
        assert!(expected > 20.0);
    }

    // =========================================================================
    // FORGERY
    // =========================================================================

    #[test]
    fn test_reassigned_block_rejected_by_peers() {
        let mut network = Network::bootstrap(2, &[]);
        network.round().unwrap();

        let (winner, mut block) = network.propose().unwrap();
        let impostor = &network.nodes[1 - winner];
        block.header.signer_public_key = impostor.validator_id.clone();

        for node in &network.nodes {
            let err = node.verifier.verify_block(&block).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::PolicyRejected);
        }
    }

    #[test]
    fn test_block_on_unknown_predecessor_is_not_verifiable() {
        let mut network = Network::bootstrap(2, &[]);
        network.round().unwrap();

        let (_, mut block) = network.propose().unwrap();
        block.header.previous_block_id = "f".repeat(64);

        let err = network.nodes[0].verifier.verify_block(&block).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    // =========================================================================
    // KEY ROTATION (K POLICY)
    // =========================================================================

    #[test]
    fn test_claim_limit_rotates_the_poet_key() {
        let mut network = Network::bootstrap(1, &[("sawtooth.poet.key_block_claim_limit", "2")]);
        let original_key = network.nodes[0].key_states.active_key().unwrap();

        assert_eq!(network.round(), Some(0));
        assert_eq!(network.round(), Some(0));

        // Third claim on the same key is refused and a new key is submitted.
        assert!(network.propose().is_none());
        let node = &network.nodes[0];
        assert_eq!(node.submitter.submitted().len(), 2);
        assert!(node.key_states.get(&original_key).unwrap().has_been_refreshed);
        let rotated_key = node.key_states.active_key().unwrap();
        assert_ne!(rotated_key, original_key);

        network.commit_registrations(&[0]);
        assert_eq!(network.round(), Some(0));

        let info = network
            .chain
            .validator_info(&network.state_root, &network.nodes[0].validator_id);
        assert_eq!(info.poet_public_key(), rotated_key);
        let state = network.nodes[0].state_at(&network.head.block_id).unwrap();
        let validator_state = state.get_validator_state(&info).unwrap();
        assert_eq!(validator_state.poet_public_key(), rotated_key);
        assert_eq!(validator_state.key_block_claim_count(), 1);
    }

    #[test]
    fn test_peers_reject_claims_past_the_limit() {
        let mut network = Network::bootstrap(1, &[("sawtooth.poet.key_block_claim_limit", "2")]);
        network.round().unwrap();
        network.round().unwrap();

        // Drive the enclave directly, skipping the publisher's own K check.
        let node = &network.nodes[0];
        let head = network.head.clone();
        let settings = PoetSettings::default();
        let local_mean = node
            .state_at(&head.block_id)
            .unwrap()
            .compute_local_mean(&settings);
        let previous_certificate_id = CertificateValidator::previous_certificate_id(
            &head.block_id,
            network.chain.blocks.as_ref(),
        )
        .unwrap();
        let timer = node
            .enclave
            .create_wait_timer(
                &node.validator_id,
                &previous_certificate_id,
                local_mean,
                settings.minimum_wait_time,
            )
            .unwrap();
        network.chain.clock.set(timer.expires_at() + 0.001);
        let certificate = node
            .enclave
            .create_wait_certificate(&timer, "forced")
            .unwrap();

        let mut header = node.header_on(&head, &network.state_root);
        header.consensus = certificate.dump().unwrap().to_bytes().unwrap();
        let block = Block::new(sha256_hex(&header.consensus), header);

        let observer = Node::new(&network.chain, "observer");
        assert_eq!(
            observer.verifier.verify_block(&block).unwrap_err(),
            ConsensusError::PolicyRejected(PolicyViolation::ClaimLimitReached)
        );
        assert_eq!(
            node.verifier.verify_block(&block).unwrap_err(),
            ConsensusError::PolicyRejected(PolicyViolation::ClaimLimitReached)
        );
    }
}
