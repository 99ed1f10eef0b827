use crate::{
    backend::SecureComputation, errors::Result, store::LedgerState, AccountId, Balance, Event,
};

/// The source identity of minted funds.
pub const MINT_SOURCE: AccountId = AccountId([0u8; 32]);

/// Create the initial encrypted supply in `creator`'s balance.
///
/// The amount comes from deployment configuration, not from an untrusted
/// submitter, so it is wrapped with `set_public` and never goes through input
/// text verification.
pub(crate) fn mint_initial_supply<B: SecureComputation>(
    backend: &mut B,
    state: &mut LedgerState,
    creator: &AccountId,
    amount: Balance,
) -> Result<()> {
    log::debug!("Minting initial supply of {} to {:?}", amount, creator);
    let handle = backend.set_public(amount)?;
    let staged = state
        .balances
        .stage(backend, creator, &handle, &state.encryption_key(creator))?;
    state.balances.commit(staged);
    state.emit(Event::TransferClear {
        from: MINT_SOURCE,
        to: *creator,
        amount,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    extern crate wasm_bindgen_test;
    use super::*;
    use crate::{errors::BackendError, AccountKeys, SimulatedBackend};
    use rand::{rngs::StdRng, SeedableRng};
    use wasm_bindgen_test::*;

    #[test]
    #[wasm_bindgen_test]
    fn mint_credits_the_creator() {
        let mut rng = StdRng::from_seed([60u8; 32]);
        let mut backend = SimulatedBackend::from_seed([61u8; 32]);
        let mut state = LedgerState::default();
        let creator = AccountKeys::generate(&mut rng);

        mint_initial_supply(&mut backend, &mut state, &creator.public, 1_000).unwrap();

        assert_eq!(
            creator.decrypt(&state.balances.balance_of(&creator.public)),
            Ok(1_000)
        );
        assert_eq!(
            state.events(),
            &[Event::TransferClear {
                from: MINT_SOURCE,
                to: creator.public,
                amount: 1_000
            }]
        );
    }

    #[test]
    #[wasm_bindgen_test]
    fn mint_to_an_invalid_key_fails_cleanly() {
        let mut backend = SimulatedBackend::from_seed([62u8; 32]);
        let mut state = LedgerState::default();

        assert_err!(
            mint_initial_supply(&mut backend, &mut state, &MINT_SOURCE, 1),
            crate::Error::Backend(BackendError::InvalidPublicKey(MINT_SOURCE))
        );
        assert!(state.balances.is_empty());
    }
}
