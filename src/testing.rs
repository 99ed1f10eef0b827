//! Used for testing/benchmarking.

use rand::{rngs::StdRng, CryptoRng, RngCore, SeedableRng};

use crate::{
    input::{CallContext, EntryPoint, InputText},
    AccountId, AccountKeys, Balance, ConfidentialToken, SimulatedBackend, TokenConfig,
};

pub const TOKEN_NAME: &str = "Confidential Token";
pub const TOKEN_SYMBOL: &str = "CTK";

/// A token running on the simulated backend.
pub type TestToken = ConfidentialToken<SimulatedBackend>;

/// Deploy a test token, returning it together with the creator's keys.
pub fn deploy<R: RngCore + CryptoRng>(
    rng: &mut R,
    supply: Balance,
    decimals: u8,
) -> (TestToken, AccountKeys) {
    let owner = AccountKeys::generate(rng);
    let mut seed = [0u8; 32];
    rng.fill_bytes(&mut seed);
    let backend = SimulatedBackend::new(StdRng::from_seed(seed));
    let ledger = AccountKeys::generate(rng).public;

    let config = TokenConfig::new(TOKEN_NAME, TOKEN_SYMBOL, decimals, supply, ledger);
    let token = ConfidentialToken::new(backend, &owner.public, config)
        .expect("Minting to a fresh key succeeds");
    (token, owner)
}

/// Encrypt and sign `amount` as `keys` for a call to `entry_point`.
pub fn encrypt_input<R: RngCore + CryptoRng>(
    token: &TestToken,
    keys: &AccountKeys,
    entry_point: EntryPoint,
    amount: Balance,
    rng: &mut R,
) -> InputText {
    let context = token.call_context(entry_point, &keys.public);
    sign_for(token, keys, &context, amount, rng)
}

/// Encrypt and sign `amount` for an arbitrary call context.
pub fn sign_for<R: RngCore + CryptoRng>(
    token: &TestToken,
    keys: &AccountKeys,
    context: &CallContext,
    amount: Balance,
    rng: &mut R,
) -> InputText {
    InputText::encrypt(keys, &token.backend().network_key(), context, amount, rng)
        .expect("The network key is valid")
}

/// The plaintext balance of `keys`' account.
pub fn balance(token: &TestToken, keys: &AccountKeys) -> Balance {
    keys.decrypt(&token.balance_of(&keys.public))
        .expect("The balance is encrypted for this account")
}

/// The plaintext allowance of `spender` over `owner`, read by `reader`.
pub fn allowance(
    token: &TestToken,
    reader: &AccountKeys,
    owner: &AccountId,
    spender: &AccountId,
) -> Balance {
    let ct = token
        .allowance(&reader.public, owner, spender)
        .expect("The reader is a party of the allowance");
    reader
        .decrypt(&ct)
        .expect("The allowance is encrypted for the reader")
}
