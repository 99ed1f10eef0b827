//! The confidential token: ERC20 entry points over encrypted balances.

use crate::{
    backend::SecureComputation,
    errors::{Error, Result},
    input::{self, CallContext, EntryPoint, InputText},
    mint,
    store::LedgerState,
    transfer::{AmountDisclosure, TransferEngine, TransferReceipt, TransferRequest},
    AccountId, Balance, Ciphertext,
};

use codec::{Decode, Encode};
use scale_info::TypeInfo;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Deployment parameters of a token.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, TypeInfo)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Minted to the creator at construction.
    pub initial_supply: Balance,
    /// The identity input text signatures are bound to.
    pub ledger_id: AccountId,
}

impl TokenConfig {
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u8,
        initial_supply: Balance,
        ledger_id: AccountId,
    ) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            initial_supply,
            ledger_id,
        }
    }
}

/// Events emitted by the token.
///
/// Events of the encrypted entry points carry identities only, so that no
/// disclosable value can be linked to them.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, TypeInfo)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Event {
    Transfer {
        from: AccountId,
        to: AccountId,
    },
    TransferClear {
        from: AccountId,
        to: AccountId,
        amount: Balance,
    },
    Approval {
        owner: AccountId,
        spender: AccountId,
    },
    ApprovalClear {
        owner: AccountId,
        spender: AccountId,
        amount: Balance,
    },
}

/// An ERC20-style token whose balances and allowances stay encrypted.
///
/// Entry points take the calling account explicitly. Transfers never fail
/// because of insufficient funds or allowance: they apply as a no-op inside
/// the secret domain, and the outcome is only disclosed when the caller asks
/// for it.
pub struct ConfidentialToken<B: SecureComputation> {
    config: TokenConfig,
    total_supply: Balance,
    state: LedgerState,
    backend: B,
}

impl<B: SecureComputation> ConfidentialToken<B> {
    /// Deploy a token, minting the configured supply to `creator`.
    pub fn new(mut backend: B, creator: &AccountId, config: TokenConfig) -> Result<Self> {
        let mut state = LedgerState::default();
        mint::mint_initial_supply(&mut backend, &mut state, creator, config.initial_supply)?;
        log::info!(
            "Deployed {} ({}) with supply {}",
            config.name,
            config.symbol,
            config.initial_supply
        );

        Ok(Self {
            total_supply: config.initial_supply,
            config,
            state,
            backend,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.config.decimals
    }

    pub fn total_supply(&self) -> Balance {
        self.total_supply
    }

    pub fn ledger_id(&self) -> AccountId {
        self.config.ledger_id
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    /// Events emitted since the last [`Self::take_events`].
    pub fn events(&self) -> &[Event] {
        self.state.events()
    }

    /// Drain the event log. The log grows with every write until drained.
    pub fn take_events(&mut self) -> Vec<Event> {
        self.state.take_events()
    }

    /// The context an input text for `entry_point` from `caller` must be signed for.
    pub fn call_context(&self, entry_point: EntryPoint, caller: &AccountId) -> CallContext {
        CallContext::new(self.config.ledger_id, entry_point, *caller)
    }

    /// The caller's balance, encrypted for the caller.
    pub fn balance_of(&self, caller: &AccountId) -> Ciphertext {
        self.state.balances.balance_of(caller)
    }

    /// Redirect future re-encryptions for `caller` to `key`.
    ///
    /// `key` must be a usable public key, otherwise every later write for
    /// `caller` would fail to offboard.
    pub fn set_encryption_key(&mut self, caller: &AccountId, key: AccountId) -> Result<()> {
        ensure!(key.to_point().is_some(), Error::InvalidEncryptionKey { key });
        log::debug!("Encryption key of {:?} set to {:?}", caller, key);
        self.state.set_encryption_key(*caller, key);
        Ok(())
    }

    pub fn encryption_key(&self, account: &AccountId) -> AccountId {
        self.state.encryption_key(account)
    }

    /// The allowance of `spender` over `owner`'s funds, encrypted for the caller.
    pub fn allowance(
        &self,
        caller: &AccountId,
        owner: &AccountId,
        spender: &AccountId,
    ) -> Result<Ciphertext> {
        let is_party = caller == owner || caller == spender;
        if !is_party {
            log::warn!("{:?} denied access to allowance of {:?}", caller, owner);
        }
        ensure!(is_party, Error::AccessDenied { caller: *caller });

        let record = self.state.allowances.get(owner, spender);
        Ok(if caller == owner {
            record.owner.user
        } else {
            record.spender
        })
    }

    // -------------------------------------------------------------------
    // Two-phase entry points.
    // -------------------------------------------------------------------

    pub fn transfer_deferred(
        &mut self,
        caller: &AccountId,
        to: &AccountId,
        input: &InputText,
    ) -> Result<TransferReceipt<B::Handle>> {
        let request = self.encrypted_request(EntryPoint::Transfer, caller, None, to, input)?;
        self.execute(request)
    }

    pub fn transfer_clear_deferred(
        &mut self,
        caller: &AccountId,
        to: &AccountId,
        amount: Balance,
    ) -> Result<TransferReceipt<B::Handle>> {
        let request = self.clear_request(caller, None, to, amount)?;
        self.execute(request)
    }

    pub fn transfer_from_deferred(
        &mut self,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
        input: &InputText,
    ) -> Result<TransferReceipt<B::Handle>> {
        let request =
            self.encrypted_request(EntryPoint::TransferFrom, caller, Some(from), to, input)?;
        self.execute(request)
    }

    pub fn transfer_from_clear_deferred(
        &mut self,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Balance,
    ) -> Result<TransferReceipt<B::Handle>> {
        let request = self.clear_request(caller, Some(from), to, amount)?;
        self.execute(request)
    }

    /// Decrypt the success flag of a transfer.
    pub fn reveal(&mut self, receipt: &TransferReceipt<B::Handle>) -> Result<bool> {
        receipt.reveal(&mut self.backend)
    }

    // -------------------------------------------------------------------
    // ERC20 entry points.
    // -------------------------------------------------------------------

    /// Transfer an encrypted amount.
    ///
    /// Returns `true` unless `reveal` is set, in which case the returned flag
    /// tells whether the balance covered the amount.
    pub fn transfer(
        &mut self,
        caller: &AccountId,
        to: &AccountId,
        input: &InputText,
        reveal: bool,
    ) -> Result<bool> {
        let request = self.encrypted_request(EntryPoint::Transfer, caller, None, to, input)?;
        self.apply(request, reveal)
    }

    pub fn transfer_clear(
        &mut self,
        caller: &AccountId,
        to: &AccountId,
        amount: Balance,
        reveal: bool,
    ) -> Result<bool> {
        let request = self.clear_request(caller, None, to, amount)?;
        self.apply(request, reveal)
    }

    /// Transfer an encrypted amount out of `from`'s balance, consuming the
    /// caller's allowance.
    pub fn transfer_from(
        &mut self,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
        input: &InputText,
        reveal: bool,
    ) -> Result<bool> {
        let request =
            self.encrypted_request(EntryPoint::TransferFrom, caller, Some(from), to, input)?;
        self.apply(request, reveal)
    }

    pub fn transfer_from_clear(
        &mut self,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Balance,
        reveal: bool,
    ) -> Result<bool> {
        let request = self.clear_request(caller, Some(from), to, amount)?;
        self.apply(request, reveal)
    }

    /// Set the caller's allowance for `spender` to an encrypted amount.
    pub fn approve(
        &mut self,
        caller: &AccountId,
        spender: &AccountId,
        input: &InputText,
    ) -> Result<bool> {
        let amount = self.verify_input(EntryPoint::Approve, caller, input)?;
        self.engine()
            .approve(caller, spender, &amount, AmountDisclosure::Hidden)?;
        Ok(true)
    }

    pub fn approve_clear(
        &mut self,
        caller: &AccountId,
        spender: &AccountId,
        amount: Balance,
    ) -> Result<bool> {
        let handle = self.backend.set_public(amount)?;
        self.engine()
            .approve(caller, spender, &handle, AmountDisclosure::Clear(amount))?;
        Ok(true)
    }

    // -------------------------------------------------------------------
    // Entry points for values already in the secret domain.
    // -------------------------------------------------------------------

    /// Transfer a secret handle held by an in-process caller.
    pub fn transfer_handle(
        &mut self,
        caller: &AccountId,
        to: &AccountId,
        amount: B::Handle,
        reveal: bool,
    ) -> Result<bool> {
        let request = TransferRequest::direct(*caller, *to, amount, AmountDisclosure::Hidden);
        self.apply(request, reveal)
    }

    pub fn transfer_from_handle(
        &mut self,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: B::Handle,
        reveal: bool,
    ) -> Result<bool> {
        let request =
            TransferRequest::delegated(*caller, *from, *to, amount, AmountDisclosure::Hidden);
        self.apply(request, reveal)
    }

    pub fn approve_handle(
        &mut self,
        caller: &AccountId,
        spender: &AccountId,
        amount: &B::Handle,
    ) -> Result<bool> {
        self.engine()
            .approve(caller, spender, amount, AmountDisclosure::Hidden)?;
        Ok(true)
    }

    // -------------------------------------------------------------------
    // Internals.
    // -------------------------------------------------------------------

    fn engine(&mut self) -> TransferEngine<'_, B> {
        TransferEngine::new(&mut self.backend, &mut self.state)
    }

    fn execute(
        &mut self,
        request: TransferRequest<B::Handle>,
    ) -> Result<TransferReceipt<B::Handle>> {
        self.engine().transfer(request)
    }

    fn verify_input(
        &mut self,
        entry_point: EntryPoint,
        caller: &AccountId,
        input: &InputText,
    ) -> Result<B::Handle> {
        let context = self.call_context(entry_point, caller);
        input::verify(&mut self.backend, input, &context)
    }

    /// Persist a transfer, revealing its outcome before the commit when asked.
    fn apply(&mut self, request: TransferRequest<B::Handle>, reveal: bool) -> Result<bool> {
        if reveal {
            self.engine().transfer_revealed(request)
        } else {
            self.execute(request).map(|_| true)
        }
    }

    /// Build a transfer of a verified input text. `from` is set for
    /// delegated transfers, where the caller spends its allowance.
    fn encrypted_request(
        &mut self,
        entry_point: EntryPoint,
        caller: &AccountId,
        from: Option<&AccountId>,
        to: &AccountId,
        input: &InputText,
    ) -> Result<TransferRequest<B::Handle>> {
        let amount = self.verify_input(entry_point, caller, input)?;
        Ok(Self::request(caller, from, to, amount, AmountDisclosure::Hidden))
    }

    fn clear_request(
        &mut self,
        caller: &AccountId,
        from: Option<&AccountId>,
        to: &AccountId,
        amount: Balance,
    ) -> Result<TransferRequest<B::Handle>> {
        let handle = self.backend.set_public(amount)?;
        Ok(Self::request(
            caller,
            from,
            to,
            handle,
            AmountDisclosure::Clear(amount),
        ))
    }

    fn request(
        caller: &AccountId,
        from: Option<&AccountId>,
        to: &AccountId,
        amount: B::Handle,
        disclosure: AmountDisclosure,
    ) -> TransferRequest<B::Handle> {
        match from {
            Some(from) => TransferRequest::delegated(*caller, *from, *to, amount, disclosure),
            None => TransferRequest::direct(*caller, *to, amount, disclosure),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate wasm_bindgen_test;
    use super::*;
    use crate::{
        backend::simulated::SimHandle,
        errors::BackendError,
        testing::{self, TestToken},
        AccountKeys, SimulatedBackend,
    };
    use rand::{rngs::StdRng, SeedableRng};
    use wasm_bindgen_test::*;

    fn setup(supply: Balance) -> (TestToken, AccountKeys, AccountKeys, StdRng) {
        let mut rng = StdRng::from_seed([70u8; 32]);
        let (token, owner) = testing::deploy(&mut rng, supply, 5);
        let other = AccountKeys::generate(&mut rng);
        (token, owner, other, rng)
    }

    #[test]
    #[wasm_bindgen_test]
    fn metadata() {
        let (token, owner, _, _) = setup(1_000);
        assert_eq!(token.name(), testing::TOKEN_NAME);
        assert_eq!(token.symbol(), testing::TOKEN_SYMBOL);
        assert_eq!(token.decimals(), 5);
        assert_eq!(token.total_supply(), 1_000);
        assert_eq!(token.config().initial_supply, 1_000);
        assert_eq!(token.ledger_id(), token.config().ledger_id);
        assert_eq!(testing::balance(&token, &owner), 1_000);
    }

    #[test]
    #[wasm_bindgen_test]
    fn encrypted_transfer() {
        let (mut token, owner, other, mut rng) = setup(1_000);
        let input =
            testing::encrypt_input(&token, &owner, EntryPoint::Transfer, 250, &mut rng);

        assert_eq!(token.transfer(&owner.public, &other.public, &input, true), Ok(true));
        assert_eq!(testing::balance(&token, &owner), 750);
        assert_eq!(testing::balance(&token, &other), 250);
        assert_eq!(
            token.events().last(),
            Some(&Event::Transfer {
                from: owner.public,
                to: other.public
            })
        );
    }

    #[test]
    #[wasm_bindgen_test]
    fn insufficient_transfer_reports_success_unless_revealed() {
        let (mut token, owner, other, _) = setup(100);

        assert_eq!(token.transfer_clear(&owner.public, &other.public, 101, false), Ok(true));
        assert_eq!(token.transfer_clear(&owner.public, &other.public, 101, true), Ok(false));
        assert_eq!(testing::balance(&token, &owner), 100);
        assert_eq!(testing::balance(&token, &other), 0);
    }

    #[test]
    #[wasm_bindgen_test]
    fn forged_input_is_rejected_without_state_change() {
        let (mut token, owner, other, mut rng) = setup(100);
        // Signed by `other` but submitted by `owner`.
        let input =
            testing::encrypt_input(&token, &other, EntryPoint::Transfer, 10, &mut rng);
        let events = token.events().len();

        assert_err!(
            token.transfer(&owner.public, &other.public, &input, false),
            Error::SignatureVerificationFailed
        );
        assert_eq!(testing::balance(&token, &owner), 100);
        assert!(!token.state().balances.contains(&other.public));
        assert_eq!(token.events().len(), events);
    }

    #[test]
    #[wasm_bindgen_test]
    fn approve_and_transfer_from() {
        let (mut token, owner, spender, mut rng) = setup(100);
        let recipient = AccountKeys::generate(&mut rng);

        let input = testing::encrypt_input(&token, &owner, EntryPoint::Approve, 60, &mut rng);
        assert_eq!(token.approve(&owner.public, &spender.public, &input), Ok(true));
        assert_eq!(
            token.events().last(),
            Some(&Event::Approval {
                owner: owner.public,
                spender: spender.public
            })
        );

        let input =
            testing::encrypt_input(&token, &spender, EntryPoint::TransferFrom, 45, &mut rng);
        assert_eq!(
            token.transfer_from(&spender.public, &owner.public, &recipient.public, &input, true),
            Ok(true)
        );
        assert_eq!(testing::balance(&token, &owner), 55);
        assert_eq!(testing::balance(&token, &recipient), 45);

        let ct = token
            .allowance(&spender.public, &owner.public, &spender.public)
            .unwrap();
        assert_eq!(spender.decrypt(&ct), Ok(15));
        let ct = token
            .allowance(&owner.public, &owner.public, &spender.public)
            .unwrap();
        assert_eq!(owner.decrypt(&ct), Ok(15));

        // Exceeds the remaining allowance, not the balance.
        assert_eq!(
            token.transfer_from_clear(&spender.public, &owner.public, &recipient.public, 16, true),
            Ok(false)
        );
        assert_eq!(testing::balance(&token, &owner), 55);
    }

    #[test]
    #[wasm_bindgen_test]
    fn transfer_from_without_allowance_is_a_no_op() {
        let (mut token, owner, spender, _) = setup(100);

        assert_eq!(
            token.transfer_from_clear(&spender.public, &owner.public, &spender.public, 1, false),
            Ok(true)
        );
        assert_eq!(testing::balance(&token, &owner), 100);
        assert_eq!(testing::balance(&token, &spender), 0);
    }

    #[test]
    #[wasm_bindgen_test]
    fn allowance_access_control() {
        let (mut token, owner, spender, mut rng) = setup(100);
        let stranger = AccountKeys::generate(&mut rng);
        token
            .approve_clear(&owner.public, &spender.public, 5)
            .unwrap();

        assert_err!(
            token.allowance(&stranger.public, &owner.public, &spender.public),
            Error::AccessDenied {
                caller: stranger.public
            }
        );
    }

    #[test]
    #[wasm_bindgen_test]
    fn two_phase_transfer() {
        let (mut token, owner, other, _) = setup(100);

        let receipt = token
            .transfer_clear_deferred(&owner.public, &other.public, 30)
            .unwrap();
        // Persisted before anything is revealed.
        assert_eq!(testing::balance(&token, &other), 30);
        assert_eq!(token.reveal(&receipt), Ok(true));
    }

    #[test]
    #[wasm_bindgen_test]
    fn handle_entry_points() {
        let (mut token, owner, other, _) = setup(100);

        let amount = token.backend_mut().set_public(12).unwrap();
        assert_eq!(
            token.transfer_handle(&owner.public, &other.public, amount, true),
            Ok(true)
        );

        let allowance = token.backend_mut().set_public(7).unwrap();
        assert_eq!(
            token.approve_handle(&other.public, &owner.public, &allowance),
            Ok(true)
        );
        let amount = token.backend_mut().set_public(7).unwrap();
        assert_eq!(
            token.transfer_from_handle(&owner.public, &other.public, &owner.public, amount, true),
            Ok(true)
        );
        assert_eq!(testing::balance(&token, &owner), 95);
        assert_eq!(testing::balance(&token, &other), 5);
    }

    #[test]
    #[wasm_bindgen_test]
    fn redirected_encryption_key() {
        let (mut token, owner, other, mut rng) = setup(100);
        let vault = AccountKeys::generate(&mut rng);
        token
            .set_encryption_key(&other.public, vault.public)
            .unwrap();
        assert_eq!(token.encryption_key(&other.public), vault.public);

        token
            .transfer_clear(&owner.public, &other.public, 3, false)
            .unwrap();
        assert_eq!(vault.decrypt(&token.balance_of(&other.public)), Ok(3));

        token
            .set_encryption_key(&other.public, other.public)
            .unwrap();
        token
            .transfer_clear(&owner.public, &other.public, 1, false)
            .unwrap();
        assert_eq!(testing::balance(&token, &other), 4);
    }

    #[test]
    #[wasm_bindgen_test]
    fn events_encode() {
        let (mut token, owner, other, _) = setup(100);
        token
            .transfer_clear(&owner.public, &other.public, 3, false)
            .unwrap();

        let events = token.take_events();
        assert_eq!(events.len(), 2);
        assert!(token.events().is_empty());
        for event in events {
            let decoded = Event::decode(&mut event.encode().as_slice()).unwrap();
            assert_eq!(decoded, event);
        }
    }

    #[test]
    #[wasm_bindgen_test]
    fn invalid_encryption_key_is_rejected() {
        let (mut token, owner, other, _) = setup(100);
        let bogus = AccountId([0xffu8; 32]);

        for key in [bogus, crate::mint::MINT_SOURCE] {
            assert_err!(
                token.set_encryption_key(&other.public, key),
                Error::InvalidEncryptionKey { key }
            );
        }
        assert_eq!(token.encryption_key(&other.public), other.public);
        assert_eq!(
            token.transfer_clear(&owner.public, &other.public, 3, false),
            Ok(true)
        );
        assert_eq!(testing::balance(&token, &other), 3);
    }

    /// Simulated backend whose decryptions always fail.
    struct BlindBackend(SimulatedBackend);

    impl SecureComputation for BlindBackend {
        type Handle = SimHandle;

        fn set_public(&mut self, value: Balance) -> Result<SimHandle, BackendError> {
            self.0.set_public(value)
        }

        fn onboard(&mut self, ciphertext: &Ciphertext) -> Result<SimHandle, BackendError> {
            self.0.onboard(ciphertext)
        }

        fn offboard(&mut self, handle: &SimHandle) -> Result<Ciphertext, BackendError> {
            self.0.offboard(handle)
        }

        fn offboard_to_user(
            &mut self,
            handle: &SimHandle,
            recipient: &AccountId,
        ) -> Result<Ciphertext, BackendError> {
            self.0.offboard_to_user(handle, recipient)
        }

        fn add(&mut self, a: &SimHandle, b: &SimHandle) -> Result<SimHandle, BackendError> {
            self.0.add(a, b)
        }

        fn sub(&mut self, a: &SimHandle, b: &SimHandle) -> Result<SimHandle, BackendError> {
            self.0.sub(a, b)
        }

        fn ge(&mut self, a: &SimHandle, b: &SimHandle) -> Result<SimHandle, BackendError> {
            self.0.ge(a, b)
        }

        fn and(&mut self, a: &SimHandle, b: &SimHandle) -> Result<SimHandle, BackendError> {
            self.0.and(a, b)
        }

        fn select(
            &mut self,
            condition: &SimHandle,
            if_true: &SimHandle,
            if_false: &SimHandle,
        ) -> Result<SimHandle, BackendError> {
            self.0.select(condition, if_true, if_false)
        }

        fn decrypt(&mut self, _: &SimHandle) -> Result<Balance, BackendError> {
            Err(BackendError::MalformedCiphertext)
        }

        fn validate_ciphertext(
            &mut self,
            input: &InputText,
            context: &CallContext,
        ) -> Result<SimHandle, BackendError> {
            self.0.validate_ciphertext(input, context)
        }
    }

    #[test]
    #[wasm_bindgen_test]
    fn failed_reveal_persists_nothing() {
        let mut rng = StdRng::from_seed([71u8; 32]);
        let owner = AccountKeys::generate(&mut rng);
        let other = AccountKeys::generate(&mut rng);
        let config = TokenConfig::new("Blind", "BLD", 0, 100, AccountId([1u8; 32]));
        let backend = BlindBackend(SimulatedBackend::from_seed([72u8; 32]));
        let mut token = ConfidentialToken::new(backend, &owner.public, config).unwrap();
        let before = token.balance_of(&owner.public);

        assert_err!(
            token.transfer_clear(&owner.public, &other.public, 30, true),
            Error::Backend(BackendError::MalformedCiphertext)
        );
        assert_eq!(token.balance_of(&owner.public), before);
        assert!(!token.state().balances.contains(&other.public));
        assert_eq!(token.events().len(), 1);

        // Without a reveal nothing is decrypted.
        assert_eq!(
            token.transfer_clear(&owner.public, &other.public, 30, false),
            Ok(true)
        );
        assert_eq!(owner.decrypt(&token.balance_of(&owner.public)), Ok(70));
    }
}
