//! The transfer engine.
//!
//! A transfer walks through `BalancesLoaded -> ComputedTransfer ->
//! StagedTransfer -> TransferReceipt`. Each stage consumes the previous one,
//! so records can only be persisted after every secret computation and every
//! offboarding of the transfer has succeeded.
//!
//! Nothing in this module branches on a secret value. Whether the sender
//! (and the allowance) covered the amount is only known to the backend,
//! carried in the receipt's success handle.

use crate::{
    backend::SecureComputation,
    errors::Result,
    store::{LedgerState, StagedAllowance, StagedBalance},
    AccountId, Balance, Event,
};

/// Whether the transferred amount may appear in the emitted event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AmountDisclosure {
    /// The amount was submitted encrypted; events carry identities only.
    Hidden,
    /// The amount was submitted in the clear.
    Clear(Balance),
}

/// A transfer of `amount` from `from` to `to`.
#[derive(Clone, Debug)]
pub struct TransferRequest<H> {
    pub from: AccountId,
    pub to: AccountId,
    pub amount: H,
    pub disclosure: AmountDisclosure,
    /// The account spending an allowance over `from`'s funds, if any.
    pub spender: Option<AccountId>,
}

impl<H> TransferRequest<H> {
    pub fn direct(from: AccountId, to: AccountId, amount: H, disclosure: AmountDisclosure) -> Self {
        Self {
            from,
            to,
            amount,
            disclosure,
            spender: None,
        }
    }

    pub fn delegated(
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: H,
        disclosure: AmountDisclosure,
    ) -> Self {
        Self {
            from,
            to,
            amount,
            disclosure,
            spender: Some(spender),
        }
    }

    fn event(&self) -> Event {
        let (from, to) = (self.from, self.to);
        match self.disclosure {
            AmountDisclosure::Hidden => Event::Transfer { from, to },
            AmountDisclosure::Clear(amount) => Event::TransferClear { from, to, amount },
        }
    }
}

/// Stage 1: every operand of the transfer is loaded into the backend.
pub struct BalancesLoaded<H> {
    request: TransferRequest<H>,
    from_balance: H,
    to_balance: H,
    allowance: Option<H>,
}

impl<H: Clone> BalancesLoaded<H> {
    pub fn load<B: SecureComputation<Handle = H>>(
        backend: &mut B,
        state: &LedgerState,
        request: TransferRequest<H>,
    ) -> Result<Self> {
        let from_balance = state.balances.load(backend, &request.from)?;
        let to_balance = state.balances.load(backend, &request.to)?;
        let allowance = match &request.spender {
            Some(spender) => Some(state.allowances.load(backend, &request.from, spender)?),
            None => None,
        };

        Ok(Self {
            request,
            from_balance,
            to_balance,
            allowance,
        })
    }

    /// Run the conditional transfer inside the backend.
    pub fn compute<B: SecureComputation<Handle = H>>(
        self,
        backend: &mut B,
    ) -> Result<ComputedTransfer<H>> {
        let Self {
            request,
            from_balance,
            to_balance,
            allowance,
        } = self;

        let (new_from, new_to, success, new_allowance) = match &allowance {
            Some(allowance) => {
                let out = backend.conditional_transfer_with_allowance(
                    &from_balance,
                    &to_balance,
                    &request.amount,
                    allowance,
                )?;
                (out.new_from, out.new_to, out.success, Some(out.new_allowance))
            }
            None => {
                let out =
                    backend.conditional_transfer(&from_balance, &to_balance, &request.amount)?;
                (out.new_from, out.new_to, out.success, None)
            }
        };

        // A self-transfer moves nothing: both sides are the same record.
        let (new_from, new_to) = if request.from == request.to {
            (from_balance.clone(), from_balance)
        } else {
            (new_from, new_to)
        };

        Ok(ComputedTransfer {
            request,
            new_from,
            new_to,
            new_allowance,
            success,
        })
    }
}

/// Stage 2: new balances (and allowance) exist as secret handles.
pub struct ComputedTransfer<H> {
    request: TransferRequest<H>,
    new_from: H,
    new_to: H,
    new_allowance: Option<H>,
    success: H,
}

impl<H> ComputedTransfer<H> {
    /// Offboard every new record without persisting any of them.
    pub fn stage<B: SecureComputation<Handle = H>>(
        self,
        backend: &mut B,
        state: &LedgerState,
    ) -> Result<StagedTransfer<H>> {
        let request = &self.request;
        let mut balances = Vec::with_capacity(2);

        if request.from != request.to {
            balances.push(state.balances.stage(
                backend,
                &request.from,
                &self.new_from,
                &state.encryption_key(&request.from),
            )?);
        }
        balances.push(state.balances.stage(
            backend,
            &request.to,
            &self.new_to,
            &state.encryption_key(&request.to),
        )?);

        let allowance = match (&request.spender, &self.new_allowance) {
            (Some(spender), Some(new_allowance)) => Some(state.allowances.stage(
                backend,
                &request.from,
                spender,
                new_allowance,
                &state.encryption_key(&request.from),
                &state.encryption_key(spender),
            )?),
            _ => None,
        };

        Ok(StagedTransfer {
            balances,
            allowance,
            event: request.event(),
            success: self.success,
        })
    }
}

/// Stage 3: every ciphertext of the transfer is computed.
pub struct StagedTransfer<H> {
    balances: Vec<StagedBalance>,
    allowance: Option<StagedAllowance>,
    event: Event,
    success: H,
}

impl<H> StagedTransfer<H> {
    /// Decrypt the success flag ahead of the commit.
    pub fn reveal<B: SecureComputation<Handle = H>>(&self, backend: &mut B) -> Result<bool> {
        Ok(backend.decrypt_bool(&self.success)?)
    }

    /// Persist the staged records and emit the transfer event.
    pub fn commit(self, state: &mut LedgerState) -> TransferReceipt<H> {
        for staged in self.balances {
            state.balances.commit(staged);
        }
        if let Some(staged) = self.allowance {
            state.allowances.commit(staged);
        }
        state.emit(self.event);

        TransferReceipt {
            success: self.success,
        }
    }
}

/// A persisted transfer.
///
/// Holds the encrypted success flag. Revealing it is an explicit choice of
/// the caller: a revealed flag discloses whether the sender could cover the
/// amount.
#[derive(Clone, Debug)]
pub struct TransferReceipt<H> {
    success: H,
}

impl<H> TransferReceipt<H> {
    /// The encrypted success flag, for further computation.
    pub fn into_success(self) -> H {
        self.success
    }

    /// Decrypt the success flag.
    pub fn reveal<B: SecureComputation<Handle = H>>(&self, backend: &mut B) -> Result<bool> {
        Ok(backend.decrypt_bool(&self.success)?)
    }
}

/// Applies transfers and allowance updates to a [`LedgerState`].
pub struct TransferEngine<'a, B> {
    backend: &'a mut B,
    state: &'a mut LedgerState,
}

impl<'a, B: SecureComputation> TransferEngine<'a, B> {
    pub fn new(backend: &'a mut B, state: &'a mut LedgerState) -> Self {
        Self { backend, state }
    }

    pub fn transfer(
        &mut self,
        request: TransferRequest<B::Handle>,
    ) -> Result<TransferReceipt<B::Handle>> {
        let staged = self.stage(request)?;
        Ok(staged.commit(self.state))
    }

    /// Apply a transfer and decrypt its success flag.
    ///
    /// The flag is decrypted before anything is persisted, so a failing
    /// decryption leaves the state untouched.
    pub fn transfer_revealed(&mut self, request: TransferRequest<B::Handle>) -> Result<bool> {
        let staged = self.stage(request)?;
        let success = staged.reveal(&mut *self.backend)?;
        staged.commit(self.state);
        Ok(success)
    }

    fn stage(
        &mut self,
        request: TransferRequest<B::Handle>,
    ) -> Result<StagedTransfer<B::Handle>> {
        log::debug!(
            "Transfer from {:?} to {:?} (spender {:?})",
            request.from,
            request.to,
            request.spender
        );
        BalancesLoaded::load(&mut *self.backend, &*self.state, request)?
            .compute(&mut *self.backend)?
            .stage(&mut *self.backend, &*self.state)
    }

    /// Set the allowance of `spender` over `owner`'s funds to `amount`.
    pub fn approve(
        &mut self,
        owner: &AccountId,
        spender: &AccountId,
        amount: &B::Handle,
        disclosure: AmountDisclosure,
    ) -> Result<()> {
        log::debug!("Approve {:?} for {:?}", spender, owner);
        let staged = self.state.allowances.stage(
            &mut *self.backend,
            owner,
            spender,
            amount,
            &self.state.encryption_key(owner),
            &self.state.encryption_key(spender),
        )?;
        self.state.allowances.commit(staged);

        let (owner, spender) = (*owner, *spender);
        self.state.emit(match disclosure {
            AmountDisclosure::Hidden => Event::Approval { owner, spender },
            AmountDisclosure::Clear(amount) => Event::ApprovalClear {
                owner,
                spender,
                amount,
            },
        });
        Ok(())
    }
}
