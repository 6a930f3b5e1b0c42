//! The settlement router: accepts signed intents, escrows collateral, and
//! closes positions by repayment or liquidation.
//!
//! Every operation runs in three steps:
//! 1. Validate all preconditions against current state (no mutation)
//! 2. Move funds in one atomic [`AssetTransferAdapter::transfer_all`] batch
//! 3. Write state: consume intent / store or erase commitment / mint or burn
//!    claim / emit event
//!
//! A failure in step 1 or 2 leaves every table and balance untouched.
//! Step 3 cannot fail once step 1 has passed, because `&mut self` excludes
//! any other call in between.

use std::collections::HashMap;

use openborrow_authority::{AuthorityRegistry, DomainContext, OrderAuthority};
use openborrow_types::{
    Address, Clock, Commitment, IntentKind, OpenborrowError, OrderRecord, OrderType,
    PositionCreated, PositionId, PositionLiquidated, PositionWithdrawn, Result, RouterConfig,
    RouterEvent, SignedIntent, constants,
};
use rust_decimal::Decimal;

use crate::claim_token::ClaimToken;
use crate::ledger::{AssetTransferAdapter, Transfer};
use crate::used_intents::UsedIntentSet;

/// The protocol core. Generic over the asset ledger and the time source.
#[derive(Debug)]
pub struct SettlementRouter<L, C> {
    /// The router's own address: ledger operator, escrow holder, claim admin.
    address: Address,
    /// May register further authorities.
    owner: Address,
    config: RouterConfig,
    authorities: AuthorityRegistry,
    ledger: L,
    clock: C,
    claims: ClaimToken,
    used_intents: UsedIntentSet,
    /// Commitment per open position. Present iff the position is open.
    commitments: HashMap<PositionId, Commitment>,
    next_position: PositionId,
    events: Vec<RouterEvent>,
}

impl<L: AssetTransferAdapter, C: Clock> SettlementRouter<L, C> {
    /// Deploy a router with `default_authority` serving order type 0.
    ///
    /// # Errors
    /// `Configuration` if the config is invalid or the router is not the
    /// claim token's admin.
    pub fn new(
        address: Address,
        owner: Address,
        config: RouterConfig,
        default_authority: Box<dyn OrderAuthority>,
        claims: ClaimToken,
        ledger: L,
        clock: C,
    ) -> Result<Self> {
        config.validate()?;
        if claims.admin() != address {
            return Err(OpenborrowError::Configuration(format!(
                "router {address} must be claim admin, found {}",
                claims.admin()
            )));
        }
        let authority = default_authority.address();
        let mut router = Self {
            address,
            owner,
            config,
            authorities: AuthorityRegistry::new(default_authority),
            ledger,
            clock,
            claims,
            used_intents: UsedIntentSet::new(),
            commitments: HashMap::new(),
            next_position: PositionId(0),
            events: Vec::new(),
        };
        router.events.push(RouterEvent::AuthorityRegistered {
            order_type: OrderType(0),
            authority,
        });
        tracing::info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            router = %address,
            owner = %owner,
            chain_id = router.config.chain_id,
            "Router deployed"
        );
        Ok(router)
    }

    // -----------------------------------------------------------------
    // Authority registry
    // -----------------------------------------------------------------

    /// Register another order authority. Owner only.
    ///
    /// # Errors
    /// `NotOwner` if `caller` is not the router owner.
    pub fn add_authority(
        &mut self,
        caller: Address,
        authority: Box<dyn OrderAuthority>,
    ) -> Result<OrderType> {
        if caller != self.owner {
            return Err(OpenborrowError::NotOwner(caller));
        }
        let address = authority.address();
        let order_type = self.authorities.register(authority)?;
        self.events.push(RouterEvent::AuthorityRegistered {
            order_type,
            authority: address,
        });
        tracing::info!(%order_type, authority = %address, "Authority registered");
        Ok(order_type)
    }

    /// Address of the authority serving order type `index`.
    #[must_use]
    pub fn authority(&self, index: usize) -> Option<Address> {
        self.authorities.address_at(index)
    }

    #[must_use]
    pub fn authority_count(&self) -> usize {
        self.authorities.len()
    }

    /// Context every authority binds into its signature domain.
    #[must_use]
    pub fn domain_context(&self) -> DomainContext {
        DomainContext::new(self.config.domain.clone(), self.config.chain_id)
    }

    // -----------------------------------------------------------------
    // Opening positions
    // -----------------------------------------------------------------

    /// Accept a lender-signed `Lend` intent on behalf of `borrower`.
    ///
    /// Principal moves lender → borrower, collateral moves borrower →
    /// escrow, and the lender receives the claim.
    ///
    /// # Errors
    /// `DeadlineExpired`, `IntentAlreadyUsed`, `CounterpartyMismatch`,
    /// `UnknownOrderType`, `InvalidSignature`, `InvalidIntent`, or a ledger
    /// funds error. Nothing changes on error.
    pub fn borrow(&mut self, signed: &SignedIntent, borrower: Address) -> Result<PositionCreated> {
        self.open_position(IntentKind::Lend, signed, borrower)
    }

    /// Accept a borrower-signed `Borrow` intent on behalf of `lender`.
    ///
    /// Principal moves lender → borrower, collateral moves borrower →
    /// escrow, and the accepting lender receives the claim.
    ///
    /// # Errors
    /// Same as [`borrow`](Self::borrow).
    pub fn lend(&mut self, signed: &SignedIntent, lender: Address) -> Result<PositionCreated> {
        self.open_position(IntentKind::Borrow, signed, lender)
    }

    fn open_position(
        &mut self,
        kind: IntentKind,
        signed: &SignedIntent,
        acceptor: Address,
    ) -> Result<PositionCreated> {
        let now = self.clock.now();
        let intent = &signed.intent;
        let key = signed.key();

        intent.validate()?;
        if now > intent.deadline {
            return Err(OpenborrowError::DeadlineExpired {
                deadline: intent.deadline,
                now,
            });
        }
        self.used_intents.ensure_unused(&key)?;
        if !intent.admits(&acceptor) {
            return Err(OpenborrowError::CounterpartyMismatch {
                expected: intent.counterparty_limit,
                actual: acceptor,
            });
        }
        let authority = self
            .authorities
            .get(intent.order_type)
            .ok_or(OpenborrowError::UnknownOrderType(intent.order_type))?;
        if !authority.verify(
            kind,
            intent,
            &signed.signature,
            &signed.signer,
            &self.domain_context(),
        ) {
            tracing::warn!(intent = %key, %kind, "Intent signature rejected");
            return Err(OpenborrowError::InvalidSignature(key));
        }

        let (lender, borrower) = match kind {
            IntentKind::Lend => (signed.signer, acceptor),
            IntentKind::Borrow => (acceptor, signed.signer),
        };
        let expiration = intent.expiration_from(now)?;
        let position_id = self.next_position;
        if self.claims.exists(position_id) {
            return Err(OpenborrowError::ClaimAlreadyExists(position_id));
        }

        self.ledger.transfer_all(&[
            Transfer::new(
                intent.principal_asset,
                lender,
                borrower,
                intent.principal_amount,
            ),
            Transfer::new(
                intent.collateral_asset,
                borrower,
                self.address,
                intent.collateral_amount,
            ),
        ])?;

        // Neither write below can fail: `ensure_unused` and `claims.exists`
        // passed above, and `&mut self` has excluded every other writer since.
        debug_assert!(!self.used_intents.is_used(&key));
        debug_assert!(!self.claims.exists(position_id));
        self.used_intents.consume(key)?;
        let record = OrderRecord::from_intent(intent, borrower, expiration);
        self.commitments.insert(position_id, record.commitment());
        self.claims.mint(self.address, lender, position_id)?;
        self.next_position = position_id.next();

        let event = PositionCreated {
            position_id,
            kind,
            claim_holder: lender,
            info: record.encode(),
        };
        self.events.push(RouterEvent::PositionCreated(event.clone()));
        tracing::info!(
            position = %position_id,
            %kind,
            lender = %lender,
            borrower = %borrower,
            principal = %intent.principal_amount,
            collateral = %intent.collateral_amount,
            expiration,
            "Position opened"
        );
        Ok(event)
    }

    // -----------------------------------------------------------------
    // Closing positions
    // -----------------------------------------------------------------

    fn ensure_open(&self, position_id: PositionId, record: &OrderRecord) -> Result<()> {
        match self.commitments.get(&position_id) {
            Some(stored) if *stored == record.commitment() => Ok(()),
            _ => Err(OpenborrowError::PositionNotFound(position_id)),
        }
    }

    /// Erase a position after its funds have moved. The burn cannot fail:
    /// `ensure_open` found the commitment, and a claim lives exactly as long
    /// as its commitment.
    fn close(&mut self, position_id: PositionId) -> Result<()> {
        debug_assert!(self.claims.exists(position_id));
        self.commitments.remove(&position_id);
        self.claims.burn(self.address, position_id)?;
        Ok(())
    }

    /// Repay a position before expiration.
    ///
    /// `caller` pays the principal and `payment` of the interest asset.
    /// The claim holder receives principal plus exactly the interest owed,
    /// the excess is refunded to `caller`, and the collateral returns to
    /// the borrower.
    ///
    /// # Errors
    /// `PositionNotFound` (closed, never opened, or record mismatch),
    /// `PositionExpired`, `NotClaimHolder` (caller is neither the borrower
    /// nor the claim holder), `InsufficientInterest`, `ExcessivePayment`,
    /// or a ledger funds error. Nothing changes on error.
    pub fn withdrawal(
        &mut self,
        caller: Address,
        record: &OrderRecord,
        position_id: PositionId,
        payment: Decimal,
    ) -> Result<PositionWithdrawn> {
        let now = self.clock.now();
        self.ensure_open(position_id, record)?;
        if !record.is_repayable_at(now) {
            return Err(OpenborrowError::PositionExpired {
                position: position_id,
                expiration: record.expiration,
                now,
            });
        }
        let holder = self.claims.owner_of(position_id)?;
        if caller != holder && caller != record.borrower {
            return Err(OpenborrowError::NotClaimHolder {
                caller,
                position: position_id,
            });
        }
        let interest = record.interest_amount;
        if payment < interest {
            return Err(OpenborrowError::InsufficientInterest {
                needed: interest,
                supplied: payment,
            });
        }
        if let Some(cap) = self.config.interest.payment_cap(interest) {
            if payment > cap {
                return Err(OpenborrowError::ExcessivePayment {
                    cap,
                    supplied: payment,
                });
            }
        }
        let refund = payment - interest;
        let escrow = self.address;

        self.ledger.transfer_all(&[
            Transfer::new(
                record.principal_asset,
                caller,
                holder,
                record.principal_amount,
            ),
            Transfer::new(record.interest_asset, caller, escrow, payment),
            Transfer::new(record.interest_asset, escrow, holder, interest),
            Transfer::new(record.interest_asset, escrow, caller, refund),
            Transfer::new(
                record.collateral_asset,
                escrow,
                record.borrower,
                record.collateral_amount,
            ),
        ])?;

        self.close(position_id)?;
        let event = PositionWithdrawn {
            position_id,
            payer: caller,
            claim_holder: holder,
            interest_paid: interest,
            refunded: refund,
        };
        self.events.push(RouterEvent::PositionWithdrawn(event.clone()));
        tracing::info!(
            position = %position_id,
            payer = %caller,
            claim_holder = %holder,
            %interest,
            %refund,
            "Position repaid"
        );
        Ok(event)
    }

    /// Seize a position's collateral for its claim holder, at or after
    /// expiration. Anyone may call; the principal stays with the borrower.
    ///
    /// # Errors
    /// `PositionNotFound` (closed, never opened, or record mismatch),
    /// `NotYetExpired`, or a ledger funds error. Nothing changes on error.
    pub fn liquidate(
        &mut self,
        caller: Address,
        record: &OrderRecord,
        position_id: PositionId,
    ) -> Result<PositionLiquidated> {
        let now = self.clock.now();
        self.ensure_open(position_id, record)?;
        if !record.is_liquidatable_at(now) {
            return Err(OpenborrowError::NotYetExpired {
                position: position_id,
                expiration: record.expiration,
                now,
            });
        }
        let holder = self.claims.owner_of(position_id)?;

        self.ledger.transfer(
            record.collateral_asset,
            self.address,
            holder,
            record.collateral_amount,
        )?;

        self.close(position_id)?;
        let event = PositionLiquidated {
            position_id,
            claim_holder: holder,
            collateral_seized: record.collateral_amount,
        };
        self.events.push(RouterEvent::PositionLiquidated(event.clone()));
        tracing::info!(
            position = %position_id,
            caller = %caller,
            claim_holder = %holder,
            collateral = %record.collateral_amount,
            "Position liquidated"
        );
        Ok(event)
    }

    // -----------------------------------------------------------------
    // Claims
    // -----------------------------------------------------------------

    /// Transfer the claim on `position_id` from `caller` to `to`.
    ///
    /// # Errors
    /// `ClaimNotFound` or `NotClaimHolder`.
    pub fn transfer_claim(&mut self, caller: Address, to: Address, position_id: PositionId) -> Result<()> {
        self.claims.transfer(caller, to, position_id)
    }

    /// Current claim holder of an open position.
    ///
    /// # Errors
    /// `ClaimNotFound` if the position is not open.
    pub fn claim_holder(&self, position_id: PositionId) -> Result<Address> {
        self.claims.owner_of(position_id)
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    #[must_use]
    pub fn is_open(&self, position_id: PositionId) -> bool {
        self.commitments.contains_key(&position_id)
    }

    #[must_use]
    pub fn commitment(&self, position_id: PositionId) -> Option<Commitment> {
        self.commitments.get(&position_id).copied()
    }

    #[must_use]
    pub fn open_positions(&self) -> usize {
        self.commitments.len()
    }

    /// Id the next accepted intent will receive.
    #[must_use]
    pub fn next_position_id(&self) -> PositionId {
        self.next_position
    }

    #[must_use]
    pub fn used_intents(&self) -> &UsedIntentSet {
        &self.used_intents
    }

    #[must_use]
    pub fn claims(&self) -> &ClaimToken {
        &self.claims
    }

    #[must_use]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Direct ledger access for funding and approvals outside the router.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    #[must_use]
    pub fn events(&self) -> &[RouterEvent] {
        &self.events
    }

    /// Drain the event log.
    pub fn take_events(&mut self) -> Vec<RouterEvent> {
        std::mem::take(&mut self.events)
    }
}
