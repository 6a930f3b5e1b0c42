//! End-to-end tests of the settlement router.
//!
//! These tests exercise the full position lifecycle:
//! signed intent -> authority verification -> escrow -> claim -> close
//!
//! They verify that authorities, ledger, claims and the router work
//! together in realistic scenarios: repayment, liquidation, replay
//! protection, claim transfer, multiple authorities, atomic failure and
//! supply conservation.

use std::sync::{Arc, Mutex};
use std::thread;

use openborrow_authority::{DomainContext, Ed25519Authority, OrderAuthority};
use openborrow_settlement::{AssetTransferAdapter, ClaimToken, InMemoryLedger, SettlementRouter};
use openborrow_types::fixtures::Party;
use openborrow_types::*;
use rust_decimal::Decimal;

const T0: u64 = 1_700_000_000;
const FUNDING: i64 = 100_000;

fn token_a() -> AssetId {
    AssetId::named("tokenA")
}

fn token_b() -> AssetId {
    AssetId::named("tokenB")
}

fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

/// Helper: a deployed router with a funded lender and borrower.
struct Market {
    router: SettlementRouter<InMemoryLedger, ManualClock>,
    checker: Ed25519Authority,
    clock: ManualClock,
    owner: Address,
    lender: Party,
    borrower: Party,
}

impl Market {
    fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    fn with_config(config: RouterConfig) -> Self {
        let address = Address::derive("router");
        let owner = Address::derive("deployer");
        let checker = Ed25519Authority::new(Address::derive("checker"));
        let clock = ManualClock::new(T0);

        // Deployment order: claim token first, then hand its admin to the router.
        let mut claims = ClaimToken::new(owner);
        claims
            .transfer_admin(owner, address)
            .expect("admin handover");

        let mut market = Self {
            router: SettlementRouter::new(
                address,
                owner,
                config,
                Box::new(checker.clone()),
                claims,
                InMemoryLedger::new(address),
                clock.clone(),
            )
            .expect("router deploys"),
            checker,
            clock,
            owner,
            lender: Party::from_seed(11),
            borrower: Party::from_seed(22),
        };
        let lender = market.lender.address;
        let borrower = market.borrower.address;
        market.fund(lender);
        market.fund(borrower);
        market
    }

    fn fund(&mut self, who: Address) {
        let ledger = self.router.ledger_mut();
        for asset in [token_a(), token_b(), AssetId::NATIVE] {
            ledger.mint(asset, who, dec(FUNDING));
            ledger.approve(who, asset, dec(FUNDING));
        }
    }

    fn balance(&self, asset: AssetId, who: Address) -> Decimal {
        self.router.ledger().balance_of(&asset, &who)
    }

    fn sign_with(
        &self,
        authority: &Ed25519Authority,
        party: &Party,
        kind: IntentKind,
        intent: Intent,
    ) -> SignedIntent {
        let signature =
            authority.sign(&party.key, kind, &intent, &self.router.domain_context());
        SignedIntent {
            intent,
            signer: party.address,
            signature,
        }
    }

    /// Lender-signed offer for the default authority.
    fn lend_offer(&self, intent: Intent) -> SignedIntent {
        self.sign_with(&self.checker, &self.lender, IntentKind::Lend, intent)
    }

    /// Borrower-signed request for the default authority.
    fn borrow_request(&self, intent: Intent) -> SignedIntent {
        self.sign_with(&self.checker, &self.borrower, IntentKind::Borrow, intent)
    }

    fn accept_offer(&mut self, intent: Intent) -> (PositionId, OrderRecord) {
        let offer = self.lend_offer(intent);
        let created = self
            .router
            .borrow(&offer, self.borrower.address)
            .expect("borrow should succeed");
        (created.position_id, created.record().expect("record decodes"))
    }

    fn assert_untouched(&self) {
        for who in [self.lender.address, self.borrower.address] {
            for asset in [token_a(), token_b(), AssetId::NATIVE] {
                assert_eq!(self.balance(asset, who), dec(FUNDING), "{asset} of {who}");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Repayment
// ---------------------------------------------------------------------------

#[test]
fn borrow_then_repay_restores_balances() {
    let mut m = Market::new();
    let lender = m.lender.address;
    let borrower = m.borrower.address;

    let (id, record) = m.accept_offer(Intent::dummy(10_000, T0 + 3_600));
    assert_eq!(m.balance(token_a(), borrower), dec(FUNDING + 1000));
    assert_eq!(m.balance(token_b(), borrower), dec(FUNDING - 2000));
    assert_eq!(m.balance(token_b(), m.router.address()), dec(2000));
    assert_eq!(m.router.claim_holder(id).unwrap(), lender);

    m.clock.advance(86_400);
    let repaid = m
        .router
        .withdrawal(borrower, &record, id, dec(102))
        .unwrap();
    assert_eq!(repaid.interest_paid, dec(100));
    assert_eq!(repaid.refunded, dec(2));
    assert_eq!(repaid.claim_holder, lender);

    assert_eq!(m.balance(token_a(), lender), dec(FUNDING));
    assert_eq!(m.balance(token_b(), lender), dec(FUNDING));
    assert_eq!(m.balance(AssetId::NATIVE, lender), dec(FUNDING + 100));
    assert_eq!(m.balance(token_a(), borrower), dec(FUNDING));
    assert_eq!(m.balance(token_b(), borrower), dec(FUNDING));
    assert_eq!(m.balance(AssetId::NATIVE, borrower), dec(FUNDING - 100));
    assert_eq!(m.balance(token_b(), m.router.address()), Decimal::ZERO);
    assert_eq!(m.balance(AssetId::NATIVE, m.router.address()), Decimal::ZERO);

    assert!(!m.router.is_open(id));
    assert!(!m.router.claims().exists(id));
    m.router.ledger().verify_all_supply().unwrap();
}

#[test]
fn double_repayment_is_not_found() {
    let mut m = Market::new();
    let borrower = m.borrower.address;
    let (id, record) = m.accept_offer(Intent::dummy(10_000, T0 + 3_600));
    m.router.withdrawal(borrower, &record, id, dec(200)).unwrap();
    let err = m
        .router
        .withdrawal(borrower, &record, id, dec(200))
        .unwrap_err();
    assert!(matches!(err, OpenborrowError::PositionNotFound(p) if p == id));
}

#[test]
fn lend_then_borrower_repays() {
    let mut m = Market::new();
    let lender = m.lender.address;
    let borrower = m.borrower.address;

    let request = m.borrow_request(Intent::dummy(7, T0 + 3_600));
    let created = m.router.lend(&request, lender).unwrap();
    assert_eq!(created.kind, IntentKind::Borrow);
    assert_eq!(created.claim_holder, lender);
    let record = created.record().unwrap();
    assert_eq!(record.borrower, borrower);

    m.router
        .withdrawal(borrower, &record, created.position_id, dec(100))
        .unwrap();
    assert_eq!(m.balance(AssetId::NATIVE, lender), dec(FUNDING + 100));
    assert_eq!(m.balance(token_b(), borrower), dec(FUNDING));
}

#[test]
fn lend_request_cannot_be_accepted_twice() {
    let mut m = Market::new();
    let lender = m.lender.address;
    let request = m.borrow_request(Intent::dummy(7, T0 + 3_600));
    m.router.lend(&request, lender).unwrap();
    let err = m.router.lend(&request, lender).unwrap_err();
    assert!(matches!(err, OpenborrowError::IntentAlreadyUsed(_)));
    assert_eq!(m.router.open_positions(), 1);
}

#[test]
fn sequential_positions_get_sequential_ids() {
    let mut m = Market::new();
    let borrower = m.borrower.address;
    let mut opened = Vec::new();
    for i in 0..5 {
        opened.push(m.accept_offer(Intent::dummy(100 + i, T0 + 3_600)));
    }
    let ids: Vec<u64> = opened.iter().map(|(id, _)| id.0).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    assert_eq!(m.router.claims().balance_of(&m.lender.address), 5);

    // Close the middle one using only what its event carried.
    let (id, record) = &opened[2];
    m.router.withdrawal(borrower, record, *id, dec(100)).unwrap();
    assert!(!m.router.is_open(PositionId(2)));
    assert_eq!(m.router.open_positions(), 4);
    assert_eq!(m.router.next_position_id(), PositionId(5));
}

#[test]
fn overpayment_cap_rejects_excess() {
    let mut m = Market::with_config(RouterConfig {
        interest: InterestPolicy {
            max_overpayment_bps: Some(200),
        },
        ..RouterConfig::default()
    });
    let borrower = m.borrower.address;
    let (id, record) = m.accept_offer(Intent::dummy(1, T0 + 3_600));
    let err = m
        .router
        .withdrawal(borrower, &record, id, dec(200))
        .unwrap_err();
    assert!(matches!(err, OpenborrowError::ExcessivePayment { .. }));
    assert!(m.router.is_open(id));
}

#[test]
fn underpayment_leaves_position_open() {
    let mut m = Market::new();
    let borrower = m.borrower.address;
    let (id, record) = m.accept_offer(Intent::dummy(1, T0 + 3_600));
    let err = m
        .router
        .withdrawal(borrower, &record, id, dec(50))
        .unwrap_err();
    assert!(matches!(err, OpenborrowError::InsufficientInterest { .. }));
    assert!(m.router.is_open(id));
    assert_eq!(m.balance(AssetId::NATIVE, borrower), dec(FUNDING));
}

// ---------------------------------------------------------------------------
// Liquidation
// ---------------------------------------------------------------------------

#[test]
fn zero_duration_loan_is_liquidated() {
    let mut m = Market::new();
    let lender = m.lender.address;
    let borrower = m.borrower.address;

    let mut intent = Intent::dummy(10_000, T0 + 3_600);
    intent.duration = 0;
    let (id, record) = m.accept_offer(intent);
    assert_eq!(record.expiration, T0);

    let seized = m.router.liquidate(lender, &record, id).unwrap();
    assert_eq!(seized.collateral_seized, dec(2000));
    assert_eq!(seized.claim_holder, lender);

    assert_eq!(m.balance(token_a(), lender), dec(99_000));
    assert_eq!(m.balance(token_b(), lender), dec(102_000));
    assert_eq!(m.balance(token_a(), borrower), dec(101_000));
    assert_eq!(m.balance(token_b(), borrower), dec(98_000));

    let err = m.router.liquidate(lender, &record, id).unwrap_err();
    assert!(matches!(err, OpenborrowError::PositionNotFound(_)));
    m.router.ledger().verify_all_supply().unwrap();
}

#[test]
fn liquidation_waits_for_expiration() {
    let mut m = Market::new();
    let lender = m.lender.address;
    let borrower = m.borrower.address;

    let mut intent = Intent::dummy(10_000, T0 + 3_600);
    intent.duration = 1_000;
    let (id, record) = m.accept_offer(intent);

    m.clock.advance(999);
    let err = m.router.liquidate(lender, &record, id).unwrap_err();
    assert!(matches!(err, OpenborrowError::NotYetExpired { .. }));

    // At expiration the borrower can no longer repay, but anyone may liquidate.
    m.clock.advance(1);
    let err = m
        .router
        .withdrawal(borrower, &record, id, dec(100))
        .unwrap_err();
    assert!(matches!(err, OpenborrowError::PositionExpired { .. }));
    m.router
        .liquidate(Address::derive("keeper"), &record, id)
        .unwrap();
    assert_eq!(m.balance(token_b(), lender), dec(FUNDING + 2000));
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

#[test]
fn replayed_offer_rejected() {
    let mut m = Market::new();
    let borrower = m.borrower.address;
    let offer = m.lend_offer(Intent::dummy(10_000, T0 + 3_600));
    m.router.borrow(&offer, borrower).unwrap();
    let err = m.router.borrow(&offer, borrower).unwrap_err();
    assert!(matches!(err, OpenborrowError::IntentAlreadyUsed(key) if key == offer.key()));
    assert_eq!(m.router.open_positions(), 1);
}

#[test]
fn consumed_offer_stays_used_after_repayment() {
    let mut m = Market::new();
    let borrower = m.borrower.address;
    let offer = m.lend_offer(Intent::dummy(10_000, T0 + 3_600));
    let created = m.router.borrow(&offer, borrower).unwrap();
    let record = created.record().unwrap();
    m.router
        .withdrawal(borrower, &record, created.position_id, dec(100))
        .unwrap();
    assert!(!m.router.is_open(created.position_id));

    let err = m.router.borrow(&offer, borrower).unwrap_err();
    assert!(matches!(err, OpenborrowError::IntentAlreadyUsed(key) if key == offer.key()));
    assert_eq!(m.router.next_position_id(), PositionId(1));
    assert_eq!(m.router.open_positions(), 0);
}

#[test]
fn consumed_offer_stays_used_after_liquidation() {
    let mut m = Market::new();
    let lender = m.lender.address;
    let borrower = m.borrower.address;
    let mut intent = Intent::dummy(10_000, T0 + 3_600);
    intent.duration = 0;
    let offer = m.lend_offer(intent);
    let created = m.router.borrow(&offer, borrower).unwrap();
    let record = created.record().unwrap();
    m.router
        .liquidate(lender, &record, created.position_id)
        .unwrap();

    let err = m.router.borrow(&offer, borrower).unwrap_err();
    assert!(matches!(err, OpenborrowError::IntentAlreadyUsed(_)));
    assert_eq!(m.router.next_position_id(), PositionId(1));
    assert_eq!(m.router.claims().total(), 0);
}

#[test]
fn invalid_acceptances_change_nothing() {
    let mut m = Market::new();
    let borrower = m.borrower.address;

    let expired = m.lend_offer(Intent::dummy(1, T0 - 1));
    assert!(matches!(
        m.router.borrow(&expired, borrower),
        Err(OpenborrowError::DeadlineExpired { .. })
    ));

    let mut limited = Intent::dummy(2, T0 + 3_600);
    limited.counterparty_limit = Address::derive("carol");
    let limited = m.lend_offer(limited);
    assert!(matches!(
        m.router.borrow(&limited, borrower),
        Err(OpenborrowError::CounterpartyMismatch { .. })
    ));

    let mut forged = m.lend_offer(Intent::dummy(3, T0 + 3_600));
    forged.intent.collateral_amount = dec(1);
    assert!(matches!(
        m.router.borrow(&forged, borrower),
        Err(OpenborrowError::InvalidSignature(_))
    ));

    let mut unknown = Intent::dummy(4, T0 + 3_600);
    unknown.order_type = OrderType(3);
    let unknown = m.lend_offer(unknown);
    assert!(matches!(
        m.router.borrow(&unknown, borrower),
        Err(OpenborrowError::UnknownOrderType(_))
    ));

    m.assert_untouched();
    assert!(m.router.used_intents().is_empty());
    assert_eq!(m.router.open_positions(), 0);
    assert_eq!(m.router.next_position_id(), PositionId(0));
}

#[test]
fn counterparty_limit_admits_named_borrower() {
    let mut m = Market::new();
    let mut intent = Intent::dummy(1, T0 + 3_600);
    intent.counterparty_limit = m.borrower.address;
    let (id, _) = m.accept_offer(intent);
    assert!(m.router.is_open(id));
}

#[test]
fn missing_allowance_aborts_without_partial_state() {
    let mut m = Market::new();
    let borrower = m.borrower.address;
    // The borrower withdraws approval for the collateral token; the principal
    // leg would succeed but the collateral leg cannot.
    m.router
        .ledger_mut()
        .approve(borrower, token_b(), Decimal::ZERO);

    let offer = m.lend_offer(Intent::dummy(1, T0 + 3_600));
    let err = m.router.borrow(&offer, borrower).unwrap_err();
    assert!(matches!(err, OpenborrowError::InsufficientAllowance { .. }));

    m.assert_untouched();
    assert!(!m.router.used_intents().is_used(&offer.key()));
    assert!(!m.router.claims().exists(PositionId(0)));
    assert_eq!(m.router.next_position_id(), PositionId(0));

    // Once approved again, the same offer still goes through.
    m.router
        .ledger_mut()
        .approve(borrower, token_b(), dec(FUNDING));
    m.router.borrow(&offer, borrower).unwrap();
}

#[test]
fn tampered_record_cannot_close_position() {
    let mut m = Market::new();
    let borrower = m.borrower.address;
    let (id, record) = m.accept_offer(Intent::dummy(1, T0 + 3_600));

    let mut cheaper = record.clone();
    cheaper.interest_amount = dec(1);
    let err = m
        .router
        .withdrawal(borrower, &cheaper, id, dec(1))
        .unwrap_err();
    assert!(matches!(err, OpenborrowError::PositionNotFound(_)));

    let mut extended = record.clone();
    extended.expiration += 365 * 24 * 3600;
    let err = m
        .router
        .withdrawal(borrower, &extended, id, dec(100))
        .unwrap_err();
    assert!(matches!(err, OpenborrowError::PositionNotFound(_)));

    assert!(m.router.is_open(id));
}

#[test]
fn stranger_cannot_repay() {
    let mut m = Market::new();
    let (id, record) = m.accept_offer(Intent::dummy(1, T0 + 3_600));
    let err = m
        .router
        .withdrawal(Address::derive("mallory"), &record, id, dec(100))
        .unwrap_err();
    assert!(matches!(err, OpenborrowError::NotClaimHolder { .. }));
}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

#[test]
fn transferred_claim_redirects_repayment() {
    let mut m = Market::new();
    let lender = m.lender.address;
    let borrower = m.borrower.address;
    let buyer = Address::derive("buyer");

    let (id, record) = m.accept_offer(Intent::dummy(1, T0 + 3_600));
    let err = m.router.transfer_claim(borrower, buyer, id).unwrap_err();
    assert!(matches!(err, OpenborrowError::NotClaimHolder { .. }));

    m.router.transfer_claim(lender, buyer, id).unwrap();
    assert_eq!(m.router.claim_holder(id).unwrap(), buyer);

    let repaid = m
        .router
        .withdrawal(borrower, &record, id, dec(100))
        .unwrap();
    assert_eq!(repaid.claim_holder, buyer);
    assert_eq!(m.balance(token_a(), buyer), dec(1000));
    assert_eq!(m.balance(AssetId::NATIVE, buyer), dec(100));
    assert_eq!(m.balance(token_a(), lender), dec(FUNDING - 1000));
}

#[test]
fn claim_holder_receives_liquidated_collateral() {
    let mut m = Market::new();
    let lender = m.lender.address;
    let buyer = Address::derive("buyer");

    let mut intent = Intent::dummy(1, T0 + 3_600);
    intent.duration = 10;
    let (id, record) = m.accept_offer(intent);
    m.router.transfer_claim(lender, buyer, id).unwrap();

    m.clock.advance(10);
    let seized = m.router.liquidate(lender, &record, id).unwrap();
    assert_eq!(seized.claim_holder, buyer);
    assert_eq!(m.balance(token_b(), buyer), dec(2000));
    assert_eq!(m.balance(token_b(), lender), dec(FUNDING));
}

// ---------------------------------------------------------------------------
// Authorities
// ---------------------------------------------------------------------------

#[test]
fn configured_domain_is_bound_into_signatures() {
    let mut m = Market::with_config(RouterConfig {
        domain: DomainConfig {
            version: "v2.0.0".into(),
            ..DomainConfig::default()
        },
        ..RouterConfig::default()
    });
    let borrower = m.borrower.address;
    let intent = Intent::dummy(1, T0 + 3_600);

    // Signed for the default protocol version, submitted to a v2 router.
    let stale_ctx = DomainContext::new(DomainConfig::default(), m.router.config().chain_id);
    let signature = m
        .checker
        .sign(&m.lender.key, IntentKind::Lend, &intent, &stale_ctx);
    let stale = SignedIntent {
        intent: intent.clone(),
        signer: m.lender.address,
        signature,
    };
    assert!(matches!(
        m.router.borrow(&stale, borrower),
        Err(OpenborrowError::InvalidSignature(_))
    ));

    let current = m.lend_offer(intent);
    assert!(m.router.borrow(&current, borrower).is_ok());
}

#[test]
fn second_authority_serves_its_order_type() {
    let mut m = Market::new();
    let borrower = m.borrower.address;
    let second = Ed25519Authority::new(Address::derive("checker-2"));

    let err = m
        .router
        .add_authority(m.lender.address, Box::new(second.clone()))
        .unwrap_err();
    assert!(matches!(err, OpenborrowError::NotOwner(_)));

    let order_type = m
        .router
        .add_authority(m.owner, Box::new(second.clone()))
        .unwrap();
    assert_eq!(order_type, OrderType(1));
    assert_eq!(m.router.authority(0), Some(m.checker.address()));
    assert_eq!(m.router.authority(1), Some(second.address()));

    let mut intent = Intent::dummy(1, T0 + 3_600);
    intent.order_type = order_type;

    // A signature for the default authority does not verify under the second.
    let wrong_domain = m.lend_offer(intent.clone());
    assert!(matches!(
        m.router.borrow(&wrong_domain, borrower),
        Err(OpenborrowError::InvalidSignature(_))
    ));

    let offer = m.sign_with(&second, &m.lender, IntentKind::Lend, intent);
    let created = m.router.borrow(&offer, borrower).unwrap();
    assert_eq!(created.record().unwrap().order_type, order_type);

    // Same id under order type 0 is a different intent.
    m.accept_offer(Intent::dummy(1, T0 + 3_600));
    assert_eq!(m.router.used_intents().len(), 2);
}

#[test]
fn event_log_tracks_lifecycle() {
    let mut m = Market::new();
    let borrower = m.borrower.address;
    let (id, record) = m.accept_offer(Intent::dummy(1, T0 + 3_600));
    m.router.withdrawal(borrower, &record, id, dec(100)).unwrap();

    let events = m.router.take_events();
    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], RouterEvent::AuthorityRegistered { .. }));
    match &events[1] {
        RouterEvent::PositionCreated(created) => {
            assert_eq!(created.record().unwrap(), record);
        }
        other => panic!("unexpected event {other}"),
    }
    assert!(matches!(&events[2], RouterEvent::PositionWithdrawn(w) if w.position_id == id));
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_acceptance_of_one_offer_succeeds_once() {
    let m = Market::new();
    let offer = m.lend_offer(Intent::dummy(42, T0 + 3_600));
    let router = Arc::new(Mutex::new(m.router));

    let handles: Vec<_> = (0..8u8)
        .map(|i| {
            let router = Arc::clone(&router);
            let offer = offer.clone();
            thread::spawn(move || {
                let taker = Party::from_seed(100 + i).address;
                let mut router = router.lock().unwrap();
                let ledger = router.ledger_mut();
                ledger.mint(token_b(), taker, dec(FUNDING));
                ledger.approve(taker, token_b(), dec(FUNDING));
                router.borrow(&offer, taker).is_ok()
            })
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(successes, 1);

    let router = router.lock().unwrap();
    assert_eq!(router.open_positions(), 1);
    assert_eq!(router.next_position_id(), PositionId(1));
    router.ledger().verify_all_supply().unwrap();
}

#[test]
fn concurrent_close_of_one_position_succeeds_once() {
    let mut m = Market::new();
    let mut intent = Intent::dummy(9, T0 + 3_600);
    intent.duration = 0;
    let (id, record) = m.accept_offer(intent);
    let router = Arc::new(Mutex::new(m.router));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let router = Arc::clone(&router);
            let record = record.clone();
            thread::spawn(move || {
                let keeper = Address::derive(&format!("keeper-{i}"));
                router.lock().unwrap().liquidate(keeper, &record, id)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, OpenborrowError::PositionNotFound(_)))
    );
    assert!(!router.lock().unwrap().is_open(id));
}
