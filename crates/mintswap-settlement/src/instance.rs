//! Contract instance: hosts one seller's mint-and-swap market.
//!
//! The instance plays host to the offer handler:
//! 1. Consume the trade ticket (spent whatever happens next)
//! 2. Validate the proposal against the ticket's shape
//! 3. Check the payments match `give` exactly
//! 4. Open a redeemer seat holding the payments
//! 5. Run the handler in a ledger transaction and commit it
//! 6. On failure, drop the transaction and refund the seat
//!
//! All redemptions on one instance are serialized by a single mutex, so
//! each runs to completion without interleaving with any other.

use ed25519_dalek::VerifyingKey;
use mintswap_escrow::{ProceedsEscrow, SeatLedger, SeatRole, UnitMint};
use mintswap_types::{
    Allocation, Amount, InstanceConfig, InstanceId, ItemBag, MintswapError, Proposal,
    ProposalShape, Result, SeatId, SettlementReceipt, Terms, TicketId, constants,
};
use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::facet::PublicFacet;
use crate::handler::{OfferPhase, TradeHandler};
use crate::signer::ReceiptSigner;
use crate::ticket::{TicketRegistry, TradeTicket};

/// Mutable state guarded by the instance mutex.
struct ContractState {
    ledger: SeatLedger,
    tickets: TicketRegistry,
    settled: u64,
    halted: bool,
}

impl std::fmt::Debug for ContractState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractState")
            .field("seats", &self.ledger.seat_count())
            .field("tickets", &self.tickets.outstanding())
            .field("settled", &self.settled)
            .field("halted", &self.halted)
            .finish()
    }
}

/// What a redeemer gets back from redeeming a ticket.
#[derive(Debug)]
pub struct UserSeat {
    ticket_id: TicketId,
    seat_id: Option<SeatId>,
    result: Result<SettlementReceipt>,
    payout: Allocation,
}

impl UserSeat {
    fn refused(ticket_id: TicketId, error: MintswapError, payments: Allocation) -> Self {
        Self {
            ticket_id,
            seat_id: None,
            result: Err(error),
            payout: payments,
        }
    }

    #[must_use]
    pub fn ticket_id(&self) -> TicketId {
        self.ticket_id
    }

    /// The ledger seat, if the proposal got far enough to open one.
    #[must_use]
    pub fn seat_id(&self) -> Option<SeatId> {
        self.seat_id
    }

    /// `"trade complete"` on settlement, otherwise the failure.
    pub fn outcome(&self) -> Result<&'static str> {
        match &self.result {
            Ok(_) => Ok(constants::TRADE_COMPLETE),
            Err(err) => Err(err.clone()),
        }
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.result.is_ok()
    }

    /// How far the offer got. Only a cap violation counts as `Rejected`;
    /// anything refused before a seat opened stays `Proposed`.
    #[must_use]
    pub fn phase(&self) -> OfferPhase {
        match (&self.result, self.seat_id) {
            (Ok(_), _) => OfferPhase::Settled,
            (Err(_), None) => OfferPhase::Proposed,
            (Err(MintswapError::CapExceeded { .. }), Some(_)) => OfferPhase::Rejected,
            (Err(_), Some(_)) => OfferPhase::Aborted,
        }
    }

    #[must_use]
    pub fn receipt(&self) -> Option<&SettlementReceipt> {
        self.result.as_ref().ok()
    }

    #[must_use]
    pub fn error(&self) -> Option<&MintswapError> {
        self.result.as_ref().err()
    }

    /// Final holdings: the minted items on settlement, the untouched
    /// payments otherwise.
    #[must_use]
    pub fn payout(&self) -> &Allocation {
        &self.payout
    }

    #[must_use]
    pub fn into_payout(self) -> Allocation {
        self.payout
    }
}

/// One running mint-and-swap contract.
#[derive(Debug)]
pub struct SwapInstance {
    id: InstanceId,
    terms: Terms,
    shape: ProposalShape,
    mint: UnitMint,
    proceeds: ProceedsEscrow,
    signer: ReceiptSigner,
    state: Mutex<ContractState>,
}

impl SwapInstance {
    /// Validate the config and start an instance with an empty proceeds
    /// escrow and no minted supply.
    pub fn start(config: &InstanceConfig) -> Result<Self> {
        config.validate()?;
        let signer = match config.seed_bytes()? {
            Some(seed) => ReceiptSigner::from_seed(&seed),
            None => ReceiptSigner::generate(),
        };
        let terms = config.terms.clone();
        let id = InstanceId::new();
        let mut ledger = SeatLedger::new();
        let proceeds = ProceedsEscrow::open(&mut ledger, terms.payment_brand().clone())?;
        let mint = UnitMint::new(terms.item_brand.clone())?;

        info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            instance = %id,
            trade_price = %terms.trade_price,
            max_items = terms.max_items,
            item_brand = %terms.item_brand,
            "Instance started"
        );

        Ok(Self {
            id,
            shape: ProposalShape::for_trade(&terms),
            terms,
            mint,
            proceeds,
            signer,
            state: Mutex::new(ContractState {
                ledger,
                tickets: TicketRegistry::new(id),
                settled: 0,
                halted: false,
            }),
        })
    }

    #[must_use]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// The seller's terms, for rendering a storefront.
    #[must_use]
    pub fn terms(&self) -> &Terms {
        &self.terms
    }

    #[must_use]
    pub fn public_facet(&self) -> PublicFacet<'_> {
        PublicFacet::new(self)
    }

    pub(crate) fn issue_ticket(&self) -> TradeTicket {
        let ticket = self.state.lock().tickets.issue(self.shape.clone());
        info!(instance = %self.id, ticket = %ticket.id(), "Trade ticket issued");
        ticket
    }

    /// Redeem a ticket with a proposal and the payments backing its `give`.
    ///
    /// The ticket is consumed whatever the outcome. A failed redemption
    /// returns the payments untouched in the seat's payout.
    pub fn redeem(&self, ticket: TradeTicket, proposal: Proposal, payments: Allocation) -> UserSeat {
        let ticket_id = ticket.id();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if let Err(err) = self.admit(state, &ticket, &proposal, &payments) {
            warn!(instance = %self.id, ticket = %ticket_id, error = %err, "Redemption refused");
            return UserSeat::refused(ticket_id, err, payments);
        }
        drop(ticket);

        let seat = match state
            .ledger
            .open_seat(SeatRole::Redeemer, Some(proposal), payments.clone())
        {
            Ok(seat) => seat,
            Err(err) => {
                warn!(instance = %self.id, ticket = %ticket_id, error = %err, "Redeemer seat not opened");
                return UserSeat::refused(ticket_id, err, payments);
            }
        };

        match self.settle(state, ticket_id, seat) {
            Ok((receipt, payout)) => {
                info!(
                    instance = %self.id,
                    ticket = %ticket_id,
                    settlement = %receipt.settlement_id,
                    paid = %receipt.paid,
                    minted = %receipt.minted,
                    receipt_hash = %receipt.short_hash(),
                    "Trade settled"
                );
                UserSeat {
                    ticket_id,
                    seat_id: Some(seat),
                    result: Ok(receipt),
                    payout,
                }
            }
            Err(err) => {
                if err.is_fatal() {
                    state.halted = true;
                    error!(instance = %self.id, ticket = %ticket_id, error = %err, "Invariant violated; instance halted");
                } else {
                    warn!(instance = %self.id, ticket = %ticket_id, error = %err, "Offer rejected");
                }
                let payout = match state.ledger.exit(seat) {
                    Ok(refund) => refund,
                    Err(exit_err) => {
                        state.halted = true;
                        error!(instance = %self.id, %seat, error = %exit_err, "Refund failed; instance halted");
                        Allocation::new()
                    }
                };
                UserSeat {
                    ticket_id,
                    seat_id: Some(seat),
                    result: Err(err),
                    payout,
                }
            }
        }
    }

    /// Host-side checks that run before any seat exists.
    fn admit(
        &self,
        state: &mut ContractState,
        ticket: &TradeTicket,
        proposal: &Proposal,
        payments: &Allocation,
    ) -> Result<()> {
        if ticket.instance() != self.id {
            return Err(MintswapError::ForeignTicket {
                ticket: ticket.id(),
                issuer: ticket.instance(),
                instance: self.id,
            });
        }
        state.tickets.consume(ticket.id())?;
        if state.halted {
            return Err(MintswapError::InstanceHalted(self.id));
        }
        ticket.shape().check(proposal)?;
        check_payments(&proposal.give, payments)
    }

    /// Handler run, receipt, commit. Nothing fallible runs after the
    /// commit, so a committed trade always settles.
    fn settle(
        &self,
        state: &mut ContractState,
        ticket_id: TicketId,
        seat: SeatId,
    ) -> Result<(SettlementReceipt, Allocation)> {
        let sequence = state.settled + 1;
        let handler = TradeHandler::new(&self.terms, &self.mint, &self.proceeds);
        let mut txn = state.ledger.transaction();
        let settled = handler.handle(&mut txn, seat)?;
        let receipt = self.signer.issue(
            self.id,
            sequence,
            ticket_id,
            seat,
            settled.paid,
            settled.minted,
            settled.total_items,
        );
        txn.commit()?;

        state.settled = sequence;
        Ok((receipt, settled.payout))
    }

    /// Everything collected by the proceeds escrow.
    pub fn proceeds(&self) -> Result<Amount> {
        self.proceeds.balance(&self.state.lock().ledger)
    }

    /// Outstanding item supply: every unit ever minted, by kind.
    #[must_use]
    pub fn item_supply(&self) -> ItemBag {
        self.mint.total_supply(&self.state.lock().ledger)
    }

    #[must_use]
    pub fn outstanding_tickets(&self) -> usize {
        self.state.lock().tickets.outstanding()
    }

    #[must_use]
    pub fn settled_count(&self) -> u64 {
        self.state.lock().settled
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.state.lock().halted
    }

    /// Seats currently held in the ledger. Settled and refunded seats
    /// leave it, so between redemptions this is just the proceeds seat.
    #[must_use]
    pub fn open_seats(&self) -> usize {
        self.state.lock().ledger.seat_count()
    }

    /// Key that verifies this instance's settlement receipts.
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signer.verifying_key()
    }

    /// Full conservation check over every seat.
    pub fn verify_supply(&self) -> Result<()> {
        self.state.lock().ledger.verify_supply()
    }

    #[cfg(test)]
    fn halt_for_test(&self) {
        self.state.lock().halted = true;
    }
}

/// Payments must match `give` keyword for keyword.
fn check_payments(give: &Allocation, payments: &Allocation) -> Result<()> {
    let give_keys: Vec<_> = give.keywords().collect();
    let paid_keys: Vec<_> = payments.keywords().collect();
    if give_keys != paid_keys {
        return Err(MintswapError::PaymentMismatch {
            reason: format!("payments cover {paid_keys:?}, proposal gives {give_keys:?}"),
        });
    }
    for (keyword, promised) in give.iter() {
        let paid = payments.get(keyword);
        if paid != Some(promised) {
            return Err(MintswapError::PaymentMismatch {
                reason: format!(
                    "{keyword}: proposal gives {promised}, payment is {}",
                    paid.map_or_else(|| "missing".to_string(), ToString::to_string)
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mintswap_types::Brand;
    use mintswap_types::fixtures::{credits, items, items_brand};

    fn start() -> SwapInstance {
        let config = InstanceConfig::new(Terms::new(credits(100), items_brand()));
        SwapInstance::start(&config).unwrap()
    }

    fn offer(price: i64, want: &[(&str, u64)]) -> (Proposal, Allocation) {
        let proposal = Proposal::trade(credits(price), items(want));
        let payments = proposal.give.clone();
        (proposal, payments)
    }

    #[test]
    fn start_rejects_bad_terms() {
        let config = InstanceConfig::new(Terms::new(credits(100), Brand::fungible("Items")));
        assert!(matches!(
            SwapInstance::start(&config),
            Err(MintswapError::Configuration(_))
        ));
    }

    #[test]
    fn settled_redemption_reports_trade_complete() {
        let instance = start();
        let ticket = instance.public_facet().make_trade_invitation();
        let (proposal, payments) = offer(100, &[("sword", 1)]);
        let seat = instance.redeem(ticket, proposal, payments);
        assert_eq!(seat.outcome(), Ok("trade complete"));
        assert_eq!(seat.phase(), OfferPhase::Settled);
        assert!(seat.seat_id().is_some());
        assert_eq!(instance.open_seats(), 1);
        assert_eq!(instance.settled_count(), 1);
        assert_eq!(seat.receipt().unwrap().sequence, 1);
    }

    #[test]
    fn payments_must_match_give() {
        let instance = start();
        let ticket = instance.public_facet().make_trade_invitation();
        let (proposal, _) = offer(100, &[("sword", 1)]);
        let short = Allocation::new().with("Price", credits(60));
        let seat = instance.redeem(ticket, proposal, short);
        assert!(matches!(
            seat.error(),
            Some(MintswapError::PaymentMismatch { .. })
        ));
        assert_eq!(seat.phase(), OfferPhase::Proposed);
        assert_eq!(seat.payout().get("Price"), Some(&credits(60)));
        assert!(instance.proceeds().unwrap().is_empty());
    }

    #[test]
    fn halted_instance_refuses_redemptions() {
        let instance = start();
        instance.halt_for_test();
        let ticket = instance.public_facet().make_trade_invitation();
        let (proposal, payments) = offer(100, &[("sword", 1)]);
        let seat = instance.redeem(ticket, proposal, payments);
        assert!(matches!(seat.error(), Some(MintswapError::InstanceHalted(_))));
        assert_eq!(seat.payout().get("Price"), Some(&credits(100)));
        assert!(instance.item_supply().is_empty());
        assert_eq!(instance.outstanding_tickets(), 0);
    }

    #[test]
    fn check_payments_detects_extra_keyword() {
        let give = Allocation::new().with("Price", credits(100));
        let payments = give.clone().with("Tip", credits(1));
        assert!(check_payments(&give, &payments).is_err());
        assert!(check_payments(&give, &give).is_ok());
    }

    #[test]
    fn debug_summarises_state() {
        let instance = start();
        let dbg = format!("{instance:?}");
        assert!(dbg.contains("SwapInstance"));
        assert!(dbg.contains("settled"));
    }

    #[test]
    fn fungible_valued_items_never_reach_the_handler() {
        let instance = start();
        let ticket = instance.public_facet().make_trade_invitation();
        let (mut proposal, payments) = offer(100, &[("sword", 1)]);
        proposal.want.set(
            constants::KEYWORD_ITEMS,
            Amount {
                brand: items_brand(),
                value: credits(5).value,
            },
        );
        let seat = instance.redeem(ticket, proposal, payments);
        assert!(matches!(seat.error(), Some(MintswapError::ShapeMismatch { .. })));
        assert!(seat.seat_id().is_none());
        assert_eq!(seat.phase(), OfferPhase::Proposed);
        assert_eq!(instance.open_seats(), 1);
    }

    #[test]
    fn only_cap_violations_are_rejected() {
        let seat = |error: MintswapError| UserSeat {
            ticket_id: TicketId::new(),
            seat_id: Some(SeatId::new()),
            result: Err(error),
            payout: Allocation::new(),
        };
        let capped = seat(MintswapError::CapExceeded {
            requested: 4,
            max_items: 3,
        });
        assert_eq!(capped.phase(), OfferPhase::Rejected);
        let broken = seat(MintswapError::MintMismatch {
            reason: "x".into(),
        });
        assert_eq!(broken.phase(), OfferPhase::Aborted);
    }

    #[test]
    fn failed_redemptions_do_not_consume_a_sequence() {
        let instance = start();
        let facet = instance.public_facet();
        let (proposal, payments) = offer(100, &[("sword", 4)]);
        let rejected = instance.redeem(facet.make_trade_invitation(), proposal, payments);
        assert!(rejected.receipt().is_none());

        let (proposal, payments) = offer(100, &[("sword", 1)]);
        let settled = instance.redeem(facet.make_trade_invitation(), proposal, payments);
        let receipt = settled.receipt().unwrap();
        assert_eq!(receipt.sequence, 1);
        assert!(receipt.verify(&instance.verifying_key()));
        assert_eq!(instance.settled_count(), 1);
    }
}
