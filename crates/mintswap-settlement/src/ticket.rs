//! # Trade tickets: single-use bearer capabilities
//!
//! A [`TradeTicket`] is neither `Clone` nor `Copy`: holding one is the right
//! to redeem it, handing it over moves that right, and redeeming it consumes
//! it. The [`TicketRegistry`] backs this with a table of outstanding ticket
//! IDs: consuming removes the entry, so a ticket ID can never settle twice
//! even if the value were somehow duplicated, and spent tickets cost nothing.
//!
//! ```text
//!   ┌────────┐   redeem (any outcome)   ┌───────┐
//!   │ ISSUED ├─────────────────────────▶│ SPENT │ (dropped from the table)
//!   └────────┘                          └───────┘
//! ```

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use mintswap_types::{InstanceId, MintswapError, ProposalShape, Result, TicketId, constants};

/// Single-use invitation to trade with one contract instance.
#[derive(Debug)]
pub struct TradeTicket {
    id: TicketId,
    instance: InstanceId,
    shape: ProposalShape,
    issued_at: DateTime<Utc>,
}

impl TradeTicket {
    #[must_use]
    pub fn id(&self) -> TicketId {
        self.id
    }

    /// The instance whose offer handler this ticket triggers.
    #[must_use]
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        constants::TRADE_INVITATION_DESCRIPTION
    }

    /// The proposal shape a redemption must satisfy.
    #[must_use]
    pub fn shape(&self) -> &ProposalShape {
        &self.shape
    }

    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

/// Factory and single-use table for one instance's tickets.
///
/// There is no limit on outstanding tickets; each is independent.
#[derive(Debug)]
pub struct TicketRegistry {
    instance: InstanceId,
    outstanding: HashSet<TicketId>,
    spent: u64,
}

impl TicketRegistry {
    #[must_use]
    pub fn new(instance: InstanceId) -> Self {
        Self {
            instance,
            outstanding: HashSet::new(),
            spent: 0,
        }
    }

    /// Mint a fresh ticket bound to `shape`.
    pub fn issue(&mut self, shape: ProposalShape) -> TradeTicket {
        let ticket = TradeTicket {
            id: TicketId::new(),
            instance: self.instance,
            shape,
            issued_at: Utc::now(),
        };
        self.outstanding.insert(ticket.id);
        ticket
    }

    /// Spend a ticket, removing it from the table. Fails if it was never
    /// issued here or is already spent.
    pub fn consume(&mut self, id: TicketId) -> Result<()> {
        if !self.outstanding.remove(&id) {
            return Err(MintswapError::TicketNotOutstanding(id));
        }
        self.spent += 1;
        Ok(())
    }

    #[must_use]
    pub fn is_outstanding(&self, id: TicketId) -> bool {
        self.outstanding.contains(&id)
    }

    /// Tickets issued but not yet redeemed.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// Tickets redeemed so far, whatever the outcome.
    #[must_use]
    pub fn spent_count(&self) -> u64 {
        self.spent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mintswap_types::Terms;
    use mintswap_types::fixtures::{credits, items_brand};

    fn shape() -> ProposalShape {
        ProposalShape::for_trade(&Terms::new(credits(100), items_brand()))
    }

    #[test]
    fn issue_records_ticket() {
        let instance = InstanceId::new();
        let mut reg = TicketRegistry::new(instance);
        let ticket = reg.issue(shape());
        assert_eq!(ticket.instance(), instance);
        assert_eq!(ticket.description(), "trade");
        assert!(reg.is_outstanding(ticket.id()));
        assert_eq!(reg.outstanding(), 1);
    }

    #[test]
    fn tickets_are_independent() {
        let mut reg = TicketRegistry::new(InstanceId::new());
        let a = reg.issue(shape());
        let b = reg.issue(shape());
        assert_ne!(a.id(), b.id());
        reg.consume(a.id()).unwrap();
        assert!(!reg.is_outstanding(a.id()));
        assert!(reg.is_outstanding(b.id()));
        assert_eq!(reg.outstanding(), 1);
        assert_eq!(reg.spent_count(), 1);
    }

    #[test]
    fn double_consume_blocked() {
        let mut reg = TicketRegistry::new(InstanceId::new());
        let ticket = reg.issue(shape());
        reg.consume(ticket.id()).unwrap();
        let err = reg.consume(ticket.id()).unwrap_err();
        assert!(
            matches!(err, MintswapError::TicketNotOutstanding(id) if id == ticket.id()),
            "Expected TicketNotOutstanding, got: {err:?}"
        );
        assert_eq!(reg.spent_count(), 1);
    }

    #[test]
    fn unknown_ticket_rejected() {
        let mut reg = TicketRegistry::new(InstanceId::new());
        let err = reg.consume(TicketId::new()).unwrap_err();
        assert!(matches!(err, MintswapError::TicketNotOutstanding(_)));
        assert_eq!(reg.spent_count(), 0);
    }

    #[test]
    fn spent_tickets_leave_the_table() {
        let mut reg = TicketRegistry::new(InstanceId::new());
        for _ in 0..500 {
            let ticket = reg.issue(shape());
            reg.consume(ticket.id()).unwrap();
        }
        assert_eq!(reg.outstanding(), 0);
        assert_eq!(reg.spent_count(), 500);
    }
}
