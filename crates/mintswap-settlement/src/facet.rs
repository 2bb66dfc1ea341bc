//! Public facet, the only externally reachable operation.

use crate::instance::SwapInstance;
use crate::ticket::TradeTicket;

/// What the outside world sees of an instance: a way to get a trade ticket.
#[derive(Debug, Clone, Copy)]
pub struct PublicFacet<'i> {
    instance: &'i SwapInstance,
}

impl<'i> PublicFacet<'i> {
    pub(crate) fn new(instance: &'i SwapInstance) -> Self {
        Self { instance }
    }

    /// Issue a new single-use trade ticket. Always succeeds.
    #[must_use]
    pub fn make_trade_invitation(&self) -> TradeTicket {
        self.instance.issue_ticket()
    }
}
