//! Post-commit notification events
use super::record::HandshakeStatus;

/// Emitted exactly once after every successful transition. Delivery is
/// fire-and-forget: it happens after the mutation commits and a delivery
/// failure never rolls back the transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeEvent {
    BureauOffered {
        position: String,
        bidder: String,
        new_status: HandshakeStatus,
        actor: String,
    },
    BureauRevoked {
        position: String,
        bidder: String,
        new_status: HandshakeStatus,
        actor: String,
    },
    CdoDecided {
        position: String,
        bidder: String,
        new_status: HandshakeStatus,
        actor: String,
    },
    BidderDecided {
        position: String,
        bidder: String,
        new_status: HandshakeStatus,
        actor: String,
    },
}

pub trait Notifier: Send + Sync {
    fn notify(&self, event: &HandshakeEvent) -> anyhow::Result<()>;
}

/// Default sink that only logs the event.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: &HandshakeEvent) -> anyhow::Result<()> {
        tracing::info!(?event, "handshake event");
        Ok(())
    }
}
