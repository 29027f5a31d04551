//! Transition engine for the handshake lifecycle
use super::actor::{ActorGateway, Role};
use super::error::HandshakeError;
use super::notify::{HandshakeEvent, Notifier};
use super::record::{BidderStatus, HandshakeRecord, HandshakeStatus, TimeStamp};
use super::store::RecordStore;
use super::view::{self, BidderHandshake, PositionHandshake};

/// States from which a revoke or an accept/decline may fire.
const LIVE_STATES: [HandshakeStatus; 3] = [
    HandshakeStatus::Offered,
    HandshakeStatus::Accepted,
    HandshakeStatus::Declined,
];

/// The state machine over handshake records.
///
/// Every operation takes the acting identity explicitly, checks the required
/// capability through the gateway, applies the transition atomically through
/// the store, and emits exactly one event after the mutation commits.
pub struct HandshakeService<G, N> {
    store: RecordStore,
    gateway: G,
    notifier: N,
}

impl<G: ActorGateway, N: Notifier> HandshakeService<G, N> {
    pub fn new(store: RecordStore, gateway: G, notifier: N) -> Self {
        Self {
            store,
            gateway,
            notifier,
        }
    }

    fn check_bureau(&self, actor: &str, position: &str) -> Result<(), HandshakeError> {
        if self.gateway.has_role(actor, Role::Superuser) {
            return Ok(());
        }
        if self.gateway.has_bureau_capability(actor, position)
            && self.gateway.has_org_capability(actor, position)
        {
            return Ok(());
        }
        Err(HandshakeError::PermissionDenied {
            actor: actor.to_owned(),
            position: position.to_owned(),
        })
    }

    fn check_cdo(&self, actor: &str, position: &str) -> Result<(), HandshakeError> {
        if self.gateway.has_role(actor, Role::Superuser)
            || self.gateway.has_role(actor, Role::Cdo)
        {
            return Ok(());
        }
        Err(HandshakeError::PermissionDenied {
            actor: actor.to_owned(),
            position: position.to_owned(),
        })
    }

    /// Delivery failures are logged and swallowed; the transition has
    /// already committed.
    fn dispatch(&self, event: HandshakeEvent) {
        if let Err(err) = self.notifier.notify(&event) {
            tracing::warn!(?event, error = %err, "handshake notification failed");
        }
    }

    /// Offer the position to a bidder. Only valid while neither this pair
    /// nor any other bidder holds a live record on the position; a previous
    /// negotiation must be explicitly revoked before re-offering.
    pub fn bureau_offer(
        &self,
        position: &str,
        bidder: &str,
        actor: &str,
    ) -> Result<HandshakeRecord, HandshakeError> {
        self.check_bureau(actor, position)?;

        for record in self.store.list_by_position(position)? {
            if record.status.is_live() && record.bidder_id != bidder {
                return Err(HandshakeError::Conflict {
                    position: position.to_owned(),
                    holder: record.bidder_id,
                });
            }
        }

        let record = self.store.create(position, bidder, actor)?;
        tracing::info!(position, bidder, actor, "handshake offered");
        self.dispatch(HandshakeEvent::BureauOffered {
            position: position.to_owned(),
            bidder: bidder.to_owned(),
            new_status: record.status,
            actor: actor.to_owned(),
        });
        Ok(record)
    }

    /// Retire the negotiation. Valid from any live state; the record is
    /// kept, never deleted, and a later offer may restart it.
    pub fn bureau_revoke(
        &self,
        position: &str,
        bidder: &str,
        actor: &str,
    ) -> Result<HandshakeRecord, HandshakeError> {
        self.check_bureau(actor, position)?;

        let record = self.store.mutate(position, bidder, &LIVE_STATES, |record| {
            record.status = HandshakeStatus::Revoked;
            record.last_editing_user_id = actor.to_owned();
            record.date_revoked = Some(TimeStamp::new());
        })?;
        tracing::info!(position, bidder, actor, "handshake revoked");
        self.dispatch(HandshakeEvent::BureauRevoked {
            position: position.to_owned(),
            bidder: bidder.to_owned(),
            new_status: record.status,
            actor: actor.to_owned(),
        });
        Ok(record)
    }

    /// CDO accepts on the bidder's behalf.
    pub fn cdo_accept(
        &self,
        position: &str,
        bidder: &str,
        actor: &str,
    ) -> Result<HandshakeRecord, HandshakeError> {
        self.check_cdo(actor, position)?;
        let record = self.apply_decision(position, bidder, actor, BidderStatus::Accepted, true)?;
        self.dispatch(HandshakeEvent::CdoDecided {
            position: position.to_owned(),
            bidder: bidder.to_owned(),
            new_status: record.status,
            actor: actor.to_owned(),
        });
        Ok(record)
    }

    /// CDO declines on the bidder's behalf.
    pub fn cdo_decline(
        &self,
        position: &str,
        bidder: &str,
        actor: &str,
    ) -> Result<HandshakeRecord, HandshakeError> {
        self.check_cdo(actor, position)?;
        let record = self.apply_decision(position, bidder, actor, BidderStatus::Declined, true)?;
        self.dispatch(HandshakeEvent::CdoDecided {
            position: position.to_owned(),
            bidder: bidder.to_owned(),
            new_status: record.status,
            actor: actor.to_owned(),
        });
        Ok(record)
    }

    /// Bidder accepts their own offer. The acting identity is the bidder:
    /// the record is looked up at (position, actor), so acting on someone
    /// else's record is impossible by construction.
    pub fn bidder_accept(
        &self,
        position: &str,
        actor: &str,
    ) -> Result<HandshakeRecord, HandshakeError> {
        let record = self.apply_decision(position, actor, actor, BidderStatus::Accepted, false)?;
        self.dispatch(HandshakeEvent::BidderDecided {
            position: position.to_owned(),
            bidder: actor.to_owned(),
            new_status: record.status,
            actor: actor.to_owned(),
        });
        Ok(record)
    }

    /// Bidder declines their own offer.
    pub fn bidder_decline(
        &self,
        position: &str,
        actor: &str,
    ) -> Result<HandshakeRecord, HandshakeError> {
        let record = self.apply_decision(position, actor, actor, BidderStatus::Declined, false)?;
        self.dispatch(HandshakeEvent::BidderDecided {
            position: position.to_owned(),
            bidder: actor.to_owned(),
            new_status: record.status,
            actor: actor.to_owned(),
        });
        Ok(record)
    }

    /// Shared accept/decline leg. Fires only against a live record; Revoked
    /// and Absent both surface as NotFound. Audit timestamps are set when
    /// the transition fires and never cleared afterwards.
    fn apply_decision(
        &self,
        position: &str,
        bidder: &str,
        actor: &str,
        decision: BidderStatus,
        is_cdo: bool,
    ) -> Result<HandshakeRecord, HandshakeError> {
        let record = self.store.mutate(position, bidder, &LIVE_STATES, |record| {
            record.bidder_status = decision;
            record.is_cdo_update = is_cdo;
            match decision {
                BidderStatus::Accepted => {
                    record.status = HandshakeStatus::Accepted;
                    record.last_editing_bidder_id = Some(actor.to_owned());
                    record.date_accepted = Some(TimeStamp::new());
                }
                BidderStatus::Declined => {
                    record.status = HandshakeStatus::Declined;
                    record.date_declined = Some(TimeStamp::new());
                }
                BidderStatus::None => unreachable!("a decision is always Accepted or Declined"),
            }
        })?;
        tracing::info!(
            position,
            bidder,
            actor,
            is_cdo,
            status = ?record.status,
            "handshake decision recorded"
        );
        Ok(record)
    }

    /// Position-level read model, recomputed on demand.
    pub fn get_position_handshake_state(
        &self,
        position: &str,
    ) -> Result<PositionHandshake, HandshakeError> {
        let records = self.store.list_by_position(position)?;
        Ok(view::position_handshake(&records))
    }

    /// Bidder-facing read model for a single record.
    pub fn get_bidder_handshake_state(
        &self,
        position: &str,
        bidder: &str,
    ) -> Result<BidderHandshake, HandshakeError> {
        let record =
            self.store
                .get(position, bidder)?
                .ok_or_else(|| HandshakeError::NotFound {
                    position: position.to_owned(),
                    bidder: bidder.to_owned(),
                })?;
        Ok(view::bidder_handshake(&record))
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }
}
