//! Property-based tests for the handshake state machine and read models
//!
//! These tests drive the engine with arbitrary action sequences and check
//! the invariants that must hold regardless of ordering: a single record per
//! pair, coherent status fields, a write-once audit trail, and read models
//! that are deterministic functions of the records.

use bid_handshake::{
    actor::StaticGateway,
    engine::HandshakeService,
    notify::LogNotifier,
    record::{BidderStatus, HandshakeRecord, HandshakeStatus, TimeStamp},
    store::RecordStore,
    view,
};
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
enum Action {
    Offer,
    Revoke,
    CdoAccept,
    CdoDecline,
    BidderAccept,
    BidderDecline,
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::Offer),
        Just(Action::Revoke),
        Just(Action::CdoAccept),
        Just(Action::CdoDecline),
        Just(Action::BidderAccept),
        Just(Action::BidderDecline),
    ]
}

/// Reference model: the status of the single (position, bidder) record,
/// `None` while the record is absent.
fn model_step(model: Option<HandshakeStatus>, action: Action) -> Option<HandshakeStatus> {
    let live = model.map(|status| status.is_live()).unwrap_or(false);
    match action {
        Action::Offer if !live => Some(HandshakeStatus::Offered),
        Action::Revoke if live => Some(HandshakeStatus::Revoked),
        Action::CdoAccept | Action::BidderAccept if live => Some(HandshakeStatus::Accepted),
        Action::CdoDecline | Action::BidderDecline if live => Some(HandshakeStatus::Declined),
        // rejected transitions leave the state untouched
        _ => model,
    }
}

fn new_service() -> (tempfile::TempDir, HandshakeService<StaticGateway, LogNotifier>) {
    let temp_dir = tempfile::tempdir().unwrap();
    let db = sled::open(temp_dir.path().join("property.db")).unwrap();
    let service = HandshakeService::new(
        RecordStore::new(Arc::new(db)),
        StaticGateway::allow_all(),
        LogNotifier,
    );
    (temp_dir, service)
}

/// Strategy for a standalone record in an arbitrary reachable state
fn record_strategy() -> impl Strategy<Value = HandshakeRecord> {
    (0u8..4, 0u8..3, any::<bool>(), 0u32..1000).prop_map(|(status, bidder_status, cdo, n)| {
        let mut record = HandshakeRecord::offered("cp100", &format!("bidder{n}"), "bureau1");
        record.status = match status {
            0 => HandshakeStatus::Offered,
            1 => HandshakeStatus::Accepted,
            2 => HandshakeStatus::Declined,
            _ => HandshakeStatus::Revoked,
        };
        record.bidder_status = match bidder_status {
            0 => BidderStatus::None,
            1 => BidderStatus::Accepted,
            _ => BidderStatus::Declined,
        };
        record.is_cdo_update = cdo;
        record.update_date = TimeStamp::new_with(2024, 1, 1 + (n % 28), 0, 0, 0);
        record
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: the engine tracks the reference state machine exactly, and
    /// a pair never accumulates more than one record.
    #[test]
    fn engine_matches_reference_model(
        actions in prop::collection::vec(action_strategy(), 1..24)
    ) {
        let (_guard, service) = new_service();
        let mut model: Option<HandshakeStatus> = None;

        for &action in &actions {
            let expect_ok = model_step(model, action) != model
                || matches!(
                    (action, model),
                    (Action::CdoAccept | Action::BidderAccept, Some(HandshakeStatus::Accepted))
                        | (Action::CdoDecline | Action::BidderDecline, Some(HandshakeStatus::Declined))
                );
            let result = match action {
                Action::Offer => service.bureau_offer("cp100", "bidder1", "bureau1"),
                Action::Revoke => service.bureau_revoke("cp100", "bidder1", "bureau1"),
                Action::CdoAccept => service.cdo_accept("cp100", "bidder1", "cdo1"),
                Action::CdoDecline => service.cdo_decline("cp100", "bidder1", "cdo1"),
                Action::BidderAccept => service.bidder_accept("cp100", "bidder1"),
                Action::BidderDecline => service.bidder_decline("cp100", "bidder1"),
            };

            prop_assert_eq!(
                result.is_ok(),
                expect_ok,
                "action {:?} against model {:?} gave {:?}",
                action,
                model,
                result
            );
            model = model_step(model, action);

            if let Ok(record) = result {
                prop_assert_eq!(Some(record.status), model);
            }
        }

        // never more than one record for the pair
        let records = service.store().list_by_position("cp100").unwrap();
        prop_assert!(records.len() <= 1);
        prop_assert_eq!(records.first().map(|record| record.status), model);
    }

    /// Property: status and bidder_status stay coherent, and audit
    /// timestamps are never cleared once set.
    #[test]
    fn audit_trail_is_write_once(
        actions in prop::collection::vec(action_strategy(), 1..24)
    ) {
        let (_guard, service) = new_service();

        let mut seen_offered = false;
        let mut seen_accepted = false;
        let mut seen_declined = false;
        let mut seen_revoked = false;

        for &action in &actions {
            let result = match action {
                Action::Offer => service.bureau_offer("cp100", "bidder1", "bureau1"),
                Action::Revoke => service.bureau_revoke("cp100", "bidder1", "bureau1"),
                Action::CdoAccept => service.cdo_accept("cp100", "bidder1", "cdo1"),
                Action::CdoDecline => service.cdo_decline("cp100", "bidder1", "cdo1"),
                Action::BidderAccept => service.bidder_accept("cp100", "bidder1"),
                Action::BidderDecline => service.bidder_decline("cp100", "bidder1"),
            };
            let Ok(record) = result else { continue };

            seen_offered |= record.date_offered.is_some();
            seen_accepted |= record.date_accepted.is_some();
            seen_declined |= record.date_declined.is_some();
            seen_revoked |= record.date_revoked.is_some();

            // once set, a date never goes away
            prop_assert_eq!(record.date_offered.is_some(), seen_offered);
            prop_assert_eq!(record.date_accepted.is_some(), seen_accepted);
            prop_assert_eq!(record.date_declined.is_some(), seen_declined);
            prop_assert_eq!(record.date_revoked.is_some(), seen_revoked);

            // bidder_status tracks the authoritative state on decision paths
            match record.status {
                HandshakeStatus::Accepted => {
                    prop_assert_eq!(record.bidder_status, BidderStatus::Accepted)
                }
                HandshakeStatus::Declined => {
                    prop_assert_eq!(record.bidder_status, BidderStatus::Declined)
                }
                HandshakeStatus::Offered => {
                    prop_assert_eq!(record.bidder_status, BidderStatus::None)
                }
                HandshakeStatus::Revoked => {}
            }
        }
    }

    /// Property: the position view is a pure function of the records -
    /// recomputing it never changes the answer.
    #[test]
    fn position_view_is_deterministic(
        records in prop::collection::vec(record_strategy(), 0..6)
    ) {
        let first = view::position_handshake(&records);
        let second = view::position_handshake(&records);
        prop_assert_eq!(&first, &second);

        // active iff no live record
        let any_live = records.iter().any(|record| record.status.is_live());
        prop_assert_eq!(first.active, !any_live);

        // a holder exists only when some record is Offered or Accepted
        let any_holding = records.iter().any(|record| {
            record.status == HandshakeStatus::Offered
                || record.status == HandshakeStatus::Accepted
        });
        prop_assert_eq!(first.active_handshake_bidder.is_some(), any_holding);
    }

    /// Property: the bidder view collapses every live status to the offered
    /// label and reserves the revoked label for Revoked.
    #[test]
    fn bidder_view_labels_are_total(record in record_strategy()) {
        let state = view::bidder_handshake(&record);

        if record.status == HandshakeStatus::Revoked {
            prop_assert_eq!(state.hs_status_code, view::HS_REVOKED_CODE);
        } else {
            prop_assert_eq!(state.hs_status_code, view::HS_OFFERED_CODE);
        }

        prop_assert_eq!(state.hs_cdo_indicator, record.is_cdo_update);

        match record.bidder_status {
            BidderStatus::None => prop_assert_eq!(state.bidder_hs_code, None),
            BidderStatus::Accepted => {
                prop_assert_eq!(state.bidder_hs_code, Some(view::HS_ACCEPTED_CODE))
            }
            BidderStatus::Declined => {
                prop_assert_eq!(state.bidder_hs_code, Some(view::HS_DECLINED_CODE))
            }
        }
    }
}
