//! Roll lifecycle tests
//!
//! Scan transitions against the in-memory roll store:
//! - forward-only status movement
//! - replay rejection for release and ship-out
//! - the two-scan relocation handshake

mod common;

use std::sync::Arc;

use proptest::prelude::*;

use common::{session, MemoryRollRepository};
use fabric_warehouse_backend::error::AppError;
use fabric_warehouse_backend::services::lifecycle::RelocateOutcome;
use fabric_warehouse_backend::services::{LifecycleService, SessionStore};
use shared::{PositionCode, RollStatus};

fn service(repo: &Arc<MemoryRollRepository>) -> LifecycleService {
    LifecycleService::new(repo.clone())
}

// ============================================================================
// Release / Ship Out
// ============================================================================

#[tokio::test]
async fn test_release_then_replay_is_rejected() {
    let repo = MemoryRollRepository::new();
    repo.seed("R100", RollStatus::Received, "F1", "10.00");
    let lifecycle = service(&repo);
    let operator = session("F1");

    let receipt = lifecycle.release(&operator, "R100").await.unwrap();
    assert_eq!(receipt.roll.status, RollStatus::Released);
    assert_eq!(receipt.roll.position_label(), "");
    assert!(receipt.roll.released_at.is_some());

    let replay = lifecycle.release(&operator, "R100").await;
    assert!(matches!(replay, Err(AppError::InvalidCode(ref id)) if id == "R100"));

    let stored = repo.get("R100").unwrap();
    assert_eq!(stored.status, RollStatus::Released);
    assert_eq!(stored.released_at, receipt.roll.released_at);
}

#[tokio::test]
async fn test_release_clears_position() {
    let repo = MemoryRollRepository::new();
    repo.seed("100", RollStatus::Received, "F1", "10.00");
    let lifecycle = service(&repo);
    let sessions = SessionStore::new();
    let operator = session("F1");
    let id = sessions.open(operator.clone()).await;

    lifecycle.relocate(&sessions, id, &operator, "B07").await.unwrap();
    lifecycle.relocate(&sessions, id, &operator, "100").await.unwrap();
    assert_eq!(repo.get("100").unwrap().position_label(), "B07");

    lifecycle.release(&operator, "100").await.unwrap();
    assert_eq!(repo.get("100").unwrap().position_label(), "");
}

#[tokio::test]
async fn test_ship_out_from_released_and_replay() {
    let repo = MemoryRollRepository::new();
    repo.seed("200", RollStatus::Released, "F1", "10.00");
    let lifecycle = service(&repo);
    let operator = session("F1");

    let receipt = lifecycle.ship_out(&operator, " 200 ").await.unwrap();
    assert_eq!(receipt.roll.status, RollStatus::ShippedOut);
    assert!(receipt.roll.shipped_out_at.is_some());

    assert!(matches!(
        lifecycle.ship_out(&operator, "200").await,
        Err(AppError::InvalidCode(_))
    ));
    assert!(matches!(
        lifecycle.release(&operator, "200").await,
        Err(AppError::InvalidCode(_))
    ));
}

#[tokio::test]
async fn test_unknown_roll_is_invalid_code() {
    let repo = MemoryRollRepository::new();
    let lifecycle = service(&repo);

    assert!(matches!(
        lifecycle.release(&session("F1"), "999").await,
        Err(AppError::InvalidCode(_))
    ));
}

#[tokio::test]
async fn test_rolls_of_another_warehouse_are_invalid() {
    let repo = MemoryRollRepository::new();
    repo.seed("300", RollStatus::Received, "F2", "10.00");
    let lifecycle = service(&repo);

    assert!(matches!(
        lifecycle.release(&session("F1"), "300").await,
        Err(AppError::InvalidCode(_))
    ));
    assert_eq!(repo.get("300").unwrap().status, RollStatus::Received);
}

#[tokio::test]
async fn test_empty_scan_is_rejected() {
    let repo = MemoryRollRepository::new();
    let lifecycle = service(&repo);

    assert!(matches!(
        lifecycle.release(&session("F1"), "   ").await,
        Err(AppError::Validation { .. })
    ));
}

#[tokio::test]
async fn test_concurrent_release_has_one_winner() {
    let repo = MemoryRollRepository::new();
    repo.seed("400", RollStatus::Received, "F1", "10.00");
    let operator = session("F1");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let lifecycle = service(&repo);
            let operator = operator.clone();
            tokio::spawn(async move { lifecycle.release(&operator, "400").await.is_ok() })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

// ============================================================================
// Relocate
// ============================================================================

#[tokio::test]
async fn test_relocate_requires_pending_position() {
    let repo = MemoryRollRepository::new();
    repo.seed("100", RollStatus::Received, "F1", "10.00");
    let lifecycle = service(&repo);
    let sessions = SessionStore::new();
    let operator = session("F1");
    let id = sessions.open(operator.clone()).await;

    let result = lifecycle.relocate(&sessions, id, &operator, "100").await;
    assert!(matches!(result, Err(AppError::PositionRequired)));
    assert_eq!(repo.get("100").unwrap().position, None);
}

#[tokio::test]
async fn test_position_then_roll_sets_position_and_keeps_status() {
    let repo = MemoryRollRepository::new();
    repo.seed("100", RollStatus::Released, "F1", "10.00");
    let lifecycle = service(&repo);
    let sessions = SessionStore::new();
    let operator = session("F1");
    let id = sessions.open(operator.clone()).await;

    let first = lifecycle.relocate(&sessions, id, &operator, "A12").await.unwrap();
    assert!(matches!(
        first,
        RelocateOutcome::PositionSet { ref position } if position.as_str() == "A12"
    ));

    let second = lifecycle.relocate(&sessions, id, &operator, "100").await.unwrap();
    match second {
        RelocateOutcome::Relocated(receipt) => {
            assert_eq!(receipt.roll.position_label(), "A12");
            assert_eq!(receipt.roll.status, RollStatus::Released);
        }
        other => panic!("expected relocation, got {:?}", other),
    }
}

#[tokio::test]
async fn test_pending_position_persists_until_replaced() {
    let repo = MemoryRollRepository::new();
    repo.seed("1", RollStatus::Received, "F1", "10.00");
    repo.seed("2", RollStatus::Received, "F1", "10.00");
    repo.seed("3", RollStatus::Received, "F1", "10.00");
    let lifecycle = service(&repo);
    let sessions = SessionStore::new();
    let operator = session("F1");
    let id = sessions.open(operator.clone()).await;

    lifecycle.relocate(&sessions, id, &operator, "A12").await.unwrap();
    lifecycle.relocate(&sessions, id, &operator, "1").await.unwrap();
    lifecycle.relocate(&sessions, id, &operator, "2").await.unwrap();
    lifecycle.relocate(&sessions, id, &operator, "J03").await.unwrap();
    lifecycle.relocate(&sessions, id, &operator, "3").await.unwrap();

    assert_eq!(repo.get("1").unwrap().position_label(), "A12");
    assert_eq!(repo.get("2").unwrap().position_label(), "A12");
    assert_eq!(repo.get("3").unwrap().position_label(), "J03");
    assert_eq!(sessions.pending_position(id).await, Some(PositionCode::new("J03")));
}

#[tokio::test]
async fn test_overlong_position_is_rejected_and_keeps_pending() {
    let repo = MemoryRollRepository::new();
    repo.seed("3", RollStatus::Received, "F1", "10.00");
    let lifecycle = service(&repo);
    let sessions = SessionStore::new();
    let operator = session("F1");
    let id = sessions.open(operator.clone()).await;

    lifecycle.relocate(&sessions, id, &operator, "A12").await.unwrap();
    let result = lifecycle
        .relocate(&sessions, id, &operator, "ABCDEFGHIJKLMNOPQRSTUVWXY")
        .await;
    assert!(matches!(result, Err(AppError::Validation { ref field, .. }) if field == "code"));
    assert_eq!(sessions.pending_position(id).await, Some(PositionCode::new("A12")));

    lifecycle.relocate(&sessions, id, &operator, "3").await.unwrap();
    assert_eq!(repo.get("3").unwrap().position_label(), "A12");
}

#[tokio::test]
async fn test_relocate_shipped_roll_is_rejected() {
    let repo = MemoryRollRepository::new();
    repo.seed("500", RollStatus::ShippedOut, "F1", "10.00");
    let lifecycle = service(&repo);
    let sessions = SessionStore::new();
    let operator = session("F1");
    let id = sessions.open(operator.clone()).await;

    lifecycle.relocate(&sessions, id, &operator, "A12").await.unwrap();
    assert!(matches!(
        lifecycle.relocate(&sessions, id, &operator, "500").await,
        Err(AppError::InvalidCode(_))
    ));
}

#[tokio::test]
async fn test_position_scan_after_logout_is_unauthorized() {
    let repo = MemoryRollRepository::new();
    let lifecycle = service(&repo);
    let sessions = SessionStore::new();
    let operator = session("F1");
    let id = sessions.open(operator.clone()).await;
    sessions.close(id).await;

    assert!(matches!(
        lifecycle.relocate(&sessions, id, &operator, "A12").await,
        Err(AppError::Unauthorized { .. })
    ));
}

// ============================================================================
// Property Tests
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Scan {
    Release,
    ShipOut,
    Position,
    Relocate,
}

fn scan_strategy() -> impl Strategy<Value = Scan> {
    prop_oneof![
        Just(Scan::Release),
        Just(Scan::ShipOut),
        Just(Scan::Position),
        Just(Scan::Relocate),
    ]
}

fn status_strategy() -> impl Strategy<Value = RollStatus> {
    prop_oneof![
        Just(RollStatus::Received),
        Just(RollStatus::Released),
        Just(RollStatus::ShippedOut),
    ]
}

proptest! {
    /// Any scan sequence only moves a roll forward, and rejected scans leave it unchanged
    #[test]
    fn prop_status_only_moves_forward(
        start in status_strategy(),
        scans in prop::collection::vec(scan_strategy(), 1..20),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let repo = MemoryRollRepository::new();
            repo.seed("100", start, "F1", "10.00");
            let lifecycle = service(&repo);
            let sessions = SessionStore::new();
            let operator = session("F1");
            let id = sessions.open(operator.clone()).await;

            for scan in scans {
                let before = repo.get("100").unwrap();
                let accepted = match scan {
                    Scan::Release => lifecycle.release(&operator, "100").await.is_ok(),
                    Scan::ShipOut => lifecycle.ship_out(&operator, "100").await.is_ok(),
                    Scan::Position => {
                        lifecycle.relocate(&sessions, id, &operator, "C01").await.unwrap();
                        continue;
                    }
                    Scan::Relocate => lifecycle.relocate(&sessions, id, &operator, "100").await.is_ok(),
                };
                let after = repo.get("100").unwrap();

                prop_assert!(after.status.rank() >= before.status.rank());
                if !accepted {
                    prop_assert_eq!(&after, &before);
                }
                if accepted && after.status != before.status {
                    prop_assert_eq!(after.position_label(), "");
                }
            }
            Ok(())
        })?;
    }
}
