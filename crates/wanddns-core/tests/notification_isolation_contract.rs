//! Contract Test: Notification Isolation
//!
//! Notifications are best effort. This test verifies that an endpoint which
//! rejects every message changes nothing about what the loop does.

mod common;

use common::*;
use std::sync::Arc;
use wanddns_core::{CycleOutcome, PollLoop};

const SCRIPT: &[Option<&str>] = &[
    Some("1.2.3.4"),
    None,
    Some("1.2.3.4"),
    Some("5.6.7.8"),
    Some("5.6.7.8"),
];

async fn run_script(notifier: RecordingNotifier) -> (Vec<CycleOutcome>, MockRecordClient, String) {
    let client = MockRecordClient::healthy();
    client.fail_next_update("first write rejected");

    let mut poll_loop = PollLoop::initialize(
        Box::new(ScriptedResolver::new(SCRIPT)),
        Box::new(client.clone()),
        Arc::new(notifier),
        record(),
        &engine_config(60),
    )
    .await
    .expect("initialization succeeds even when notifications fail");

    let mut outcomes = Vec::new();
    for _ in SCRIPT {
        outcomes.push(poll_loop.run_cycle().await);
    }

    let last = poll_loop.last_known_ip().to_string();
    (outcomes, client, last)
}

#[tokio::test]
async fn rejected_notifications_do_not_change_control_flow() {
    let accepting = RecordingNotifier::accepting();
    let rejecting = RecordingNotifier::rejecting();

    let (outcomes_ok, client_ok, last_ok) = run_script(accepting.clone()).await;
    let (outcomes_rejected, client_rejected, last_rejected) = run_script(rejecting.clone()).await;

    assert_eq!(outcomes_ok, outcomes_rejected);
    assert_eq!(client_ok.updated_ips(), client_rejected.updated_ips());
    assert_eq!(last_ok, last_rejected);
    assert_eq!(last_rejected, "5.6.7.8");

    // Both notifiers were asked to send the same messages
    assert_eq!(accepting.messages().len(), rejecting.messages().len());
}

#[tokio::test]
async fn rejected_notifications_still_attempt_every_message() {
    let rejecting = RecordingNotifier::rejecting();
    let (outcomes, client, _) = run_script(rejecting.clone()).await;

    // 1.2.3.4 fails, unresolved, 1.2.3.4 retried and applied, 5.6.7.8 applied, unchanged
    assert!(matches!(outcomes[0], CycleOutcome::UpdateFailed { .. }));
    assert!(matches!(outcomes[1], CycleOutcome::Unresolved { .. }));
    assert!(matches!(outcomes[2], CycleOutcome::Updated { .. }));
    assert!(matches!(outcomes[3], CycleOutcome::Updated { .. }));
    assert!(matches!(outcomes[4], CycleOutcome::Unchanged { .. }));
    assert_eq!(client.update_call_count(), 3);

    assert_eq!(rejecting.count_containing("Started"), 1);
    assert_eq!(rejecting.count_containing("first write rejected"), 1);
    assert_eq!(rejecting.count_containing("DNS Update Successful"), 2);
}
