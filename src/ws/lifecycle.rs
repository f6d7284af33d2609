use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    CurrentUsersMessage, PositionReport, SendMessage, UserDisconnectedMessage, UserPosition, WelcomeMessage,
};
use super::connctx::ConnHandle;
use super::dispatcher::{broadcast_all, broadcast_others, send_to};
use super::registry::SessionRegistry;

// Treat unreachable recipients as disconnected.
fn drop_unreachable(registry: &SessionRegistry, failed: Vec<Uuid>) -> Vec<String> {
    failed
        .into_iter()
        .filter_map(|conn_id| registry.remove_by_conn(conn_id))
        .collect()
}

/// Announce the given departures, then push a fresh `current_users` snapshot to
/// everyone left. Sessions found stale or unreachable along the way are announced
/// too; every round removes at least one entry, so this terminates.
fn announce(registry: &SessionRegistry, mut departed: Vec<String>) {
    loop {
        let mut failed = Vec::new();
        for id in departed.drain(..) {
            info!("Announcing departure of {}", id);
            let event = SendMessage::UserDisconnected(UserDisconnectedMessage { id });
            failed.extend(broadcast_all(registry, &event));
        }

        let (users, swept) = registry.sweep_and_snapshot();
        departed.extend(swept);
        departed.extend(drop_unreachable(registry, failed));
        if !departed.is_empty() {
            continue;
        }

        let failed = broadcast_all(registry, &SendMessage::CurrentUsers(CurrentUsersMessage { users }));
        departed.extend(drop_unreachable(registry, failed));
        if departed.is_empty() {
            return;
        }
    }
}

/// A client opened a connection under the logical id `id`.
pub fn on_connect(registry: &SessionRegistry, id: &str, handle: ConnHandle) {
    let conn_id = handle.conn_id;
    if let Err(e) = send_to(&handle, &SendMessage::Welcome(WelcomeMessage { id: id.to_string() })) {
        warn!("Failed to greet connection {} of {}: {:?}", conn_id, id, e);
    }
    registry.register(id, handle);
    info!("Client {} connected on {} ({} session(s))", id, conn_id, registry.len());

    // The newcomer has no position yet, so it is absent from this snapshot but still receives it.
    announce(registry, Vec::new());
}

/// Bind a client that only talks plain HTTP. An existing session for `id`, such
/// as a live WebSocket, is left as is. A new session gets a detached handle and
/// is announced like any other connect.
pub fn attach_polling(registry: &SessionRegistry, id: &str) -> bool {
    if !registry.register_if_absent(id, ConnHandle::detached()) {
        return false;
    }
    info!("Polling client {} attached ({} session(s))", id, registry.len());
    announce(registry, Vec::new());
    true
}

/// Positioned users for a snapshot read. Sessions the read finds stale are
/// announced before it returns.
pub fn current_users(registry: &SessionRegistry) -> Vec<UserPosition> {
    loop {
        let (users, swept) = registry.sweep_and_snapshot();
        if swept.is_empty() {
            return users;
        }
        announce(registry, swept);
    }
}

/// Apply a position report for `id` and forward it to every other client.
/// Reports without both coordinates, or for unknown ids, are ignored.
pub fn apply_position(registry: &SessionRegistry, id: &str, report: &PositionReport) -> bool {
    let Some((x, y)) = report.coordinates() else {
        debug!("Ignoring position report without coordinates from {}", id);
        return false;
    };
    if !registry.touch(id, x, y) {
        return false;
    }

    let event = SendMessage::UserPositionUpdate(UserPosition { id: id.to_string(), x, y });
    let failed = broadcast_others(registry, &event, id);
    let departed = drop_unreachable(registry, failed);
    if !departed.is_empty() {
        announce(registry, departed);
    }
    true
}

/// Position report arriving on connection `conn_id`.
pub fn on_position(registry: &SessionRegistry, conn_id: Uuid, report: &PositionReport) -> bool {
    match registry.id_for_conn(conn_id) {
        Some(id) => apply_position(registry, &id, report),
        None => {
            debug!("Ignoring position from unbound connection {}", conn_id);
            false
        }
    }
}

/// Connection `conn_id` closed. Removal is keyed on the connection so a late close
/// from a superseded connection leaves the newer session alone.
pub fn on_disconnect(registry: &SessionRegistry, conn_id: Uuid) -> Option<String> {
    let id = registry.remove_by_conn(conn_id)?;
    info!("Client {} disconnected from {}", id, conn_id);
    announce(registry, vec![id.clone()]);
    Some(id)
}

/// Background staleness sweep. Returns how many sessions were dropped.
pub fn sweep_stale(registry: &SessionRegistry) -> usize {
    let swept = registry.sweep();
    let n = swept.len();
    if n > 0 {
        announce(registry, swept);
    }
    n
}

/// Sweep every `every` until the returned task is aborted.
pub fn spawn_sweeper(registry: Arc<SessionRegistry>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            sweep_stale(&registry);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tokio::sync::mpsc::Receiver;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn drain(rx: &mut Receiver<String>) -> Vec<Value> {
        let mut out = Vec::new();
        while let Ok(text) = rx.try_recv() {
            out.push(serde_json::from_str(&text).unwrap());
        }
        out
    }

    fn types(events: &[Value]) -> Vec<&str> {
        events.iter().map(|e| e["type"].as_str().unwrap()).collect()
    }

    fn connect(registry: &SessionRegistry, id: &str) -> (Uuid, Receiver<String>) {
        let (handle, rx) = ConnHandle::new(16);
        let conn_id = handle.conn_id;
        on_connect(registry, id, handle);
        (conn_id, rx)
    }

    fn report(x: f64, y: f64) -> PositionReport {
        PositionReport { x: Some(x), y: Some(y) }
    }

    #[test]
    fn connect_greets_and_broadcasts_snapshot_to_everyone() {
        let registry = SessionRegistry::new(TIMEOUT);
        let (_c1, mut r1) = connect(&registry, "u1");
        assert_eq!(types(&drain(&mut r1)), vec!["welcome", "current_users"]);

        let (_c2, mut r2) = connect(&registry, "u2");
        let events = drain(&mut r2);
        assert_eq!(types(&events), vec!["welcome", "current_users"]);
        assert_eq!(events[0]["id"], "u2");
        assert_eq!(events[1]["users"], serde_json::json!([]));
        assert_eq!(types(&drain(&mut r1)), vec!["current_users"]);
    }

    #[test]
    fn position_is_forwarded_to_others_only() {
        let registry = SessionRegistry::new(TIMEOUT);
        let (c1, mut r1) = connect(&registry, "u1");
        let (_c2, mut r2) = connect(&registry, "u2");
        drain(&mut r1);
        drain(&mut r2);

        assert!(on_position(&registry, c1, &report(0.0, 0.0)));

        assert!(drain(&mut r1).is_empty());
        let events = drain(&mut r2);
        assert_eq!(types(&events), vec!["user_position_update"]);
        assert_eq!(events[0]["id"], "u1");
    }

    #[test]
    fn incomplete_report_is_ignored() {
        let registry = SessionRegistry::new(TIMEOUT);
        let (c1, _r1) = connect(&registry, "u1");
        let (_c2, mut r2) = connect(&registry, "u2");
        drain(&mut r2);

        let partial = PositionReport { x: Some(1.0), y: None };
        assert!(!on_position(&registry, c1, &partial));
        assert!(drain(&mut r2).is_empty());
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn disconnect_announces_departure_then_snapshot() {
        let registry = SessionRegistry::new(TIMEOUT);
        let (c1, _r1) = connect(&registry, "u1");
        let (c2, mut r2) = connect(&registry, "u2");
        on_position(&registry, c2, &report(1.0, 1.0));
        drain(&mut r2);

        assert_eq!(on_disconnect(&registry, c1), Some("u1".to_string()));

        let events = drain(&mut r2);
        assert_eq!(types(&events), vec!["user_disconnected", "current_users"]);
        assert_eq!(events[0]["id"], "u1");
        assert_eq!(events[1]["users"][0]["id"], "u2");

        assert_eq!(on_disconnect(&registry, c1), None);
        assert!(drain(&mut r2).is_empty());
    }

    #[test]
    fn reconnect_survives_late_disconnect_of_old_connection() {
        let registry = SessionRegistry::new(TIMEOUT);
        let (old_conn, _old_rx) = connect(&registry, "u1");
        let (new_conn, _new_rx) = connect(&registry, "u1");

        assert_eq!(on_disconnect(&registry, old_conn), None);
        assert_eq!(registry.id_for_conn(new_conn), Some("u1".to_string()));
        assert!(!on_position(&registry, old_conn, &report(9.0, 9.0)));
        assert!(on_position(&registry, new_conn, &report(2.0, 2.0)));
    }

    #[test]
    fn unreachable_recipient_is_treated_as_disconnected() {
        let registry = SessionRegistry::new(TIMEOUT);
        let (c1, mut r1) = connect(&registry, "u1");
        let (_c2, r2) = connect(&registry, "u2");
        let (_c3, mut r3) = connect(&registry, "u3");
        drop(r2);
        drain(&mut r1);
        drain(&mut r3);

        on_position(&registry, c1, &report(4.0, 4.0));

        assert_eq!(registry.len(), 2);
        let events = drain(&mut r3);
        assert_eq!(types(&events), vec!["user_position_update", "user_disconnected", "current_users"]);
        assert_eq!(events[1]["id"], "u2");
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_announces_stale_sessions() {
        let registry = SessionRegistry::new(TIMEOUT);
        let (c1, _r1) = connect(&registry, "u1");
        on_position(&registry, c1, &report(1.0, 1.0));

        tokio::time::advance(Duration::from_secs(8)).await;
        let (c2, mut r2) = connect(&registry, "u2");
        on_position(&registry, c2, &report(2.0, 2.0));
        drain(&mut r2);

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(sweep_stale(&registry), 1);

        let events = drain(&mut r2);
        assert_eq!(types(&events), vec!["user_disconnected", "current_users"]);
        assert_eq!(events[0]["id"], "u1");
        assert_eq!(sweep_stale(&registry), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn background_sweeper_drops_idle_connections() {
        let registry = Arc::new(SessionRegistry::new(TIMEOUT));
        let (_conn, mut rx) = connect(&registry, "idle");
        drain(&mut rx);

        let sweeper = spawn_sweeper(registry.clone(), Duration::from_secs(1));
        tokio::time::sleep(TIMEOUT + Duration::from_secs(2)).await;

        assert_eq!(registry.len(), 0);
        assert_eq!(rx.recv().await, None);
        sweeper.abort();
    }

    #[test]
    fn connect_survives_smallest_configured_buffer() {
        let registry = SessionRegistry::new(TIMEOUT);
        let (handle, mut rx) = ConnHandle::new(1);
        on_connect(&registry, "u1", handle);

        assert_eq!(registry.len(), 1);
        assert_eq!(types(&drain(&mut rx)), vec!["welcome", "current_users"]);
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_read_announces_what_it_sweeps() {
        let registry = SessionRegistry::new(TIMEOUT);
        let (c1, _r1) = connect(&registry, "u1");
        on_position(&registry, c1, &report(1.0, 1.0));

        tokio::time::advance(Duration::from_secs(8)).await;
        let (c2, mut r2) = connect(&registry, "u2");
        on_position(&registry, c2, &report(2.0, 2.0));
        drain(&mut r2);

        tokio::time::advance(Duration::from_secs(3)).await;
        let users = current_users(&registry);

        assert_eq!(users, vec![UserPosition { id: "u2".into(), x: 2.0, y: 2.0 }]);
        let events = drain(&mut r2);
        assert_eq!(types(&events), vec!["user_disconnected", "current_users"]);
        assert_eq!(events[0]["id"], "u1");
        assert_eq!(sweep_stale(&registry), 0);
    }

    #[test]
    fn polling_client_is_announced_once() {
        let registry = SessionRegistry::new(TIMEOUT);
        let (_c1, mut r1) = connect(&registry, "ws");
        drain(&mut r1);

        assert!(attach_polling(&registry, "poller"));
        assert!(!attach_polling(&registry, "poller"));
        assert_eq!(types(&drain(&mut r1)), vec!["current_users"]);

        assert!(apply_position(&registry, "poller", &report(3.0, 4.0)));
        assert_eq!(types(&drain(&mut r1)), vec!["user_position_update"]);
        assert_eq!(registry.len(), 2);
    }
}
