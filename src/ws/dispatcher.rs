use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::models::SendMessage;
use super::connctx::{ConnHandle, DeliveryError};
use super::registry::SessionRegistry;

fn encode(event: &SendMessage) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(text) => Some(text),
        Err(e) => {
            error!("Failed to serialize event {:?}: {}", event, e);
            None
        }
    }
}

// Queue `text` on every recipient. A failing recipient never stops delivery to the
// rest; the conn ids that could not be reached are returned.
fn fan_out(recipients: Vec<ConnHandle>, text: &str) -> Vec<Uuid> {
    let mut failed = Vec::new();
    for recipient in recipients {
        if let Err(e) = recipient.try_deliver(text.to_string()) {
            warn!("Dropping delivery to connection {}: {:?}", recipient.conn_id, e);
            failed.push(recipient.conn_id);
        }
    }
    failed
}

/// Deliver `event` to every registered connection.
pub fn broadcast_all(registry: &SessionRegistry, event: &SendMessage) -> Vec<Uuid> {
    let Some(text) = encode(event) else {
        return Vec::new();
    };
    let recipients = registry.recipients(None);
    debug!("Broadcasting to {} connection(s): {}", recipients.len(), text);
    fan_out(recipients, &text)
}

/// Deliver `event` to every registered connection except the one owned by `exclude_id`.
pub fn broadcast_others(registry: &SessionRegistry, event: &SendMessage, exclude_id: &str) -> Vec<Uuid> {
    let Some(text) = encode(event) else {
        return Vec::new();
    };
    let recipients = registry.recipients(Some(exclude_id));
    debug!("Broadcasting to {} connection(s) except {}: {}", recipients.len(), exclude_id, text);
    fan_out(recipients, &text)
}

/// Deliver `event` to a single connection.
pub fn send_to(handle: &ConnHandle, event: &SendMessage) -> Result<(), DeliveryError> {
    match encode(event) {
        Some(text) => handle.try_deliver(text),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{UserDisconnectedMessage, UserPosition};
    use std::time::Duration;
    use tokio::sync::mpsc::Receiver;

    fn update() -> SendMessage {
        SendMessage::UserPositionUpdate(UserPosition { id: "a".into(), x: 0.0, y: 0.0 })
    }

    fn drain(rx: &mut Receiver<String>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(text) = rx.try_recv() {
            out.push(text);
        }
        out
    }

    #[test]
    fn broadcast_others_skips_the_excluded_session() {
        let registry = SessionRegistry::new(Duration::from_secs(10));
        let (a, mut ra) = ConnHandle::new(8);
        let (b, mut rb) = ConnHandle::new(8);
        let (c, mut rc) = ConnHandle::new(8);
        registry.register("a", a);
        registry.register("b", b);
        registry.register("c", c);

        let failed = broadcast_others(&registry, &update(), "a");

        assert!(failed.is_empty());
        assert_eq!(drain(&mut ra).len(), 0);
        assert_eq!(drain(&mut rb).len(), 1);
        assert_eq!(drain(&mut rc).len(), 1);
    }

    #[test]
    fn broadcast_all_includes_everyone() {
        let registry = SessionRegistry::new(Duration::from_secs(10));
        let (a, mut ra) = ConnHandle::new(8);
        let (b, mut rb) = ConnHandle::new(8);
        registry.register("a", a);
        registry.register("b", b);

        let event = SendMessage::UserDisconnected(UserDisconnectedMessage { id: "z".into() });
        broadcast_all(&registry, &event);

        let received = drain(&mut ra);
        assert_eq!(received, vec![r#"{"type":"user_disconnected","id":"z"}"#.to_string()]);
        assert_eq!(drain(&mut rb).len(), 1);
    }

    #[test]
    fn closed_recipient_does_not_abort_delivery() {
        let registry = SessionRegistry::new(Duration::from_secs(10));
        let (a, ra) = ConnHandle::new(8);
        let (b, mut rb) = ConnHandle::new(8);
        let (c, mut rc) = ConnHandle::new(8);
        let a_conn = a.conn_id;
        registry.register("a", a);
        registry.register("b", b);
        registry.register("c", c);
        drop(ra);

        let failed = broadcast_all(&registry, &update());

        assert_eq!(failed, vec![a_conn]);
        assert_eq!(drain(&mut rb).len(), 1);
        assert_eq!(drain(&mut rc).len(), 1);
    }

    #[test]
    fn full_queue_counts_as_failure() {
        let registry = SessionRegistry::new(Duration::from_secs(10));
        let (slow, _rslow) = ConnHandle::new(2);
        let slow_conn = slow.conn_id;
        registry.register("slow", slow);

        assert!(broadcast_all(&registry, &update()).is_empty());
        assert!(broadcast_all(&registry, &update()).is_empty());
        assert_eq!(broadcast_all(&registry, &update()), vec![slow_conn]);
    }

    #[test]
    fn send_to_reaches_exactly_one_connection() {
        let (a, mut ra) = ConnHandle::new(8);
        let (_b, mut rb) = ConnHandle::new(8);

        assert_eq!(send_to(&a, &update()), Ok(()));
        assert_eq!(drain(&mut ra).len(), 1);
        assert!(drain(&mut rb).is_empty());
    }
}
