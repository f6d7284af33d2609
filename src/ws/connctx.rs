use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

/// Smallest outbound queue: a new connection is sent `welcome` and `current_users`
/// back to back, before its writer task gets to run.
pub const MIN_OUTBOUND_BUFFER: usize = 2;

/// Handle to one client transport.
///
/// The registry entry owns the handle; when the last handle for a connection is
/// dropped the outbound queue closes and the connection's writer task ends.
/// Clients that only poll over HTTP get a detached handle with no queue.
#[derive(Clone, Debug)]
pub struct ConnHandle {
    pub conn_id: Uuid,
    outbound: Option<mpsc::Sender<String>>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum DeliveryError {
    /// The connection's writer has gone away
    Closed,
    /// The recipient is not draining its queue fast enough
    Full,
}

impl ConnHandle {
    /// Create a handle with a fresh connection id, returning the receiving end of
    /// its outbound queue.
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<String>) {
        let (outbound, rx) = mpsc::channel(buffer.max(MIN_OUTBOUND_BUFFER));
        (
            Self {
                conn_id: Uuid::new_v4(),
                outbound: Some(outbound),
            },
            rx,
        )
    }

    /// Handle for a polling client. Pushed events are discarded; the client
    /// reads state through the snapshot endpoint instead.
    pub fn detached() -> Self {
        Self {
            conn_id: Uuid::new_v4(),
            outbound: None,
        }
    }

    /// Queue a text frame without waiting.
    pub fn try_deliver(&self, text: String) -> Result<(), DeliveryError> {
        let Some(outbound) = &self.outbound else {
            return Ok(());
        };
        outbound.try_send(text).map_err(|e| match e {
            TrySendError::Closed(_) => DeliveryError::Closed,
            TrySendError::Full(_) => DeliveryError::Full,
        })
    }
}
