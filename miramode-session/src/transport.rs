//! Transport seam between the session and the physical BLE link

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::TransportError;

/// Capability set the session needs from the BLE link.
///
/// Implementations own connection policy: [`connect`](Transport::connect)
/// may reuse a link that is already up, and any retry or backoff happens
/// behind this trait. The session itself is single-shot per call.
#[async_trait]
pub trait Transport: Send {
    /// Establish a connection to `address`, or reuse one already open.
    async fn connect(&mut self, address: &str) -> Result<(), TransportError>;

    /// Write `payload` to a characteristic.
    async fn write(&mut self, characteristic: Uuid, payload: &[u8]) -> Result<(), TransportError>;

    /// Start routing notifications from a characteristic into `sink`.
    ///
    /// Replaces any previous sink, so a cancelled operation can never leak
    /// a stale notification into the next one.
    async fn subscribe(
        &mut self,
        characteristic: Uuid,
        sink: mpsc::Sender<Vec<u8>>,
    ) -> Result<(), TransportError>;

    /// Stop notification delivery for a characteristic.
    async fn unsubscribe(&mut self, characteristic: Uuid) -> Result<(), TransportError>;

    /// Drop the connection, if any.
    async fn disconnect(&mut self);
}
