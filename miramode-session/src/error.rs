//! Error taxonomy: transport faults, silent devices, foreign firmware

use std::time::Duration;

use uuid::Uuid;

/// Failure reported by the BLE transport. The session propagates these
/// untouched; retry and reconnect decisions belong to the caller.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("could not connect to {address}: {reason}")]
    Connect { address: String, reason: String },

    /// The GATT database has no such characteristic. Usually a stale
    /// service cache rather than a missing feature.
    #[error("characteristic {uuid} not found; clear the GATT cache and reconnect")]
    CharacteristicMissing { uuid: Uuid },

    #[error("{op} on characteristic {uuid} failed: {reason}")]
    Operation {
        op: &'static str,
        uuid: Uuid,
        reason: String,
    },
}

/// Failure of a session operation. Every operation returns either a fully
/// decoded state or one of these; nothing is swallowed into defaults.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The valve stayed silent for the whole timeout window. Most often a
    /// wrong device id, otherwise the unit is out of range.
    #[error("no notification from {address} within {timeout:?}; is the device id correct?")]
    NoResponse { address: String, timeout: Duration },

    /// Notifications of the wrong shape: whatever answered is not a Mira
    /// valve, or runs an unknown firmware revision.
    #[error("not a recognised Mira device: {0}")]
    IncompatibleDevice(#[from] miramode_proto::DecodeError),

    #[error("device configuration is missing the {0}")]
    InvalidConfiguration(&'static str),
}
