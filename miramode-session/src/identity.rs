//! Per-valve identifiers, fixed at pairing time

use crate::SessionError;

/// Immutable identity of one physical valve.
///
/// `client_id` is the paired secret the firmware folds into every command
/// CRC. It is obtained out of band (sniffed or brute-forced during pairing)
/// and is only required for operations that write a command frame, so state
/// reads still work on a half-configured device.
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    pub address: String,
    pub device_id: u8,
    pub client_id: Option<u32>,
}

impl DeviceIdentity {
    pub fn new(
        address: impl Into<String>,
        device_id: u8,
        client_id: Option<u32>,
    ) -> Result<Self, SessionError> {
        let address = address.into();
        if address.is_empty() {
            return Err(SessionError::InvalidConfiguration("address"));
        }
        Ok(Self {
            address,
            device_id,
            client_id,
        })
    }

    pub(crate) fn require_client_id(&self) -> Result<u32, SessionError> {
        self.client_id
            .ok_or(SessionError::InvalidConfiguration("client id"))
    }
}
