//! Scanning helpers and the btleplug-backed session transport

use std::time::Duration;

use btleplug::api::{
    Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use async_trait::async_trait;
use miramode_session::{Transport, TransportError};

/// Advertised name prefix of a paired Mira handset unit.
const NAME_PREFIX: &str = "Mira N86Sd: ";

/// A device seen during a scan. Mira units have `is_mira = true`.
#[derive(Debug, Clone)]
pub struct MiraDevice {
    pub name: String,
    pub address: String,
    pub rssi: Option<i16>,
    pub is_mira: bool,
}

/// Get the default Bluetooth adapter
pub async fn default_adapter() -> Result<Adapter, Box<dyn std::error::Error>> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    adapters
        .into_iter()
        .next()
        .ok_or_else(|| "No Bluetooth adapter found".into())
}

/// Scan for BLE devices and list them, flagging Mira units.
pub async fn scan(duration_secs: u64) -> Result<Vec<MiraDevice>, Box<dyn std::error::Error>> {
    let adapter = default_adapter().await?;

    adapter.start_scan(ScanFilter::default()).await?;
    tokio::time::sleep(Duration::from_secs(duration_secs)).await;

    let mut devices = Vec::new();
    for peripheral in adapter.peripherals().await? {
        if let Some(props) = peripheral.properties().await? {
            let advertised = props.local_name.unwrap_or_else(|| "Unknown".to_string());
            let is_mira = advertised.starts_with("Mira");
            // Valves advertise as "Mira N86Sd: <room name>"
            let name = advertised
                .strip_prefix(NAME_PREFIX)
                .unwrap_or(&advertised)
                .to_string();

            devices.push(MiraDevice {
                name,
                address: peripheral.address().to_string(),
                rssi: props.rssi,
                is_mira,
            });
        }
    }

    adapter.stop_scan().await?;
    Ok(devices)
}

fn connect_err(address: &str, err: impl std::fmt::Display) -> TransportError {
    TransportError::Connect {
        address: address.to_string(),
        reason: err.to_string(),
    }
}

fn op_err(op: &'static str, uuid: Uuid, err: impl std::fmt::Display) -> TransportError {
    TransportError::Operation {
        op,
        uuid,
        reason: err.to_string(),
    }
}

fn find_characteristic(
    peripheral: &Peripheral,
    uuid: Uuid,
) -> Result<Characteristic, TransportError> {
    peripheral
        .characteristics()
        .into_iter()
        .find(|c| c.uuid == uuid)
        .ok_or(TransportError::CharacteristicMissing { uuid })
}

/// btleplug-backed [`Transport`].
///
/// Keeps the link up across operations: the session connects before every
/// exchange and this reuses a live connection. Notifications for the
/// subscribed characteristic are forwarded into the session's sink from a
/// background task, which is aborted whenever the sink is replaced or torn
/// down, so late frames can never reach a finished operation.
pub struct BleTransport {
    adapter: Adapter,
    peripheral: Option<Peripheral>,
    forwarder: Option<JoinHandle<()>>,
    scan_window: Duration,
}

impl BleTransport {
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            adapter: default_adapter().await?,
            peripheral: None,
            forwarder: None,
            scan_window: Duration::from_secs(5),
        })
    }

    /// Override the discovery window used when connecting by address.
    pub fn with_scan_window(mut self, window: Duration) -> Self {
        self.scan_window = window;
        self
    }

    async fn find_peripheral(&self, address: &str) -> Result<Peripheral, TransportError> {
        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(|err| connect_err(address, err))?;
        tokio::time::sleep(self.scan_window).await;

        let peripherals = self
            .adapter
            .peripherals()
            .await
            .map_err(|err| connect_err(address, err))?;

        let _ = self.adapter.stop_scan().await;

        peripherals
            .into_iter()
            .find(|p| p.address().to_string().eq_ignore_ascii_case(address))
            .ok_or_else(|| connect_err(address, "device not found during scan"))
    }

    fn active(&self) -> Result<&Peripheral, TransportError> {
        self.peripheral.as_ref().ok_or_else(|| TransportError::Connect {
            address: String::from("(none)"),
            reason: String::from("no active connection"),
        })
    }

    fn abort_forwarder(&mut self) {
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
    }
}

#[async_trait]
impl Transport for BleTransport {
    async fn connect(&mut self, address: &str) -> Result<(), TransportError> {
        if let Some(peripheral) = &self.peripheral {
            if peripheral.is_connected().await.unwrap_or(false) {
                return Ok(());
            }
            tracing::debug!(address, "connection dropped, reconnecting");
        }

        let peripheral = self.find_peripheral(address).await?;
        peripheral
            .connect()
            .await
            .map_err(|err| connect_err(address, err))?;
        peripheral
            .discover_services()
            .await
            .map_err(|err| connect_err(address, err))?;

        self.peripheral = Some(peripheral);
        Ok(())
    }

    async fn write(&mut self, characteristic: Uuid, payload: &[u8]) -> Result<(), TransportError> {
        let peripheral = self.active()?;
        let target = find_characteristic(peripheral, characteristic)?;
        peripheral
            .write(&target, payload, WriteType::WithResponse)
            .await
            .map_err(|err| op_err("write", characteristic, err))
    }

    async fn subscribe(
        &mut self,
        characteristic: Uuid,
        sink: mpsc::Sender<Vec<u8>>,
    ) -> Result<(), TransportError> {
        let peripheral = self.active()?.clone();
        let target = find_characteristic(&peripheral, characteristic)?;

        let mut notifications = peripheral
            .notifications()
            .await
            .map_err(|err| op_err("subscribe", characteristic, err))?;
        peripheral
            .subscribe(&target)
            .await
            .map_err(|err| op_err("subscribe", characteristic, err))?;

        let forwarder = tokio::spawn(async move {
            while let Some(event) = notifications.next().await {
                if event.uuid != characteristic {
                    continue;
                }
                // A closed sink means the operation finished or was
                // cancelled; stop forwarding.
                if sink.send(event.value).await.is_err() {
                    break;
                }
            }
        });

        if let Some(old) = self.forwarder.replace(forwarder) {
            old.abort();
        }
        Ok(())
    }

    async fn unsubscribe(&mut self, characteristic: Uuid) -> Result<(), TransportError> {
        self.abort_forwarder();
        let peripheral = self.active()?;
        let target = find_characteristic(peripheral, characteristic)?;
        peripheral
            .unsubscribe(&target)
            .await
            .map_err(|err| op_err("unsubscribe", characteristic, err))
    }

    async fn disconnect(&mut self) {
        self.abort_forwarder();
        if let Some(peripheral) = self.peripheral.take() {
            if let Err(err) = peripheral.disconnect().await {
                tracing::warn!(%err, "failed to disconnect peripheral");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_the_handset_name_prefix() {
        let advertised = "Mira N86Sd: Main Bathroom";
        assert_eq!(
            advertised.strip_prefix(NAME_PREFIX).unwrap(),
            "Main Bathroom"
        );
    }
}
