//! Mira BLE transport
//!
//! btleplug-backed link for Mira valve sessions: discovery of nearby units
//! and the [`Transport`](miramode_session::Transport) implementation the
//! session drives.
//!
//! # Example
//!
//! ```ignore
//! use miramode_ble::ble::{self, BleTransport};
//! use miramode_session::{DeviceIdentity, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Scan for valves
//!     for device in ble::scan(5).await? {
//!         println!("{} ({})", device.name, device.address);
//!     }
//!
//!     // Read one valve's state
//!     let identity = DeviceIdentity::new("00:1A:22:33:44:55", 1, Some(32683))?;
//!     let session = Session::new(identity, BleTransport::new().await?);
//!     println!("{:?}", session.refresh().await?);
//!     session.shutdown().await;
//!
//!     Ok(())
//! }
//! ```

pub mod ble;

pub use ble::{BleTransport, MiraDevice, scan};
