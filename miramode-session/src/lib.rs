//! Device sessions for Mira BLE mixing valves
//!
//! One [`Session`] per physical valve. The firmware carries no
//! request/response correlation, so a session serializes its operations
//! behind an exclusive gate and waits for exactly one notification per
//! trigger or command exchange. The BLE link sits behind the [`Transport`]
//! trait; connection policy, retries and backoff all live on that side.

mod error;
mod identity;
mod session;
mod transport;

pub use error::{SessionError, TransportError};
pub use identity::DeviceIdentity;
pub use session::{Session, SessionConfig};
pub use transport::Transport;

// Callers get the state type without depending on the proto crate.
pub use miramode_proto::DeviceState;
