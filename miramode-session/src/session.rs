//! Session: serialized request/response exchanges with one valve

use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::time::timeout;

use miramode_proto::{CHAR_READ, CHAR_WRITE, Command, DeviceState, Trigger};

use crate::{DeviceIdentity, SessionError, Transport};

/// Tunables for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long to wait for a notification after a trigger or command write.
    pub notify_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            notify_timeout: Duration::from_secs(10),
        }
    }
}

struct Inner<T> {
    transport: T,
    state: DeviceState,
}

/// One session per physical valve.
///
/// The firmware has no request/response correlation identifiers, so every
/// operation holds an exclusive gate for its full duration; a second
/// concurrent write-and-wait would race on the single pending-notification
/// slot and corrupt one of the results. Sessions for different valves share
/// nothing and run freely in parallel.
pub struct Session<T> {
    identity: DeviceIdentity,
    config: SessionConfig,
    inner: Mutex<Inner<T>>,
}

impl<T: Transport> Session<T> {
    pub fn new(identity: DeviceIdentity, transport: T) -> Self {
        Self::with_config(identity, transport, SessionConfig::default())
    }

    pub fn with_config(identity: DeviceIdentity, transport: T, config: SessionConfig) -> Self {
        Self {
            identity,
            config,
            inner: Mutex::new(Inner {
                transport,
                state: DeviceState::default(),
            }),
        }
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Last state decoded from the valve; the default all-off state before
    /// the first successful read.
    pub async fn state(&self) -> DeviceState {
        self.inner.lock().await.state
    }

    /// Ask the valve for a fresh state notification and decode it.
    pub async fn refresh(&self) -> Result<DeviceState, SessionError> {
        let mut inner = self.inner.lock().await;
        self.refresh_locked(&mut inner).await
    }

    /// Move the temperature setpoint, keeping both outlet flags as they are.
    pub async fn set_temperature(&self, celsius: f64) -> Result<DeviceState, SessionError> {
        self.apply(|state| state.temperature = celsius).await
    }

    /// Start or stop the shower outlet.
    pub async fn set_shower(&self, on: bool) -> Result<DeviceState, SessionError> {
        self.apply(|state| state.shower = on).await
    }

    /// Start or stop the bath outlet.
    pub async fn set_bath(&self, on: bool) -> Result<DeviceState, SessionError> {
        self.apply(|state| state.bath = on).await
    }

    /// Disconnect and consume the session.
    pub async fn shutdown(self) {
        let mut inner = self.inner.into_inner();
        inner.transport.disconnect().await;
    }

    /// Refresh-mutate-send-refresh under one gate acquisition.
    ///
    /// Command frames carry temperature and both flags together, so the
    /// session first learns the fields the caller is not changing, and reads
    /// back afterwards because the firmware is authoritative: it may clamp
    /// the setpoint or ignore the write outright.
    async fn apply(
        &self,
        mutate: impl FnOnce(&mut DeviceState) + Send,
    ) -> Result<DeviceState, SessionError> {
        let client_id = self.identity.require_client_id()?;
        let mut inner = self.inner.lock().await;

        let mut desired = self.refresh_locked(&mut inner).await?;
        mutate(&mut desired);

        let command = Command {
            device_id: self.identity.device_id,
            client_id,
            temperature: desired.temperature,
            shower: desired.shower,
            bath: desired.bath,
        };
        inner.transport.write(CHAR_WRITE, &command.to_bytes()).await?;

        self.refresh_locked(&mut inner).await
    }

    async fn refresh_locked(&self, inner: &mut Inner<T>) -> Result<DeviceState, SessionError> {
        inner.transport.connect(&self.identity.address).await?;

        // Fresh single-slot rendezvous per exchange. Dropping the receiver
        // (cancellation included) detaches any late notification, and the
        // transport replaces the sink on the next subscribe.
        let (tx, mut rx) = mpsc::channel(1);
        inner.transport.subscribe(CHAR_READ, tx).await?;

        let trigger = Trigger::new(self.identity.device_id);
        let raw = match inner.transport.write(CHAR_WRITE, &trigger.to_bytes()).await {
            Ok(()) => timeout(self.config.notify_timeout, rx.recv()).await.ok().flatten(),
            Err(err) => {
                Self::stop_notifications(inner).await;
                return Err(err.into());
            }
        };

        Self::stop_notifications(inner).await;

        let Some(raw) = raw else {
            return Err(SessionError::NoResponse {
                address: self.identity.address.clone(),
                timeout: self.config.notify_timeout,
            });
        };

        let state = DeviceState::from_notification(&raw)?;
        tracing::debug!(
            address = %self.identity.address,
            temperature = state.temperature,
            shower = state.shower,
            bath = state.bath,
            "decoded state notification"
        );
        inner.state = state;
        Ok(state)
    }

    /// Tear the subscription down on every exit path; a failure here must
    /// not mask the outcome of the exchange itself.
    async fn stop_notifications(inner: &mut Inner<T>) {
        if let Err(err) = inner.transport.unsubscribe(CHAR_READ).await {
            tracing::warn!(%err, "failed to stop notifications");
        }
    }
}
