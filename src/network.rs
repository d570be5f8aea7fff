use embassy_time::{with_timeout, Duration};
use log::{info, warn};

use crate::config::Config;
use crate::constants::{BROKER_TIMEOUT_SECS, WIFI_CONNECT_TIMEOUT_SECS};

#[derive(Debug)]
pub enum NetworkError {
    AssociationFailed,
    AssociationTimeout,
}

#[derive(Debug)]
pub enum BrokerError {
    ConnectionFailed,
    ConnectTimeout,
    PublishFailed,
    KeepAliveFailed,
    Timeout,
}

/// Station-mode Wi-Fi association.
pub trait WifiLink {
    fn is_connected(&self) -> bool;

    /// Associates and waits until the interface is usable. May take
    /// arbitrarily long; callers bound it.
    async fn connect(&mut self) -> Result<(), NetworkError>;
}

/// Message-broker session.
pub trait Broker {
    fn is_connected(&self) -> bool;

    async fn connect(&mut self, client_id: &'static str) -> Result<(), BrokerError>;

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), BrokerError>;

    /// Keep-alive and receive processing, called on every loop iteration.
    async fn poll(&mut self) -> Result<(), BrokerError>;

    /// Abandons the session, e.g. after an exchange timed out half-way.
    fn disconnect(&mut self);
}

/// Best-effort, idempotent connectivity: every call either finds the link up,
/// brings it up within a bounded time, or logs the failure and returns.
pub struct NetworkConnector<W> {
    wifi: W,
    config: &'static Config,
    wifi_timeout: Duration,
    broker_timeout: Duration,
}

impl<W: WifiLink> NetworkConnector<W> {
    pub fn new(wifi: W, config: &'static Config) -> Self {
        Self {
            wifi,
            config,
            wifi_timeout: Duration::from_secs(WIFI_CONNECT_TIMEOUT_SECS),
            broker_timeout: Duration::from_secs(BROKER_TIMEOUT_SECS),
        }
    }

    pub fn with_timeouts(mut self, wifi_timeout: Duration, broker_timeout: Duration) -> Self {
        self.wifi_timeout = wifi_timeout;
        self.broker_timeout = broker_timeout;
        self
    }

    pub fn wifi(&self) -> &W {
        &self.wifi
    }

    pub fn broker_timeout(&self) -> Duration {
        self.broker_timeout
    }

    pub async fn ensure_wifi(&mut self) -> Result<(), NetworkError> {
        if self.wifi.is_connected() {
            return Ok(());
        }

        info!("Connecting to WiFi {:?}...", self.config.wifi_ssid);
        match with_timeout(self.wifi_timeout, self.wifi.connect()).await {
            Ok(Ok(())) => {
                info!("WiFi connected");
                Ok(())
            }
            Ok(Err(e)) => {
                warn!("WiFi connection failed: {:?}", e);
                Err(e)
            }
            Err(_) => {
                warn!(
                    "WiFi connection timed out after {}s",
                    self.wifi_timeout.as_secs()
                );
                Err(NetworkError::AssociationTimeout)
            }
        }
    }

    pub async fn ensure_broker<B: Broker>(&mut self, broker: &mut B) -> Result<(), BrokerError> {
        if broker.is_connected() {
            return Ok(());
        }

        info!(
            "Connecting MQTT to {}:{} as {}...",
            self.config.mqtt_hostname, self.config.mqtt_port, self.config.device_id
        );
        match with_timeout(self.broker_timeout, broker.connect(self.config.device_id)).await {
            Ok(Ok(())) => {
                info!("MQTT connected");
                Ok(())
            }
            Ok(Err(e)) => {
                warn!("MQTT connection failed: {:?}", e);
                Err(e)
            }
            Err(_) => {
                warn!(
                    "MQTT connection timed out after {}s",
                    self.broker_timeout.as_secs()
                );
                Err(BrokerError::ConnectTimeout)
            }
        }
    }

    /// Services the broker session, bounded like a connect. A session that
    /// does not answer in time is dropped and reconnected on a later pass.
    pub async fn keep_alive<B: Broker>(&mut self, broker: &mut B) -> Result<(), BrokerError> {
        if !broker.is_connected() {
            return Ok(());
        }

        match with_timeout(self.broker_timeout, broker.poll()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                warn!("MQTT keep-alive failed: {:?}", e);
                Err(e)
            }
            Err(_) => {
                warn!(
                    "MQTT keep-alive timed out after {}s, dropping session",
                    self.broker_timeout.as_secs()
                );
                broker.disconnect();
                Err(BrokerError::Timeout)
            }
        }
    }
}
