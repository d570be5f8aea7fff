use embassy_net::{dns::DnsQueryType, tcp::TcpSocket, Stack};
use embassy_time::{Duration, Instant};
use log::{debug, warn};
use rust_mqtt::{
    client::{
        client::MqttClient,
        client_config::{ClientConfig, MqttVersion},
    },
    packet::v5::publish_packet::QualityOfService,
    utils::rng_generator::CountingRng,
};

use crate::config::Config;
use crate::constants::{MQTT_KEEP_ALIVE_SECS, MQTT_MAX_PROPERTIES};
use crate::network::{Broker, BrokerError};

/// Idle time after which the socket gives up on the broker
const SOCKET_TIMEOUT_SECS: u64 = 2 * MQTT_KEEP_ALIVE_SECS as u64;

/// Memory one broker session runs in.
pub struct Buffers<'a> {
    pub rx: &'a mut [u8],
    pub tx: &'a mut [u8],
    pub mqtt_rx: &'a mut [u8],
    pub mqtt_tx: &'a mut [u8],
}

type Client<'a> = MqttClient<'a, TcpSocket<'a>, MQTT_MAX_PROPERTIES, CountingRng>;

/// One MQTT session over plain TCP.
///
/// The session owns its buffers for as long as the connection lives. Once a
/// connection attempt fails or an established connection drops, the buffers
/// are gone with it and the session is spent: the caller drops it and builds
/// a fresh one from the same memory.
pub struct MqttBroker<'a> {
    stack: Stack<'static>,
    config: &'static Config,
    buffers: Option<Buffers<'a>>,
    client: Option<Client<'a>>,
    last_activity: Instant,
}

impl<'a> MqttBroker<'a> {
    pub fn new(stack: Stack<'static>, config: &'static Config, buffers: Buffers<'a>) -> Self {
        Self {
            stack,
            config,
            buffers: Some(buffers),
            client: None,
            last_activity: Instant::now(),
        }
    }

    pub fn is_spent(&self) -> bool {
        self.buffers.is_none() && self.client.is_none()
    }

    fn drop_connection(&mut self) {
        self.client = None;
    }
}

impl<'a> Broker for MqttBroker<'a> {
    fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    async fn connect(&mut self, client_id: &'static str) -> Result<(), BrokerError> {
        if self.client.is_some() {
            return Ok(());
        }

        let addr = self
            .stack
            .dns_query(self.config.mqtt_hostname, DnsQueryType::A)
            .await
            .map_err(|e| {
                warn!("DNS query for {} failed: {:?}", self.config.mqtt_hostname, e);
                BrokerError::ConnectionFailed
            })?
            .first()
            .copied()
            .ok_or(BrokerError::ConnectionFailed)?;

        let Buffers {
            rx,
            tx,
            mqtt_rx,
            mqtt_tx,
        } = self.buffers.take().ok_or(BrokerError::ConnectionFailed)?;

        let mut socket = TcpSocket::new(self.stack, rx, tx);
        socket.set_timeout(Some(Duration::from_secs(SOCKET_TIMEOUT_SECS)));

        debug!("Connecting TCP socket to {}:{}", addr, self.config.mqtt_port);
        socket
            .connect((addr, self.config.mqtt_port))
            .await
            .map_err(|e| {
                warn!("TCP connection failed: {:?}", e);
                BrokerError::ConnectionFailed
            })?;

        let mut mqtt_config = ClientConfig::new(MqttVersion::MQTTv5, CountingRng(20000));
        mqtt_config.add_client_id(client_id);
        mqtt_config.keep_alive = MQTT_KEEP_ALIVE_SECS;
        mqtt_config.max_packet_size = mqtt_tx.len() as u32;
        if let Some(username) = self.config.mqtt_username {
            mqtt_config.add_username(username);
        }
        if let Some(password) = self.config.mqtt_password {
            mqtt_config.add_password(password);
        }

        let tx_len = mqtt_tx.len();
        let rx_len = mqtt_rx.len();
        let mut client = MqttClient::<_, MQTT_MAX_PROPERTIES, _>::new(
            socket,
            mqtt_tx,
            tx_len,
            mqtt_rx,
            rx_len,
            mqtt_config,
        );

        client.connect_to_broker().await.map_err(|e| {
            warn!("MQTT connect_to_broker failed: {:?}", e);
            BrokerError::ConnectionFailed
        })?;

        self.client = Some(client);
        self.last_activity = Instant::now();
        Ok(())
    }

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), BrokerError> {
        let client = self.client.as_mut().ok_or(BrokerError::PublishFailed)?;

        match client
            .send_message(topic, payload, QualityOfService::QoS0, false)
            .await
        {
            Ok(()) => {
                self.last_activity = Instant::now();
                Ok(())
            }
            Err(e) => {
                warn!("Failed to publish message: {:?}", e);
                self.drop_connection();
                Err(BrokerError::PublishFailed)
            }
        }
    }

    async fn poll(&mut self) -> Result<(), BrokerError> {
        let Some(client) = self.client.as_mut() else {
            return Ok(());
        };

        // Ping at half the keep-alive so the broker never sees us idle
        let ping_after = Duration::from_secs(MQTT_KEEP_ALIVE_SECS as u64 / 2);
        if self.last_activity.elapsed() < ping_after {
            return Ok(());
        }

        match client.send_ping().await {
            Ok(()) => {
                debug!("MQTT ping acknowledged");
                self.last_activity = Instant::now();
                Ok(())
            }
            Err(e) => {
                warn!("MQTT ping failed: {:?}", e);
                self.drop_connection();
                Err(BrokerError::KeepAliveFailed)
            }
        }
    }

    fn disconnect(&mut self) {
        self.drop_connection();
    }
}
