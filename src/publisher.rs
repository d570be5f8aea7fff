use embassy_time::{with_timeout, Duration};

use crate::config::Config;
use crate::constants::BROKER_TIMEOUT_SECS;
use crate::network::Broker;
use crate::payload::{format_json, Payload, PayloadError};
use crate::reading::Reading;

#[derive(Debug)]
pub enum Error {
    Payload(PayloadError),
}

/// What happened to a published reading.
#[derive(Debug)]
pub struct Publication {
    pub payload: Payload,
    /// Handed to the broker. `false` when the broker was down or refused it;
    /// the reading is not retried.
    pub sent: bool,
}

pub struct Publisher {
    config: &'static Config,
    timeout: Duration,
}

impl Publisher {
    pub fn new(config: &'static Config) -> Self {
        Self {
            config,
            timeout: Duration::from_secs(BROKER_TIMEOUT_SECS),
        }
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Writes the payload to the console log, then publishes it if and only
    /// if the broker session is up.
    pub async fn publish<B: Broker>(
        &self,
        broker: &mut B,
        reading: &Reading,
    ) -> Result<Publication, Error> {
        let payload = format_json(self.config.device_id, reading).map_err(Error::Payload)?;
        log::info!("{}", payload);

        if !broker.is_connected() {
            log::warn!("MQTT not connected, reading not sent");
            return Ok(Publication {
                payload,
                sent: false,
            });
        }

        let sent = with_timeout(
            self.timeout,
            broker.publish(self.config.mqtt_topic, payload.as_bytes()),
        )
        .await;

        match sent {
            Ok(Ok(())) => {
                log::debug!("Reading published to {}", self.config.mqtt_topic);
                Ok(Publication {
                    payload,
                    sent: true,
                })
            }
            Ok(Err(e)) => {
                log::warn!("Failed to publish reading: {:?}", e);
                Ok(Publication {
                    payload,
                    sent: false,
                })
            }
            Err(_) => {
                log::warn!(
                    "Publish timed out after {}ms, dropping session",
                    self.timeout.as_millis()
                );
                broker.disconnect();
                Ok(Publication {
                    payload,
                    sent: false,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::string::String;
    use std::sync::{Mutex, Once};
    use std::vec::Vec;

    use embassy_futures::block_on;
    use log::{Level, Log, Metadata, Record};

    use super::*;
    use crate::network::tests::{FakeBroker, TEST_CONFIG};

    static LINES: Mutex<Vec<String>> = Mutex::new(Vec::new());
    static INIT: Once = Once::new();

    struct CaptureLogger;

    impl Log for CaptureLogger {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.level() <= Level::Info
        }

        fn log(&self, record: &Record) {
            if self.enabled(record.metadata()) {
                LINES.lock().unwrap().push(record.args().to_string());
            }
        }

        fn flush(&self) {}
    }

    fn capture_logs() {
        INIT.call_once(|| {
            log::set_logger(&CaptureLogger).unwrap();
            log::set_max_level(log::LevelFilter::Info);
        });
    }

    fn logged(line: &str) -> bool {
        LINES.lock().unwrap().iter().any(|l| l == line)
    }

    fn reading(timestamp: u64) -> Reading {
        Reading {
            timestamp,
            temperature_c: 30.0,
            humidity_pct: 45.0,
            vibration: false,
            current_ma: 1500.0,
            voltage_v: 12.0,
        }
    }

    #[test]
    fn connected_broker_receives_payload_on_topic() {
        capture_logs();
        let publisher = Publisher::new(&TEST_CONFIG);
        let mut broker = FakeBroker {
            connected: true,
            ..Default::default()
        };

        let publication = block_on(publisher.publish(&mut broker, &reading(5))).unwrap();

        let expected = r#"{"device_id":"DEV1","ts":5,"temp_c":30.00,"humidity_pct":45.00,"vibration":0,"current_mA":1500.00,"voltage_v":12.00}"#;
        assert!(publication.sent);
        assert_eq!(publication.payload.as_str(), expected);
        assert_eq!(
            broker.sent,
            vec![("ent/device/DEV1/telemetry".to_string(), expected.to_string())]
        );
        assert!(logged(expected));
    }

    #[test]
    fn disconnected_broker_skips_send_but_logs() {
        capture_logs();
        let publisher = Publisher::new(&TEST_CONFIG);
        let mut broker = FakeBroker::default();

        let publication = block_on(publisher.publish(&mut broker, &reading(777))).unwrap();

        assert!(!publication.sent);
        assert!(broker.sent.is_empty());
        assert!(logged(publication.payload.as_str()));
    }

    #[test]
    fn stalled_publish_gives_up_and_drops_session() {
        let publisher = Publisher::new(&TEST_CONFIG).with_send_timeout(Duration::from_millis(50));
        let mut broker = FakeBroker {
            connected: true,
            hang: true,
            ..Default::default()
        };

        let publication = block_on(publisher.publish(&mut broker, &reading(9))).unwrap();

        assert!(!publication.sent);
        assert!(!broker.is_connected());
        assert!(broker.sent.is_empty());
    }

    #[test]
    fn invalid_reading_is_not_published() {
        let publisher = Publisher::new(&TEST_CONFIG);
        let mut broker = FakeBroker {
            connected: true,
            ..Default::default()
        };
        let bad = Reading {
            voltage_v: f32::NAN,
            ..reading(1)
        };

        assert!(matches!(
            block_on(publisher.publish(&mut broker, &bad)),
            Err(Error::Payload(PayloadError::Format))
        ));
        assert!(broker.sent.is_empty());
    }
}
