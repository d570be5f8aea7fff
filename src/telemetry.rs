use embassy_time::{Duration, Instant};

use crate::config::Config;
use crate::display::{DisplayPresenter, Panel};
use crate::network::{Broker, NetworkConnector, WifiLink};
use crate::publisher::Publisher;
use crate::reading::Reading;
use crate::scheduler::Ticker;
use crate::sensors::Sensor;

/// Outcome of one tick, for callers that want to observe the loop.
#[derive(Debug)]
pub struct TickReport {
    pub reading: Reading,
    pub sent: bool,
    pub displayed: bool,
}

/// The device's control loop: keeps connectivity up between ticks and, once
/// per interval, samples, publishes and displays one reading.
pub struct Telemetry<S, W, P> {
    config: &'static Config,
    sensor: S,
    network: NetworkConnector<W>,
    publisher: Publisher,
    display: DisplayPresenter<P>,
    ticker: Ticker,
}

impl<S, W, P> Telemetry<S, W, P>
where
    S: Sensor,
    W: WifiLink,
    P: Panel,
{
    pub fn new(
        config: &'static Config,
        sensor: S,
        network: NetworkConnector<W>,
        display: DisplayPresenter<P>,
    ) -> Self {
        let publisher = Publisher::new(config).with_send_timeout(network.broker_timeout());

        Self {
            config,
            sensor,
            network,
            publisher,
            display,
            ticker: Ticker::new(Duration::from_millis(config.publish_interval_ms.into())),
        }
    }

    pub fn network(&self) -> &NetworkConnector<W> {
        &self.network
    }

    pub fn display(&self) -> &DisplayPresenter<P> {
        &self.display
    }

    /// One pass of the loop at monotonic time `now`.
    ///
    /// Never fails: connectivity problems are logged and retried on the next
    /// pass, a failed sample skips the tick.
    pub async fn poll<B: Broker>(&mut self, now: Instant, broker: &mut B) -> Option<TickReport> {
        let _ = self.network.ensure_wifi().await;
        let _ = self.network.ensure_broker(broker).await;
        let _ = self.network.keep_alive(broker).await;

        if !self.ticker.poll(now) {
            return None;
        }

        self.tick(now, broker).await
    }

    async fn tick<B: Broker>(&mut self, now: Instant, broker: &mut B) -> Option<TickReport> {
        let reading = match self.sensor.measure(now.as_secs()).await {
            Ok(reading) => reading,
            Err(e) => {
                log::error!("Measurement error: {:?}", e);
                return None;
            }
        };

        let sent = match self.publisher.publish(broker, &reading).await {
            Ok(publication) => publication.sent,
            Err(e) => {
                log::error!("Publish error: {:?}", e);
                false
            }
        };

        let displayed = self.display.present(&reading).is_ok();

        log::debug!(
            "Tick at {}s for {}: sent={} displayed={}",
            reading.timestamp,
            self.config.device_id,
            sent,
            displayed
        );

        Some(TickReport {
            reading,
            sent,
            displayed,
        })
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;
    use rand::{rngs::SmallRng, SeedableRng};

    use super::*;
    use crate::display::tests::FakePanel;
    use crate::network::tests::{FakeBroker, FakeWifi, TEST_CONFIG};
    use crate::sensors::{MockSensor, SensorError};

    struct BrokenSensor;

    impl Sensor for BrokenSensor {
        async fn measure(&mut self, _timestamp: u64) -> Result<Reading, SensorError> {
            Err(SensorError::MeasurementFailure)
        }
    }

    fn telemetry<S: Sensor>(
        sensor: S,
        wifi: FakeWifi,
        panel: FakePanel,
    ) -> Telemetry<S, FakeWifi, FakePanel> {
        let network = NetworkConnector::new(wifi, &TEST_CONFIG)
            .with_timeouts(Duration::from_millis(50), Duration::from_millis(50));
        Telemetry::new(
            &TEST_CONFIG,
            sensor,
            network,
            DisplayPresenter::new(panel, TEST_CONFIG.device_id),
        )
    }

    #[test]
    fn connects_before_first_tick() {
        let sensor = MockSensor::new(SmallRng::seed_from_u64(3));
        let mut node = telemetry(sensor, FakeWifi::default(), FakePanel::default());
        let mut broker = FakeBroker::default();

        assert!(block_on(node.poll(Instant::from_millis(10), &mut broker)).is_none());

        assert!(node.network().wifi().connected);
        assert!(broker.connected);
        assert_eq!(broker.polls, 1);
        assert!(broker.sent.is_empty());
    }

    #[test]
    fn tick_publishes_then_displays() {
        let sensor = MockSensor::new(SmallRng::seed_from_u64(3));
        let mut node = telemetry(sensor, FakeWifi::default(), FakePanel::default());
        let mut broker = FakeBroker::default();

        let report = block_on(node.poll(Instant::from_millis(3000), &mut broker)).unwrap();

        assert!(report.sent);
        assert!(report.displayed);
        assert_eq!(report.reading.timestamp, 3);
        assert_eq!(broker.sent.len(), 1);
        assert!(broker.sent[0].1.starts_with(r#"{"device_id":"DEV1","ts":3,"#));
        assert!(node.display().panel().lit() > 0);
    }

    #[test]
    fn unresponsive_broker_does_not_stall_the_loop() {
        let sensor = MockSensor::new(SmallRng::seed_from_u64(3));
        let mut node = telemetry(sensor, FakeWifi::default(), FakePanel::default());
        let mut broker = FakeBroker {
            connected: true,
            hang: true,
            ..Default::default()
        };

        let report = block_on(node.poll(Instant::from_millis(3000), &mut broker)).unwrap();

        assert!(!report.sent);
        assert!(report.displayed);
        assert!(!broker.is_connected());
        assert_eq!(broker.polls, 1);
    }

    #[test]
    fn sensor_failure_skips_tick() {
        let mut node = telemetry(BrokenSensor, FakeWifi::default(), FakePanel::default());
        let mut broker = FakeBroker::default();

        assert!(block_on(node.poll(Instant::from_millis(3000), &mut broker)).is_none());

        assert!(broker.sent.is_empty());
        assert_eq!(node.display().panel().flushes, 0);
    }

    #[test]
    fn missing_display_does_not_block_publish() {
        let sensor = MockSensor::new(SmallRng::seed_from_u64(3));
        let panel = FakePanel {
            present: false,
            ..Default::default()
        };
        let mut node = telemetry(sensor, FakeWifi::default(), panel);
        let mut broker = FakeBroker::default();

        let report = block_on(node.poll(Instant::from_millis(3000), &mut broker)).unwrap();

        assert!(report.sent);
        assert!(!report.displayed);
    }
}
