use crate::reading::Reading;

#[cfg(feature = "bme280")]
pub mod bme280;
pub mod mock;

pub use mock::{MockSensor, SimulatedSensorState};

#[derive(Debug)]
pub enum SensorError {
    InitFailure,
    MeasurementFailure,
    InvalidReading,
}

/// Source of readings, simulated or physical.
pub trait Sensor {
    /// Produces the reading for the tick at `timestamp` (seconds since boot).
    async fn measure(&mut self, timestamp: u64) -> Result<Reading, SensorError>;
}
