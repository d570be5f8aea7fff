use crate::sensors::SensorError;

/// One sample of every quantity the device reports.
///
/// Produced fresh on each tick, consumed by the publisher and the display,
/// then dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Seconds since boot
    pub timestamp: u64,
    /// Temperature in °C
    pub temperature_c: f32,
    /// Relative humidity in %
    pub humidity_pct: f32,
    /// Vibration event seen during this tick
    pub vibration: bool,
    /// Load current in mA
    pub current_ma: f32,
    /// Bus voltage in V
    pub voltage_v: f32,
}

impl Reading {
    /// Rejects readings carrying NaN or infinite values, e.g. from a failed
    /// sensor read.
    pub fn validate(self) -> Result<Self, SensorError> {
        let fields = [
            ("temperature_c", self.temperature_c),
            ("humidity_pct", self.humidity_pct),
            ("current_ma", self.current_ma),
            ("voltage_v", self.voltage_v),
        ];

        for (name, value) in fields {
            if !value.is_finite() {
                log::error!("Rejecting reading: {} is {}", name, value);
                return Err(SensorError::InvalidReading);
            }
        }

        Ok(self)
    }
}
