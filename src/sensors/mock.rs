use rand_core::RngCore;

use super::{Sensor, SensorError};
use crate::reading::Reading;

/// Largest per-tick temperature change in °C
pub const TEMPERATURE_STEP: f32 = 0.3;
/// Largest per-tick humidity change in %
pub const HUMIDITY_STEP: f32 = 0.5;
/// Largest per-tick current change in mA
pub const CURRENT_STEP: f32 = 50.0;
/// Largest per-tick voltage change in V
pub const VOLTAGE_STEP: f32 = 0.03;
/// Factor applied to the reported current during a spike
pub const SPIKE_FACTOR: f32 = 3.0;

// Draws are taken modulo these; a vibration fires on 96..=99 (4%),
// a spike on 986..=999 (1.4%).
const VIBRATION_RANGE: u32 = 100;
const VIBRATION_THRESHOLD: u32 = 95;
const SPIKE_RANGE: u32 = 1000;
const SPIKE_THRESHOLD: u32 = 985;
const NOISE_RESOLUTION: u32 = 10_000;

/// Simulated physical values, evolved by a bounded random walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedSensorState {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub current_ma: f32,
    pub voltage_v: f32,
    pub vibration: bool,
}

impl Default for SimulatedSensorState {
    fn default() -> Self {
        Self {
            temperature_c: 30.0,
            humidity_pct: 45.0,
            current_ma: 1500.0,
            voltage_v: 12.0,
            vibration: false,
        }
    }
}

impl SimulatedSensorState {
    /// Advances the walk by one tick and returns the values to report.
    ///
    /// A current spike only affects the returned reading; the walk keeps
    /// evolving from the un-spiked baseline.
    pub fn advance<R: RngCore>(&mut self, rng: &mut R, timestamp: u64) -> Reading {
        self.temperature_c += uniform(rng, -TEMPERATURE_STEP, TEMPERATURE_STEP);
        self.humidity_pct =
            (self.humidity_pct + uniform(rng, -HUMIDITY_STEP, HUMIDITY_STEP)).clamp(0.0, 100.0);
        self.current_ma += uniform(rng, -CURRENT_STEP, CURRENT_STEP);
        self.voltage_v += uniform(rng, -VOLTAGE_STEP, VOLTAGE_STEP);
        self.vibration = rng.next_u32() % VIBRATION_RANGE > VIBRATION_THRESHOLD;

        let spike = rng.next_u32() % SPIKE_RANGE > SPIKE_THRESHOLD;
        let current_ma = if spike {
            log::debug!("Simulating current spike");
            self.current_ma * SPIKE_FACTOR
        } else {
            self.current_ma
        };

        Reading {
            timestamp,
            temperature_c: self.temperature_c,
            humidity_pct: self.humidity_pct,
            vibration: self.vibration,
            current_ma,
            voltage_v: self.voltage_v,
        }
    }
}

/// Uniform value in `[low, high)` with a resolution of 1/10000 of the range.
fn uniform<R: RngCore>(rng: &mut R, low: f32, high: f32) -> f32 {
    let unit = (rng.next_u32() % NOISE_RESOLUTION) as f32 / NOISE_RESOLUTION as f32;
    low + unit * (high - low)
}

/// Mock-mode sensor: readings come from a [`SimulatedSensorState`].
pub struct MockSensor<R> {
    state: SimulatedSensorState,
    rng: R,
}

impl<R: RngCore> MockSensor<R> {
    pub fn new(rng: R) -> Self {
        Self {
            state: SimulatedSensorState::default(),
            rng,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> &SimulatedSensorState {
        &self.state
    }
}

impl<R: RngCore> Sensor for MockSensor<R> {
    async fn measure(&mut self, timestamp: u64) -> Result<Reading, SensorError> {
        self.state.advance(&mut self.rng, timestamp).validate()
    }
}
