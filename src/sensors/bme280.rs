use bme280_rs::{AsyncBme280, Oversampling, SensorMode};
use embassy_time::Delay;
use log::info;

use super::{Sensor, SensorError};
use crate::reading::Reading;

/// Real sensor path: temperature and humidity from a BME280.
///
/// The board carries no current, voltage or vibration sensing, those fields
/// report zero.
pub struct Bme280<I2C> {
    sensor: AsyncBme280<I2C, Delay>,
}

impl<I2C: embedded_hal_async::i2c::I2c> Bme280<I2C> {
    pub async fn new(i2c: I2C) -> Result<Self, SensorError> {
        info!("Initialising BME280...");
        let mut sensor = AsyncBme280::new(i2c, Delay);
        sensor.init().await.map_err(|_| SensorError::InitFailure)?;

        sensor
            .set_sampling_configuration(
                bme280_rs::Configuration::default()
                    .with_temperature_oversampling(Oversampling::Oversample1)
                    .with_pressure_oversampling(Oversampling::Skip)
                    .with_humidity_oversampling(Oversampling::Oversample1)
                    .with_sensor_mode(SensorMode::Normal),
            )
            .await
            .map_err(|_| SensorError::InitFailure)?;

        info!("Initialised BME280");

        Ok(Self { sensor })
    }
}

impl<I2C: embedded_hal_async::i2c::I2c> Sensor for Bme280<I2C> {
    async fn measure(&mut self, timestamp: u64) -> Result<Reading, SensorError> {
        let sample = self
            .sensor
            .read_sample()
            .await
            .map_err(|_| SensorError::MeasurementFailure)?;

        Reading {
            timestamp,
            temperature_c: sample
                .temperature
                .ok_or(SensorError::MeasurementFailure)?,
            humidity_pct: sample.humidity.ok_or(SensorError::MeasurementFailure)?,
            vibration: false,
            current_ma: 0.0,
            voltage_v: 0.0,
        }
        .validate()
    }
}
