use core::fmt::Write;

use heapless::String;

use crate::constants::PAYLOAD_CAPACITY;
use crate::reading::Reading;

pub type Payload = String<PAYLOAD_CAPACITY>;

#[derive(Debug)]
pub enum PayloadError {
    Format,
}

impl From<core::fmt::Error> for PayloadError {
    fn from(_: core::fmt::Error) -> Self {
        PayloadError::Format
    }
}

/// Formats a reading as a single-line JSON object.
///
/// Keys are always emitted in the same order and floats with two decimals:
/// `{"device_id":"DEV1","ts":5,"temp_c":30.00,"humidity_pct":45.00,"vibration":0,"current_mA":1500.00,"voltage_v":12.00}`
pub fn format_json(device_id: &str, reading: &Reading) -> Result<Payload, PayloadError> {
    // JSON has no representation for NaN or infinities
    reading.validate().map_err(|_| PayloadError::Format)?;

    let mut payload = Payload::new();
    write!(
        payload,
        "{{\"device_id\":\"{}\",\"ts\":{},\"temp_c\":{:.2},\"humidity_pct\":{:.2},\"vibration\":{},\"current_mA\":{:.2},\"voltage_v\":{:.2}}}",
        device_id,
        reading.timestamp,
        reading.temperature_c,
        reading.humidity_pct,
        u8::from(reading.vibration),
        reading.current_ma,
        reading.voltage_v,
    )?;

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Decoded {
        device_id: std::string::String,
        ts: u64,
        temp_c: f32,
        humidity_pct: f32,
        vibration: u8,
        #[serde(rename = "current_mA")]
        current_ma: f32,
        voltage_v: f32,
    }

    fn baseline() -> Reading {
        Reading {
            timestamp: 5,
            temperature_c: 30.0,
            humidity_pct: 45.0,
            vibration: false,
            current_ma: 1500.0,
            voltage_v: 12.0,
        }
    }

    #[test]
    fn baseline_reading_matches_wire_format() {
        let payload = format_json("DEV1", &baseline()).unwrap();
        assert_eq!(
            payload.as_str(),
            r#"{"device_id":"DEV1","ts":5,"temp_c":30.00,"humidity_pct":45.00,"vibration":0,"current_mA":1500.00,"voltage_v":12.00}"#
        );
    }

    #[test]
    fn vibration_is_encoded_as_integer() {
        let reading = Reading {
            vibration: true,
            ..baseline()
        };
        let payload = format_json("DEV1", &reading).unwrap();
        assert!(payload.contains(r#""vibration":1,"#));
    }

    #[test]
    fn parsed_payload_matches_reading() {
        let reading = Reading {
            timestamp: 123_456,
            temperature_c: 29.876,
            humidity_pct: 44.123,
            vibration: true,
            current_ma: 4512.345,
            voltage_v: 11.987,
        };

        let payload = format_json("ENT_DEV_001", &reading).unwrap();
        let decoded: Decoded = serde_json::from_str(&payload).unwrap();

        assert_eq!(decoded.device_id, "ENT_DEV_001");
        assert_eq!(decoded.ts, reading.timestamp);
        assert!((decoded.temp_c - reading.temperature_c).abs() <= 0.006);
        assert!((decoded.humidity_pct - reading.humidity_pct).abs() <= 0.006);
        assert_eq!(decoded.vibration, 1);
        assert!((decoded.current_ma - reading.current_ma).abs() <= 0.006);
        assert!((decoded.voltage_v - reading.voltage_v).abs() <= 0.006);
    }

    #[test]
    fn negative_values_parse() {
        let reading = Reading {
            temperature_c: -4.5,
            current_ma: -12.25,
            ..baseline()
        };

        let payload = format_json("DEV1", &reading).unwrap();
        let decoded: Decoded = serde_json::from_str(&payload).unwrap();

        assert_eq!(decoded.temp_c, -4.5);
        assert_eq!(decoded.current_ma, -12.25);
    }

    #[test]
    fn non_finite_reading_is_not_encoded() {
        let reading = Reading {
            humidity_pct: f32::NAN,
            ..baseline()
        };
        assert!(matches!(
            format_json("DEV1", &reading),
            Err(PayloadError::Format)
        ));
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let long_id = "X".repeat(PAYLOAD_CAPACITY);
        assert!(matches!(
            format_json(&long_id, &baseline()),
            Err(PayloadError::Format)
        ));
    }
}
