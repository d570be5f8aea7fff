//! ESP32 implementations of the capability traits.

pub mod mqtt;
pub mod oled;
pub mod wifi;
