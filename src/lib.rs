#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]

#[cfg(feature = "esp32")]
pub mod board;
pub mod config;
pub mod constants;
pub mod display;
pub mod network;
pub mod payload;
pub mod publisher;
pub mod reading;
pub mod scheduler;
pub mod sensors;
pub mod telemetry;

pub use reading::Reading;
pub use telemetry::{Telemetry, TickReport};
