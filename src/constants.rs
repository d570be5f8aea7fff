/// Current firmware version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Size of the heap in DRAM (internal memory)
pub const HEAP_SIZE: usize = 72 * 1024;

/// Sleep between two iterations of the main loop
pub const LOOP_DELAY_MS: u64 = 10;

/// Upper bound for a Wi-Fi association attempt, DHCP included
pub const WIFI_CONNECT_TIMEOUT_SECS: u64 = 15;

/// Upper bound for a single broker exchange: connect (DNS, TCP and
/// CONNECT/CONNACK), publish or keep-alive ping
pub const BROKER_TIMEOUT_SECS: u64 = 5;

/// MQTT keep-alive announced to the broker
pub const MQTT_KEEP_ALIVE_SECS: u16 = 15;

/// Size of the TCP socket receive buffer
pub const RX_BUFFER_SIZE: usize = 1024;
/// Size of the TCP socket transmit buffer
pub const TX_BUFFER_SIZE: usize = 1024;

/// Size of the MQTT client receive buffer for application data
pub const MQTT_RX_BUFFER_SIZE: usize = 512;
/// Size of the MQTT client transmit buffer for application data
pub const MQTT_TX_BUFFER_SIZE: usize = 512;
/// Maximum number of MQTT v5 properties per packet
pub const MQTT_MAX_PROPERTIES: usize = 5;

/// Capacity of a formatted JSON payload
pub const PAYLOAD_CAPACITY: usize = 256;

/// Longest accepted device id, checked by build.rs
pub const MAX_DEVICE_ID_LEN: usize = 32;

/// Capacity of one rendered display line, sized for "Device:" plus the
/// longest device id
pub const DISPLAY_LINE_CAPACITY: usize = 7 + MAX_DEVICE_ID_LEN;

/// I2C address of the SSD1306 OLED
pub const DISPLAY_I2C_ADDRESS: u8 = 0x3C;
