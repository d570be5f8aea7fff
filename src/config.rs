#[derive(Debug)]
pub struct Config {
    // Wi-Fi SSID to connect to
    pub wifi_ssid: &'static str,

    // Wi-Fi pre-shared key (password)
    pub wifi_psk: &'static str,

    // Device ID (MQTT client ID, DHCP hostname and `device_id` in payloads)
    pub device_id: &'static str,

    // MQTT broker hostname or IP address
    pub mqtt_hostname: &'static str,

    // MQTT port (usually 1883)
    pub mqtt_port: u16,

    // MQTT username for authentication (optional)
    pub mqtt_username: Option<&'static str>,

    // MQTT password for authentication (optional)
    pub mqtt_password: Option<&'static str>,

    // MQTT topic to publish readings to
    pub mqtt_topic: &'static str,

    // Interval between two published readings in milliseconds
    pub publish_interval_ms: u32,
}

// config values are generated at compile time
include!(concat!(env!("OUT_DIR"), "/config.rs"));
