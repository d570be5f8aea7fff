use std::{env, error::Error, fs, path::Path};

use serde::Deserialize;

// Must match `constants::MAX_DEVICE_ID_LEN`, the display line is sized from it
const MAX_DEVICE_ID_LEN: usize = 32;

#[derive(Deserialize)]
struct RawConfig {
    wifi_ssid: String,
    wifi_psk: String,
    device_id: String,
    mqtt_hostname: String,
    mqtt_port: u16,
    mqtt_username: Option<String>,
    mqtt_password: Option<String>,
    mqtt_topic: String,
    #[serde(default = "default_publish_interval_ms")]
    publish_interval_ms: u32,
}

fn default_publish_interval_ms() -> u32 {
    3000
}

impl RawConfig {
    fn validate(&self) -> Result<(), String> {
        if self.wifi_ssid.is_empty() {
            return Err("wifi_ssid must not be empty".into());
        }
        if self.device_id.is_empty() || self.device_id.len() > MAX_DEVICE_ID_LEN {
            return Err(format!(
                "device_id must be 1..={} bytes long",
                MAX_DEVICE_ID_LEN
            ));
        }
        // The id is embedded raw in the JSON payload and used as DHCP hostname
        if !self
            .device_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(format!(
                "device_id {:?} may only contain [A-Za-z0-9_-]",
                self.device_id
            ));
        }
        if self.mqtt_topic.is_empty() || self.mqtt_topic.contains(['+', '#']) {
            return Err(format!(
                "mqtt_topic {:?} must be a non-empty topic name without wildcards",
                self.mqtt_topic
            ));
        }
        if self.mqtt_port == 0 {
            return Err("mqtt_port must not be 0".into());
        }
        if self.publish_interval_ms == 0 {
            return Err("publish_interval_ms must not be 0".into());
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    // Tell Cargo to rerun if toml changes
    println!("cargo:rerun-if-changed=cfg.toml");

    // Read, parse and check
    let toml_str = fs::read_to_string("cfg.toml")?;
    let raw: RawConfig = toml::from_str(&toml_str)?;
    raw.validate()?;

    // Generate Rust code
    let code = format!(
        r#"
        pub const CONFIG: Config = Config {{
            wifi_ssid: {ssid:?},
            wifi_psk: {psk:?},
            device_id: {id:?},
            mqtt_hostname: {mh:?},
            mqtt_port: {mp},
            mqtt_username: {mu:?},
            mqtt_password: {mpw:?},
            mqtt_topic: {mt:?},
            publish_interval_ms: {intv},
        }};
    "#,
        ssid = raw.wifi_ssid,
        psk = raw.wifi_psk,
        id = raw.device_id,
        mh = raw.mqtt_hostname,
        mp = raw.mqtt_port,
        mu = raw.mqtt_username,
        mpw = raw.mqtt_password,
        mt = raw.mqtt_topic,
        intv = raw.publish_interval_ms
    );

    let out_dir = env::var("OUT_DIR")?;
    let dest_path = Path::new(&out_dir).join("config.rs");
    fs::write(dest_path, code)?;
    Ok(())
}
