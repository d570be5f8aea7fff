use embassy_executor::Spawner;
use embassy_net::{Runner, Stack, StackResources};

use esp_hal::rng::Rng;
use esp_wifi::{
    wifi::{ClientConfiguration, Configuration, WifiController, WifiDevice},
    EspWifiController,
};

use core::str::FromStr;
use heapless::String;
use log::info;
use static_cell::StaticCell;

use crate::config::Config;
use crate::network::{NetworkError, WifiLink};

static RESOURCES: StaticCell<StackResources<4>> = StaticCell::new();

/// Station interface plus the embassy-net stack running on top of it.
pub struct EspWifi {
    controller: WifiController<'static>,
    stack: Stack<'static>,
    config: &'static Config,
}

#[derive(Debug)]
pub enum Error {
    WifiInitFailed,
    HostnameTooLong,
    SpawnFailed,
}

impl EspWifi {
    pub fn new(
        init: &'static EspWifiController<'static>,
        wifi: esp_hal::peripherals::WIFI<'static>,
        mut rng: Rng,
        config: &'static Config,
        spawner: Spawner,
    ) -> Result<Self, Error> {
        let (controller, interfaces) =
            esp_wifi::wifi::new(init, wifi).map_err(|_| Error::WifiInitFailed)?;

        let mut dhcp_config = embassy_net::DhcpConfig::default();
        dhcp_config.hostname =
            Some(String::<32>::from_str(config.device_id).map_err(|_| Error::HostnameTooLong)?);

        let seed = (rng.random() as u64) << 32 | rng.random() as u64;
        let net_config = embassy_net::Config::dhcpv4(dhcp_config);

        let resources = RESOURCES.init(StackResources::new());
        let (stack, runner) = embassy_net::new(interfaces.sta, net_config, resources, seed);

        spawner
            .spawn(net_task(runner))
            .map_err(|_| Error::SpawnFailed)?;

        Ok(Self {
            controller,
            stack,
            config,
        })
    }

    pub fn stack(&self) -> Stack<'static> {
        self.stack
    }

    fn is_associated(&self) -> bool {
        matches!(self.controller.is_connected(), Ok(true))
    }
}

impl WifiLink for EspWifi {
    fn is_connected(&self) -> bool {
        self.is_associated() && self.stack.is_config_up()
    }

    async fn connect(&mut self) -> Result<(), NetworkError> {
        if !matches!(self.controller.is_started(), Ok(true)) {
            let client_config = Configuration::Client(ClientConfiguration {
                ssid: self.config.wifi_ssid.into(),
                password: self.config.wifi_psk.into(),
                ..Default::default()
            });
            self.controller
                .set_configuration(&client_config)
                .map_err(|e| {
                    log::error!("Failed to set WiFi config: {:?}", e);
                    NetworkError::AssociationFailed
                })?;

            info!("Starting wifi");
            self.controller.start_async().await.map_err(|e| {
                log::error!("Failed to start WiFi: {:?}", e);
                NetworkError::AssociationFailed
            })?;
            info!("Wifi started!");
        }

        if !self.is_associated() {
            self.controller.connect_async().await.map_err(|e| {
                info!("Failed to connect to wifi: {e:?}");
                NetworkError::AssociationFailed
            })?;
        }

        info!("Waiting to get IP address...");
        self.stack.wait_config_up().await;
        if let Some(config) = self.stack.config_v4() {
            info!("Got IP: {}", config.address);
        }

        Ok(())
    }
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await
}
