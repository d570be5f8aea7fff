#![no_std]
#![no_main]

use static_cell::StaticCell;

use embassy_executor::Spawner;
use embassy_net::Stack;
use embassy_time::{Duration, Instant, Timer};

use esp_alloc as _;
use esp_backtrace as _;
use esp_hal::{self as hal};
use esp_println::logger::init_logger;
use esp_wifi::EspWifiController;

use hal::{i2c::master::I2c, rng::Rng, time::Rate, timer::timg::TimerGroup};

use telemetry_node::board::{
    mqtt::{Buffers, MqttBroker},
    oled::{self, Oled},
    wifi::EspWifi,
};
use telemetry_node::config::CONFIG;
use telemetry_node::constants::*;
use telemetry_node::display::DisplayPresenter;
use telemetry_node::network::NetworkConnector;
use telemetry_node::Telemetry;

#[cfg(feature = "bme280")]
use telemetry_node::sensors::bme280::Bme280;
#[cfg(not(feature = "bme280"))]
use telemetry_node::sensors::MockSensor;

#[cfg(feature = "bme280")]
type NodeSensor = Bme280<I2c<'static, hal::Async>>;
#[cfg(not(feature = "bme280"))]
type NodeSensor = MockSensor<Rng>;

type Node = Telemetry<NodeSensor, EspWifi, Oled>;

esp_bootloader_esp_idf::esp_app_desc!();

static RADIO: StaticCell<EspWifiController<'static>> = StaticCell::new();

static RX_BUF: StaticCell<[u8; RX_BUFFER_SIZE]> = StaticCell::new();
static TX_BUF: StaticCell<[u8; TX_BUFFER_SIZE]> = StaticCell::new();
static MQTT_RX_BUF: StaticCell<[u8; MQTT_RX_BUFFER_SIZE]> = StaticCell::new();
static MQTT_TX_BUF: StaticCell<[u8; MQTT_TX_BUFFER_SIZE]> = StaticCell::new();

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    init_logger(log::LevelFilter::Info);
    log::info!("telemetry_node {} starting as {}", VERSION, CONFIG.device_id);

    let peripherals = esp_hal::init(esp_hal::Config::default());

    let rng = Rng::new(peripherals.RNG);

    esp_alloc::heap_allocator!(size: HEAP_SIZE);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let timg1 = TimerGroup::new(peripherals.TIMG1);

    esp_hal_embassy::init(timg0.timer0);

    // possibly high transient required at init
    // https://github.com/esp-rs/esp-hal/issues/1626
    Timer::after(Duration::from_millis(1000)).await;

    let radio = RADIO.init(esp_wifi::init(timg1.timer0, rng.clone(), peripherals.RADIO_CLK).unwrap());
    let wifi = EspWifi::new(radio, peripherals.WIFI, rng.clone(), &CONFIG, spawner).unwrap();
    let stack = wifi.stack();

    let display_i2c = I2c::new(
        peripherals.I2C0,
        hal::i2c::master::Config::default().with_frequency(Rate::from_khz(400)),
    )
    .unwrap()
    .with_sda(peripherals.GPIO21)
    .with_scl(peripherals.GPIO22);
    let display = DisplayPresenter::new(oled::new(display_i2c), CONFIG.device_id);

    #[cfg(feature = "bme280")]
    let sensor: NodeSensor = {
        let i2c = I2c::new(
            peripherals.I2C1,
            hal::i2c::master::Config::default().with_frequency(Rate::from_khz(100)),
        )
        .unwrap()
        .with_sda(peripherals.GPIO25)
        .with_scl(peripherals.GPIO26)
        .into_async();
        Bme280::new(i2c).await.unwrap()
    };

    #[cfg(not(feature = "bme280"))]
    let sensor: NodeSensor = {
        log::info!("Mock mode: readings are simulated");
        MockSensor::new(rng)
    };

    let network = NetworkConnector::new(wifi, &CONFIG);
    let node = Telemetry::new(&CONFIG, sensor, network, display);

    spawner.spawn(main_task(node, stack)).ok();
}

#[embassy_executor::task]
async fn main_task(mut node: Node, stack: Stack<'static>) {
    let rx_buf = RX_BUF.init([0; RX_BUFFER_SIZE]);
    let tx_buf = TX_BUF.init([0; TX_BUFFER_SIZE]);
    let mqtt_rx_buf = MQTT_RX_BUF.init([0; MQTT_RX_BUFFER_SIZE]);
    let mqtt_tx_buf = MQTT_TX_BUF.init([0; MQTT_TX_BUFFER_SIZE]);

    loop {
        // Each broker session borrows the buffers until its connection ends
        let buffers = Buffers {
            rx: &mut rx_buf[..],
            tx: &mut tx_buf[..],
            mqtt_rx: &mut mqtt_rx_buf[..],
            mqtt_tx: &mut mqtt_tx_buf[..],
        };
        let mut broker = MqttBroker::new(stack, &CONFIG, buffers);

        while !broker.is_spent() {
            node.poll(Instant::now(), &mut broker).await;
            Timer::after(Duration::from_millis(LOOP_DELAY_MS)).await;
        }
    }
}
