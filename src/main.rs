// 固件入口：外设初始化 + 单线程轮询主循环（业务逻辑在 badge_terminal 库中）
#[cfg(target_os = "espidf")]
mod net;
#[cfg(target_os = "espidf")]
mod smart_led;

#[cfg(target_os = "espidf")]
use esp_idf_hal::sys::EspError;

// 灯条像素数（M5Stack 侧边灯条）
#[cfg(target_os = "espidf")]
const LED_PIXELS: usize = 10;

// ILI9342C 通过 SPI 写像素时使用的缓冲
#[cfg(target_os = "espidf")]
const LCD_BUFFER_LEN: usize = 512;

/// 启动阶段的致命错误。
#[cfg(target_os = "espidf")]
#[derive(Debug)]
enum BootError {
    Esp(EspError),
    Reader(String),
    Display(String),
}

#[cfg(target_os = "espidf")]
impl From<EspError> for BootError {
    fn from(err: EspError) -> Self {
        BootError::Esp(err)
    }
}

#[cfg(target_os = "espidf")]
fn main() -> Result<(), BootError> {
    use std::time::Instant;

    use badge_terminal::indicator::LedDisplay;
    use badge_terminal::lcd::LcdDisplay;
    use badge_terminal::model::TerminalSettings;
    use badge_terminal::rfid::{self, Mfrc522};
    use badge_terminal::roster::Roster;
    use badge_terminal::terminal::{ScanTerminal, TickOutcome};
    use esp_idf_hal::delay::FreeRtos;
    use esp_idf_hal::gpio::PinDriver;
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::prelude::*;
    use esp_idf_hal::spi::{config::Config as SpiConfig, SpiDeviceDriver, SpiDriver, SpiDriverConfig};
    use mipidsi::interface::SpiInterface;
    use mipidsi::models::ILI9342CRgb565;
    use mipidsi::options::ColorInversion;
    use mipidsi::Builder;

    // ESP-IDF 运行时初始化（链接补丁 & 日志）
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    let settings = TerminalSettings::default();
    log::info!("Badge terminal {} booting (ESP-IDF)...", settings.device_id);

    // 外设初始化：I2C（RFID 单元）+ SPI（LCD）+ RMT（灯条）
    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;
    let i2c_config = I2cConfig::new().baudrate(100.kHz().into());
    let i2c = I2cDriver::new(peripherals.i2c0, pins.gpio21, pins.gpio22, &i2c_config)?;
    let mut reader = Mfrc522::new(i2c, rfid::DEFAULT_ADDRESS);
    reader
        .init()
        .map_err(|err| BootError::Reader(format!("{:?}", err)))?;

    let spi = SpiDriver::new(
        peripherals.spi2,
        pins.gpio18,
        pins.gpio23,
        Some(pins.gpio19),
        &SpiDriverConfig::new(),
    )?;
    let spi_device = SpiDeviceDriver::new(
        spi,
        Some(pins.gpio14),
        &SpiConfig::new().baudrate(40.MHz().into()),
    )?;
    let dc = PinDriver::output(pins.gpio27)?;
    let rst = PinDriver::output(pins.gpio33)?;
    let mut backlight = PinDriver::output(pins.gpio32)?;
    backlight.set_high()?;
    let mut lcd_buffer = [0_u8; LCD_BUFFER_LEN];
    let panel = Builder::new(
        ILI9342CRgb565,
        SpiInterface::new(spi_device, dc, &mut lcd_buffer),
    )
    .invert_colors(ColorInversion::Inverted)
    .reset_pin(rst)
    .init(&mut FreeRtos)
    .map_err(|err| BootError::Display(format!("{:?}", err)))?;
    let lcd = LcdDisplay::new(panel, settings.device_id.clone());

    let strip = smart_led::SmartLedStrip::new(peripherals.rmt.channel0, pins.gpio15)?;
    let led = LedDisplay::new(strip, LED_PIXELS, settings.device_id.clone());

    // 连接 Wi-Fi（失败不阻塞主流程，上报失败后下次刷卡可重试）
    let _wifi = match net::connect_wifi(peripherals.modem) {
        Ok(wifi) => Some(wifi),
        Err(err) => {
            log::warn!("Wi-Fi connect failed: {:?}", err);
            None
        }
    };

    let roster = Roster::builtin();
    if roster.is_empty() {
        log::warn!("Roster is empty, every tap will show UNKNOWN");
    }
    log::info!(
        "Roster loaded ({} members), reporting to {}",
        roster.len(),
        settings.report_url
    );
    let mut terminal = ScanTerminal::new(
        settings,
        reader,
        FreeRtos,
        roster,
        net::EspHttpTransport,
        (lcd, led),
    );

    // 主循环：tick -> 固定间隔休眠；上报请求会阻塞整个循环
    let boot = Instant::now();
    loop {
        let now_ms = boot.elapsed().as_millis() as u64;
        match terminal.tick(now_ms) {
            TickOutcome::Rejected => log::debug!("Tap ignored: unreadable UID"),
            TickOutcome::Scanned { tag, send, .. } => log::debug!("Tap {} -> {:?}", tag, send),
            _ => {}
        }
        FreeRtos::delay_ms(terminal.settings().poll_interval_ms);
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!("badge-terminal only runs on ESP-IDF targets; use `cargo test --lib` on the host");
}
