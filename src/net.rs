use core::convert::TryInto;

use embedded_svc::http::client::Client as HttpClient;
use embedded_svc::http::Method;
use embedded_svc::io::Write as _;
use embedded_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};
use esp_idf_hal::modem::Modem;
use esp_idf_hal::sys::EspError;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::http::client::{Configuration as HttpConfiguration, EspHttpConnection};
use esp_idf_svc::io::EspIOError;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use badge_terminal::report::{ScanTransport, TransportError};

const WIFI_SSID: &str = env!("WIFI_SSID");
const WIFI_PASS: &str = env!("WIFI_PASS");

#[derive(Debug)]
pub enum NetError {
    Esp(EspError),
    Config(&'static str),
}

impl From<EspError> for NetError {
    fn from(err: EspError) -> Self {
        NetError::Esp(err)
    }
}

pub fn connect_wifi(modem: Modem) -> Result<BlockingWifi<EspWifi<'static>>, NetError> {
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take().ok();
    let mut wifi = BlockingWifi::wrap(EspWifi::new(modem, sys_loop.clone(), nvs)?, sys_loop)?;

    let auth_method = if WIFI_PASS.is_empty() {
        AuthMethod::None
    } else {
        AuthMethod::WPA2Personal
    };

    let wifi_configuration: Configuration = Configuration::Client(ClientConfiguration {
        ssid: WIFI_SSID
            .try_into()
            .map_err(|_| NetError::Config("SSID too long"))?,
        bssid: None,
        auth_method,
        password: WIFI_PASS
            .try_into()
            .map_err(|_| NetError::Config("password too long"))?,
        channel: None,
        ..Default::default()
    });

    wifi.set_configuration(&wifi_configuration)?;
    wifi.start()?;
    log::info!("Wi-Fi started");
    wifi.connect()?;
    log::info!("Wi-Fi connected to {}", WIFI_SSID);
    wifi.wait_netif_up()?;
    log::info!("Wi-Fi netif up");
    Ok(wifi)
}

/// 基于 ESP-IDF HTTP 客户端的上报通道（每次请求新建连接，支持 HTTPS）。
pub struct EspHttpTransport;

impl EspHttpTransport {
    fn post(&self, url: &str, headers: &[(&str, &str)], body: &[u8]) -> Result<u16, EspIOError> {
        let config = HttpConfiguration {
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        };

        let mut client = HttpClient::wrap(EspHttpConnection::new(&config)?);
        let mut request = client.request(Method::Post, url, headers)?;
        request.write_all(body)?;
        request.flush()?;
        let response = request.submit()?;
        Ok(response.status())
    }
}

impl ScanTransport for EspHttpTransport {
    fn post_json(
        &mut self,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<u16, TransportError> {
        log::debug!("POST {} ({} bytes)", url, body.len());
        self.post(url, headers, body)
            .map_err(|err| TransportError::Io(format!("{:?}", err)))
    }
}
