use std::time::Duration;

use esp_idf_hal::gpio::OutputPin;
use esp_idf_hal::rmt::{config::TransmitConfig, PinState, Pulse, TxRmtDriver, VariableLengthSignal};
use esp_idf_hal::sys::EspError;
use esp_idf_hal::{peripheral::Peripheral, rmt::RmtChannel};
use smart_leds::{SmartLedsWrite, RGB8};

/// WS2812/SK6812 灯条（通过 RMT 一次性发送整条数据）。
pub struct SmartLedStrip<'d> {
    tx: TxRmtDriver<'d>,
}

impl<'d> SmartLedStrip<'d> {
    /// 初始化 RMT 发送器。
    pub fn new<C, P, Ch, Pin>(channel: C, pin: P) -> Result<Self, EspError>
    where
        C: Peripheral<P = Ch> + 'd,
        P: Peripheral<P = Pin> + 'd,
        Ch: RmtChannel,
        Pin: OutputPin,
    {
        let config = TransmitConfig::new().clock_divider(1);
        let tx = TxRmtDriver::new(channel, pin, &config)?;
        Ok(Self { tx })
    }

    /// 按 GRB 顺序生成所有像素的脉冲序列。
    fn render_signal<I>(&self, colors: I) -> Result<VariableLengthSignal, EspError>
    where
        I: Iterator<Item = RGB8>,
    {
        let ticks_hz = self.tx.counter_clock()?;
        let (t0h, t0l, t1h, t1l) = (
            Pulse::new_with_duration(ticks_hz, PinState::High, &Duration::from_nanos(350))?,
            Pulse::new_with_duration(ticks_hz, PinState::Low, &Duration::from_nanos(800))?,
            Pulse::new_with_duration(ticks_hz, PinState::High, &Duration::from_nanos(700))?,
            Pulse::new_with_duration(ticks_hz, PinState::Low, &Duration::from_nanos(600))?,
        );
        let mut signal = VariableLengthSignal::new();
        for color in colors {
            let grb: u32 = ((color.g as u32) << 16) | ((color.r as u32) << 8) | color.b as u32;
            for i in (0..24).rev() {
                let bit = (grb & (1 << i)) != 0;
                let (hi, lo) = if bit { (&t1h, &t1l) } else { (&t0h, &t0l) };
                signal.push([hi, lo])?;
            }
        }
        Ok(signal)
    }
}

impl SmartLedsWrite for SmartLedStrip<'_> {
    type Color = RGB8;
    type Error = EspError;

    fn write<T, I>(&mut self, iterator: T) -> Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        let signal = self.render_signal(iterator.into_iter().map(Into::into))?;
        self.tx.start_blocking(&signal)?;
        Ok(())
    }
}
