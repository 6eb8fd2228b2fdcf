use smart_leds::{SmartLedsWrite, RGB8};

use crate::display::NameDisplay;
use crate::roster::UNKNOWN_NAME;

// 亮度缩放（约 30%）。
const BRIGHTNESS_SCALE: u8 = 77;

const KNOWN_COLOR: RGB8 = RGB8 { r: 0, g: 255, b: 0 };
const UNKNOWN_COLOR: RGB8 = RGB8 { r: 255, g: 160, b: 0 };
const OFF: RGB8 = RGB8 { r: 0, g: 0, b: 0 };

/// 用灯条提示刷卡结果：名单内亮绿、未登记亮橙，清屏时熄灭；姓名写入日志。
pub struct LedDisplay<W> {
    strip: W,
    pixels: usize,
    device_id: String,
}

impl<W> LedDisplay<W>
where
    W: SmartLedsWrite<Color = RGB8>,
    W::Error: core::fmt::Debug,
{
    pub fn new(strip: W, pixels: usize, device_id: impl Into<String>) -> Self {
        Self {
            strip,
            pixels,
            device_id: device_id.into(),
        }
    }

    pub fn strip(&self) -> &W {
        &self.strip
    }

    fn fill(&mut self, color: RGB8) {
        let color = apply_brightness(color);
        let pixels = core::iter::repeat(color).take(self.pixels);
        if let Err(err) = self.strip.write(pixels) {
            log::warn!("LED update failed: {:?}", err);
        }
    }
}

impl<W> NameDisplay for LedDisplay<W>
where
    W: SmartLedsWrite<Color = RGB8>,
    W::Error: core::fmt::Debug,
{
    fn show(&mut self, name: &str) {
        log::info!("[{}] {}", self.device_id, name);
        let color = if name == UNKNOWN_NAME {
            UNKNOWN_COLOR
        } else {
            KNOWN_COLOR
        };
        self.fill(color);
    }

    fn clear(&mut self) {
        self.fill(OFF);
    }
}

/// 亮度缩放，降低刺眼程度。
fn apply_brightness(color: RGB8) -> RGB8 {
    let scale = BRIGHTNESS_SCALE as u16;
    let apply = |v: u8| ((v as u16 * scale) / 255) as u8;
    RGB8 {
        r: apply(color.r),
        g: apply(color.g),
        b: apply(color.b),
    }
}
