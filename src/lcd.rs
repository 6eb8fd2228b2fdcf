use core::fmt::Debug;

use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_9X15_BOLD};
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::{Baseline, Text};

use crate::display::NameDisplay;

// 画面布局：左上角设备号，下方姓名
const HEADER_ORIGIN: Point = Point::new(10, 10);
const NAME_ORIGIN: Point = Point::new(30, 70);
const NAME_LINE_HEIGHT: u32 = 20;

const BACKGROUND: Rgb565 = Rgb565::WHITE;
const HEADER_COLOR: Rgb565 = Rgb565::BLUE;
const NAME_COLOR: Rgb565 = Rgb565::BLACK;

/// LCD 姓名显示：白底，顶部蓝色设备号，姓名行黑字；清屏只擦除姓名行。
pub struct LcdDisplay<D> {
    target: D,
    device_id: String,
}

impl<D> LcdDisplay<D>
where
    D: DrawTarget<Color = Rgb565>,
    D::Error: Debug,
{
    /// 创建并绘制初始画面（背景 + 设备号）。
    pub fn new(target: D, device_id: impl Into<String>) -> Self {
        let mut display = Self {
            target,
            device_id: device_id.into(),
        };
        if let Err(err) = display.draw_header() {
            log::warn!("LCD header draw failed: {:?}", err);
        }
        display
    }

    pub fn target(&self) -> &D {
        &self.target
    }

    fn draw_header(&mut self) -> Result<(), D::Error> {
        self.target.clear(BACKGROUND)?;
        let style = MonoTextStyle::new(&FONT_9X15_BOLD, HEADER_COLOR);
        Text::with_baseline(&self.device_id, HEADER_ORIGIN, style, Baseline::Top)
            .draw(&mut self.target)?;
        Ok(())
    }

    fn name_area(&self) -> Rectangle {
        let width = self.target.bounding_box().size.width;
        Rectangle::new(
            Point::new(0, NAME_ORIGIN.y),
            Size::new(width, NAME_LINE_HEIGHT),
        )
    }

    fn draw_name(&mut self, name: &str) -> Result<(), D::Error> {
        let area = self.name_area();
        self.target.fill_solid(&area, BACKGROUND)?;
        if !name.is_empty() {
            let style = MonoTextStyle::new(&FONT_10X20, NAME_COLOR);
            Text::with_baseline(name, NAME_ORIGIN, style, Baseline::Top).draw(&mut self.target)?;
        }
        Ok(())
    }
}

impl<D> NameDisplay for LcdDisplay<D>
where
    D: DrawTarget<Color = Rgb565>,
    D::Error: Debug,
{
    fn show(&mut self, name: &str) {
        if let Err(err) = self.draw_name(name) {
            log::warn!("LCD draw failed: {:?}", err);
        }
    }

    fn clear(&mut self) {
        if let Err(err) = self.draw_name("") {
            log::warn!("LCD clear failed: {:?}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use core::convert::Infallible;

    use super::*;

    const WIDTH: usize = 320;
    const HEIGHT: usize = 240;

    /// 320x240 内存帧缓冲，模拟 LCD 面板。
    struct FrameBuffer {
        pixels: Vec<Rgb565>,
    }

    impl FrameBuffer {
        fn new() -> Self {
            Self {
                pixels: vec![Rgb565::RED; WIDTH * HEIGHT],
            }
        }

        fn count_in_rows(&self, rows: core::ops::Range<usize>, color: Rgb565) -> usize {
            rows.flat_map(|y| (0..WIDTH).map(move |x| y * WIDTH + x))
                .filter(|&idx| self.pixels[idx] == color)
                .count()
        }
    }

    impl DrawTarget for FrameBuffer {
        type Color = Rgb565;
        type Error = Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            for Pixel(point, color) in pixels {
                if point.x >= 0 && point.y >= 0 && (point.x as usize) < WIDTH && (point.y as usize) < HEIGHT {
                    self.pixels[point.y as usize * WIDTH + point.x as usize] = color;
                }
            }
            Ok(())
        }
    }

    impl OriginDimensions for FrameBuffer {
        fn size(&self) -> Size {
            Size::new(WIDTH as u32, HEIGHT as u32)
        }
    }

    fn header_rows() -> core::ops::Range<usize> {
        HEADER_ORIGIN.y as usize..HEADER_ORIGIN.y as usize + 15
    }

    fn name_rows() -> core::ops::Range<usize> {
        NAME_ORIGIN.y as usize..NAME_ORIGIN.y as usize + NAME_LINE_HEIGHT as usize
    }

    #[test]
    fn boot_screen_shows_device_id_only() {
        let display = LcdDisplay::new(FrameBuffer::new(), "HR-01");
        let fb = display.target();
        assert!(fb.pixels.iter().all(|&p| p == BACKGROUND || p == HEADER_COLOR));
        assert!(fb.count_in_rows(header_rows(), HEADER_COLOR) > 0);
        assert_eq!(fb.count_in_rows(name_rows(), NAME_COLOR), 0);
    }

    #[test]
    fn show_draws_name_and_clear_blanks_it() {
        let mut display = LcdDisplay::new(FrameBuffer::new(), "HR-01");
        let header_pixels = display.target().count_in_rows(header_rows(), HEADER_COLOR);

        display.show("A.Satou");
        assert!(display.target().count_in_rows(name_rows(), NAME_COLOR) > 0);

        display.clear();
        assert_eq!(display.target().count_in_rows(name_rows(), NAME_COLOR), 0);
        assert_eq!(
            display.target().count_in_rows(header_rows(), HEADER_COLOR),
            header_pixels
        );
    }

    #[test]
    fn new_name_replaces_previous_one() {
        let mut display = LcdDisplay::new(FrameBuffer::new(), "HR-01");
        display.show("J.Uchikawa");
        display.show("Y.Kon");

        let mut fresh = LcdDisplay::new(FrameBuffer::new(), "HR-01");
        fresh.show("Y.Kon");
        assert!(display.target().pixels == fresh.target().pixels);
    }
}
