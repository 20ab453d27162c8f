//! Overlay drawing for one display snapshot.

use core::fmt::{self, Write};

use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{Dimensions, Point as ScreenPoint, Size},
    mono_font::{
        ascii::{FONT_10X20, FONT_6X10},
        MonoTextStyle,
    },
    pixelcolor::{Rgb565, RgbColor},
    primitives::{Circle, Line, Primitive, PrimitiveStyle, Rectangle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
    Drawable,
};
use hand_core::geometry::{clamp_corners, clamp_point, clamp_point_with_margin, to_corners, PixelPoint};
use hand_core::landmarks::{decode_landmark, BINDINGS};
use hand_core::FrameBounds;
use hand_shared::{DetectionBox, DisplayInfo, HandInfo, Roi, LANDMARK_COUNT};
use heapless::String;

const LINE_HEIGHT: i32 = 10;
const KEYPOINT_RADIUS: i32 = 2;
const DISK_RADIUS: i32 = 2;

const BACKGROUND: Rgb565 = Rgb565::BLACK;
const TEXT: Rgb565 = Rgb565::WHITE;

fn screen(p: PixelPoint) -> ScreenPoint {
    ScreenPoint::new(p.x, p.y)
}

fn disk(center: PixelPoint, radius: i32, color: Rgb565) -> impl Drawable<Color = Rgb565> {
    Circle::with_center(screen(center), (2 * radius + 1) as u32).into_styled(PrimitiveStyle::with_fill(color))
}

fn segment(from: PixelPoint, to: PixelPoint, color: Rgb565) -> impl Drawable<Color = Rgb565> {
    Line::new(screen(from), screen(to)).into_styled(PrimitiveStyle::with_stroke(color, 1))
}

fn format_line(args: fmt::Arguments) -> String<32> {
    let mut line = String::new();
    // longer lines get cut, nothing we print comes close
    let _ = line.write_fmt(args);
    line
}

pub struct Renderer {
    bounds: FrameBounds,
    debug: bool,
}

impl Renderer {
    /// `bounds` is the camera frame the overlay is laid over
    pub fn new(bounds: FrameBounds) -> Self {
        Self { bounds, debug: false }
    }

    /// Adds display timing and detector confidence to the text column
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn render<D>(&self, target: &mut D, info: &DisplayInfo) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        target.clear(BACKGROUND)?;

        let report = &info.report;
        if report.finger_count >= 0 {
            let digit = [b'0' + report.finger_count as u8];
            let digit = core::str::from_utf8(&digit).unwrap_or("?");
            let style = MonoTextStyle::new(&FONT_10X20, TEXT);
            Text::with_baseline(digit, ScreenPoint::new(10, 10), style, Baseline::Top).draw(target)?;
        }

        let fps = if report.nn_period_ms > 0.0 {
            1000.0 / report.nn_period_ms
        } else {
            0.0
        };

        self.print_right(target, 0, &format_line(format_args!("Inferences")))?;
        self.print_right(target, 1, &format_line(format_args!(" pd {:2}ms", report.pd_ms)))?;
        self.print_right(target, 2, &format_line(format_args!(" hl {:2}ms", report.hl_ms)))?;
        self.print_right(target, 4, &format_line(format_args!("  {:.1} FPS", fps)))?;
        if self.debug {
            self.print_right(target, 6, &format_line(format_args!("Display")))?;
            self.print_right(target, 7, &format_line(format_args!("   {}ms", info.disp_ms)))?;
            self.print_right(
                target,
                8,
                &format_line(format_args!("pd : {:5.1} %", report.pd_max_prob * 100.0)),
            )?;
        }

        let hands = report.hands.iter().take(report.pd_hand_nb as usize);
        for hand in hands.filter(|hand| hand.is_valid) {
            if info.overlay.detection {
                self.draw_detection(target, &hand.detection)?;
                self.draw_roi(target, &hand.roi)?;
            }
            if info.overlay.landmarks {
                self.draw_landmarks(target, hand)?;
            }
        }

        Ok(())
    }

    fn print_right<D>(&self, target: &mut D, row: i32, text: &str) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let right = target.bounding_box().size.width as i32 - 1;
        let character_style = MonoTextStyle::new(&FONT_6X10, TEXT);
        let text_style = TextStyleBuilder::new()
            .alignment(Alignment::Right)
            .baseline(Baseline::Top)
            .build();

        Text::with_text_style(text, ScreenPoint::new(right, row * LINE_HEIGHT), character_style, text_style)
            .draw(target)?;
        Ok(())
    }

    fn draw_detection<D>(&self, target: &mut D, detection: &DetectionBox) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let (xc, yc) = (detection.x_center as i32, detection.y_center as i32);
        let (w, h) = (detection.width as i32, detection.height as i32);

        let (top_left, _) = clamp_point(PixelPoint::new(xc - (w + 1) / 2, yc - (h + 1) / 2), self.bounds);
        let (bottom_right, _) = clamp_point(PixelPoint::new(xc + (w + 1) / 2, yc + (h + 1) / 2), self.bounds);
        let size = Size::new(
            (bottom_right.x - top_left.x) as u32,
            (bottom_right.y - top_left.y) as u32,
        );
        Rectangle::new(screen(top_left), size)
            .into_styled(PrimitiveStyle::with_stroke(Rgb565::GREEN, 1))
            .draw(target)?;

        for (i, keypoint) in detection.keypoints.iter().enumerate() {
            // the two keypoints giving the palm direction
            let color = if i == 0 || i == 2 { Rgb565::BLUE } else { Rgb565::RED };
            let (center, _) = clamp_point(PixelPoint::truncate(*keypoint), self.bounds);
            disk(center, KEYPOINT_RADIUS, color).draw(target)?;
        }

        Ok(())
    }

    /// Outlines the ROI, nothing when it sticks out of the frame
    fn draw_roi<D>(&self, target: &mut D, roi: &Roi) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let (corners, is_clamped) = clamp_corners(&to_corners(roi), self.bounds);
        if is_clamped {
            return Ok(());
        }

        for i in 0..corners.len() {
            segment(corners[i], corners[(i + 1) % corners.len()], Rgb565::RED).draw(target)?;
        }

        Ok(())
    }

    fn draw_landmarks<D>(&self, target: &mut D, hand: &HandInfo) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let mut points = [PixelPoint::default(); LANDMARK_COUNT];
        let mut hidden = [false; LANDMARK_COUNT];

        for (i, landmark) in hand.landmarks.iter().enumerate() {
            let decoded = PixelPoint::truncate(decode_landmark(&hand.roi, *landmark));
            (points[i], hidden[i]) = clamp_point_with_margin(decoded, self.bounds, DISK_RADIUS);
        }

        for (point, _) in points.iter().zip(hidden.iter()).filter(|(_, hidden)| !**hidden) {
            disk(*point, DISK_RADIUS, Rgb565::YELLOW).draw(target)?;
        }

        for &(from, to) in BINDINGS.iter() {
            if hidden[from] || hidden[to] {
                continue;
            }
            segment(points[from], points[to], Rgb565::WHITE).draw(target)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::geometry::OriginDimensions;
    use embedded_graphics::Pixel;
    use hand_shared::{CycleReport, Point};

    /// Counts pixels per color, ignoring the clear
    struct Tally {
        size: Size,
        yellow: usize,
        red: usize,
        green: usize,
        white: usize,
        out_of_bounds: usize,
    }

    impl Tally {
        fn new(width: u32, height: u32) -> Self {
            Self {
                size: Size::new(width, height),
                yellow: 0,
                red: 0,
                green: 0,
                white: 0,
                out_of_bounds: 0,
            }
        }
    }

    impl OriginDimensions for Tally {
        fn size(&self) -> Size {
            self.size
        }
    }

    impl DrawTarget for Tally {
        type Color = Rgb565;
        type Error = core::convert::Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            let area = self.bounding_box();
            for Pixel(point, color) in pixels {
                if !area.contains(point) {
                    self.out_of_bounds += 1;
                    continue;
                }
                if color == Rgb565::YELLOW {
                    self.yellow += 1;
                } else if color == Rgb565::RED {
                    self.red += 1;
                } else if color == Rgb565::GREEN {
                    self.green += 1;
                } else if color == Rgb565::WHITE {
                    self.white += 1;
                }
            }
            Ok(())
        }

        fn clear(&mut self, _color: Self::Color) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    fn tracked_info() -> DisplayInfo {
        let mut report = CycleReport::default();
        report.pd_hand_nb = 1;
        report.finger_count = 3;
        report.nn_period_ms = 40.0;
        let hand = &mut report.hands[0];
        hand.is_valid = true;
        hand.roi = Roi {
            cx: 160.0,
            cy: 120.0,
            w: 100.0,
            h: 100.0,
            rotation: 0.0,
        };
        hand.detection = DetectionBox {
            probability: 0.9,
            x_center: 160.0,
            y_center: 130.0,
            width: 40.0,
            height: 40.0,
            keypoints: [Point::new(160.0, 130.0); 7],
        };
        for (i, landmark) in hand.landmarks.iter_mut().enumerate() {
            *landmark = Point::new(0.2 + 0.03 * i as f32, 0.5);
        }

        DisplayInfo {
            report,
            ..DisplayInfo::default()
        }
    }

    #[test]
    fn test_default_overlay_draws_landmarks_only() {
        let renderer = Renderer::new(FrameBounds::new(320, 240));
        let mut target = Tally::new(320, 240);

        renderer.render(&mut target, &tracked_info()).unwrap();

        assert!(target.yellow > 0);
        assert_eq!(target.green, 0);
        assert_eq!(target.red, 0);
    }

    #[test]
    fn test_detection_overlay() {
        let renderer = Renderer::new(FrameBounds::new(320, 240));
        let mut target = Tally::new(320, 240);
        let mut info = tracked_info();
        info.overlay.detection = true;
        info.overlay.landmarks = false;

        renderer.render(&mut target, &info).unwrap();

        assert!(target.green > 0);
        assert!(target.red > 0);
        assert_eq!(target.yellow, 0);
    }

    #[test]
    fn test_no_hand_draws_text_only() {
        let renderer = Renderer::new(FrameBounds::new(320, 240));
        let mut target = Tally::new(320, 240);
        let mut info = tracked_info();
        info.report.hands[0].is_valid = false;
        info.report.finger_count = hand_shared::NO_HAND;

        renderer.render(&mut target, &info).unwrap();

        assert!(target.white > 0);
        assert_eq!(target.yellow, 0);
        assert_eq!(target.out_of_bounds, 0);
    }

    #[test]
    fn test_landmarks_at_edge_are_suppressed() {
        let renderer = Renderer::new(FrameBounds::new(320, 240));
        let mut target = Tally::new(320, 240);
        let mut info = tracked_info();
        // everything lands beyond the left edge
        info.report.hands[0].roi.cx = -200.0;

        renderer.render(&mut target, &info).unwrap();

        assert_eq!(target.yellow, 0);
        assert_eq!(target.out_of_bounds, 0);
    }
}
