use std::path::Path;

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgb, RgbImage};
use tracing::{info, warn};

use crate::config::constants::*;
use crate::error::ExportError;
use crate::utils::logging::{self, ExportType, OperationCategory};

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
const AXIS: Rgb<u8> = Rgb([40, 40, 40]);
const TEXT: Rgb<u8> = Rgb([20, 20, 20]);

const GLYPH_SIZE: u32 = 8;
const TICK_GAP: i64 = 6;

// Diverging blue-grey-red ramp endpoints
const COOL: [f64; 3] = [59.0, 76.0, 192.0];
const NEUTRAL: [f64; 3] = [221.0, 221.0, 221.0];
const WARM: [f64; 3] = [180.0, 4.0, 38.0];

/// Data range of one axis, padded so edge points are not clipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn from_values(values: impl Iterator<Item = f64>) -> Option<Self> {
        let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
        for v in values.filter(|v| v.is_finite()) {
            min = min.min(v);
            max = max.max(v);
        }
        if !min.is_finite() {
            return None;
        }
        if max - min == 0.0 {
            return Some(Self { min: min - 1.0, max: max + 1.0 });
        }
        let pad = (max - min) * 0.05;
        Some(Self { min: min - pad, max: max + pad })
    }

    /// Position of `v` within the range, 0.0 at `min` and 1.0 at `max`.
    pub fn fraction(&self, v: f64) -> f64 {
        ((v - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

/// Cool-to-warm color for `t` in [0, 1].
pub fn coolwarm(t: f64) -> Rgb<u8> {
    let t = t.clamp(0.0, 1.0);
    let (from, to, s) = if t < 0.5 {
        (COOL, NEUTRAL, t * 2.0)
    } else {
        (NEUTRAL, WARM, (t - 0.5) * 2.0)
    };
    let channel = |i: usize| (from[i] + (to[i] - from[i]) * s).round() as u8;
    Rgb([channel(0), channel(1), channel(2)])
}

fn plot_area() -> (u32, u32, u32, u32) {
    (
        PLOT_MARGIN_LEFT,
        PLOT_WIDTH - PLOT_MARGIN_RIGHT,
        PLOT_MARGIN_TOP,
        PLOT_HEIGHT - PLOT_MARGIN_BOTTOM,
    )
}

/// Pixel width of `text` drawn with the 8x8 font at `scale`.
pub fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * GLYPH_SIZE * scale
}

/// Draws `text` with its top-left corner at (x, y). Pixels off the image are
/// dropped; characters outside basic Latin render as '?'.
fn draw_text(img: &mut RgbImage, x: i64, y: i64, text: &str, scale: u32, color: Rgb<u8>) {
    let (w, h) = img.dimensions();
    let step = (GLYPH_SIZE * scale) as i64;
    for (i, c) in text.chars().enumerate() {
        let Some(glyph) = BASIC_FONTS.get(c).or_else(|| BASIC_FONTS.get('?')) else {
            continue;
        };
        let gx = x + i as i64 * step;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                if *bits & (1u8 << col) == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let px = gx + (col * scale + dx) as i64;
                        let py = y + (row as u32 * scale + dy) as i64;
                        if px >= 0 && py >= 0 && px < w as i64 && py < h as i64 {
                            img.put_pixel(px as u32, py as u32, color);
                        }
                    }
                }
            }
        }
    }
}

fn draw_text_centered(img: &mut RgbImage, center_x: i64, y: i64, text: &str, scale: u32) {
    let x = center_x - text_width(text, scale) as i64 / 2;
    draw_text(img, x, y, text, scale, TEXT);
}

fn draw_labels(img: &mut RgbImage) {
    let (left, right, top, bottom) = plot_area();
    draw_text_centered(img, PLOT_WIDTH as i64 / 2, 20, PLOT_TITLE, 2);
    draw_text(img, left as i64, top as i64 - 16, PLOT_Y_LABEL, 1, TEXT);
    draw_text_centered(img, (left + right) as i64 / 2, bottom as i64 + 36, PLOT_X_LABEL, 2);
}

fn draw_ticks(img: &mut RgbImage, x_range: &AxisRange, y_range: &AxisRange) {
    let (left, right, top, bottom) = plot_area();
    for i in 0..=PLOT_GRID_DIVISIONS {
        let share = i as f64 / PLOT_GRID_DIVISIONS as f64;

        let gx = left + (right - left) * i / PLOT_GRID_DIVISIONS;
        let x_value = x_range.min + (x_range.max - x_range.min) * share;
        draw_text_centered(img, gx as i64, bottom as i64 + TICK_GAP + 2, &format!("{:.2}", x_value), 1);

        let gy = bottom - (bottom - top) * i / PLOT_GRID_DIVISIONS;
        let y_label = format!("{:.0}", y_range.min + (y_range.max - y_range.min) * share);
        let lx = left as i64 - TICK_GAP - text_width(&y_label, 1) as i64;
        draw_text(img, lx, gy as i64 - GLYPH_SIZE as i64 / 2, &y_label, 1, TEXT);
    }
}

/// Center of the `index`-th legend marker, counted from the top.
fn legend_marker_center(index: u32) -> (f64, f64) {
    let (_, right, top, _) = plot_area();
    let x = right as f64 + 24.0 + PLOT_MAX_POINT_RADIUS;
    let y = top as f64 + 30.0 + index as f64 * 30.0;
    (x, y)
}

/// Sample markers for the highest, middle and lowest gain, sized and
/// colored the way the data points are.
fn draw_legend(img: &mut RgbImage, gain_range: &AxisRange, gains: (f64, f64)) {
    let (_, right, top, _) = plot_area();
    draw_text(img, right as i64 + 24, top as i64, PLOT_LEGEND_TITLE, 1, TEXT);

    let (low, high) = gains;
    for (index, value) in [high, (low + high) / 2.0, low].into_iter().enumerate() {
        let t = gain_range.fraction(value);
        let (cx, cy) = legend_marker_center(index as u32);
        draw_marker(img, cx, cy, t);
        let label_x = (cx + PLOT_MAX_POINT_RADIUS + 10.0) as i64;
        draw_text(img, label_x, cy as i64 - GLYPH_SIZE as i64 / 2, &format!("{:.0}", value), 1, TEXT);
    }
}

/// Maps data coordinates to pixel coordinates (y grows downward).
pub fn to_pixel(x: f64, y: f64, x_range: &AxisRange, y_range: &AxisRange) -> (f64, f64) {
    let (left, right, top, bottom) = plot_area();
    let px = left as f64 + x_range.fraction(x) * (right - left) as f64;
    let py = bottom as f64 - y_range.fraction(y) * (bottom - top) as f64;
    (px, py)
}

fn draw_grid(img: &mut RgbImage) {
    let (left, right, top, bottom) = plot_area();
    for i in 0..=PLOT_GRID_DIVISIONS {
        let gx = left + (right - left) * i / PLOT_GRID_DIVISIONS;
        let gy = top + (bottom - top) * i / PLOT_GRID_DIVISIONS;
        for y in top..=bottom {
            img.put_pixel(gx, y, GRID);
        }
        for x in left..=right {
            img.put_pixel(x, gy, GRID);
        }
    }
    for x in left..=right {
        img.put_pixel(x, bottom, AXIS);
        img.put_pixel(x, top, AXIS);
    }
    for y in top..=bottom {
        img.put_pixel(left, y, AXIS);
        img.put_pixel(right, y, AXIS);
    }
}

fn draw_disc(img: &mut RgbImage, cx: f64, cy: f64, radius: f64, color: Rgb<u8>) {
    let (w, h) = img.dimensions();
    let x0 = (cx - radius).floor().max(0.0) as u32;
    let x1 = ((cx + radius).ceil() as u32).min(w - 1);
    let y0 = (cy - radius).floor().max(0.0) as u32;
    let y1 = ((cy + radius).ceil() as u32).min(h - 1);
    let r2 = radius * radius;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            if dx * dx + dy * dy <= r2 {
                img.put_pixel(x, y, color);
            }
        }
    }
}

/// Renders CO2 intensity (x) against PV gain (y) with title, axis labels,
/// tick values and a gain legend. Marker size and color both scale with PV
/// gain. Points with non-finite coordinates are skipped.
pub fn render_scatter(points: &[(f64, f64)]) -> RgbImage {
    let mut img = RgbImage::from_pixel(PLOT_WIDTH, PLOT_HEIGHT, BACKGROUND);
    draw_grid(&mut img);
    draw_labels(&mut img);

    let finite: Vec<(f64, f64)> = points
        .iter()
        .copied()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    let (Some(x_range), Some(y_range)) = (
        AxisRange::from_values(finite.iter().map(|p| p.0)),
        AxisRange::from_values(finite.iter().map(|p| p.1)),
    ) else {
        return img;
    };
    let gain_range = AxisRange::from_values(finite.iter().map(|p| p.1)).unwrap_or(y_range);

    // Smallest markers first so large ones stay visible on top.
    let mut ordered = finite;
    ordered.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    let gains = (ordered[0].1, ordered[ordered.len() - 1].1);
    draw_ticks(&mut img, &x_range, &y_range);
    draw_legend(&mut img, &gain_range, gains);
    for (x, y) in ordered {
        let (px, py) = to_pixel(x, y, &x_range, &y_range);
        draw_marker(&mut img, px, py, gain_range.fraction(y));
    }
    img
}

/// Outlined disc whose radius and color both follow `t` in [0, 1].
fn draw_marker(img: &mut RgbImage, cx: f64, cy: f64, t: f64) {
    let radius = PLOT_MIN_POINT_RADIUS + t * (PLOT_MAX_POINT_RADIUS - PLOT_MIN_POINT_RADIUS);
    draw_disc(img, cx, cy, radius + 1.0, AXIS);
    draw_disc(img, cx, cy, radius, coolwarm(t));
}

pub fn save_scatter_plot(points: &[(f64, f64)], path: impl AsRef<Path>) -> Result<(), ExportError> {
    let _timing = logging::start_timing("save_scatter_plot",
        OperationCategory::Export { subcategory: ExportType::Plot });

    if points.is_empty() {
        warn!("no points to plot; writing empty axes");
    }
    let img = render_scatter(points);
    img.save(path.as_ref())?;
    info!(points = points.len(), path = %path.as_ref().display(), "wrote scatter plot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_endpoints() {
        assert_eq!(coolwarm(0.0), Rgb([59, 76, 192]));
        assert_eq!(coolwarm(0.5), Rgb([221, 221, 221]));
        assert_eq!(coolwarm(1.0), Rgb([180, 4, 38]));
        assert_eq!(coolwarm(7.0), coolwarm(1.0));
    }

    #[test]
    fn degenerate_range_is_widened() {
        let r = AxisRange::from_values([3.0, 3.0].into_iter()).unwrap();
        assert_eq!(r, AxisRange { min: 2.0, max: 4.0 });
        assert_eq!(AxisRange::from_values([f64::NAN].into_iter()), None);
    }

    #[test]
    fn pixel_mapping_is_inside_plot_area() {
        let xr = AxisRange { min: 0.0, max: 2.0 };
        let yr = AxisRange { min: -100.0, max: 100.0 };
        let (left, right, top, bottom) = plot_area();
        assert_eq!(to_pixel(0.0, -100.0, &xr, &yr), (left as f64, bottom as f64));
        assert_eq!(to_pixel(2.0, 100.0, &xr, &yr), (right as f64, top as f64));
    }

    #[test]
    fn highest_gain_point_is_warm() {
        let points = [(0.9, -500.0), (1.1, 4000.0), (1.4, 12_000.0)];
        let img = render_scatter(&points);
        let xr = AxisRange::from_values(points.iter().map(|p| p.0)).unwrap();
        let yr = AxisRange::from_values(points.iter().map(|p| p.1)).unwrap();
        let (px, py) = to_pixel(1.4, 12_000.0, &xr, &yr);
        let pixel = img.get_pixel(px.round() as u32, py.round() as u32);
        assert_eq!(*pixel, coolwarm(yr.fraction(12_000.0)));
    }

    fn has_ink(img: &RgbImage, x0: u32, y0: u32, x1: u32, y1: u32) -> bool {
        (y0..y1).any(|y| (x0..x1).any(|x| *img.get_pixel(x, y) != BACKGROUND))
    }

    #[test]
    fn glyphs_draw_only_where_set() {
        let mut img = RgbImage::from_pixel(32, 16, BACKGROUND);
        draw_text(&mut img, 0, 0, " ", 2, TEXT);
        assert!(!has_ink(&img, 0, 0, 32, 16));
        draw_text(&mut img, 0, 0, "A", 2, TEXT);
        assert!(has_ink(&img, 0, 0, 16, 16));
        assert!(!has_ink(&img, 16, 0, 32, 16));
        assert_eq!(text_width("PV Gain", 2), 7 * 16);
    }

    #[test]
    fn text_off_the_image_is_clipped() {
        let mut img = RgbImage::from_pixel(10, 10, BACKGROUND);
        draw_text(&mut img, -4, -4, "WW", 3, TEXT);
        draw_text(&mut img, 8, 8, "W", 3, TEXT);
        assert!(has_ink(&img, 0, 0, 10, 10));
    }

    #[test]
    fn margins_carry_title_axis_labels_and_ticks() {
        let img = render_scatter(&[(0.9, -500.0), (1.1, 4000.0), (1.4, 12_000.0)]);
        let (left, right, top, bottom) = plot_area();
        // title
        assert!(has_ink(&img, 0, 0, PLOT_WIDTH, top - 20));
        // x tick values and axis label
        assert!(has_ink(&img, left, bottom + 2, right, bottom + 20));
        assert!(has_ink(&img, left, bottom + 30, right, PLOT_HEIGHT));
        // y tick values
        assert!(has_ink(&img, 0, top, left - 2, bottom));
    }

    #[test]
    fn empty_plot_keeps_labels_but_no_legend() {
        let img = render_scatter(&[]);
        let (_, right, top, bottom) = plot_area();
        assert!(has_ink(&img, 0, 0, PLOT_WIDTH, top - 20));
        assert!(!has_ink(&img, right + 2, top, PLOT_WIDTH, bottom));
    }

    #[test]
    fn legend_spans_the_gain_colors() {
        let points = [(0.9, -500.0), (1.1, 4000.0), (1.4, 12_000.0)];
        let img = render_scatter(&points);
        let gains = AxisRange::from_values(points.iter().map(|p| p.1)).unwrap();
        let (hx, hy) = legend_marker_center(0);
        let (lx, ly) = legend_marker_center(2);
        assert_eq!(*img.get_pixel(hx as u32, hy as u32), coolwarm(gains.fraction(12_000.0)));
        assert_eq!(*img.get_pixel(lx as u32, ly as u32), coolwarm(gains.fraction(-500.0)));
    }

    #[test]
    fn writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.png");
        save_scatter_plot(&[(1.0, 2.0), (2.0, 3.0)], &path).unwrap();
        let loaded = image::open(&path).unwrap();
        assert_eq!(loaded.width(), PLOT_WIDTH);
        assert_eq!(loaded.height(), PLOT_HEIGHT);
    }
}
