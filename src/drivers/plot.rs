use std::io::Cursor;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use log::warn;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use crate::drivers::aggregate::AggregateCurve;
use crate::drivers::align::AlignedTrial;
use crate::drivers::error::AnalysisError;
/// Canvas size and font scaling derived from a figure size in inches and a DPI.
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub dpi: u32,
    pub background: RGBColor,
}
impl PlotStyle {
    pub fn from_figure(inches: (f64, f64), dpi: u32) -> Self {
        Self {
            width: (inches.0 * dpi as f64).round().max(1.0) as u32,
            height: (inches.1 * dpi as f64).round().max(1.0) as u32,
            dpi,
            background: WHITE,
        }
    }
    /// Converts a length in points (fonts, line widths) to pixels.
    fn px(&self, points: f64) -> u32 {
        (points * self.dpi as f64 / 72.0).round().max(1.0) as u32
    }
    fn font(&self, points: f64) -> (&'static str, i32) {
        ("sans-serif", self.px(points) as i32)
    }
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self::from_figure((16.0, 10.0), 100)
    }
}
/// A shaded frequency band on the response chart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub label: String,
    pub color: String,
    pub from_hz: f64,
    pub to_hz: f64,
}
/// Static decorations of a frequency-response chart.
#[derive(Clone, Debug)]
pub struct ResponseChart<'a> {
    pub title: &'a str,
    pub x_range_hz: (f64, f64),
    pub y_range_db: (f64, f64),
    pub benchmark_db: Option<f64>,
    pub bands: &'a [Band],
    /// Curve drawn with a heavier line.
    pub accent: Option<&'a str>,
}
/// Aligned peak-to-peak traces plus their percentage difference to the reference.
#[derive(Clone, Debug)]
pub struct PeakChart<'a> {
    pub title: &'a str,
    pub x_range_secs: (f64, f64),
    pub trials: &'a [AlignedTrial],
    /// `None` marks the reference trial.
    pub differences: &'a [Option<f64>],
}
/// Resolves matplotlib-style colour names and `#rrggbb` strings.
pub fn parse_color(name: &str) -> Option<RGBColor> {
    let name = name.trim().to_ascii_lowercase();
    if let Some(hex) = name.strip_prefix('#') {
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        return Some(RGBColor(channel(0)?, channel(2)?, channel(4)?));
    }
    let rgb = match name.as_str() {
        "black" => (0, 0, 0),
        "white" => (255, 255, 255),
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        "blue" => (0, 0, 255),
        "orange" => (255, 165, 0),
        "purple" => (128, 0, 128),
        "royalblue" => (65, 105, 225),
        "gray" | "grey" => (128, 128, 128),
        "cyan" => (0, 255, 255),
        "magenta" => (255, 0, 255),
        "yellow" => (255, 255, 0),
        "brown" => (165, 42, 42),
        _ => return None,
    };
    Some(RGBColor(rgb.0, rgb.1, rgb.2))
}
fn color_or_black(name: &str) -> RGBColor {
    parse_color(name).unwrap_or_else(|| {
        warn!("unknown colour '{name}', drawing in black");
        BLACK
    })
}
/// Short dashes along a horizontal line.
fn dashes(x_range: (f64, f64), y: f64, dash: f64) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut x = x_range.0;
    while x < x_range.1 {
        let end = (x + dash).min(x_range.1);
        segments.push(vec![(x, y), (end, y)]);
        x += dash * 2.0;
    }
    segments
}
/// Same as [`dashes`] for a log-scaled axis: dash length is a ratio, not a width.
fn log_dashes(x_range: (f64, f64), y: f64, ratio: f64) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut x = x_range.0;
    while x < x_range.1 {
        let end = (x * ratio).min(x_range.1);
        segments.push(vec![(x, y), (end, y)]);
        x *= ratio * ratio;
    }
    segments
}
/// `(frequency, mean, std)` triples inside the plotted frequency range.
fn visible_points(
    curve: &AggregateCurve,
    x0: f64,
    x1: f64,
) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
    curve
        .frequencies_hz
        .iter()
        .zip(curve.mean_db.iter().zip(&curve.std_db))
        .map(|(&f, (&m, &s))| (f, m, s))
        .filter(move |&(f, _, _)| f >= x0 && f <= x1)
}
pub fn render_frequency_response_png(
    curves: &[AggregateCurve],
    opts: &ResponseChart<'_>,
    style: &PlotStyle,
) -> Result<Vec<u8>, AnalysisError> {
    if curves.is_empty() {
        return Err(AnalysisError::Plot("no curves to draw".into()));
    }
    let (x0, x1) = opts.x_range_hz;
    if x0 <= 0.0 || x1 <= x0 {
        return Err(AnalysisError::Plot(format!(
            "invalid log-scale frequency range {x0}..{x1}"
        )));
    }
    let (y0, y1) = opts.y_range_db;
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(style.px(10.0))
            .caption(opts.title, style.font(25.0))
            .set_label_area_size(LabelAreaPosition::Left, style.px(40.0))
            .set_label_area_size(LabelAreaPosition::Bottom, style.px(32.0))
            .build_cartesian_2d((x0..x1).log_scale(), y0..y1)?;
        chart
            .configure_mesh()
            .x_desc("Frequency (Hz)")
            .y_desc("Amplitude (dB)")
            .label_style(style.font(12.0))
            .axis_desc_style(style.font(14.0))
            .light_line_style(&BLACK.mix(0.05))
            .bold_line_style(&BLACK.mix(0.2))
            .draw()?;
        for band in opts.bands {
            let color = color_or_black(&band.color);
            let (from, to) = (band.from_hz.max(x0), band.to_hz.min(x1));
            if from >= to {
                continue;
            }
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(from, y0), (to, y1)],
                    color.mix(0.2).filled(),
                )))?
                .label(band.label.clone())
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 6), (x + 20, y + 6)], color.mix(0.2).filled())
                });
        }
        if let Some(level) = opts.benchmark_db {
            let stroke = RGBColor(128, 0, 128).stroke_width(style.px(2.0));
            chart
                .draw_series(
                    log_dashes((x0, x1), level, 1.08)
                        .into_iter()
                        .map(move |segment| PathElement::new(segment, stroke)),
                )?
                .label(format!("Benchmark ({level} dB)"))
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], stroke));
        }
        for curve in curves {
            let color = color_or_black(&curve.color);
            let mut band: Vec<(f64, f64)> = visible_points(curve, x0, x1)
                .map(|(f, m, s)| (f, m + s))
                .collect();
            let lower: Vec<(f64, f64)> = visible_points(curve, x0, x1)
                .map(|(f, m, s)| (f, m - s))
                .collect();
            band.extend(lower.into_iter().rev());
            if band.len() > 2 {
                chart.draw_series(std::iter::once(Polygon::new(band, color.mix(0.2).filled())))?;
            }
            let width = if opts.accent == Some(curve.label.as_str()) {
                style.px(5.0)
            } else {
                style.px(2.0)
            };
            let stroke = color.stroke_width(width);
            chart
                .draw_series(LineSeries::new(
                    visible_points(curve, x0, x1).map(|(f, m, _)| (f, m)),
                    stroke,
                ))?
                .label(curve.label.clone())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], stroke));
        }
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::LowerLeft)
            .label_font(style.font(18.0))
            .border_style(&BLACK.mix(0.3))
            .background_style(&WHITE.mix(0.8))
            .draw()?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
pub fn render_peak_comparison_png(
    opts: &PeakChart<'_>,
    style: &PlotStyle,
) -> Result<Vec<u8>, AnalysisError> {
    if opts.trials.is_empty() {
        return Err(AnalysisError::Plot("no trials to draw".into()));
    }
    let (x0, x1) = opts.x_range_secs;
    if x1 <= x0 {
        return Err(AnalysisError::Plot(format!("invalid time range {x0}..{x1}")));
    }
    let y_max = opts
        .trials
        .iter()
        .flat_map(|a| a.trial.values.iter().copied())
        .max()
        .unwrap_or(0)
        .max(1) as f64
        * 1.1;
    let y_min = opts
        .trials
        .iter()
        .flat_map(|a| a.trial.values.iter().copied())
        .min()
        .unwrap_or(0)
        .min(0) as f64;
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(style.px(10.0))
            .caption(opts.title, style.font(22.0))
            .set_label_area_size(LabelAreaPosition::Left, style.px(40.0))
            .set_label_area_size(LabelAreaPosition::Bottom, style.px(32.0))
            .build_cartesian_2d(x0..x1, y_min..y_max)?;
        chart
            .configure_mesh()
            .x_desc("Time (s)")
            .y_desc("Amplitude")
            .label_style(style.font(12.0))
            .axis_desc_style(style.font(18.0))
            .light_line_style(&BLACK.mix(0.05))
            .bold_line_style(&BLACK.mix(0.2))
            .draw()?;
        for (idx, aligned) in opts.trials.iter().enumerate() {
            let trial = &aligned.trial;
            let color = color_or_black(&trial.color);
            let trace = color.mix(0.7).stroke_width(style.px(2.0));
            let series = trial
                .timestamps
                .iter()
                .zip(&trial.values)
                .filter(|&(&t, _)| t >= x0 && t <= x1)
                .map(|(&t, &v)| (t, v as f64));
            chart
                .draw_series(LineSeries::new(series, trace))?
                .label(trial.label.clone())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], trace));
            let mean_label = match opts.differences.get(idx).copied().flatten() {
                Some(diff) => format!("{:.2} ({diff:.2}%)", trial.mean),
                None => format!("{:.2}", trial.mean),
            };
            let mean_stroke = color.stroke_width(style.px(4.0));
            chart
                .draw_series(
                    dashes((x0, x1), trial.mean, (x1 - x0) / 80.0)
                        .into_iter()
                        .map(move |segment| PathElement::new(segment, mean_stroke)),
                )?
                .label(mean_label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], mean_stroke));
        }
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .label_font(style.font(16.0))
            .border_style(&BLACK.mix(0.3))
            .background_style(&WHITE.mix(0.8))
            .draw()?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, AnalysisError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| AnalysisError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
