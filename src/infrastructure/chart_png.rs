// In-memory PNG rendering of the NDVI line chart
use crate::domain::artifact::Artifact;
use crate::domain::ndvi::NdviSeries;
use crate::infrastructure::config::ChartSettings;
use crate::infrastructure::export::ExportError;
use chrono::{Datelike, Duration, NaiveDate};
use plotters::prelude::*;
use plotters::style::register_font;
use std::io::Cursor;
use std::sync::OnceLock;

const MIN_WIDTH: u32 = 200;
const MIN_HEIGHT: u32 = 150;
const FONT_FAMILY: &str = "sans-serif";
const FONT_BYTES: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

static FONT_REGISTERED: OnceLock<bool> = OnceLock::new();

/// plotters' glyph backend only draws fonts registered by name
fn ensure_font() -> Result<(), ExportError> {
    let registered = *FONT_REGISTERED
        .get_or_init(|| register_font(FONT_FAMILY, FontStyle::Normal, FONT_BYTES).is_ok());
    if registered {
        Ok(())
    } else {
        Err(ExportError::Chart("embedded chart font could not be loaded".to_string()))
    }
}

/// x positions are whole days since `origin`, the first month start
struct Layout {
    origin: NaiveDate,
    x_end: i32,
    month_ticks: Vec<i32>,
    y_range: (f64, f64),
    segments: Vec<Vec<(i32, f64)>>,
}

fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

fn layout(series: &NdviSeries) -> Layout {
    let origin = series
        .records
        .iter()
        .map(|r| month_start(r.date))
        .min()
        .unwrap_or_default();
    let offset = |d: NaiveDate| (d - origin).num_days() as i32;

    let mut month_ticks: Vec<i32> = Vec::new();
    for record in &series.records {
        let tick = offset(month_start(record.date));
        if !month_ticks.contains(&tick) {
            month_ticks.push(tick);
        }
    }
    month_ticks.sort_unstable();

    let x_end = series
        .records
        .iter()
        .map(|r| offset(r.date))
        .max()
        .map_or(1, |max| max + 1);

    // Nulls split the line
    let mut segments = Vec::new();
    let mut current = Vec::new();
    for record in &series.records {
        match record.ndvi {
            Some(v) => current.push((offset(record.date), v)),
            None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }

    Layout {
        origin,
        x_end,
        month_ticks,
        y_range: y_range(series),
        segments,
    }
}

fn y_range(series: &NdviSeries) -> (f64, f64) {
    let values: Vec<f64> = series.records.iter().filter_map(|r| r.ndvi).collect();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if values.is_empty() {
        return (-1.0, 1.0);
    }

    let pad = ((max - min) * 0.1).max(0.05);
    let (lo, hi) = ((min - pad).max(-1.0), (max + pad).min(1.0));
    if lo < hi { (lo, hi) } else { (-1.0, 1.0) }
}

fn draw(
    layout: &Layout,
    title: &str,
    buffer: &mut [u8],
    size: (u32, u32),
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::with_buffer(buffer, size).into_drawing_area();
    root.fill(&WHITE)?;

    let (y_min, y_max) = layout.y_range;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT_FAMILY, 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(
            (0..layout.x_end).with_key_points(layout.month_ticks.clone()),
            y_min..y_max,
        )?;

    let origin = layout.origin;
    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("NDVI")
        .label_style((FONT_FAMILY, 14))
        .x_label_formatter(&|offset: &i32| {
            (origin + Duration::days(i64::from(*offset)))
                .format("%Y-%m")
                .to_string()
        })
        .draw()?;

    for segment in &layout.segments {
        chart.draw_series(LineSeries::new(segment.iter().copied(), BLUE.stroke_width(2)))?;
        chart.draw_series(
            segment
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 3, BLUE.filled())),
        )?;
    }

    root.present()?;
    Ok(())
}

/// Render the series as a single line+marker chart, PNG encoded in memory
pub fn render_png(series: &NdviSeries, settings: &ChartSettings) -> Result<Artifact, ExportError> {
    let width = settings.width.max(MIN_WIDTH);
    let height = settings.height.max(MIN_HEIGHT);
    let mut buffer = vec![0u8; width as usize * height as usize * 3];

    ensure_font()?;
    draw(&layout(series), &settings.title, &mut buffer, (width, height))
        .map_err(|e| ExportError::Chart(e.to_string()))?;

    let bitmap = image::RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| ExportError::Chart("bitmap size mismatch".to_string()))?;
    let mut png = Vec::new();
    bitmap.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;

    Ok(Artifact::png(png))
}
