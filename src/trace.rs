//! Raster-to-vector tracing for paletted pixel art.
//!
//! Emits one `<path>` per palette color whose subpaths are horizontal run
//! rectangles, with `shape-rendering="crispEdges"` so renderers keep block
//! borders hard. The fill colors come exclusively from the supplied
//! palette — the tracer never samples colors itself. Transparent pixels
//! produce no geometry.
use crate::error::EngineError;
use crate::image::RasterRgba;
use crate::types::Palette;
use serde::Deserialize;
use std::fmt::Write as FmtWrite;

/// Numeric tolerances of the tracer.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct TracerOptions {
    /// Output units per source pixel.
    pub scale: f32,
    /// Minimum interior run length emitted, in pixels. Never applied when
    /// it would drop a color's only geometry.
    pub filter_speckle: usize,
    /// Decimal places for path coordinates; 0 emits integers.
    pub path_precision: usize,
}

impl Default for TracerOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            filter_speckle: 0,
            path_precision: 0,
        }
    }
}

/// Trace `raster` into an SVG document using exactly the `palette` fills.
pub fn trace_raster(
    raster: &RasterRgba,
    palette: &Palette,
    options: &TracerOptions,
) -> Result<String, EngineError> {
    if raster.is_degenerate() {
        return Err(EngineError::Trace("empty raster".to_string()));
    }
    if options.scale <= 0.0 {
        return Err(EngineError::Trace(format!(
            "non-positive output scale {}",
            options.scale
        )));
    }

    let doc_w = raster.w as f32 * options.scale;
    let doc_h = raster.h as f32 * options.scale;
    let mut svg = String::new();
    writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {} {}\" shape-rendering=\"crispEdges\">",
        fmt_coord(doc_w, options.path_precision),
        fmt_coord(doc_h, options.path_precision),
    )
    .ok();

    let assignments = assign_palette(raster, palette);
    for (index, &color) in palette.colors.iter().enumerate() {
        let runs = index_runs(&assignments, raster.w, raster.h, index);
        if runs.is_empty() {
            continue;
        }
        let kept: Vec<&Run> = if options.filter_speckle > 1 {
            let filtered: Vec<&Run> = runs
                .iter()
                .filter(|r| r.len >= options.filter_speckle)
                .collect();
            if filtered.is_empty() {
                runs.iter().collect()
            } else {
                filtered
            }
        } else {
            runs.iter().collect()
        };

        let mut d = String::new();
        for run in kept {
            let x = run.x as f32 * options.scale;
            let y = run.y as f32 * options.scale;
            let w = run.len as f32 * options.scale;
            write!(
                d,
                "M{} {}h{}v{}h-{}z",
                fmt_coord(x, options.path_precision),
                fmt_coord(y, options.path_precision),
                fmt_coord(w, options.path_precision),
                fmt_coord(options.scale, options.path_precision),
                fmt_coord(w, options.path_precision),
            )
            .ok();
        }
        writeln!(svg, "  <path fill=\"#{}\" d=\"{}\" />", to_hex(color), d).ok();
    }

    svg.push_str("</svg>\n");
    Ok(svg)
}

/// Drop every `<path>` whose fill matches `color` from a traced document.
pub fn remove_fill(svg: &str, color: [u8; 4]) -> String {
    let needle = format!("fill=\"#{}\"", to_hex(color));
    svg.lines()
        .filter(|line| !line.contains(&needle))
        .map(|line| format!("{line}\n"))
        .collect()
}

/// Recover the palette actually present in a traced document by scanning
/// its fill attributes in document order.
pub fn palette_from_svg(svg: &str) -> Palette {
    let mut colors: Vec<[u8; 4]> = Vec::new();
    let mut rest = svg;
    while let Some(pos) = rest.find("fill=\"#") {
        let hex = &rest[pos + 7..];
        if hex.len() >= 6 {
            if let Some(color) = parse_hex(&hex[..6]) {
                if !colors.contains(&color) {
                    colors.push(color);
                }
            }
        }
        rest = &rest[pos + 7..];
    }
    Palette { colors }
}

struct Run {
    x: usize,
    y: usize,
    len: usize,
}

/// Assign every non-transparent pixel to its nearest palette entry. Pixels
/// that drifted off the palette (post-smoothing) still land on a supplied
/// fill; the tracer never invents colors.
fn assign_palette(raster: &RasterRgba, palette: &Palette) -> Vec<Option<usize>> {
    let entries: Vec<[u8; 3]> = palette
        .colors
        .iter()
        .map(|c| [c[0], c[1], c[2]])
        .collect();
    raster
        .pixels()
        .map(|px| {
            if px[3] == 0 {
                None
            } else {
                Some(crate::quant::nearest_index([px[0], px[1], px[2]], &entries))
            }
        })
        .collect()
}

fn index_runs(assignments: &[Option<usize>], w: usize, h: usize, index: usize) -> Vec<Run> {
    let mut runs = Vec::new();
    for y in 0..h {
        let row = &assignments[y * w..(y + 1) * w];
        let mut x = 0;
        while x < w {
            if row[x] != Some(index) {
                x += 1;
                continue;
            }
            let start = x;
            while x < w && row[x] == Some(index) {
                x += 1;
            }
            runs.push(Run {
                x: start,
                y,
                len: x - start,
            });
        }
    }
    runs
}

fn fmt_coord(v: f32, precision: usize) -> String {
    if precision == 0 {
        format!("{}", v.round() as i64)
    } else {
        format!("{v:.precision$}")
    }
}

fn to_hex(color: [u8; 4]) -> String {
    format!("{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

fn parse_hex(hex: &str) -> Option<[u8; 4]> {
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b, 255])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(w: usize, h: usize) -> RasterRgba {
        RasterRgba::from_fn(w, h, |x, y| {
            if (x + y) % 2 == 0 {
                [0, 0, 0, 255]
            } else {
                [255, 255, 255, 255]
            }
        })
    }

    #[test]
    fn two_color_checker_traces_two_paths() {
        let img = checker(16, 16);
        let palette = Palette::from_raster(&img);
        let svg = trace_raster(&img, &palette, &TracerOptions::default()).unwrap();
        assert_eq!(svg.matches("<path").count(), 2);
        assert_eq!(palette_from_svg(&svg).len(), 2);
    }

    #[test]
    fn transparent_pixels_emit_no_geometry() {
        let mut img = checker(4, 4);
        for px in img.data.chunks_exact_mut(4) {
            if px[0] == 255 {
                px.fill(0);
            }
        }
        let palette = Palette::from_raster(&img);
        let svg = trace_raster(&img, &palette, &TracerOptions::default()).unwrap();
        assert_eq!(svg.matches("<path").count(), 1);
        assert!(!svg.contains("ffffff"));
    }

    #[test]
    fn remove_fill_drops_exactly_one_path() {
        let img = checker(8, 8);
        let palette = Palette::from_raster(&img);
        let svg = trace_raster(&img, &palette, &TracerOptions::default()).unwrap();
        let stripped = remove_fill(&svg, [0, 0, 0, 255]);
        assert_eq!(stripped.matches("<path").count(), 1);
        assert_eq!(palette_from_svg(&stripped).len(), 1);
    }

    #[test]
    fn speckle_filter_never_drops_a_color_entirely() {
        let mut img = RasterRgba::from_fn(8, 1, |_, _| [10, 10, 10, 255]);
        img.set_pixel(7, 0, [200, 0, 0, 255]); // single-pixel color
        let palette = Palette::from_raster(&img);
        let options = TracerOptions {
            filter_speckle: 4,
            ..Default::default()
        };
        let svg = trace_raster(&img, &palette, &options).unwrap();
        assert!(svg.contains("c80000"), "lone color must survive");
    }

    #[test]
    fn scaled_output_keeps_proportions() {
        let img = checker(4, 2);
        let palette = Palette::from_raster(&img);
        let options = TracerOptions {
            scale: 10.0,
            ..Default::default()
        };
        let svg = trace_raster(&img, &palette, &options).unwrap();
        assert!(svg.contains("viewBox=\"0 0 40 20\""));
    }
}
