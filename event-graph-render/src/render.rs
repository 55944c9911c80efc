//! Diagram rendering
//!
//! Assembles the whole diagram as one SVG document (string assembly, no
//! scene graph), then rasterizes it with usvg/resvg and writes a PNG. The
//! canvas bounding box is auto-fit to the layout circle plus every legend
//! text item.
//!
//! The PNG is written to a temporary sibling path and renamed into place on
//! success, so a failed run never leaves a half-written image behind.

use crate::config::RenderConfig;
use crate::graph::{EventGraph, EDGE_WEIGHT, EVENTS_EXT, EVENTS_INT};
use crate::layout::Layout;
use crate::legend::{HAlign, TextItem, TEXT_SIZE};
use crate::types::{Point, RenderError, Result};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

/// World-unit inset of the dotted cancellation overlay from the source node
const DOTTED_INSET: f64 = 0.16;
/// World units trimmed off the far end of the dotted overlay
const DOTTED_TRIM: f64 = 0.22;
/// Distance of the delay marker from a node center toward the sink
const DELAY_MARKER_INSET: f64 = 0.16;
/// Upward shift of the delay marker
const DELAY_MARKER_RAISE: f64 = 0.05;
/// Sideways bow between parallel edges, in world units
const PARALLEL_EDGE_BOW: f64 = 0.15;
/// Extra margin around the fitted bounding box, in world units
const CANVAS_MARGIN: f64 = 0.15;
/// Line height multiplier for multi-line node labels
const LABEL_LINE_HEIGHT: f64 = 1.15;
/// Rough glyph width as a fraction of font size, for bounding-box fitting
const GLYPH_ASPECT: f64 = 0.6;

/// World-to-pixel transform for the fitted bounding box
#[derive(Debug, Clone, Copy)]
struct Canvas {
    scale: f64,
    min_x: f64,
    max_y: f64,
    width: f64,
    height: f64,
}

impl Canvas {
    /// Fit the canvas around every node circle and text item
    fn fit(layout: &Layout, items: &[TextItem], config: &RenderConfig) -> Canvas {
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        let reach = config.node_radius.max(DOTTED_INSET) + TEXT_SIZE;
        for (_, position) in layout.iter() {
            min_x = min_x.min(position.x - reach);
            max_x = max_x.max(position.x + reach);
            min_y = min_y.min(position.y - reach);
            max_y = max_y.max(position.y + reach);
        }

        for item in items {
            // Estimate the text extent from the glyph count; good enough
            // for fitting, the exact width depends on the rasterizer font.
            let width = item.text.chars().count() as f64 * item.size * GLYPH_ASPECT;
            let (left, right) = match item.halign {
                HAlign::Left => (item.x, item.x + width),
                HAlign::Center => (item.x - width / 2.0, item.x + width / 2.0),
                HAlign::Right => (item.x - width, item.x),
            };
            min_x = min_x.min(left);
            max_x = max_x.max(right);
            min_y = min_y.min(item.y - item.size);
            max_y = max_y.max(item.y + item.size);
        }

        if !min_x.is_finite() {
            // Nothing to draw; fall back to the unit square.
            min_x = -1.0;
            max_x = 1.0;
            min_y = -1.0;
            max_y = 1.0;
        }

        min_x -= CANVAS_MARGIN;
        max_x += CANVAS_MARGIN;
        min_y -= CANVAS_MARGIN;
        max_y += CANVAS_MARGIN;

        Canvas {
            scale: config.scale,
            min_x,
            max_y,
            width: ((max_x - min_x) * config.scale).max(1.0),
            height: ((max_y - min_y) * config.scale).max(1.0),
        }
    }

    /// Map a world point to pixel coordinates (y axis flips)
    fn to_px(&self, point: Point) -> (f64, f64) {
        (
            (point.x - self.min_x) * self.scale,
            (self.max_y - point.y) * self.scale,
        )
    }

    fn px(&self, world: f64) -> f64 {
        world * self.scale
    }
}

/// Render the laid-out graph and legend items into an SVG document
pub fn render_svg(
    graph: &EventGraph,
    layout: &Layout,
    items: &[TextItem],
    config: &RenderConfig,
) -> Result<String> {
    let canvas = Canvas::fit(layout, items, config);
    let mut svg = String::new();

    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{:.0}\" height=\"{:.0}\" viewBox=\"0 0 {:.0} {:.0}\">",
        canvas.width, canvas.height, canvas.width, canvas.height
    );

    svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>");

    // Arrowhead marker, scaled from the configured arrow size.
    let marker_size = config.arrow_size * 0.3;
    let _ = write!(
        svg,
        "<defs><marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" \
         markerWidth=\"{marker_size:.1}\" markerHeight=\"{marker_size:.1}\" \
         orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{}\"/></marker></defs>",
        config.edge_color
    );

    draw_edges(&mut svg, graph, layout, &canvas, config)?;
    draw_cancellation_overlay(&mut svg, layout, &canvas, config)?;
    draw_nodes(&mut svg, layout, &canvas, config);
    draw_node_labels(&mut svg, layout, &canvas, config);
    for item in items {
        draw_text_item(&mut svg, item, &canvas, config);
    }
    draw_delay_markers(&mut svg, layout, &canvas, config)?;

    svg.push_str("</svg>");
    Ok(svg)
}

fn draw_edges(
    svg: &mut String,
    graph: &EventGraph,
    layout: &Layout,
    canvas: &Canvas,
    config: &RenderConfig,
) -> Result<()> {
    // Count parallel edges so later duplicates bow outward.
    let mut seen: HashMap<(String, String), usize> = HashMap::new();

    for (source, target, weight) in graph.edges() {
        let occurrence = seen
            .entry((source.to_string(), target.to_string()))
            .and_modify(|count| *count += 1)
            .or_insert(0);
        let stroke = config.edge_width * weight / EDGE_WEIGHT;

        let src = layout.get(source)?;
        let dst = layout.get(target)?;

        if source == target {
            draw_self_loop(svg, src, canvas, config, stroke);
            continue;
        }

        let distance = src.distance(dst);
        let angle = src.angle_to(dst);
        let (ux, uy) = (angle.cos(), angle.sin());
        // Pull endpoints in to the node boundary unless the nodes overlap.
        let trim = if distance > 2.0 * config.node_radius {
            config.node_radius
        } else {
            0.0
        };
        let start = Point::new(src.x + ux * trim, src.y + uy * trim);
        let end = Point::new(dst.x - ux * trim, dst.y - uy * trim);

        let (sx, sy) = canvas.to_px(start);
        let (ex, ey) = canvas.to_px(end);

        if *occurrence == 0 {
            let _ = write!(
                svg,
                "<path d=\"M {sx:.2} {sy:.2} L {ex:.2} {ey:.2}\" fill=\"none\" stroke=\"{}\" \
                 stroke-width=\"{stroke:.2}\" marker-end=\"url(#arrow)\"/>",
                config.edge_color
            );
        } else {
            // Quadratic bow; the curve passes at half the control offset.
            let bow = PARALLEL_EDGE_BOW * *occurrence as f64 * 2.0;
            let mid = start.midpoint(end);
            let control = Point::new(mid.x - uy * bow, mid.y + ux * bow);
            let (cx, cy) = canvas.to_px(control);
            let _ = write!(
                svg,
                "<path d=\"M {sx:.2} {sy:.2} Q {cx:.2} {cy:.2} {ex:.2} {ey:.2}\" fill=\"none\" \
                 stroke=\"{}\" stroke-width=\"{stroke:.2}\" marker-end=\"url(#arrow)\"/>",
                config.edge_color
            );
        }
    }

    Ok(())
}

fn draw_self_loop(
    svg: &mut String,
    center: Point,
    canvas: &Canvas,
    config: &RenderConfig,
    stroke: f64,
) {
    let r = config.node_radius;
    let start = Point::new(center.x + r * 0.5, center.y + r);
    let end = Point::new(center.x - r * 0.5, center.y + r);
    let c1 = Point::new(center.x + r * 2.0, center.y + r * 3.0);
    let c2 = Point::new(center.x - r * 2.0, center.y + r * 3.0);
    let (sx, sy) = canvas.to_px(start);
    let (ex, ey) = canvas.to_px(end);
    let (c1x, c1y) = canvas.to_px(c1);
    let (c2x, c2y) = canvas.to_px(c2);
    let _ = write!(
        svg,
        "<path d=\"M {sx:.2} {sy:.2} C {c1x:.2} {c1y:.2} {c2x:.2} {c2y:.2} {ex:.2} {ey:.2}\" \
         fill=\"none\" stroke=\"{}\" stroke-width=\"{stroke:.2}\" marker-end=\"url(#arrow)\"/>",
        config.edge_color
    );
}

/// Overdraw the external-to-internal cancellation edge with a dotted line
fn draw_cancellation_overlay(
    svg: &mut String,
    layout: &Layout,
    canvas: &Canvas,
    config: &RenderConfig,
) -> Result<()> {
    let ext = layout.get(EVENTS_EXT)?;
    let int = layout.get(EVENTS_INT)?;

    let angle = ext.angle_to(int);
    let length = ext.distance(int);
    let (ux, uy) = (angle.cos(), angle.sin());
    let start = Point::new(ext.x + DOTTED_INSET * ux, ext.y + DOTTED_INSET * uy);
    let end = Point::new(
        ext.x + (length - DOTTED_TRIM) * ux,
        ext.y + (length - DOTTED_TRIM) * uy,
    );

    let (sx, sy) = canvas.to_px(start);
    let (ex, ey) = canvas.to_px(end);
    let width = config.edge_width + 1.0;
    let _ = write!(
        svg,
        "<path d=\"M {ex:.2} {ey:.2} L {sx:.2} {sy:.2}\" fill=\"none\" stroke=\"#ffffff\" \
         stroke-width=\"{width:.2}\" stroke-dasharray=\"2 8\" stroke-linecap=\"round\"/>"
    );
    Ok(())
}

fn draw_nodes(svg: &mut String, layout: &Layout, canvas: &Canvas, config: &RenderConfig) {
    let radius = canvas.px(config.node_radius);
    for (_, position) in layout.iter() {
        let (cx, cy) = canvas.to_px(position);
        let _ = write!(
            svg,
            "<circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{radius:.2}\" fill=\"{}\" \
             fill-opacity=\"{:.2}\"/>",
            config.node_color, config.node_alpha
        );
    }
}

fn draw_node_labels(svg: &mut String, layout: &Layout, canvas: &Canvas, config: &RenderConfig) {
    let font = canvas.px(TEXT_SIZE);
    let line_height = font * LABEL_LINE_HEIGHT;

    for (label, position) in layout.iter() {
        let (cx, cy) = canvas.to_px(position);
        let lines: Vec<&str> = label.split('\n').collect();
        let _ = write!(
            svg,
            "<text text-anchor=\"middle\" font-family=\"{}\" font-size=\"{font:.2}\" fill=\"#000000\">",
            config.font_family
        );
        let offset = (lines.len() as f64 - 1.0) / 2.0;
        for (i, line) in lines.iter().enumerate() {
            let y = cy + (i as f64 - offset) * line_height;
            let _ = write!(
                svg,
                "<tspan x=\"{cx:.2}\" y=\"{y:.2}\" dominant-baseline=\"central\">{}</tspan>",
                escape_xml(line)
            );
        }
        svg.push_str("</text>");
    }
}

fn draw_text_item(svg: &mut String, item: &TextItem, canvas: &Canvas, config: &RenderConfig) {
    let (x, y) = canvas.to_px(Point::new(item.x, item.y));
    let font = canvas.px(item.size);
    let anchor = match item.halign {
        HAlign::Left => "start",
        HAlign::Center => "middle",
        HAlign::Right => "end",
    };
    // World rotation is counter-clockwise; the y flip inverts chirality.
    let transform = if item.rotation != 0.0 {
        format!(" transform=\"rotate({:.2}, {x:.2}, {y:.2})\"", -item.rotation)
    } else {
        String::new()
    };
    let _ = write!(
        svg,
        "<text x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"{anchor}\" \
         dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{font:.2}\" \
         fill=\"{}\"{transform}>{}</text>",
        config.font_family,
        item.color,
        escape_xml(&item.text)
    );
}

/// Place a delay marker on every non-sentinel node's approach to the sink
fn draw_delay_markers(
    svg: &mut String,
    layout: &Layout,
    canvas: &Canvas,
    config: &RenderConfig,
) -> Result<()> {
    let int = layout.get(EVENTS_INT)?;
    let font = canvas.px(TEXT_SIZE);

    for (label, position) in layout.iter() {
        if label == EVENTS_INT || label == EVENTS_EXT {
            continue;
        }
        let angle = position.angle_to(int);
        let marker = Point::new(
            position.x + DELAY_MARKER_INSET * angle.cos(),
            position.y + DELAY_MARKER_INSET * angle.sin() + DELAY_MARKER_RAISE,
        );
        let (x, y) = canvas.to_px(marker);
        let _ = write!(
            svg,
            "<text x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"start\" \
             dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{font:.2}\" \
             fill=\"#000000\">σ</text>",
            config.font_family
        );
    }
    Ok(())
}

/// Rasterize the SVG document and write it as a PNG
///
/// Writes to a temporary sibling file first and renames on success.
pub fn write_png(svg: &str, output: &Path, config: &RenderConfig) -> Result<()> {
    let mut options = usvg::Options::default();
    options.font_family = config.font_family.clone();
    options.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &options)
        .map_err(|e| RenderError::SvgError(e.to_string()))?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| RenderError::PngEncodeError("failed to allocate pixmap".to_string()))?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::default(),
        &mut pixmap.as_mut(),
    );

    let tmp = output.with_extension("png.tmp");
    pixmap
        .save_png(&tmp)
        .map_err(|e| RenderError::PngEncodeError(e.to_string()))?;
    std::fs::rename(&tmp, output)?;

    log::info!("Wrote diagram to {:?}", output);
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
