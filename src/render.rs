//! What a renderer needs from the core: sizes, colors, dim state, hit-testing.
//!
//! Pixel drawing lives in the desktop shell; everything here is pure so any
//! painter can reuse it.

use eframe::egui::{Color32, Pos2, Rect, Vec2};

use crate::interaction::{Highlight, ViewportTransform};
use crate::model::Category;

/// Node radius in simulation units. Strictly increasing in `frequency`.
pub fn node_radius(frequency: u32) -> f32 {
    4.0 + 3.0 * (frequency.max(1) as f32).sqrt()
}

/// Edge stroke width in simulation units, non-decreasing in `weight`.
pub fn edge_width(weight: f32) -> f32 {
    (0.6 + 0.9 * weight.max(0.0).ln_1p()).clamp(0.6, 6.0)
}

pub fn category_color(category: Category) -> Color32 {
    match category {
        Category::Sample => Color32::from_rgb(88, 184, 120),
        Category::Condition => Color32::from_rgb(92, 156, 230),
        Category::Outcome => Color32::from_rgb(238, 146, 86),
        Category::Objective => Color32::from_rgb(196, 120, 220),
        Category::Entity => Color32::from_rgb(160, 168, 178),
    }
}

pub fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let mix = |from: u8, to: u8| (from as f32 + (to as f32 - from as f32) * amount) as u8;
    Color32::from_rgba_unmultiplied(
        mix(base.r(), overlay.r()),
        mix(base.g(), overlay.g()),
        mix(base.b(), overlay.b()),
        mix(base.a(), overlay.a()),
    )
}

pub fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let opacity = opacity.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (color.a() as f32 * opacity) as u8,
    )
}

const DIMMED_OPACITY: f32 = 0.18;
const FOCUS_RADIUS_BOOST: f32 = 1.25;
const SEARCH_HIT_COLOR: Color32 = Color32::from_rgb(103, 196, 255);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeVisual {
    pub center: Pos2,
    pub radius: f32,
    pub fill: Color32,
    pub stroke_width: f32,
    pub show_label: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeVisual {
    pub from: Pos2,
    pub to: Pos2,
    pub width: f32,
    pub color: Color32,
}

/// Per-node flags that feed into [`node_visual`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeFlags {
    pub selected: bool,
    pub pinned: bool,
    pub search_hit: bool,
}

pub fn node_visual(
    index: usize,
    category: Category,
    frequency: u32,
    position: Vec2,
    flags: NodeFlags,
    highlight: &Highlight,
    viewport: &ViewportTransform,
) -> NodeVisual {
    let focused = highlight.is_focus(index);
    let mut radius = node_radius(frequency) * viewport.scale;
    if focused {
        radius *= FOCUS_RADIUS_BOOST;
    }

    let mut fill = category_color(category);
    if flags.search_hit {
        fill = blend_color(fill, SEARCH_HIT_COLOR, 0.6);
    }
    if highlight.node_dimmed(index) {
        fill = with_opacity(fill, DIMMED_OPACITY);
    }

    let stroke_width = if focused {
        2.6
    } else if flags.selected {
        2.2
    } else if flags.pinned {
        1.6
    } else {
        1.0
    };

    NodeVisual {
        center: viewport.to_screen(position),
        radius,
        fill,
        stroke_width,
        show_label: focused || flags.selected || radius > 14.0 || viewport.scale > 1.6,
    }
}

pub fn edge_visual(
    edge_id: usize,
    weight: f32,
    from: Vec2,
    to: Vec2,
    highlight: &Highlight,
    viewport: &ViewportTransform,
) -> EdgeVisual {
    let base = Color32::from_rgba_unmultiplied(150, 160, 172, 150);
    let color = if highlight.edge_dimmed(edge_id) {
        with_opacity(base, DIMMED_OPACITY)
    } else if highlight.is_active() {
        Color32::from_rgb(241, 196, 120)
    } else {
        base
    };

    EdgeVisual {
        from: viewport.to_screen(from),
        to: viewport.to_screen(to),
        width: (edge_width(weight) * viewport.scale.sqrt()).clamp(0.4, 8.0),
        color,
    }
}

/// Closest node whose circle contains `point`, both in simulation space.
pub fn hit_test(positions: &[Vec2], radii: &[f32], point: Vec2) -> Option<usize> {
    positions
        .iter()
        .zip(radii)
        .enumerate()
        .filter_map(|(index, (position, radius))| {
            let distance = (*position - point).length();
            (distance <= *radius).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

pub fn circle_visible(rect: Rect, center: Pos2, radius: f32) -> bool {
    rect.expand(radius).contains(center)
}

pub fn segment_visible(rect: Rect, from: Pos2, to: Pos2) -> bool {
    Rect::from_two_pos(from, to).intersects(rect)
}
