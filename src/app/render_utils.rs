use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke};
use spacebio_graph::interaction::ViewportTransform;

/// Canvas-local coordinates (origin at the canvas corner) to window coordinates.
pub(super) fn to_window(rect: Rect, local: Pos2) -> Pos2 {
    local + rect.min.to_vec2()
}

pub(super) fn to_local(rect: Rect, window: Pos2) -> Pos2 {
    window - rect.min.to_vec2()
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, viewport: &ViewportTransform) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(17, 21, 30));

    let step = (64.0 * viewport.scale.clamp(0.5, 2.0)).max(24.0);
    let origin = rect.min + viewport.translate;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 72, 90, 60));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}
