use eframe::egui::{Pos2, Vec2};

use crate::config::ViewportConfig;

/// Pan/zoom transform applied at render time only.
///
/// Screen coordinates are relative to the canvas origin; simulation space is
/// never affected by the transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportTransform {
    pub translate: Vec2,
    pub scale: f32,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl ViewportTransform {
    pub fn to_screen(&self, world: Vec2) -> Pos2 {
        (self.translate + world * self.scale).to_pos2()
    }

    pub fn to_world(&self, screen: Pos2) -> Vec2 {
        (screen.to_vec2() - self.translate) / self.scale
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.translate += delta;
    }

    /// Scales by `factor` while keeping the world point under `anchor` fixed.
    pub fn zoom_at(&mut self, anchor: Pos2, factor: f32, bounds: &ViewportConfig) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }

        let world_before = self.to_world(anchor);
        self.scale = (self.scale * factor).clamp(bounds.min_scale, bounds.max_scale);
        self.translate = anchor.to_vec2() - (world_before * self.scale);
    }

    /// Wheel delta to multiplicative zoom factor.
    pub fn wheel_factor(scroll: f32, bounds: &ViewportConfig) -> f32 {
        (1.0 + (scroll * bounds.zoom_sensitivity)).clamp(0.85, 1.15)
    }

    pub fn clamped(mut self, bounds: &ViewportConfig) -> Self {
        if !self.scale.is_finite() {
            self.scale = 1.0;
        }
        self.scale = self.scale.clamp(bounds.min_scale, bounds.max_scale);
        self
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use eframe::egui::{pos2, vec2};

    use super::*;

    #[test]
    fn screen_and_world_are_inverse() {
        let transform = ViewportTransform {
            translate: vec2(120.0, -40.0),
            scale: 2.5,
        };
        let world = vec2(13.0, 7.5);
        let back = transform.to_world(transform.to_screen(world));

        assert_abs_diff_eq!(back.x, world.x, epsilon = 1e-4);
        assert_abs_diff_eq!(back.y, world.y, epsilon = 1e-4);
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let bounds = ViewportConfig::default();
        let mut transform = ViewportTransform::default();
        let anchor = pos2(300.0, 200.0);
        let world_before = transform.to_world(anchor);

        transform.zoom_at(anchor, 1.15, &bounds);
        let world_after = transform.to_world(anchor);

        assert_abs_diff_eq!(world_before.x, world_after.x, epsilon = 1e-3);
        assert_abs_diff_eq!(world_before.y, world_after.y, epsilon = 1e-3);
    }

    #[test]
    fn zoom_is_clamped() {
        let bounds = ViewportConfig::default();
        let mut transform = ViewportTransform::default();
        for _ in 0..200 {
            transform.zoom_at(pos2(0.0, 0.0), 1.15, &bounds);
        }
        assert_eq!(transform.scale, bounds.max_scale);

        for _ in 0..400 {
            transform.zoom_at(pos2(0.0, 0.0), 0.85, &bounds);
        }
        assert_eq!(transform.scale, bounds.min_scale);
    }
}
