//! Hover-driven lift field.
//!
//! Each frame a hovered dot raises the target lift of its neighbours with a
//! gaussian falloff; every target then decays toward zero and every lift eases
//! toward its target. Dots within `threshold` of their target are settled and
//! neither integrated nor reported, so an idle field costs nothing per frame.

use foundation::DotId;

use crate::config::{HoverConfig, SceneConfig};
use crate::dot_set::DotSet;
use crate::state::Dot;

/// Gaussian falloff `exp(-(d / radius)^2) * max_lift`.
pub fn falloff(distance: f64, radius: f64, max_lift: f64) -> f64 {
    let t = distance / radius;
    (-t * t).exp() * max_lift
}

/// One easing step of `lift` toward `target`.
///
/// Returns `None` when the dot is already within `threshold` of its target.
pub fn integrate(lift: f64, target: f64, easing: f64, threshold: f64) -> Option<f64> {
    let delta = target - lift;
    if delta.abs() > threshold {
        Some(lift + delta * easing)
    } else {
        None
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct LiftReport {
    /// Whether the integration pass ran at all this frame.
    pub ran: bool,
    /// Whether any dot moved.
    pub dirty: bool,
    /// Dots whose transform changed.
    pub written: usize,
}

#[derive(Debug, Clone)]
pub struct LiftField {
    hover: HoverConfig,
    outer_radius_sq: f64,
    decay: f64,
    spacing: f64,
    active: bool,
    changed: DotSet,
}

impl LiftField {
    pub fn new(config: &SceneConfig, dot_count: usize) -> Self {
        let outer = config.hover.outer_radius();
        Self {
            hover: config.hover.clone(),
            outer_radius_sq: outer * outer,
            decay: config.interaction.decay,
            spacing: config.dots.spacing,
            active: false,
            changed: DotSet::with_capacity(dot_count),
        }
    }

    /// Whether the field still has motion to integrate.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Dots moved by the last integration pass.
    pub fn changed(&self) -> &DotSet {
        &self.changed
    }

    /// Raises targets around `hovered`. Targets only ever grow here.
    pub fn apply_hover(&mut self, dots: &mut [Dot], hovered: DotId) {
        if self.hover.max_lift == 0.0 {
            return;
        }
        let Some(center) = dots.get(hovered.as_usize()).map(|d| d.grid) else {
            return;
        };
        self.active = true;

        for dot in dots.iter_mut() {
            let dx = (dot.grid.x - center.x) * self.spacing;
            let dy = (dot.grid.y - center.y) * self.spacing;
            let dist_sq = dx * dx + dy * dy;
            if dist_sq < self.outer_radius_sq {
                let candidate = falloff(dist_sq.sqrt(), self.hover.radius, self.hover.max_lift);
                dot.target_lift = dot.target_lift.max(candidate);
            }
        }
    }

    /// Decays every target and eases every unsettled lift toward it.
    ///
    /// Skipped entirely while the field is at rest and nothing is hovered.
    pub fn integrate(&mut self, dots: &mut [Dot], hovering: bool) -> LiftReport {
        self.changed.clear();
        if !self.active && !hovering {
            return LiftReport::default();
        }

        for (i, dot) in dots.iter_mut().enumerate() {
            dot.target_lift *= self.decay;
            if let Some(next) = integrate(
                dot.lift,
                dot.target_lift,
                self.hover.easing,
                self.hover.threshold,
            ) {
                dot.lift = next;
                self.changed.insert(DotId::from_usize(i));
            }
        }

        let dirty = !self.changed.is_empty();
        if !dirty && !hovering {
            self.active = false;
        }

        LiftReport {
            ran: true,
            dirty,
            written: self.changed.len(),
        }
    }

    /// Puts the field back at rest without touching any dot.
    pub fn reset(&mut self) {
        self.active = false;
        self.changed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{LiftField, falloff, integrate};
    use crate::config::SceneConfig;
    use crate::state::Dot;
    use foundation::DotId;
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;

    const RADIUS: f64 = 0.35;
    const MAX_LIFT: f64 = 0.55;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    /// Config with unit spacing so grid distances are world distances.
    fn unit_config() -> SceneConfig {
        let mut cfg = SceneConfig::default();
        cfg.dots.spacing = 1.0;
        cfg
    }

    fn row(xs: &[f64]) -> Vec<Dot> {
        xs.iter().map(|&x| Dot::new(Vec2::new(x, 0.0))).collect()
    }

    fn targets_after_hover(xs: &[f64]) -> Vec<f64> {
        let cfg = unit_config();
        let mut dots = row(xs);
        let mut field = LiftField::new(&cfg, dots.len());
        field.apply_hover(&mut dots, DotId::new(0));
        dots.iter().map(|d| d.target_lift).collect()
    }

    #[test]
    fn scenario_falloff_values() {
        let t = targets_after_hover(&[0.0, 0.35, 0.489, 0.6]);
        assert_close(t[0], 0.55, 1e-12);
        assert_close(t[1], 0.55 * (-1.0f64).exp(), 1e-12);
        assert_close(t[1], 0.2023, 1e-4);
        assert_close(t[2], falloff(0.489, RADIUS, MAX_LIFT), 1e-12);
        assert_close(t[2], 0.0775, 1e-3);
        assert_eq!(t[3], 0.0);
    }

    #[test]
    fn outer_radius_cutoff_is_strict() {
        // 0.35 * 1.4 lands just below 0.49 in f64.
        let t = targets_after_hover(&[0.0, 0.49, 0.4899]);
        assert_eq!(t[1], 0.0);
        assert!(t[2] > 0.0);
    }

    #[test]
    fn dots_outside_outer_radius_are_untouched() {
        let cfg = unit_config();
        let mut dots = row(&[0.0, 0.5, 1.0, 3.0]);
        dots[2].lift = 0.1;
        dots[2].target_lift = 0.2;
        let before = dots.clone();
        let mut field = LiftField::new(&cfg, dots.len());
        field.apply_hover(&mut dots, DotId::new(0));
        assert_eq!(dots[1..], before[1..]);
    }

    #[test]
    fn falloff_is_monotone_in_distance() {
        let mut prev = f64::INFINITY;
        for i in 0..=100 {
            let d = i as f64 * 0.49 / 100.0;
            let v = falloff(d, RADIUS, MAX_LIFT);
            assert!(v <= prev);
            prev = v;
        }
    }

    #[test]
    fn hover_never_lowers_an_existing_target() {
        let cfg = unit_config();
        let mut dots = row(&[0.0, 0.3]);
        dots[1].target_lift = 0.5;
        let mut field = LiftField::new(&cfg, dots.len());
        field.apply_hover(&mut dots, DotId::new(0));
        assert_eq!(dots[1].target_lift, 0.5);
    }

    #[test]
    fn integrating_at_target_is_a_no_op() {
        assert_eq!(integrate(0.3, 0.3, 0.16, 0.001), None);
        assert_eq!(integrate(0.3, 0.3, 0.16, 0.0), None);
    }

    #[test]
    fn scenario_settle_steps_match_closed_form() {
        let (easing, threshold, start): (f64, f64, f64) = (0.16, 0.001, 0.55);
        let expected = ((threshold / start).ln() / (1.0 - easing).ln()).ceil() as usize;
        assert_eq!(expected, 37);

        let mut lift = 0.0;
        let mut steps = 0;
        while let Some(next) = integrate(lift, start, easing, threshold) {
            lift = next;
            steps += 1;
            assert!(steps <= 100);
        }
        assert_eq!(steps, expected);
        assert!(start - lift <= threshold);
    }

    #[test]
    fn lifts_settle_near_zero_after_hover_clears() {
        let cfg = unit_config();
        let mut dots = row(&[0.0, 0.1, 0.2, 0.3, 0.4, 2.0]);
        let mut field = LiftField::new(&cfg, dots.len());

        for _ in 0..30 {
            field.apply_hover(&mut dots, DotId::new(0));
            field.integrate(&mut dots, true);
        }
        assert!(dots[0].lift > 0.3);
        for d in &dots {
            assert!(d.lift >= 0.0 && d.lift <= MAX_LIFT);
        }

        let mut frames = 0;
        loop {
            let report = field.integrate(&mut dots, false);
            frames += 1;
            assert!(frames < 500, "field never settled");
            if !report.dirty {
                break;
            }
        }
        assert!(!field.is_active());
        // The lagging lift stops once it is within threshold of its decaying
        // target, which leaves it a small multiple of threshold above zero.
        for d in &dots {
            assert!(d.lift.abs() <= cfg.hover.threshold / cfg.hover.easing);
            assert!((d.target_lift - d.lift).abs() <= cfg.hover.threshold);
        }
    }

    #[test]
    fn idle_field_skips_the_pass() {
        let cfg = unit_config();
        let mut dots = row(&[0.0, 1.0]);
        let mut field = LiftField::new(&cfg, dots.len());
        let report = field.integrate(&mut dots, false);
        assert!(!report.ran);
        assert!(field.changed().is_empty());
    }

    #[test]
    fn report_lists_changed_dots_only() {
        let cfg = unit_config();
        let mut dots = row(&[0.0, 0.3, 5.0]);
        let mut field = LiftField::new(&cfg, dots.len());
        field.apply_hover(&mut dots, DotId::new(0));
        let report = field.integrate(&mut dots, true);
        assert!(report.ran && report.dirty);
        assert_eq!(report.written, 2);
        let changed: Vec<u32> = field.changed().iter().map(DotId::index).collect();
        assert_eq!(changed, vec![0, 1]);
        assert_eq!(dots[2].lift, 0.0);
    }

    #[test]
    fn zero_max_lift_is_inert() {
        let mut cfg = unit_config();
        cfg.hover.max_lift = 0.0;
        let mut dots = row(&[0.0, 0.1]);
        let mut field = LiftField::new(&cfg, dots.len());
        field.apply_hover(&mut dots, DotId::new(0));
        let report = field.integrate(&mut dots, true);
        assert!(!field.is_active());
        assert!(!report.dirty);
        assert!(dots.iter().all(|d| d.lift == 0.0));
    }

    #[test]
    fn spacing_scales_grid_distance() {
        let cfg = SceneConfig::default();
        let mut dots = row(&[0.0, 0.3]);
        let mut field = LiftField::new(&cfg, dots.len());
        field.apply_hover(&mut dots, DotId::new(0));
        // 0.3 grid units * 1.5 spacing = 0.45 world units.
        assert_close(dots[1].target_lift, falloff(0.45, RADIUS, MAX_LIFT), 1e-12);
    }
}
