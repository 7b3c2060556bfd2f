use foundation::DotId;

/// Result of one hover resolution.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HoverUpdate {
    pub hovered: Option<DotId>,
    pub previous: Option<DotId>,
}

impl HoverUpdate {
    pub fn changed(&self) -> bool {
        self.hovered != self.previous
    }
}

/// Turns a per-frame pick result into a stable hovered dot.
///
/// A hit on a new dot is adopted immediately and arms the cooldown counter.
/// A miss only clears the hover once the counter has run down to zero. The
/// counter drops by one every frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverResolver {
    cooldown_frames: u32,
    cooldown: u32,
    hovered: Option<DotId>,
}

impl HoverResolver {
    pub fn new(cooldown_frames: u32) -> Self {
        Self {
            cooldown_frames,
            cooldown: 0,
            hovered: None,
        }
    }

    pub fn hovered(&self) -> Option<DotId> {
        self.hovered
    }

    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    pub fn resolve(&mut self, hit: Option<DotId>) -> HoverUpdate {
        let previous = self.hovered;
        match hit {
            Some(id) if self.hovered != Some(id) => {
                self.hovered = Some(id);
                self.cooldown = self.cooldown_frames;
            }
            Some(_) => {}
            None if self.cooldown == 0 => self.hovered = None,
            None => {}
        }
        self.cooldown = self.cooldown.saturating_sub(1);
        HoverUpdate {
            hovered: self.hovered,
            previous,
        }
    }

    /// Drops the hover immediately (scene unload).
    pub fn reset(&mut self) {
        self.hovered = None;
        self.cooldown = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::HoverResolver;
    use foundation::DotId;
    use pretty_assertions::assert_eq;

    fn run(resolver: &mut HoverResolver, hits: &[Option<u32>]) -> Vec<Option<u32>> {
        hits.iter()
            .map(|h| {
                resolver
                    .resolve(h.map(DotId::new))
                    .hovered
                    .map(DotId::index)
            })
            .collect()
    }

    #[test]
    fn hit_is_adopted_immediately() {
        let mut r = HoverResolver::new(2);
        let u = r.resolve(Some(DotId::new(4)));
        assert_eq!(u.hovered, Some(DotId::new(4)));
        assert!(u.changed());
        assert!(!r.resolve(Some(DotId::new(4))).changed());
    }

    #[test]
    fn switching_dots_needs_no_cooldown() {
        let mut r = HoverResolver::new(2);
        assert_eq!(run(&mut r, &[Some(1), Some(2)]), vec![Some(1), Some(2)]);
    }

    #[test]
    fn single_frame_gap_keeps_hover() {
        let mut r = HoverResolver::new(2);
        let got = run(&mut r, &[Some(7), None, Some(7)]);
        assert_eq!(got, vec![Some(7), Some(7), Some(7)]);
    }

    #[test]
    fn sustained_miss_clears_once_counter_runs_out() {
        let mut r = HoverResolver::new(2);
        let got = run(&mut r, &[Some(3), None, None, None]);
        assert_eq!(got, vec![Some(3), Some(3), None, None]);
        assert_eq!(r.cooldown(), 0);
    }

    #[test]
    fn counter_is_only_rearmed_by_a_new_dot() {
        let mut r = HoverResolver::new(2);
        // The counter runs down while the same dot stays hit.
        let got = run(&mut r, &[Some(3), Some(3), Some(3), None, Some(4), None]);
        assert_eq!(got, vec![Some(3), Some(3), Some(3), None, Some(4), Some(4)]);
    }

    #[test]
    fn zero_cooldown_clears_on_first_miss() {
        let mut r = HoverResolver::new(0);
        assert_eq!(run(&mut r, &[Some(3), None]), vec![Some(3), None]);
    }

    #[test]
    fn never_hovered_stays_empty() {
        let mut r = HoverResolver::new(2);
        let u = r.resolve(None);
        assert_eq!(u.hovered, None);
        assert!(!u.changed());
    }
}
