use foundation::HotspotId;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PointerKind {
    Move,
    Down,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TooltipAction {
    Show { hotspot: HotspotId, x_px: f64, y_px: f64 },
    Hide,
    Unchanged,
}

/// Tracks which hotspot's tooltip is visible.
///
/// Moving over a hotspot shows it and moving off hides it. Pressing on the
/// hotspot whose tooltip is already visible dismisses it; pressing anywhere
/// else behaves like a move.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TooltipController {
    active: Option<HotspotId>,
}

impl TooltipController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<HotspotId> {
        self.active
    }

    pub fn on_pointer(
        &mut self,
        kind: PointerKind,
        hit: Option<HotspotId>,
        x_px: f64,
        y_px: f64,
    ) -> TooltipAction {
        match (kind, hit) {
            (PointerKind::Down, Some(h)) if self.active == Some(h) => self.hide(),
            (_, Some(h)) if self.active == Some(h) => TooltipAction::Unchanged,
            (_, Some(h)) => {
                self.active = Some(h);
                TooltipAction::Show {
                    hotspot: h,
                    x_px,
                    y_px,
                }
            }
            (_, None) => self.hide(),
        }
    }

    /// Hides the tooltip unconditionally (scene unload, pointer leaving).
    pub fn hide(&mut self) -> TooltipAction {
        match self.active.take() {
            Some(_) => TooltipAction::Hide,
            None => TooltipAction::Unchanged,
        }
    }
}
