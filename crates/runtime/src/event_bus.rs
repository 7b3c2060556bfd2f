use foundation::{ConnectorId, DotId, HotspotId};

use crate::frame::{Frame, Phase};

/// Observable state transitions of the dot map.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    HoverChanged {
        from: Option<DotId>,
        to: Option<DotId>,
    },
    PhaseChanged {
        from: Phase,
        to: Phase,
    },
    /// A connector's buffers were replaced; the previous GPU copy is stale.
    ConnectorRebuilt {
        connector: ConnectorId,
        vertex_count: usize,
    },
    /// A hotspot record could not be bound to a dot and was dropped.
    HotspotSkipped {
        id: String,
    },
    TooltipShown {
        hotspot: HotspotId,
        x_px: f64,
        y_px: f64,
    },
    TooltipHidden,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::HoverChanged { .. } => "hover_changed",
            EventKind::PhaseChanged { .. } => "phase_changed",
            EventKind::ConnectorRebuilt { .. } => "connector_rebuilt",
            EventKind::HotspotSkipped { .. } => "hotspot_skipped",
            EventKind::TooltipShown { .. } => "tooltip_shown",
            EventKind::TooltipHidden => "tooltip_hidden",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub frame_index: u64,
    pub kind: EventKind,
}

/// Append-only event log drained by the host once per frame.
#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, frame: Frame, kind: EventKind) {
        self.emit_at(frame.index, kind);
    }

    /// Records an event outside the frame loop (asset install, pointer input).
    pub fn emit_at(&mut self, frame_index: u64, kind: EventKind) {
        self.events.push(Event { frame_index, kind });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
