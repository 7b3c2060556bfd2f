/// Frame metadata handed to every subsystem during one step.
///
/// The dot map is driven by display refresh, not by simulated time: easing
/// and decay are expressed per frame, so the frame index is the only timebase.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
}

/// Monotonic frame counter.
#[derive(Debug, Default, Clone)]
pub struct FrameClock {
    next_index: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new frame and returns its metadata.
    pub fn tick(&mut self) -> Frame {
        let frame = Frame {
            index: self.next_index,
        };
        self.next_index = self.next_index.wrapping_add(1);
        frame
    }

    /// Number of frames started so far.
    pub fn frames_started(&self) -> u64 {
        self.next_index
    }
}

/// Lifecycle of the interactive scene.
///
/// `Unloaded → Idle → Hovering → Settling → Idle`. Only asset installation
/// leaves `Unloaded`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Unloaded,
    Idle,
    Hovering,
    Settling,
}

impl Phase {
    /// Phase for a loaded scene given this frame's hover and lift state.
    pub fn loaded(hovering: bool, lift_active: bool) -> Self {
        match (hovering, lift_active) {
            (true, _) => Phase::Hovering,
            (false, true) => Phase::Settling,
            (false, false) => Phase::Idle,
        }
    }

    pub fn is_loaded(self) -> bool {
        self != Phase::Unloaded
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Unloaded => "unloaded",
            Phase::Idle => "idle",
            Phase::Hovering => "hovering",
            Phase::Settling => "settling",
        }
    }
}
