#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramePhase {
    #[default]
    Idle,
    Drawing,
}

/// Tracks the begin -> draw -> present ordering of each frame.
///
/// Ordering mistakes panic in debug builds. Release builds log them and the offending
/// call is skipped.
#[derive(Debug, Default)]
pub struct FrameController {
    phase: FramePhase,
    frames: u64,
}

impl FrameController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// Number of frames that reached `end`.
    pub fn frames_presented(&self) -> u64 {
        self.frames
    }

    /// Moves to `Drawing`. Returns false if a frame was already open.
    pub fn begin(&mut self) -> bool {
        if self.phase == FramePhase::Drawing {
            report("begin_frame called twice without end_frame");
            return false;
        }
        self.phase = FramePhase::Drawing;
        true
    }

    /// Moves back to `Idle`. Returns false if no frame was open.
    pub fn end(&mut self) -> bool {
        if self.phase != FramePhase::Drawing {
            report("end_frame called without begin_frame");
            return false;
        }
        self.phase = FramePhase::Idle;
        self.frames += 1;
        true
    }

    /// Whether `op` may draw right now.
    pub fn check_draw(&self, op: &str) -> bool {
        if self.phase != FramePhase::Drawing {
            report(&format!("{op} called outside begin_frame/end_frame"));
            return false;
        }
        true
    }
}

fn report(message: &str) {
    debug_assert!(false, "{message}");
    log::error!("{message}; ignoring the call");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_alternate() {
        let mut frame = FrameController::new();
        assert_eq!(frame.phase(), FramePhase::Idle);
        assert!(frame.begin());
        assert!(frame.check_draw("draw_rectangle"));
        assert!(frame.end());
        assert_eq!(frame.phase(), FramePhase::Idle);
        assert_eq!(frame.frames_presented(), 1);
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "outside begin_frame"))]
    fn drawing_while_idle_is_caught() {
        let frame = FrameController::new();
        assert!(!frame.check_draw("draw_text"));
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "without begin_frame"))]
    fn end_without_begin_is_caught() {
        let mut frame = FrameController::new();
        assert!(!frame.end());
        assert_eq!(frame.frames_presented(), 0);
    }
}
