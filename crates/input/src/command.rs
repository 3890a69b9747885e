use std::collections::VecDeque;

/// A camera displacement request produced by a host input event.
///
/// The frame driver consumes commands, never raw input events, so every
/// input source goes through the same per-tick application point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraCommand {
    /// Absolute document scroll offset (signed, negative when scrolled down).
    Scroll { offset: f32 },
    /// Pointer drag in pixels.
    Orbit { dx: f32, dy: f32 },
    /// Wheel delta; negative zooms in.
    Zoom { delta: f32 },
    /// Secondary-button drag in pixels.
    Pan { dx: f32, dy: f32 },
}

/// FIFO of pending camera commands.
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: VecDeque<CameraCommand>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: CameraCommand) {
        self.pending.push_back(command);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take every pending command for this tick.
    ///
    /// Scroll commands carry absolute offsets, so only the most recent one
    /// survives; it keeps the position of the first scroll in the batch.
    /// Relative commands are kept in arrival order.
    pub fn drain(&mut self) -> Vec<CameraCommand> {
        let mut out: Vec<CameraCommand> = Vec::with_capacity(self.pending.len());
        let mut scroll_slot: Option<usize> = None;
        for command in self.pending.drain(..) {
            match (command, scroll_slot) {
                (CameraCommand::Scroll { .. }, Some(slot)) => out[slot] = command,
                (CameraCommand::Scroll { .. }, None) => {
                    scroll_slot = Some(out.len());
                    out.push(command);
                }
                _ => out.push(command),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_queue() {
        let mut q = CommandQueue::new();
        q.push(CameraCommand::Zoom { delta: 1.0 });
        q.push(CameraCommand::Orbit { dx: 1.0, dy: 2.0 });
        assert_eq!(q.len(), 2);
        let cmds = q.drain();
        assert_eq!(cmds.len(), 2);
        assert!(q.is_empty());
    }

    #[test]
    fn relative_commands_keep_order() {
        let mut q = CommandQueue::new();
        q.push(CameraCommand::Orbit { dx: 1.0, dy: 0.0 });
        q.push(CameraCommand::Zoom { delta: -1.0 });
        q.push(CameraCommand::Orbit { dx: 2.0, dy: 0.0 });
        assert_eq!(
            q.drain(),
            vec![
                CameraCommand::Orbit { dx: 1.0, dy: 0.0 },
                CameraCommand::Zoom { delta: -1.0 },
                CameraCommand::Orbit { dx: 2.0, dy: 0.0 },
            ]
        );
    }

    #[test]
    fn scrolls_coalesce_to_latest() {
        let mut q = CommandQueue::new();
        q.push(CameraCommand::Scroll { offset: -100.0 });
        q.push(CameraCommand::Zoom { delta: 1.0 });
        q.push(CameraCommand::Scroll { offset: -200.0 });
        q.push(CameraCommand::Scroll { offset: -300.0 });
        assert_eq!(
            q.drain(),
            vec![
                CameraCommand::Scroll { offset: -300.0 },
                CameraCommand::Zoom { delta: 1.0 },
            ]
        );
    }
}
