use super::MovementMode;

/// Receives mode changes, the way an animation instance mirrors the
/// movement mode.
pub trait ModeObserver {
    fn on_exit(&mut self, _mode: MovementMode) {}

    fn on_enter(&mut self, _mode: MovementMode) {}

    fn on_mode_changed(&mut self, _previous: MovementMode, _current: MovementMode) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeEvent {
    Exit(MovementMode),
    Enter(MovementMode),
    Changed {
        previous: MovementMode,
        current: MovementMode,
    },
}

/// Observer that keeps every event it sees.
#[derive(Debug, Default, Clone)]
pub struct ModeHistory {
    events: Vec<ModeEvent>,
}

impl ModeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ModeEvent] {
        &self.events
    }

    pub fn changes(&self) -> impl Iterator<Item = (MovementMode, MovementMode)> + '_ {
        self.events.iter().filter_map(|event| match event {
            ModeEvent::Changed { previous, current } => Some((*previous, *current)),
            _ => None,
        })
    }

    pub fn count_entered(&self, mode: MovementMode) -> usize {
        self.events
            .iter()
            .filter(|event| **event == ModeEvent::Enter(mode))
            .count()
    }

    pub fn count_exited(&self, mode: MovementMode) -> usize {
        self.events
            .iter()
            .filter(|event| **event == ModeEvent::Exit(mode))
            .count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl ModeObserver for ModeHistory {
    fn on_exit(&mut self, mode: MovementMode) {
        self.events.push(ModeEvent::Exit(mode));
    }

    fn on_enter(&mut self, mode: MovementMode) {
        self.events.push(ModeEvent::Enter(mode));
    }

    fn on_mode_changed(&mut self, previous: MovementMode, current: MovementMode) {
        self.events.push(ModeEvent::Changed { previous, current });
    }
}

/// Shared handle so the owner can inspect the history after handing it to a
/// movement component.
impl ModeObserver for std::rc::Rc<std::cell::RefCell<ModeHistory>> {
    fn on_exit(&mut self, mode: MovementMode) {
        self.borrow_mut().on_exit(mode);
    }

    fn on_enter(&mut self, mode: MovementMode) {
        self.borrow_mut().on_enter(mode);
    }

    fn on_mode_changed(&mut self, previous: MovementMode, current: MovementMode) {
        self.borrow_mut().on_mode_changed(previous, current);
    }
}
