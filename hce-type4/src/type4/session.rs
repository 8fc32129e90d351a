//! Type 4 Tag session state
//!
//! Tracks which application and file the reader has selected. The state is
//! volatile and returns to `Idle` whenever the field is lost.

/// Selection state of the current reader session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// Nothing selected
    #[default]
    Idle,
    /// NDEF Tag Application selected, no file
    AppSelected,
    /// An elementary file is selected
    FileSelected(u16),
}

/// Session tracker
#[derive(Debug, Default)]
pub(crate) struct Session {
    state: SessionState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Enter `AppSelected`, dropping any selected file
    pub fn select_application(&mut self) {
        self.state = SessionState::AppSelected;
    }

    /// Enter `FileSelected(file_id)`
    pub fn select_file(&mut self, file_id: u16) {
        self.state = SessionState::FileSelected(file_id);
    }

    /// Fall back from `FileSelected` to `AppSelected`, other states are kept
    pub fn deselect_file(&mut self) {
        if let SessionState::FileSelected(_) = self.state {
            self.state = SessionState::AppSelected;
        }
    }

    /// Back to `Idle`
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let session = Session::new();
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_transitions() {
        let mut session = Session::new();
        session.select_application();
        assert_eq!(session.state(), SessionState::AppSelected);

        session.select_file(0xE103);
        assert_eq!(session.state(), SessionState::FileSelected(0xE103));

        session.deselect_file();
        assert_eq!(session.state(), SessionState::AppSelected);

        session.reset();
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_deselect_keeps_idle() {
        let mut session = Session::new();
        session.deselect_file();
        assert_eq!(session.state(), SessionState::Idle);
    }
}
