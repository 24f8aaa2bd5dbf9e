//! Workflow screens and the "no election" gate.

use zvote_types::Election;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Screen {
    Setup,
    Overview,
    Vote,
    Delegate,
    History,
}

impl Screen {
    pub const ALL: [Screen; 5] = [
        Screen::Setup,
        Screen::Overview,
        Screen::Vote,
        Screen::Delegate,
        Screen::History,
    ];

    /// Screens that only make sense with an election loaded.
    pub fn requires_election(&self) -> bool {
        matches!(self, Self::Overview | Self::Vote | Self::Delegate)
    }
}

/// What a screen should render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScreenGate {
    Ready(Election),
    /// Render the "set an election first" fallback instead of the screen.
    NoElection,
}

pub fn gate(screen: Screen, election: &Election) -> ScreenGate {
    if screen.requires_election() && election.is_absent() {
        ScreenGate::NoElection
    } else {
        ScreenGate::Ready(election.clone())
    }
}
