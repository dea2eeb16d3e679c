/// Notifications from the host that end the slideshow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// The user came back; the screensaver was dismissed.
    ScreensaverDeactivated,
    /// The display went into power saving.
    DpmsActivated,
}

/// Coarse presenter states, reported through [`crate::tasks::presenter::SlidePresenter::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenterState {
    Idle,
    ShowingGroup,
    Displaying,
    WaitingForTimeout,
    Stopped,
}
