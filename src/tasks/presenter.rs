use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use tokio::select;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::burst::SlideGroup;
use crate::config::Effect;
use crate::effects::random_pan_zoom;
use crate::error::Error;
use crate::events::PresenterState;
use crate::picture::Picture;
use crate::properties::clear_info;
use crate::session::Session;
use crate::store::MetadataStore;
use crate::surface::{Layout, Slot, Surface};

/// Heading of configuration notifications.
pub const SETTINGS_ERROR_HEADING: &str = "Slideshow settings error";

/// Session-wide properties cleared when the slideshow stops.
const SESSION_PROPERTIES: &[&str] = &[
    "Fade1",
    "Fade2",
    "Fade11",
    "Fade12",
    "NoEffectFade1",
    "NoEffectFade2",
    "FadeinLabel",
    "FadeoutLabel",
    "Dim",
    "Music",
    "Clock",
    "Splash",
    "Background",
];

/// Drives the slideshow: picks groups, shows their pictures in alternating
/// slots and waits between slides until cancelled.
///
/// Rules:
/// - Cancellation is checked before each group, before each picture and on
///   every poll tick of a wait.
/// - Burst groups use the `fast` effect, the burst interval, and show labels
///   once for the first picture.
/// - Normal groups use the configured effect and slide time, with labels per
///   picture.
/// - A store failure ends the show with an error; label properties are
///   cleared either way.
pub struct SlidePresenter<S, U> {
    session: Session<S>,
    surface: U,
    cancel: CancellationToken,
    state: PresenterState,
    slot: Slot,
    effect: Effect,
    groups_shown: usize,
}

impl<S: MetadataStore, U: Surface> SlidePresenter<S, U> {
    pub fn new(session: Session<S>, surface: U, cancel: CancellationToken) -> Self {
        let effect = session.settings().effect;
        Self {
            session,
            surface,
            cancel,
            state: PresenterState::Idle,
            slot: Slot::Primary,
            effect,
            groups_shown: 0,
        }
    }

    pub fn state(&self) -> PresenterState {
        self.state
    }

    pub fn surface(&self) -> &U {
        &self.surface
    }

    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    /// Groups that started displaying so far.
    pub fn groups_shown(&self) -> usize {
        self.groups_shown
    }

    /// Requests a stop; observed at the next loop boundary or poll tick.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub async fn run(&mut self) -> Result<()> {
        self.begin();
        let outcome = self.show_groups().await;
        self.finish();
        match &outcome {
            Ok(()) => info!(groups = self.groups_shown, "slideshow stopped"),
            Err(err) => error!("slideshow aborted: {err:#}"),
        }
        outcome
    }

    fn begin(&mut self) {
        let settings = self.session.settings().clone();
        self.surface.select_layout(if settings.scale_images {
            Layout::Scaled
        } else {
            Layout::Fitted
        });
        if let Some(problem) = self.session.configuration_problem() {
            self.surface.notify(
                SETTINGS_ERROR_HEADING,
                &problem.to_string(),
                settings.notification_time,
            );
        }
        self.surface.set_property("Dim", &settings.dim_color());
        if settings.show_music {
            self.surface.set_property("Music", "show");
        }
        if settings.show_background {
            self.surface.set_property("Background", "show");
        }
        if settings.show_clock {
            self.surface.set_property("Clock", "show");
        }
    }

    fn finish(&mut self) {
        for name in SESSION_PROPERTIES {
            self.surface.clear_property(name);
        }
        clear_info(&mut self.surface);
        self.transition(PresenterState::Stopped);
    }

    async fn show_groups(&mut self) -> Result<()> {
        // distinct keys found empty since the last group that had pictures
        let mut empty_keys = HashSet::new();
        while !self.cancel.is_cancelled() {
            self.transition(PresenterState::ShowingGroup);
            let selection = self.session.next_selection()?;
            if selection.group.is_empty() {
                debug!(key = %selection.key, "no displayable pictures for group");
                empty_keys.insert(selection.key);
                if empty_keys.len() >= self.session.selector().pool_len() {
                    return Err(Error::NothingToShow.into());
                }
                continue;
            }
            empty_keys.clear();
            self.groups_shown += 1;
            info!(
                key = %selection.key,
                pictures = selection.group.len(),
                burst = selection.group.is_burst(),
                "showing group"
            );
            if !self.show_group(&selection.group).await? {
                break;
            }
        }
        Ok(())
    }

    /// Shows every picture of `group`; returns false once cancelled.
    async fn show_group(&mut self, group: &SlideGroup) -> Result<bool> {
        let settings = self.session.settings().clone();
        let backgrounds = settings.show_background && !settings.scale_images;
        let burst = group.is_burst();

        let (wait, tick) = if burst {
            self.effect = Effect::Fast;
            for name in ["Fade1", "Fade2", "NoEffectFade1", "NoEffectFade2"] {
                self.surface.set_property(name, "0");
            }
            for slot in [Slot::Primary, Slot::Secondary] {
                self.surface.set_animations(slot, &[]);
                self.surface.set_position(slot, 0, 0);
            }
            if backgrounds {
                self.surface.set_visible(Slot::BackgroundPrimary, false);
                self.surface.set_visible(Slot::BackgroundSecondary, false);
            }
            if let Some(first) = group.pictures.first() {
                if !self.reveal_labels(first).await? {
                    return Ok(false);
                }
            }
            let interval = settings.burst_interval();
            (interval, interval)
        } else {
            self.effect = settings.effect;
            if backgrounds {
                self.surface.set_visible(Slot::BackgroundPrimary, true);
                self.surface.set_visible(Slot::BackgroundSecondary, true);
            }
            (settings.slide_time, settings.poll_interval)
        };
        self.surface.set_property("Splash", "hide");

        for picture in &group.pictures {
            if self.cancel.is_cancelled() {
                return Ok(false);
            }
            self.transition(PresenterState::Displaying);
            let path = picture.path();
            self.surface.set_image(self.slot, &path);

            if !burst {
                if backgrounds {
                    self.surface.set_image(self.slot.background(), &path);
                }
                if !self.reveal_labels(picture).await? {
                    return Ok(false);
                }
                self.apply_effect(backgrounds);
            }

            self.slot = self.slot.other();
            self.transition(PresenterState::WaitingForTimeout);
            if !self.countdown(wait, tick).await {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Fades the labels out, pauses, swaps in the picture's properties and
    /// fades them back in. Returns false when cancelled during the pause.
    async fn reveal_labels(&mut self, picture: &Picture) -> Result<bool> {
        self.surface.set_property("FadeinLabel", "0");
        self.surface.set_property("FadeoutLabel", "1");
        let pause = self.session.settings().label_pause;
        let tick = self.session.settings().poll_interval;
        if !self.countdown(pause, tick).await {
            return Ok(false);
        }
        self.session.show_info(&mut self.surface, picture)?;
        self.surface.set_property("FadeinLabel", "1");
        self.surface.set_property("FadeoutLabel", "0");
        Ok(true)
    }

    fn apply_effect(&mut self, backgrounds: bool) {
        let current = self.slot.number();
        let next = self.slot.other().number();
        match self.effect {
            Effect::Crossfade | Effect::Panzoom => {
                if self.effect == Effect::Panzoom {
                    let slide_time = self.session.settings().slide_time;
                    let motion = random_pan_zoom(self.session.rng_mut(), slide_time);
                    let (x, y) = motion.position;
                    self.surface.set_position(self.slot, x, y);
                    self.surface.set_animations(self.slot, &motion.animations);
                }
                self.surface.set_property(&format!("Fade{current}"), "0");
                self.surface.set_property(&format!("Fade{next}"), "1");
            }
            Effect::None => {
                self.surface
                    .set_property(&format!("NoEffectFade{current}"), "0");
                self.surface.set_property(&format!("NoEffectFade{next}"), "1");
            }
            Effect::Fast => {}
        }
        if backgrounds && self.effect != Effect::None {
            self.surface.set_property(&format!("Fade1{current}"), "0");
            self.surface.set_property(&format!("Fade1{next}"), "1");
        }
    }

    /// Waits `total` in steps of at most `tick`. Returns false when cancelled.
    async fn countdown(&self, total: Duration, tick: Duration) -> bool {
        let tick = tick.max(Duration::from_millis(1));
        let mut remaining = total;
        while !remaining.is_zero() {
            let step = remaining.min(tick);
            select! {
                _ = self.cancel.cancelled() => return false,
                _ = sleep(step) => {}
            }
            remaining -= step;
        }
        !self.cancel.is_cancelled()
    }

    fn transition(&mut self, next: PresenterState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "presenter state");
            self.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::store::MemoryStore;
    use crate::surface::RecordingSurface;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn quick_settings() -> Settings {
        Settings {
            slide_time: Duration::from_millis(20),
            poll_interval: Duration::from_millis(5),
            label_pause: Duration::from_millis(1),
            burst_interval_ms: 2,
            shuffle_seed: Some(1),
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn countdown_observes_cancellation_within_a_tick() {
        let store = MemoryStore::new().with_picture(1, "2020-01-01 10:00:00", "/p", "a.jpg");
        let session =
            Session::with_rng(store, quick_settings(), StdRng::seed_from_u64(1)).unwrap();
        let cancel = CancellationToken::new();
        let presenter = SlidePresenter::new(session, RecordingSurface::default(), cancel.clone());

        let canceller = tokio::spawn(async move {
            sleep(Duration::from_millis(30)).await;
            cancel.cancel();
        });
        let started = std::time::Instant::now();
        let finished = presenter
            .countdown(Duration::from_secs(30), Duration::from_millis(10))
            .await;
        assert!(!finished);
        assert!(started.elapsed() < Duration::from_secs(5));
        canceller.await.unwrap();
    }

    #[tokio::test]
    async fn pre_cancelled_presenter_shows_nothing_and_cleans_up() {
        let store = MemoryStore::new().with_picture(1, "2020-01-01 10:00:00", "/p", "a.jpg");
        let session =
            Session::with_rng(store, quick_settings(), StdRng::seed_from_u64(1)).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut presenter = SlidePresenter::new(session, RecordingSurface::default(), cancel);
        presenter.run().await.unwrap();
        assert_eq!(presenter.state(), PresenterState::Stopped);
        assert!(presenter.surface().shown_images().is_empty());
        assert!(presenter.surface().properties().is_empty());
        assert_eq!(presenter.groups_shown(), 0);
    }
}
