use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::info;

use crate::config::Settings;
use crate::error::{ConfigurationError, Result};
use crate::picture::Picture;
use crate::properties::PropertyMapper;
use crate::selector::{GroupSelector, Selection};
use crate::store::MetadataStore;
use crate::surface::Surface;

/// Everything one slideshow run owns: the store handle, a settings snapshot,
/// the group pool and the resolved tag types.
#[derive(Debug)]
pub struct Session<S> {
    store: S,
    settings: Settings,
    selector: GroupSelector,
    mapper: PropertyMapper,
    rng: StdRng,
    fallback: Option<ConfigurationError>,
}

impl<S: MetadataStore> Session<S> {
    /// Starts a session seeded from `shuffle-seed`, or from the OS when unset.
    pub fn start(store: S, settings: Settings) -> Result<Self> {
        let rng = match settings.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(store, settings, rng)
    }

    pub fn with_rng(store: S, settings: Settings, mut rng: StdRng) -> Result<Self> {
        let selector_rng = StdRng::seed_from_u64(rng.next_u64());
        let start = GroupSelector::open(&store, &settings.selection(), selector_rng)?;
        let mapper = PropertyMapper::new(&store, settings.display())?;
        info!(
            filtered = start.selector.is_filtered(),
            pool = start.selector.pool_len(),
            limit = settings.group_limit,
            burst = settings.burst_enabled,
            effect = %settings.effect,
            "slideshow session started"
        );
        Ok(Self {
            store,
            settings,
            selector: start.selector,
            mapper,
            rng,
            fallback: start.fallback,
        })
    }

    /// The filter problem this session fell back from, if any.
    pub fn configuration_problem(&self) -> Option<&ConfigurationError> {
        self.fallback.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn selector(&self) -> &GroupSelector {
        &self.selector
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn next_selection(&mut self) -> Result<Selection> {
        self.selector.next_selection(&self.store)
    }

    /// Sets the label properties for `picture` on `surface`.
    pub fn show_info<U: Surface + ?Sized>(&self, surface: &mut U, picture: &Picture) -> Result<()> {
        self.mapper.apply(&self.store, surface, picture)
    }

    /// The next `groups` selections, as the presenter would show them.
    pub fn plan(&mut self, groups: usize) -> Result<Vec<Selection>> {
        (0..groups).map(|_| self.next_selection()).collect()
    }
}
