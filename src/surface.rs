//! The presentation surface the slideshow draws on.
//!
//! Rendering lives in the host; the slideshow only tells the surface which
//! image goes into which slot and which label properties to show.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::effects::Animation;

/// Image slots. `Primary` and `Secondary` alternate so one is filled while
/// the other stays visible; each has a blurred background companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Primary,
    Secondary,
    BackgroundPrimary,
    BackgroundSecondary,
}

impl Slot {
    /// The other slot of the same pair.
    pub fn other(self) -> Self {
        match self {
            Self::Primary => Self::Secondary,
            Self::Secondary => Self::Primary,
            Self::BackgroundPrimary => Self::BackgroundSecondary,
            Self::BackgroundSecondary => Self::BackgroundPrimary,
        }
    }

    pub fn background(self) -> Self {
        match self {
            Self::Primary | Self::BackgroundPrimary => Self::BackgroundPrimary,
            Self::Secondary | Self::BackgroundSecondary => Self::BackgroundSecondary,
        }
    }

    /// 1-based position within its pair, used in fade property names.
    pub fn number(self) -> u8 {
        match self {
            Self::Primary | Self::BackgroundPrimary => 1,
            Self::Secondary | Self::BackgroundSecondary => 2,
        }
    }
}

/// Whether images are shown fitted (with optional backgrounds) or scaled to fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Fitted,
    Scaled,
}

pub trait Surface {
    fn select_layout(&mut self, layout: Layout);
    fn set_image(&mut self, slot: Slot, path: &Path);
    fn set_visible(&mut self, slot: Slot, visible: bool);
    fn set_position(&mut self, slot: Slot, x: i32, y: i32);
    fn set_animations(&mut self, slot: Slot, animations: &[Animation]);
    fn set_property(&mut self, name: &str, value: &str);
    fn clear_property(&mut self, name: &str);
    /// Shows a user-visible notification for `duration`.
    fn notify(&mut self, heading: &str, message: &str, duration: Duration);
}

/// A surface that only logs what it is asked to show.
#[derive(Debug, Default)]
pub struct TracingSurface;

impl Surface for TracingSurface {
    fn select_layout(&mut self, layout: Layout) {
        debug!(?layout, "surface layout");
    }

    fn set_image(&mut self, slot: Slot, path: &Path) {
        info!(?slot, path = %path.display(), "show image");
    }

    fn set_visible(&mut self, slot: Slot, visible: bool) {
        debug!(?slot, visible, "slot visibility");
    }

    fn set_position(&mut self, slot: Slot, x: i32, y: i32) {
        debug!(?slot, x, y, "slot position");
    }

    fn set_animations(&mut self, slot: Slot, animations: &[Animation]) {
        debug!(?slot, ?animations, "slot animations");
    }

    fn set_property(&mut self, name: &str, value: &str) {
        debug!(name, value, "set property");
    }

    fn clear_property(&mut self, name: &str) {
        debug!(name, "clear property");
    }

    fn notify(&mut self, heading: &str, message: &str, duration: Duration) {
        warn!(heading, message, duration = ?duration, "notification");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    SelectLayout(Layout),
    SetImage(Slot, PathBuf),
    SetVisible(Slot, bool),
    SetPosition(Slot, i32, i32),
    SetAnimations(Slot, Vec<Animation>),
    SetProperty(String, String),
    ClearProperty(String),
    Notify { heading: String, message: String },
}

/// Records every call and tracks the resulting property values.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    calls: Vec<SurfaceCall>,
    properties: BTreeMap<String, String>,
}

impl RecordingSurface {
    pub fn calls(&self) -> &[SurfaceCall] {
        &self.calls
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Images in the order they were set on the primary/secondary pair.
    pub fn shown_images(&self) -> Vec<(Slot, PathBuf)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SurfaceCall::SetImage(slot @ (Slot::Primary | Slot::Secondary), path) => {
                    Some((*slot, path.clone()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn notifications(&self) -> Vec<(&str, &str)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SurfaceCall::Notify { heading, message } => {
                    Some((heading.as_str(), message.as_str()))
                }
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn select_layout(&mut self, layout: Layout) {
        self.calls.push(SurfaceCall::SelectLayout(layout));
    }

    fn set_image(&mut self, slot: Slot, path: &Path) {
        self.calls.push(SurfaceCall::SetImage(slot, path.to_path_buf()));
    }

    fn set_visible(&mut self, slot: Slot, visible: bool) {
        self.calls.push(SurfaceCall::SetVisible(slot, visible));
    }

    fn set_position(&mut self, slot: Slot, x: i32, y: i32) {
        self.calls.push(SurfaceCall::SetPosition(slot, x, y));
    }

    fn set_animations(&mut self, slot: Slot, animations: &[Animation]) {
        self.calls
            .push(SurfaceCall::SetAnimations(slot, animations.to_vec()));
    }

    fn set_property(&mut self, name: &str, value: &str) {
        self.properties.insert(name.to_owned(), value.to_owned());
        self.calls
            .push(SurfaceCall::SetProperty(name.to_owned(), value.to_owned()));
    }

    fn clear_property(&mut self, name: &str) {
        self.properties.remove(name);
        self.calls.push(SurfaceCall::ClearProperty(name.to_owned()));
    }

    fn notify(&mut self, heading: &str, message: &str, _duration: Duration) {
        self.calls.push(SurfaceCall::Notify {
            heading: heading.to_owned(),
            message: message.to_owned(),
        });
    }
}
