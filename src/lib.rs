pub mod burst;
pub mod config;
pub mod effects;
pub mod error;
pub mod events;
pub mod picture;
pub mod properties;
pub mod selector;
pub mod session;
pub mod store;
pub mod surface;
pub mod tasks {
    pub mod host;
    pub mod presenter;
}
