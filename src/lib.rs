pub mod catalog;
pub mod clock;
pub mod config;
pub mod content;
pub mod convert;
pub mod debounce;
pub mod loader;
pub mod placement;
pub mod prefetch;
pub mod preview;
pub mod session;
pub mod viewer;
