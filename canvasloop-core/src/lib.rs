//! canvasloop core
//!
//! Host-agnostic pieces of the render loop: an input aggregator that folds
//! raw pointer/keyboard/resize events into one state record, a frame
//! scheduler that runs a render step once per host repaint and tracks a
//! rolling FPS, and the [`Stage`] that wires both to a drawing surface.
//! Hosts plug in through the traits in [`host`].

pub mod error;
pub mod handle;
pub mod host;
pub mod input;
pub mod manual;
pub mod scheduler;
pub mod stage;
pub mod surface;

pub use error::{Error, Result};
pub use host::{
    Clock, EventHandler, EventKind, EventSource, FrameHandle, FrameRequester, Host, RawEvent,
    ViewportQuery, PRIMARY_BUTTON,
};
pub use input::{InputAggregator, InputCallbacks, InputConfig, InputState, ViewportState};
pub use manual::ManualHost;
pub use scheduler::{FrameInfo, FrameScheduler, FPS_WINDOW_SECS};
pub use stage::{Stage, StageConfig};
pub use surface::{DisplayList, DrawCommand, DrawingSurface, Rect, Rgba};
