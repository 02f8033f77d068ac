//! Circuitboard Core Library
//!
//! Platform-agnostic interaction engine for the Circuitboard diagram surface:
//! coordinate transforms, the pointer-gesture state machine, scene state,
//! snapshot undo and the portable scene-code codec. Rendering, styling and
//! the surrounding UI live in consumers of this crate.

pub mod analysis;
pub mod codec;
pub mod engine;
pub mod geometry;
pub mod gesture;
pub mod history;
pub mod markdown;
pub mod scene;
pub mod viewport;

pub use analysis::{SceneMetrics, analyze};
pub use codec::{CodecError, DecodedScene};
pub use engine::Engine;
pub use gesture::{GestureMachine, GestureState, HitTarget, InteractionMode, hit_test};
pub use history::History;
pub use scene::{
    Color, Edge, EdgeDirection, ItemRef, Keyword, Node, Scene, Selection, StickyNote,
};
pub use viewport::{Viewport, ViewportGuard};
