//! Runtime engine: owns the scene, viewport, selection, history and gesture
//! machine, and exposes the discrete command surface the surrounding UI
//! issues into the core.
//!
//! Every mutating command is the unit the history manager snapshots around.
//! Domain clamps and no-op conditions resolve silently; only a malformed
//! scene code reports an error.

use crate::analysis::{self, SceneMetrics};
use crate::codec::{self, CodecError};
use crate::gesture::{GestureMachine, InteractionMode, PointerId};
use crate::history::History;
use crate::scene::{
    Color, DEFAULT_NODE_SIZE, EdgeDirection, EdgeId, ItemRef, Keyword, MAX_NODE_SIZE,
    MIN_NODE_SIZE, Node, NodeId, Scene, Selection, StickyId, StickyNote,
};
use crate::viewport::{Viewport, ViewportGuard, ZOOM_MAX, ZOOM_MIN};
use kurbo::{Point, Rect, Vec2};

/// Fallback insertion point before the viewport has been measured.
const FALLBACK_CENTER: Point = Point::new(200.0, 200.0);

/// The scene interaction engine.
#[derive(Debug, Default)]
pub struct Engine {
    pub scene: Scene,
    pub viewport: Viewport,
    pub selection: Selection,
    pub history: History,
    pub mode: InteractionMode,
    /// Palette color applied to newly added nodes.
    pub selected_color: Color,
    gestures: GestureMachine,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the gesture machine (rubber band, marquee, trash hover).
    pub fn gestures(&self) -> &GestureMachine {
        &self.gestures
    }

    /// Set (or remove) the screen-space trash drop-zone.
    pub fn set_trash_zone(&mut self, zone: Option<Rect>) {
        self.gestures.set_trash_zone(zone);
    }

    pub fn set_mode(&mut self, mode: InteractionMode) {
        self.mode = mode;
    }

    // --- Pointer events -------------------------------------------------

    pub fn pointer_down(&mut self, pointer: PointerId, screen: Point) {
        self.gestures.pointer_down(
            pointer,
            screen,
            &self.scene,
            &self.viewport,
            &self.selection,
            self.mode,
        );
    }

    pub fn pointer_move(&mut self, pointer: PointerId, screen: Point) {
        self.gestures.pointer_move(
            pointer,
            screen,
            &mut self.scene,
            &mut self.viewport,
            &mut self.history,
        );
    }

    pub fn pointer_up(&mut self, pointer: PointerId, screen: Point) {
        self.gestures.pointer_up(
            pointer,
            screen,
            &mut self.scene,
            &self.viewport,
            &mut self.selection,
            &mut self.history,
        );
    }

    pub fn pointer_cancel(&mut self, pointer: PointerId) {
        self.gestures.pointer_cancel(pointer);
    }

    // --- Commands -------------------------------------------------------

    /// Add a node at the viewport center with the selected palette color.
    pub fn add_node(&mut self) -> NodeId {
        let center = self
            .viewport
            .center_scene_point()
            .unwrap_or(FALLBACK_CENTER);
        self.history.push(&self.scene);
        let half = DEFAULT_NODE_SIZE / 2.0;
        let title = format!("Node {}", self.scene.nodes.len() + 1);
        let node = Node::new(
            Point::new(center.x - half, center.y - half),
            self.selected_color,
            title,
        );
        log::debug!("add node {} at {:?}", node.id, node.position);
        self.scene.add_node(node)
    }

    /// Add a sticky note centered on a scene point and open its editor.
    pub fn add_sticky_at(&mut self, point: Point) -> StickyId {
        self.history.push(&self.scene);
        let id = self.scene.add_sticky(StickyNote::at(point));
        self.selection.activate(ItemRef::Sticky(id));
        id
    }

    /// Delete a node and every edge referencing it.
    pub fn delete_node(&mut self, id: NodeId) {
        if self.scene.node(id).is_none() {
            return;
        }
        self.history.push(&self.scene);
        self.scene.remove_node(id);
        self.selection.forget(ItemRef::Node(id));
    }

    pub fn delete_sticky(&mut self, id: StickyId) {
        if self.scene.sticky(id).is_none() {
            return;
        }
        self.history.push(&self.scene);
        self.scene.remove_sticky(id);
        self.selection.forget(ItemRef::Sticky(id));
    }

    pub fn delete_edge(&mut self, id: EdgeId) {
        if self.scene.edge(id).is_none() {
            return;
        }
        self.history.push(&self.scene);
        self.scene.remove_edge(id);
        self.selection.forget(ItemRef::Edge(id));
    }

    pub fn set_edge_direction(&mut self, id: EdgeId, direction: EdgeDirection) {
        if self.scene.edge(id).is_none() {
            return;
        }
        self.history.push(&self.scene);
        if let Some(edge) = self.scene.edge_mut(id) {
            edge.direction = direction;
        }
    }

    pub fn toggle_edge_keyword(&mut self, id: EdgeId, keyword: Keyword) {
        if self.scene.edge(id).is_none() {
            return;
        }
        self.history.push(&self.scene);
        if let Some(edge) = self.scene.edge_mut(id) {
            edge.toggle_keyword(keyword);
        }
    }

    pub fn set_edge_note(&mut self, id: EdgeId, note: impl Into<String>) {
        if self.scene.edge(id).is_none() {
            return;
        }
        self.history.push(&self.scene);
        if let Some(edge) = self.scene.edge_mut(id) {
            edge.note = note.into();
        }
    }

    /// Set or clear an edge's curve control point.
    pub fn set_edge_control(&mut self, id: EdgeId, control: Option<Point>) {
        if self.scene.edge(id).is_none() {
            return;
        }
        self.history.push(&self.scene);
        if let Some(edge) = self.scene.edge_mut(id) {
            edge.control = control;
        }
    }

    pub fn set_node_title(&mut self, id: NodeId, title: impl Into<String>) {
        if self.scene.node(id).is_none() {
            return;
        }
        self.history.push(&self.scene);
        if let Some(node) = self.scene.node_mut(id) {
            node.title = title.into();
        }
    }

    pub fn set_node_description(&mut self, id: NodeId, description: impl Into<String>) {
        if self.scene.node(id).is_none() {
            return;
        }
        self.history.push(&self.scene);
        if let Some(node) = self.scene.node_mut(id) {
            node.description = description.into();
        }
    }

    pub fn set_node_tags(&mut self, id: NodeId, tags: Vec<String>) {
        if self.scene.node(id).is_none() {
            return;
        }
        self.history.push(&self.scene);
        if let Some(node) = self.scene.node_mut(id) {
            node.tags = tags;
        }
    }

    pub fn set_node_color(&mut self, id: NodeId, color: Color) {
        if self.scene.node(id).is_none() {
            return;
        }
        self.history.push(&self.scene);
        if let Some(node) = self.scene.node_mut(id) {
            node.color = color;
        }
    }

    /// Set a node's diameter, clamped to the size domain.
    pub fn set_node_size(&mut self, id: NodeId, size: f64) {
        if self.scene.node(id).is_none() {
            return;
        }
        self.history.push(&self.scene);
        if let Some(node) = self.scene.node_mut(id) {
            node.size = size.clamp(MIN_NODE_SIZE, MAX_NODE_SIZE);
        }
    }

    /// Restore the most recent history snapshot. No-op on an empty stack.
    ///
    /// The selection is cleared on success: restored ids may no longer match
    /// the rendered order, so it is deliberately not restorable.
    pub fn undo(&mut self) -> bool {
        if self.history.undo(&mut self.scene) {
            self.selection.clear();
            true
        } else {
            false
        }
    }

    /// Clear the whole scene and reset the view.
    pub fn reset(&mut self) {
        self.history.push(&self.scene);
        self.scene = Scene::new();
        self.selection.clear();
        self.viewport.zoom = 1.0;
        self.viewport.set_pan(Vec2::ZERO);
    }

    // --- Scene codes ----------------------------------------------------

    /// Produce the portable scene code for the current scene and viewport.
    pub fn encode(&self) -> Result<String, CodecError> {
        codec::encode(&self.scene, &self.viewport)
    }

    /// Replace the scene from a code, atomically.
    ///
    /// On any decode failure the scene, viewport and selection are untouched.
    pub fn apply_code(&mut self, code: &str) -> Result<(), CodecError> {
        let decoded = codec::decode(code)?;
        self.history.push(&self.scene);
        self.scene = decoded.scene;
        if let Some(zoom) = decoded.zoom {
            self.viewport.zoom = zoom.clamp(ZOOM_MIN, ZOOM_MAX);
        }
        if let Some(pan) = decoded.pan {
            self.viewport.set_pan(pan);
        }
        self.selection.clear();
        log::info!(
            "loaded scene code: {} node(s), {} edge(s), {} sticky note(s)",
            self.scene.nodes.len(),
            self.scene.edges.len(),
            self.scene.sticky_notes.len()
        );
        Ok(())
    }

    // --- View -----------------------------------------------------------

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Run an export-style read with the viewport temporarily framed around
    /// the scene content.
    ///
    /// The prior zoom/pan come back unconditionally once `f` returns, even if
    /// it panics. Collaborators that repurpose the viewport go through here
    /// instead of mutating it directly.
    pub fn with_framed_content<R>(
        &mut self,
        padding: f64,
        f: impl FnOnce(&Scene, &Viewport) -> R,
    ) -> R {
        let bounds = self.scene.content_bounds();
        let mut guard = ViewportGuard::new(&mut self.viewport);
        if let Some(bounds) = bounds {
            guard.frame_bounds(bounds, padding);
        }
        f(&self.scene, &guard)
    }

    /// Derived metrics over the current scene (read-only collaborator).
    pub fn analyze(&self) -> SceneMetrics {
        analysis::analyze(&self.scene)
    }
}
