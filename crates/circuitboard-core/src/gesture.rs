//! Pointer-gesture state machine.
//!
//! One gesture at a time, scoped to one pointer id: pointer-down classifies
//! the topmost interactive target under the pointer into exactly one state,
//! pointer-move streams the corresponding mutation, and pointer-up/cancel
//! unconditionally returns to `Idle`. Click semantics (activating an item,
//! creating a sticky note on the background) fire on pointer-up only when the
//! gesture never crossed the drag threshold.

use crate::geometry::{self, Corner};
use crate::history::History;
use crate::scene::{EdgeId, ItemRef, Node, NodeId, Scene, Selection, StickyId, StickyNote};
use crate::viewport::Viewport;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Identifier of an input pointer (mouse, touch, pen contact).
pub type PointerId = u64;

/// Displacement (scene units) beyond which a gesture counts as a drag.
pub const DRAG_THRESHOLD: f64 = 3.0;
/// Screen-space expansion of the trash drop-zone hit box.
pub const TRASH_HIT_EXPANSION: f64 = 6.0;
/// Screen-space hit radius of the four link handles on a node.
pub const LINK_HANDLE_HIT_RADIUS: f64 = 8.0;
/// Screen-space hit radius of a resize corner.
pub const RESIZE_HANDLE_HIT_RADIUS: f64 = 8.0;
/// Screen-space hit tolerance around an edge path.
pub const EDGE_HIT_TOLERANCE: f64 = 6.0;

/// What a pointer-down on empty background does.
///
/// A persistent two-valued setting, not part of any gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InteractionMode {
    #[default]
    Pan,
    BoxSelect,
}

/// The side of a node a link handle sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleSide {
    Left,
    Right,
    Top,
    Bottom,
}

impl HandleSide {
    pub const ALL: [HandleSide; 4] = [
        HandleSide::Left,
        HandleSide::Right,
        HandleSide::Top,
        HandleSide::Bottom,
    ];

    /// Anchor point of this handle on the node's circle boundary.
    pub fn anchor(self, node: &Node) -> Point {
        let c = node.center();
        let r = node.radius();
        match self {
            HandleSide::Left => Point::new(c.x - r, c.y),
            HandleSide::Right => Point::new(c.x + r, c.y),
            HandleSide::Top => Point::new(c.x, c.y - r),
            HandleSide::Bottom => Point::new(c.x, c.y + r),
        }
    }
}

/// Topmost interactive target under a scene point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    LinkHandle { node: NodeId, side: HandleSide },
    NodeCorner { node: NodeId, corner: Corner },
    NodeBody(NodeId),
    StickyCorner { sticky: StickyId, corner: Corner },
    StickyBody(StickyId),
    EdgePath(EdgeId),
    Background,
}

/// Resolve the target under `point` in the fixed priority order:
/// link handle > resize corner > node/sticky body > edge path > background.
///
/// Nodes render above sticky notes and both above edges; within each layer
/// the last-added item is topmost. Hit tolerances are screen-sized, so they
/// are divided by the zoom factor here.
pub fn hit_test(scene: &Scene, point: Point, zoom: f64) -> HitTarget {
    let handle_tol = LINK_HANDLE_HIT_RADIUS / zoom;
    let corner_tol = RESIZE_HANDLE_HIT_RADIUS / zoom;

    for node in scene.nodes.iter().rev() {
        for side in HandleSide::ALL {
            if (point - side.anchor(node)).hypot() <= handle_tol {
                return HitTarget::LinkHandle {
                    node: node.id,
                    side,
                };
            }
        }
        for corner in Corner::ALL {
            if (point - corner.of(node.bounds())).hypot() <= corner_tol {
                return HitTarget::NodeCorner {
                    node: node.id,
                    corner,
                };
            }
        }
        if node.hit_test(point) {
            return HitTarget::NodeBody(node.id);
        }
    }

    for sticky in scene.sticky_notes.iter().rev() {
        for corner in Corner::ALL {
            if (point - corner.of(sticky.bounds())).hypot() <= corner_tol {
                return HitTarget::StickyCorner {
                    sticky: sticky.id,
                    corner,
                };
            }
        }
        if sticky.bounds().contains(point) {
            return HitTarget::StickyBody(sticky.id);
        }
    }

    let edge_tol = EDGE_HIT_TOLERANCE / zoom;
    for edge in scene.edges.iter().rev() {
        let (Some(src), Some(tgt)) = (scene.node(edge.source_id), scene.node(edge.target_id))
        else {
            continue;
        };
        let (a, b) = geometry::edge_anchors(src, tgt);
        let control = edge
            .control
            .unwrap_or_else(|| Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0));
        if geometry::quad_distance(a, control, b, point) <= edge_tol {
            return HitTarget::EdgePath(edge.id);
        }
    }

    HitTarget::Background
}

/// The mutually-exclusive gesture states.
///
/// `EdgePress` is the provisional "maybe-curving" sub-state: a plain click on
/// an edge opens its menu, and only movement past the drag threshold promotes
/// it to `DraggingEdgeControl`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum GestureState {
    #[default]
    Idle,
    Panning {
        origin_screen: Point,
        pan_origin: Vec2,
    },
    BoxSelecting {
        origin: Point,
        current: Point,
    },
    DraggingNodes {
        origin: Point,
        primary: NodeId,
        /// Every moved node with its position at gesture start.
        nodes: Vec<(NodeId, Point)>,
        /// Stickies moved along with a multi-selection.
        stickies: Vec<(StickyId, Point)>,
    },
    DraggingStickies {
        origin: Point,
        primary: StickyId,
        nodes: Vec<(NodeId, Point)>,
        stickies: Vec<(StickyId, Point)>,
    },
    ResizingNode {
        node: NodeId,
        corner: Corner,
        origin: Point,
        orig_position: Point,
        orig_size: f64,
    },
    ResizingSticky {
        sticky: StickyId,
        corner: Corner,
        origin: Point,
        orig_position: Point,
        orig_width: f64,
        orig_height: f64,
    },
    Linking {
        source: NodeId,
        side: HandleSide,
    },
    EdgePress {
        edge: EdgeId,
        origin: Point,
    },
    DraggingEdgeControl {
        edge: EdgeId,
    },
}

/// Arbitrates pointer events into gestures and applies their mutations.
#[derive(Debug, Default)]
pub struct GestureMachine {
    state: GestureState,
    /// The pointer that owns the current gesture. Events from any other
    /// pointer id are ignored until this one releases (pointer capture).
    pointer: Option<PointerId>,
    /// Raised once the gesture crosses the drag threshold; consulted exactly
    /// once on pointer-up to suppress click semantics, then reset.
    has_dragged: bool,
    /// Scene snapshot taken at pointer-down on a mutating target, pushed to
    /// history the first time the gesture crosses the drag threshold. One
    /// history entry per real drag; none for clicks or per pointer-move.
    pending_snapshot: Option<Scene>,
    over_trash: bool,
    /// Trash drop-zone in screen coordinates, when the host displays one.
    trash_zone: Option<Rect>,
    /// Last pointer position in scene coordinates (rubber-band rendering).
    pointer_scene: Point,
}

impl GestureMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, GestureState::Idle)
    }

    pub fn is_over_trash(&self) -> bool {
        self.over_trash
    }

    /// Set (or remove) the screen-space trash drop-zone.
    pub fn set_trash_zone(&mut self, zone: Option<Rect>) {
        self.trash_zone = zone;
    }

    /// Rubber band from the origin link handle to the live pointer, while a
    /// linking gesture is active.
    pub fn rubber_band(&self, scene: &Scene) -> Option<(Point, Point)> {
        if let GestureState::Linking { source, side } = &self.state {
            scene
                .node(*source)
                .map(|n| (side.anchor(n), self.pointer_scene))
        } else {
            None
        }
    }

    /// Marquee rectangle while a box-select gesture is active.
    pub fn selection_rect(&self) -> Option<Rect> {
        if let GestureState::BoxSelecting { origin, current } = self.state {
            Some(Rect::from_points(origin, current))
        } else {
            None
        }
    }

    /// Classify a pointer-down into a gesture.
    pub fn pointer_down(
        &mut self,
        pointer: PointerId,
        screen: Point,
        scene: &Scene,
        viewport: &Viewport,
        selection: &Selection,
        mode: InteractionMode,
    ) {
        // A second pointer cannot interleave mid-gesture
        if self.pointer.is_some() {
            return;
        }
        self.pointer = Some(pointer);
        self.has_dragged = false;
        self.over_trash = false;
        self.pending_snapshot = None;

        let point = viewport.to_scene(screen);
        self.pointer_scene = point;
        let target = hit_test(scene, point, viewport.zoom);
        log::debug!("pointer down on {target:?}");

        self.state = match target {
            HitTarget::LinkHandle { node, side } => GestureState::Linking { source: node, side },
            HitTarget::NodeCorner { node, corner } => match scene.node(node) {
                Some(n) => {
                    self.pending_snapshot = Some(scene.clone());
                    GestureState::ResizingNode {
                        node,
                        corner,
                        origin: point,
                        orig_position: n.position,
                        orig_size: n.size,
                    }
                }
                None => GestureState::Idle,
            },
            HitTarget::NodeBody(id) => match scene.node(id) {
                Some(n) => {
                    self.pending_snapshot = Some(scene.clone());
                    let (nodes, stickies) = if selection.multi_contains_node(id) {
                        grab_selection(scene, selection)
                    } else {
                        (vec![(id, n.position)], Vec::new())
                    };
                    GestureState::DraggingNodes {
                        origin: point,
                        primary: id,
                        nodes,
                        stickies,
                    }
                }
                None => GestureState::Idle,
            },
            HitTarget::StickyCorner { sticky, corner } => match scene.sticky(sticky) {
                Some(s) => {
                    self.pending_snapshot = Some(scene.clone());
                    GestureState::ResizingSticky {
                        sticky,
                        corner,
                        origin: point,
                        orig_position: s.position,
                        orig_width: s.width,
                        orig_height: s.height,
                    }
                }
                None => GestureState::Idle,
            },
            HitTarget::StickyBody(id) => match scene.sticky(id) {
                Some(s) => {
                    self.pending_snapshot = Some(scene.clone());
                    let (nodes, stickies) = if selection.multi_contains_sticky(id) {
                        grab_selection(scene, selection)
                    } else {
                        (Vec::new(), vec![(id, s.position)])
                    };
                    GestureState::DraggingStickies {
                        origin: point,
                        primary: id,
                        nodes,
                        stickies,
                    }
                }
                None => GestureState::Idle,
            },
            HitTarget::EdgePath(id) => {
                self.pending_snapshot = Some(scene.clone());
                GestureState::EdgePress {
                    edge: id,
                    origin: point,
                }
            }
            HitTarget::Background => match mode {
                InteractionMode::Pan => GestureState::Panning {
                    origin_screen: screen,
                    pan_origin: viewport.pan,
                },
                InteractionMode::BoxSelect => GestureState::BoxSelecting {
                    origin: point,
                    current: point,
                },
            },
        };
    }

    /// Stream the active gesture's mutation for a pointer-move.
    pub fn pointer_move(
        &mut self,
        pointer: PointerId,
        screen: Point,
        scene: &mut Scene,
        viewport: &mut Viewport,
        history: &mut History,
    ) {
        if self.pointer != Some(pointer) {
            return;
        }
        let point = viewport.to_scene(screen);
        self.pointer_scene = point;

        let mut promoted_edge: Option<EdgeId> = None;
        match &mut self.state {
            GestureState::Idle | GestureState::Linking { .. } => {}
            GestureState::Panning {
                origin_screen,
                pan_origin,
            } => {
                let delta = (screen - *origin_screen) / viewport.zoom;
                let pan_origin = *pan_origin;
                if !self.has_dragged && delta.hypot() > DRAG_THRESHOLD {
                    self.has_dragged = true;
                }
                viewport.set_pan(pan_origin + delta);
            }
            GestureState::BoxSelecting { origin, current } => {
                *current = point;
                if !self.has_dragged && (point - *origin).hypot() > DRAG_THRESHOLD {
                    self.has_dragged = true;
                }
            }
            GestureState::DraggingNodes {
                origin,
                nodes,
                stickies,
                ..
            }
            | GestureState::DraggingStickies {
                origin,
                nodes,
                stickies,
                ..
            } => {
                let delta = point - *origin;
                if !self.has_dragged && delta.hypot() > DRAG_THRESHOLD {
                    self.has_dragged = true;
                    if let Some(snapshot) = self.pending_snapshot.take() {
                        history.push_snapshot(snapshot);
                    }
                }
                // One shared delta keeps relative offsets exact
                for (id, orig) in nodes.iter() {
                    if let Some(node) = scene.node_mut(*id) {
                        node.position = *orig + delta;
                    }
                }
                for (id, orig) in stickies.iter() {
                    if let Some(sticky) = scene.sticky_mut(*id) {
                        sticky.position = *orig + delta;
                    }
                }
            }
            GestureState::ResizingNode {
                node,
                corner,
                origin,
                orig_position,
                orig_size,
            } => {
                let delta = point - *origin;
                let (position, size) =
                    geometry::resize_node(*orig_position, *orig_size, *corner, delta);
                if !self.has_dragged && delta.hypot() > DRAG_THRESHOLD {
                    self.has_dragged = true;
                    if let Some(snapshot) = self.pending_snapshot.take() {
                        history.push_snapshot(snapshot);
                    }
                }
                if let Some(n) = scene.node_mut(*node) {
                    n.position = position;
                    n.size = size;
                }
            }
            GestureState::ResizingSticky {
                sticky,
                corner,
                origin,
                orig_position,
                orig_width,
                orig_height,
            } => {
                let delta = point - *origin;
                let (position, width, height) = geometry::resize_sticky(
                    *orig_position,
                    *orig_width,
                    *orig_height,
                    *corner,
                    delta,
                );
                if !self.has_dragged && delta.hypot() > DRAG_THRESHOLD {
                    self.has_dragged = true;
                    if let Some(snapshot) = self.pending_snapshot.take() {
                        history.push_snapshot(snapshot);
                    }
                }
                if let Some(s) = scene.sticky_mut(*sticky) {
                    s.position = position;
                    s.width = width;
                    s.height = height;
                }
            }
            GestureState::EdgePress { edge, origin } => {
                if (point - *origin).hypot() > DRAG_THRESHOLD {
                    promoted_edge = Some(*edge);
                }
            }
            GestureState::DraggingEdgeControl { edge } => {
                if let Some(e) = scene.edge_mut(*edge) {
                    e.control = Some(point);
                }
            }
        }

        if let Some(edge) = promoted_edge {
            self.has_dragged = true;
            if let Some(snapshot) = self.pending_snapshot.take() {
                history.push_snapshot(snapshot);
            }
            if let Some(e) = scene.edge_mut(edge) {
                e.control = Some(point);
            }
            self.state = GestureState::DraggingEdgeControl { edge };
        }

        self.over_trash = match (&self.state, self.trash_zone) {
            (
                GestureState::DraggingNodes { .. } | GestureState::DraggingStickies { .. },
                Some(zone),
            ) => zone
                .inflate(TRASH_HIT_EXPANSION, TRASH_HIT_EXPANSION)
                .contains(screen),
            _ => false,
        };
    }

    /// Finalize the active gesture.
    ///
    /// Every state returns to `Idle` regardless of outcome; a gesture that
    /// "fails" (link released over nothing, empty marquee) simply leaves the
    /// scene as the streamed mutations left it.
    pub fn pointer_up(
        &mut self,
        pointer: PointerId,
        screen: Point,
        scene: &mut Scene,
        viewport: &Viewport,
        selection: &mut Selection,
        history: &mut History,
    ) {
        if self.pointer != Some(pointer) {
            return;
        }
        let point = viewport.to_scene(screen);
        let state = std::mem::take(&mut self.state);
        // One-shot: consulted here, reset before anything else can read it
        let dragged = std::mem::take(&mut self.has_dragged);
        let over_trash = std::mem::take(&mut self.over_trash);
        self.pending_snapshot = None;
        self.pointer = None;

        match state {
            GestureState::Idle => {}
            GestureState::Panning { .. } => {
                // Background release always deselects
                selection.clear();
                if !dragged {
                    history.push(scene);
                    let id = scene.add_sticky(StickyNote::at(point));
                    selection.activate(ItemRef::Sticky(id));
                    log::debug!("background click created sticky {id}");
                }
            }
            GestureState::BoxSelecting { origin, .. } => {
                let rect = Rect::from_points(origin, point);
                let nodes = scene
                    .nodes
                    .iter()
                    .filter(|n| geometry::rect_overlap(rect, n.bounds()))
                    .map(|n| n.id)
                    .collect::<Vec<_>>();
                let stickies = scene
                    .sticky_notes
                    .iter()
                    .filter(|s| geometry::rect_overlap(rect, s.bounds()))
                    .map(|s| s.id)
                    .collect::<Vec<_>>();
                // Zero matches still replaces the selection with an empty set
                *selection = Selection::Multi { nodes, stickies };
            }
            GestureState::DraggingNodes {
                primary,
                nodes,
                stickies,
                ..
            } => {
                if over_trash {
                    let group = selection.multi_contains_node(primary);
                    drop_into_trash(scene, selection, history, &nodes, &stickies, group);
                    if !group {
                        selection.forget(ItemRef::Node(primary));
                    }
                } else if !dragged {
                    // Click: open the node editor
                    selection.activate(ItemRef::Node(primary));
                }
            }
            GestureState::DraggingStickies {
                primary,
                nodes,
                stickies,
                ..
            } => {
                if over_trash {
                    let group = selection.multi_contains_sticky(primary);
                    drop_into_trash(scene, selection, history, &nodes, &stickies, group);
                    if !group {
                        selection.forget(ItemRef::Sticky(primary));
                    }
                } else if !dragged {
                    selection.activate(ItemRef::Sticky(primary));
                }
            }
            GestureState::ResizingNode { .. } | GestureState::ResizingSticky { .. } => {
                // Domain clamps were applied continuously; nothing to validate
            }
            GestureState::Linking { source, .. } => {
                let target = scene.topmost_node_at(point).map(|n| n.id);
                match target {
                    Some(target) if target != source && !scene.has_link(source, target) => {
                        history.push(scene);
                        scene.link(source, target);
                        log::debug!("linked {source} -> {target}");
                    }
                    // Empty space, same node, already connected: silent cancel
                    _ => {}
                }
            }
            GestureState::EdgePress { edge, .. } => {
                if !dragged {
                    // Click: open the edge's inline menu
                    selection.activate(ItemRef::Edge(edge));
                }
            }
            GestureState::DraggingEdgeControl { .. } => {}
        }
    }

    /// Abort the active gesture.
    ///
    /// Handled like pointer-up for cleanup, but with none of the completion
    /// side effects: no link commit, no trash delete, no click semantics.
    /// Mutations that already streamed during pointer-move stay in place.
    pub fn pointer_cancel(&mut self, pointer: PointerId) {
        if self.pointer != Some(pointer) {
            return;
        }
        log::debug!("pointer cancel in {:?}", self.state);
        self.state = GestureState::Idle;
        self.pointer = None;
        self.has_dragged = false;
        self.over_trash = false;
        self.pending_snapshot = None;
    }
}

/// Collect the multi-selection's items with their current positions.
fn grab_selection(
    scene: &Scene,
    selection: &Selection,
) -> (Vec<(NodeId, Point)>, Vec<(StickyId, Point)>) {
    let Selection::Multi { nodes, stickies } = selection else {
        return (Vec::new(), Vec::new());
    };
    let nodes = nodes
        .iter()
        .filter_map(|&id| scene.node(id).map(|n| (id, n.position)))
        .collect();
    let stickies = stickies
        .iter()
        .filter_map(|&id| scene.sticky(id).map(|s| (id, s.position)))
        .collect();
    (nodes, stickies)
}

/// Delete the dropped items as one history-recorded step.
fn drop_into_trash(
    scene: &mut Scene,
    selection: &mut Selection,
    history: &mut History,
    nodes: &[(NodeId, Point)],
    stickies: &[(StickyId, Point)],
    group: bool,
) {
    history.push(scene);
    for (id, _) in nodes {
        scene.remove_node(*id);
    }
    for (id, _) in stickies {
        scene.remove_sticky(*id);
    }
    if group {
        selection.clear();
    }
    log::debug!(
        "trash drop removed {} node(s), {} sticky note(s)",
        nodes.len(),
        stickies.len()
    );
}
