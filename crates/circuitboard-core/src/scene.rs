//! Scene data model: nodes, edges, sticky notes, and selection state.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a node.
pub type NodeId = Uuid;
/// Unique identifier for an edge.
pub type EdgeId = Uuid;
/// Unique identifier for a sticky note.
pub type StickyId = Uuid;

/// Smallest allowed node diameter.
pub const MIN_NODE_SIZE: f64 = 24.0;
/// Largest allowed node diameter.
pub const MAX_NODE_SIZE: f64 = 200.0;
/// Diameter given to newly created nodes.
pub const DEFAULT_NODE_SIZE: f64 = 64.0;

/// Smallest allowed sticky note width.
pub const MIN_STICKY_WIDTH: f64 = 100.0;
/// Smallest allowed sticky note height.
pub const MIN_STICKY_HEIGHT: f64 = 80.0;
/// Size given to newly created sticky notes.
pub const DEFAULT_STICKY_SIZE: (f64, f64) = (240.0, 160.0);

/// An RGB color, serialized as a `#rrggbb` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// The fixed palette offered by the surrounding UI. The first entry is the
/// default for new nodes; arbitrary custom colors are also valid.
pub const PALETTE: [Color; 6] = [
    Color::new(0x1e, 0x90, 0xff), // blue (default)
    Color::new(0xff, 0x4d, 0x4f), // red
    Color::new(0xfa, 0xdb, 0x14), // yellow
    Color::new(0x52, 0xc4, 0x1a), // green
    Color::new(0xff, 0xff, 0xff), // white
    Color::new(0x00, 0x00, 0x00), // black
];

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// Parse a `#rrggbb` or shorthand `#rgb` hex string.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().strip_prefix('#')?;
        match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
                Some(Self::new(r, g, b))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::new(r, g, b))
            }
            _ => None,
        }
    }

    /// Format as a lowercase `#rrggbb` hex string.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        PALETTE[0]
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hex color: {s}")))
    }
}

/// A circular node on the canvas.
///
/// `position` is the top-left of the bounding box; the rendered circle is
/// inscribed in the `size`-by-`size` square starting there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub position: Point,
    pub size: f64,
    pub color: Color,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Node {
    /// Create a node with the default size.
    pub fn new(position: Point, color: Color, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            size: DEFAULT_NODE_SIZE,
            color,
            title: title.into(),
            description: String::new(),
            tags: Vec::new(),
        }
    }

    pub fn radius(&self) -> f64 {
        self.size / 2.0
    }

    pub fn center(&self) -> Point {
        let r = self.radius();
        Point::new(self.position.x + r, self.position.y + r)
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.size,
            self.position.y + self.size,
        )
    }

    /// True iff the point lies within the node's circumscribed circle.
    pub fn hit_test(&self, point: Point) -> bool {
        crate::geometry::point_in_circle(point, self.center(), self.radius())
    }

    /// Text color derived from the fill: white on pure black, black otherwise.
    /// Never persisted; always recomputed from `color`.
    pub fn text_color(&self) -> Color {
        if self.color == Color::black() {
            Color::white()
        } else {
            Color::black()
        }
    }
}

/// Arrow direction along an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeDirection {
    #[default]
    None,
    SourceToTarget,
    TargetToSource,
}

/// Semantic keyword attached to an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Keyword {
    Increases,
    Decreases,
}

/// A connection between two nodes.
///
/// `control` is an optional quadratic curve control point; when absent the
/// edge renders as a straight line through the implicit midpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub source_id: NodeId,
    pub target_id: NodeId,
    #[serde(default)]
    pub direction: EdgeDirection,
    #[serde(default)]
    pub keywords: Vec<Keyword>,
    #[serde(default)]
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<Point>,
}

impl Edge {
    pub fn new(source_id: NodeId, target_id: NodeId) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_id,
            target_id,
            direction: EdgeDirection::None,
            keywords: Vec::new(),
            note: String::new(),
            control: None,
        }
    }

    /// True iff this edge connects the unordered pair `{a, b}`.
    pub fn connects(&self, a: NodeId, b: NodeId) -> bool {
        (self.source_id == a && self.target_id == b)
            || (self.source_id == b && self.target_id == a)
    }

    /// True iff either endpoint is `id`.
    pub fn touches(&self, id: NodeId) -> bool {
        self.source_id == id || self.target_id == id
    }

    /// Add the keyword if absent, remove it if present.
    pub fn toggle_keyword(&mut self, keyword: Keyword) {
        if let Some(pos) = self.keywords.iter().position(|&k| k == keyword) {
            self.keywords.remove(pos);
        } else {
            self.keywords.push(keyword);
        }
    }
}

/// A freeform markdown annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickyNote {
    pub id: StickyId,
    pub position: Point,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub content: String,
}

impl StickyNote {
    /// Create a default-sized note centered on `point`.
    pub fn at(point: Point) -> Self {
        let (width, height) = DEFAULT_STICKY_SIZE;
        Self {
            id: Uuid::new_v4(),
            position: Point::new(point.x - width / 2.0, point.y - height / 2.0),
            width,
            height,
            content: String::new(),
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.width,
            self.position.y + self.height,
        )
    }
}

/// The full set of nodes, edges and sticky notes at a point in time.
///
/// The vectors double as z-order: the last element renders topmost.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub sticky_notes: Vec<StickyNote>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.sticky_notes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.iter_mut().find(|e| e.id == id)
    }

    pub fn sticky(&self, id: StickyId) -> Option<&StickyNote> {
        self.sticky_notes.iter().find(|s| s.id == id)
    }

    pub fn sticky_mut(&mut self, id: StickyId) -> Option<&mut StickyNote> {
        self.sticky_notes.iter_mut().find(|s| s.id == id)
    }

    /// Add a node on top of the z-order.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.push(node);
        id
    }

    /// Remove a node and every edge referencing it.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let pos = self.nodes.iter().position(|n| n.id == id)?;
        self.edges.retain(|e| !e.touches(id));
        Some(self.nodes.remove(pos))
    }

    pub fn add_sticky(&mut self, sticky: StickyNote) -> StickyId {
        let id = sticky.id;
        self.sticky_notes.push(sticky);
        id
    }

    pub fn remove_sticky(&mut self, id: StickyId) -> Option<StickyNote> {
        let pos = self.sticky_notes.iter().position(|s| s.id == id)?;
        Some(self.sticky_notes.remove(pos))
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let pos = self.edges.iter().position(|e| e.id == id)?;
        Some(self.edges.remove(pos))
    }

    /// True iff an edge already connects the unordered pair `{a, b}`.
    pub fn has_link(&self, a: NodeId, b: NodeId) -> bool {
        self.edges.iter().any(|e| e.connects(a, b))
    }

    /// Create an edge between two distinct, not-yet-connected nodes.
    ///
    /// Self-links, duplicate pairs (in either direction) and missing
    /// endpoints are all silent no-ops.
    pub fn link(&mut self, source: NodeId, target: NodeId) -> Option<EdgeId> {
        if source == target
            || self.has_link(source, target)
            || self.node(source).is_none()
            || self.node(target).is_none()
        {
            return None;
        }
        let edge = Edge::new(source, target);
        let id = edge.id;
        self.edges.push(edge);
        Some(id)
    }

    /// Topmost node whose circle contains `point` (last added = topmost).
    ///
    /// This is the canonical hit test for link completion.
    pub fn topmost_node_at(&self, point: Point) -> Option<&Node> {
        self.nodes.iter().rev().find(|n| n.hit_test(point))
    }

    /// Bounding box of all nodes and sticky notes, for content framing.
    pub fn content_bounds(&self) -> Option<Rect> {
        let mut result: Option<Rect> = None;
        let rects = self
            .nodes
            .iter()
            .map(Node::bounds)
            .chain(self.sticky_notes.iter().map(StickyNote::bounds));
        for rect in rects {
            result = Some(match result {
                Some(r) => r.union(rect),
                None => rect,
            });
        }
        result
    }

    /// Translate a set of nodes and stickies by one shared delta.
    pub fn translate_items(&mut self, nodes: &[NodeId], stickies: &[StickyId], delta: Vec2) {
        for node in self.nodes.iter_mut().filter(|n| nodes.contains(&n.id)) {
            node.position += delta;
        }
        for sticky in self
            .sticky_notes
            .iter_mut()
            .filter(|s| stickies.contains(&s.id))
        {
            sticky.position += delta;
        }
    }
}

/// Reference to a single selectable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemRef {
    Node(NodeId),
    Edge(EdgeId),
    Sticky(StickyId),
}

/// Current selection.
///
/// Either one "active" item (driving the property editor) or a set of ids
/// from box-select mode; the two representations never coexist.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Selection {
    #[default]
    None,
    Active(ItemRef),
    Multi {
        nodes: Vec<NodeId>,
        stickies: Vec<StickyId>,
    },
}

impl Selection {
    pub fn clear(&mut self) {
        *self = Selection::None;
    }

    pub fn activate(&mut self, item: ItemRef) {
        *self = Selection::Active(item);
    }

    pub fn active(&self) -> Option<ItemRef> {
        match self {
            Selection::Active(item) => Some(*item),
            _ => None,
        }
    }

    /// True iff the node is part of a multi-selection.
    pub fn multi_contains_node(&self, id: NodeId) -> bool {
        matches!(self, Selection::Multi { nodes, .. } if nodes.contains(&id))
    }

    /// True iff the sticky is part of a multi-selection.
    pub fn multi_contains_sticky(&self, id: StickyId) -> bool {
        matches!(self, Selection::Multi { stickies, .. } if stickies.contains(&id))
    }

    /// Drop any reference to a deleted item.
    pub fn forget(&mut self, item: ItemRef) {
        match self {
            Selection::Active(active) if *active == item => *self = Selection::None,
            Selection::Multi { nodes, stickies } => match item {
                ItemRef::Node(id) => nodes.retain(|&n| n != id),
                ItemRef::Sticky(id) => stickies.retain(|&s| s != id),
                ItemRef::Edge(_) => {}
            },
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex_roundtrip() {
        let color = Color::new(0x1e, 0x90, 0xff);
        assert_eq!(color.to_hex(), "#1e90ff");
        assert_eq!(Color::from_hex("#1e90ff"), Some(color));
    }

    #[test]
    fn test_color_shorthand_hex() {
        assert_eq!(Color::from_hex("#fff"), Some(Color::white()));
        assert_eq!(Color::from_hex("#000"), Some(Color::black()));
        assert_eq!(Color::from_hex("not-a-color"), None);
    }

    #[test]
    fn test_text_color_derived() {
        let mut node = Node::new(Point::ZERO, Color::black(), "n");
        assert_eq!(node.text_color(), Color::white());
        node.color = PALETTE[0];
        assert_eq!(node.text_color(), Color::black());
        // Near-black still reads as a light fill
        node.color = Color::new(1, 0, 0);
        assert_eq!(node.text_color(), Color::black());
    }

    #[test]
    fn test_node_center_and_radius() {
        let mut node = Node::new(Point::new(10.0, 20.0), Color::default(), "n");
        node.size = 64.0;
        assert_eq!(node.center(), Point::new(42.0, 52.0));
        assert!((node.radius() - 32.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_remove_node_cascades_edges() {
        let mut scene = Scene::new();
        let a = scene.add_node(Node::new(Point::ZERO, Color::default(), "a"));
        let b = scene.add_node(Node::new(Point::new(200.0, 0.0), Color::default(), "b"));
        let c = scene.add_node(Node::new(Point::new(400.0, 0.0), Color::default(), "c"));
        scene.link(a, b);
        let bc = scene.link(b, c).unwrap();

        scene.remove_node(a);
        assert_eq!(scene.nodes.len(), 2);
        assert_eq!(scene.edges.len(), 1);
        assert_eq!(scene.edges[0].id, bc);
    }

    #[test]
    fn test_link_rejects_duplicates_and_self() {
        let mut scene = Scene::new();
        let a = scene.add_node(Node::new(Point::ZERO, Color::default(), "a"));
        let b = scene.add_node(Node::new(Point::new(200.0, 0.0), Color::default(), "b"));

        assert!(scene.link(a, b).is_some());
        // Reversed direction still counts as the same unordered pair
        assert!(scene.link(b, a).is_none());
        assert!(scene.link(a, a).is_none());
        assert_eq!(scene.edges.len(), 1);
    }

    #[test]
    fn test_topmost_node_wins() {
        let mut scene = Scene::new();
        let bottom = scene.add_node(Node::new(Point::ZERO, Color::default(), "bottom"));
        let top = scene.add_node(Node::new(Point::new(10.0, 10.0), Color::default(), "top"));

        // Point inside both circles resolves to the most recently added
        let hit = scene.topmost_node_at(Point::new(40.0, 40.0)).unwrap();
        assert_eq!(hit.id, top);

        scene.remove_node(top);
        let hit = scene.topmost_node_at(Point::new(30.0, 30.0)).unwrap();
        assert_eq!(hit.id, bottom);
    }

    #[test]
    fn test_toggle_keyword() {
        let mut edge = Edge::new(Uuid::new_v4(), Uuid::new_v4());
        edge.toggle_keyword(Keyword::Increases);
        assert_eq!(edge.keywords, vec![Keyword::Increases]);
        edge.toggle_keyword(Keyword::Increases);
        assert!(edge.keywords.is_empty());
    }

    #[test]
    fn test_group_translate_preserves_offsets() {
        let mut scene = Scene::new();
        let a = scene.add_node(Node::new(Point::ZERO, Color::default(), "a"));
        let b = scene.add_node(Node::new(Point::new(100.0, 50.0), Color::default(), "b"));
        let s = scene.add_sticky(StickyNote::at(Point::new(300.0, 300.0)));

        scene.translate_items(&[a, b], &[s], Vec2::new(7.0, -3.0));

        assert_eq!(scene.node(a).unwrap().position, Point::new(7.0, -3.0));
        assert_eq!(scene.node(b).unwrap().position, Point::new(107.0, 47.0));
        assert_eq!(scene.sticky(s).unwrap().position, Point::new(187.0, 217.0));
    }

    #[test]
    fn test_selection_forget() {
        let id = Uuid::new_v4();
        let mut selection = Selection::Active(ItemRef::Node(id));
        selection.forget(ItemRef::Node(id));
        assert_eq!(selection, Selection::None);

        let other = Uuid::new_v4();
        let mut selection = Selection::Multi {
            nodes: vec![id, other],
            stickies: vec![],
        };
        selection.forget(ItemRef::Node(id));
        assert!(selection.multi_contains_node(other));
        assert!(!selection.multi_contains_node(id));
    }

    #[test]
    fn test_content_bounds() {
        let mut scene = Scene::new();
        assert!(scene.content_bounds().is_none());

        scene.add_node(Node::new(Point::ZERO, Color::default(), "a"));
        scene.add_sticky(StickyNote::at(Point::new(500.0, 500.0)));
        let bounds = scene.content_bounds().unwrap();
        assert_eq!(bounds.x0, 0.0);
        assert_eq!(bounds.y0, 0.0);
        assert_eq!(bounds.x1, 620.0);
        assert_eq!(bounds.y1, 580.0);
    }
}
