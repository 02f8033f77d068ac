//! Derived metrics over a scene.
//!
//! A pure, read-only collaborator: `analyze` never mutates engine state and
//! tolerates empty scenes without division errors.

use crate::scene::{Color, NodeId, Scene};
use std::collections::HashMap;

/// Number of connections from which a node counts as a hub.
pub const HUB_THRESHOLD: usize = 3;

/// A node with its connection count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionCount {
    pub node: NodeId,
    pub title: String,
    pub count: usize,
}

/// A tag with the number of nodes carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// How many nodes use a color, and the share of the scene they make up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorUsage {
    pub color: Color,
    pub count: usize,
    pub percentage: u32,
}

/// Documentation-coverage percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Completeness {
    /// Nodes with a non-empty description.
    pub descriptions: u32,
    /// Nodes with at least one tag.
    pub tags: u32,
    /// Sticky notes with non-empty content (100 when there are none).
    pub notes: u32,
    /// Average of the three.
    pub overall: u32,
}

/// The full metrics bundle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneMetrics {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub total_stickies: usize,
    /// Edge count as a percentage of the possible node pairs.
    pub density: u32,
    /// Per-node connection counts, most connected first.
    pub connections: Vec<ConnectionCount>,
    /// Top five connected nodes (only those with at least one edge).
    pub top_connected: Vec<ConnectionCount>,
    /// Nodes with no edges at all.
    pub isolated: usize,
    /// Nodes with `HUB_THRESHOLD` or more connections.
    pub hubs: Vec<ConnectionCount>,
    /// Tags shared by two or more nodes, largest cluster first.
    pub clusters: Vec<TagCount>,
    /// Ten most frequent tags.
    pub top_tags: Vec<TagCount>,
    /// Per-color usage, most used first.
    pub colors: Vec<ColorUsage>,
    pub completeness: Completeness,
}

/// Compute metrics for a scene.
pub fn analyze(scene: &Scene) -> SceneMetrics {
    let total_nodes = scene.nodes.len();
    let total_edges = scene.edges.len();
    let total_stickies = scene.sticky_notes.len();
    if total_nodes == 0 {
        return SceneMetrics {
            total_edges,
            total_stickies,
            ..SceneMetrics::default()
        };
    }

    let mut connections: Vec<ConnectionCount> = scene
        .nodes
        .iter()
        .map(|node| ConnectionCount {
            node: node.id,
            title: node.title.clone(),
            count: scene.edges.iter().filter(|e| e.touches(node.id)).count(),
        })
        .collect();
    connections.sort_by(|a, b| b.count.cmp(&a.count));

    let isolated = connections.iter().filter(|c| c.count == 0).count();
    let hubs: Vec<ConnectionCount> = connections
        .iter()
        .filter(|c| c.count >= HUB_THRESHOLD)
        .cloned()
        .collect();
    let top_connected: Vec<ConnectionCount> = connections
        .iter()
        .filter(|c| c.count > 0)
        .take(5)
        .cloned()
        .collect();

    let possible_pairs = total_nodes * (total_nodes.saturating_sub(1)) / 2;
    let density = if possible_pairs > 0 {
        ((total_edges as f64 / possible_pairs as f64) * 100.0).round() as u32
    } else {
        0
    };

    // Tag frequency, counting each node once per tag occurrence
    let mut tag_counts: HashMap<&str, usize> = HashMap::new();
    for node in &scene.nodes {
        for tag in &node.tags {
            *tag_counts.entry(tag.as_str()).or_default() += 1;
        }
    }
    let mut tags: Vec<TagCount> = tag_counts
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            count,
        })
        .collect();
    tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    let clusters: Vec<TagCount> = tags.iter().filter(|t| t.count >= 2).cloned().collect();
    let top_tags: Vec<TagCount> = tags.into_iter().take(10).collect();

    let mut color_counts: HashMap<Color, usize> = HashMap::new();
    for node in &scene.nodes {
        *color_counts.entry(node.color).or_default() += 1;
    }
    let mut colors: Vec<ColorUsage> = color_counts
        .into_iter()
        .map(|(color, count)| ColorUsage {
            color,
            count,
            percentage: ((count as f64 / total_nodes as f64) * 100.0).round() as u32,
        })
        .collect();
    colors.sort_by(|a, b| b.count.cmp(&a.count));

    let pct = |part: usize, whole: usize| -> u32 {
        if whole == 0 {
            100
        } else {
            ((part as f64 / whole as f64) * 100.0).round() as u32
        }
    };
    let described = scene
        .nodes
        .iter()
        .filter(|n| !n.description.trim().is_empty())
        .count();
    let tagged = scene.nodes.iter().filter(|n| !n.tags.is_empty()).count();
    let filled_notes = scene
        .sticky_notes
        .iter()
        .filter(|s| !s.content.trim().is_empty())
        .count();
    let descriptions = pct(described, total_nodes);
    let tagged_pct = pct(tagged, total_nodes);
    let notes = pct(filled_notes, total_stickies);
    let completeness = Completeness {
        descriptions,
        tags: tagged_pct,
        notes,
        overall: (descriptions + tagged_pct + notes) / 3,
    };

    SceneMetrics {
        total_nodes,
        total_edges,
        total_stickies,
        density,
        connections,
        top_connected,
        isolated,
        hubs,
        clusters,
        top_tags,
        colors,
        completeness,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Node, StickyNote};
    use kurbo::Point;

    fn node(scene: &mut Scene, title: &str, tags: &[&str]) -> NodeId {
        let mut n = Node::new(Point::ZERO, Color::default(), title);
        n.tags = tags.iter().map(|t| t.to_string()).collect();
        scene.add_node(n)
    }

    #[test]
    fn test_empty_scene_is_safe() {
        let metrics = analyze(&Scene::new());
        assert_eq!(metrics.total_nodes, 0);
        assert_eq!(metrics.density, 0);
        assert!(metrics.connections.is_empty());
    }

    #[test]
    fn test_single_node_no_division_error() {
        let mut scene = Scene::new();
        node(&mut scene, "only", &[]);
        let metrics = analyze(&scene);
        assert_eq!(metrics.density, 0);
        assert_eq!(metrics.isolated, 1);
    }

    #[test]
    fn test_density_and_hubs() {
        let mut scene = Scene::new();
        let hub = node(&mut scene, "hub", &[]);
        let a = node(&mut scene, "a", &[]);
        let b = node(&mut scene, "b", &[]);
        let c = node(&mut scene, "c", &[]);
        let _lonely = node(&mut scene, "lonely", &[]);
        scene.link(hub, a);
        scene.link(hub, b);
        scene.link(hub, c);

        let metrics = analyze(&scene);
        // 3 edges out of C(5,2) = 10 pairs
        assert_eq!(metrics.density, 30);
        assert_eq!(metrics.isolated, 1);
        assert_eq!(metrics.hubs.len(), 1);
        assert_eq!(metrics.hubs[0].title, "hub");
        assert_eq!(metrics.top_connected.len(), 4);
        assert_eq!(metrics.top_connected[0].count, 3);
    }

    #[test]
    fn test_tag_clusters_and_top_tags() {
        let mut scene = Scene::new();
        node(&mut scene, "a", &["backend", "db"]);
        node(&mut scene, "b", &["backend"]);
        node(&mut scene, "c", &["frontend"]);

        let metrics = analyze(&scene);
        assert_eq!(metrics.clusters.len(), 1);
        assert_eq!(metrics.clusters[0].tag, "backend");
        assert_eq!(metrics.clusters[0].count, 2);
        assert_eq!(metrics.top_tags.len(), 3);
        assert_eq!(metrics.top_tags[0].tag, "backend");
    }

    #[test]
    fn test_completeness_percentages() {
        let mut scene = Scene::new();
        let a = node(&mut scene, "a", &["tagged"]);
        node(&mut scene, "b", &[]);
        scene.node_mut(a).unwrap().description = "documented".into();

        let sticky = scene.add_sticky(StickyNote::at(Point::ZERO));
        scene.add_sticky(StickyNote::at(Point::ZERO));
        scene.sticky_mut(sticky).unwrap().content = "notes".into();

        let metrics = analyze(&scene);
        assert_eq!(metrics.completeness.descriptions, 50);
        assert_eq!(metrics.completeness.tags, 50);
        assert_eq!(metrics.completeness.notes, 50);
        assert_eq!(metrics.completeness.overall, 50);
    }

    #[test]
    fn test_no_stickies_counts_as_full_note_coverage() {
        let mut scene = Scene::new();
        node(&mut scene, "a", &[]);
        let metrics = analyze(&scene);
        assert_eq!(metrics.completeness.notes, 100);
    }

    #[test]
    fn test_color_usage() {
        let mut scene = Scene::new();
        node(&mut scene, "a", &[]);
        node(&mut scene, "b", &[]);
        let c = node(&mut scene, "c", &[]);
        scene.node_mut(c).unwrap().color = Color::black();

        let metrics = analyze(&scene);
        assert_eq!(metrics.colors.len(), 2);
        assert_eq!(metrics.colors[0].count, 2);
        assert_eq!(metrics.colors[0].percentage, 67);
    }
}
