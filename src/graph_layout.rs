use std::collections::BTreeMap;

use crate::display_width::{line_height_px, text_height_px, text_width_px};
use crate::error::{Error, Result};
use crate::graph_ast::*;

#[derive(Debug, Clone, PartialEq)]
pub struct GraphLayout {
    pub nodes: Vec<NodeLayout>,
    pub edges: Vec<EdgeLayout>,
    /// Parents come before their children.
    pub clusters: Vec<ClusterLayout>,
    pub caption: Option<Caption>,
    pub width: f32,
    pub height: f32,
    pub direction: Direction,
    pub font_size: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayout {
    pub id: NodeId,
    pub label: String,
    pub kind: NodeKind,
    pub rank: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NodeLayout {
    /// Left edge of the glyph, which is centered above the label.
    pub fn icon_x(&self) -> f32 {
        self.x + (self.width - ICON_SIZE) / 2.0
    }

    pub fn icon_y(&self) -> f32 {
        self.y
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Top of the first label line.
    pub fn label_y(&self) -> f32 {
        self.y + ICON_SIZE + LABEL_GAP
    }

    fn out_anchor(&self, direction: Direction) -> (f32, f32) {
        match direction {
            Direction::LeftRight => (self.icon_x() + ICON_SIZE, self.y + ICON_SIZE / 2.0),
            Direction::TopBottom => (self.center_x(), self.y + self.height),
        }
    }

    fn in_anchor(&self, direction: Direction) -> (f32, f32) {
        match direction {
            Direction::LeftRight => (self.icon_x(), self.y + ICON_SIZE / 2.0),
            Direction::TopBottom => (self.center_x(), self.y),
        }
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterLayout {
    pub label: String,
    /// 1 for top-level clusters.
    pub depth: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ClusterLayout {
    pub fn contains(&self, node: &NodeLayout) -> bool {
        node.x >= self.x
            && node.y >= self.y
            && node.x + node.width <= self.x + self.width
            && node.y + node.height <= self.y + self.height
    }

    pub fn intersects(&self, node: &NodeLayout) -> bool {
        node.x < self.x + self.width
            && self.x < node.x + node.width
            && node.y < self.y + self.height
            && self.y < node.y + node.height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLayout {
    pub from: NodeId,
    pub to: NodeId,
    pub dir: ArrowDir,
    pub points: Vec<(f32, f32)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Caption {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

pub const ICON_SIZE: f32 = 56.0;
pub const CLUSTER_TITLE: f32 = 18.0;
/// Pixels per inch for `pad`.
pub const DPI: f32 = 72.0;

const LABEL_GAP: f32 = 4.0;
const NODE_GAP: f32 = 24.0;
const BASE_RANK_GAP: f32 = 48.0;
const CLUSTER_PAD: f32 = 16.0;
const CLUSTER_GAP: f32 = 20.0;
const CAPTION_FONT_SIZE: f32 = 15.0;

/// Maps the rank axis and the band axis onto x/y.
#[derive(Debug, Clone, Copy)]
struct Axes {
    direction: Direction,
    /// Space a cluster box reserves before its content along each axis.
    lead_main: f32,
    lead_cross: f32,
}

impl Axes {
    fn new(direction: Direction) -> Self {
        match direction {
            Direction::LeftRight => Self {
                direction,
                lead_main: CLUSTER_PAD,
                lead_cross: CLUSTER_PAD + CLUSTER_TITLE,
            },
            Direction::TopBottom => Self {
                direction,
                lead_main: CLUSTER_PAD + CLUSTER_TITLE,
                lead_cross: CLUSTER_PAD,
            },
        }
    }

    fn main(&self, (w, h): (f32, f32)) -> f32 {
        match self.direction {
            Direction::LeftRight => w,
            Direction::TopBottom => h,
        }
    }

    fn cross(&self, (w, h): (f32, f32)) -> f32 {
        match self.direction {
            Direction::LeftRight => h,
            Direction::TopBottom => w,
        }
    }

    fn to_xy(&self, main: f32, cross: f32) -> (f32, f32) {
        match self.direction {
            Direction::LeftRight => (main, cross),
            Direction::TopBottom => (cross, main),
        }
    }
}

pub fn compute(diagram: &Diagram) -> Result<GraphLayout> {
    if diagram.nodes.is_empty() {
        return Err(Error::EmptyDiagram);
    }

    let font_size = diagram.attrs.font_size;
    let axes = Axes::new(diagram.direction);
    let ranks = assign_ranks(diagram);
    let max_rank = ranks.iter().copied().max().unwrap_or(0);
    let sizes: Vec<(f32, f32)> = diagram
        .nodes
        .iter()
        .map(|n| node_size(&n.label, font_size))
        .collect();

    let depth = nesting_depth(&diagram.root);
    let rank_gap = BASE_RANK_GAP + depth as f32 * (axes.lead_main + CLUSTER_PAD);

    let mut rank_sizes = vec![0.0f32; max_rank + 1];
    for (i, size) in sizes.iter().enumerate() {
        rank_sizes[ranks[i]] = rank_sizes[ranks[i]].max(axes.main(*size));
    }
    let mut rank_starts = Vec::with_capacity(rank_sizes.len());
    let mut cursor = 0.0;
    for size in &rank_sizes {
        rank_starts.push(cursor);
        cursor += size + rank_gap;
    }
    let main: Vec<f32> = sizes
        .iter()
        .enumerate()
        .map(|(i, size)| {
            let r = ranks[i];
            rank_starts[r] + (rank_sizes[r] - axes.main(*size)) / 2.0
        })
        .collect();

    let mut bands = BandPlacer {
        axes,
        ranks: &ranks,
        sizes: &sizes,
        main: &main,
        cross: vec![0.0; sizes.len()],
        bands: Vec::new(),
    };
    bands.place(&diagram.root, 0, 0.0);
    let BandPlacer { cross, bands, .. } = bands;

    let mut nodes: Vec<NodeLayout> = diagram
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| {
            let (x, y) = axes.to_xy(main[i], cross[i]);
            NodeLayout {
                id: n.id,
                label: n.label.clone(),
                kind: n.kind,
                rank: ranks[i],
                x,
                y,
                width: sizes[i].0,
                height: sizes[i].1,
            }
        })
        .collect();

    let mut clusters: Vec<(usize, ClusterLayout)> = bands
        .iter()
        .enumerate()
        .map(|(order, band)| {
            let (x, y) = axes.to_xy(band.main_start, band.cross_start);
            let (width, height) = axes.to_xy(band.main_end - band.main_start, band.cross_extent);
            (
                order,
                ClusterLayout {
                    label: band.label.to_string(),
                    depth: band.depth,
                    x,
                    y,
                    width,
                    height,
                },
            )
        })
        .collect();
    // Bands are recorded children first; draw parents underneath.
    clusters.sort_by_key(|(order, c)| (c.depth, *order));
    let mut clusters: Vec<ClusterLayout> = clusters.into_iter().map(|(_, c)| c).collect();

    let mut edges: Vec<EdgeLayout> = diagram
        .edges
        .iter()
        .map(|e| EdgeLayout {
            from: e.from,
            to: e.to,
            dir: e.dir,
            points: route(
                diagram.direction,
                &nodes,
                &nodes[e.from.0],
                &nodes[e.to.0],
                rank_gap,
            ),
        })
        .collect();

    let pad = diagram.attrs.pad * DPI;
    let (min_x, min_y, _, _) = bounds(&nodes, &clusters, &edges);
    let (dx, dy) = (pad - min_x, pad - min_y);
    for node in &mut nodes {
        node.translate(dx, dy);
    }
    for cluster in &mut clusters {
        cluster.x += dx;
        cluster.y += dy;
    }
    for edge in &mut edges {
        for point in &mut edge.points {
            point.0 += dx;
            point.1 += dy;
        }
    }

    let (_, _, max_x, max_y) = bounds(&nodes, &clusters, &edges);
    let width = max_x + pad;
    let mut height = max_y + pad;

    let caption = if diagram.attrs.label.is_empty() {
        None
    } else {
        let caption_height = line_height_px(CAPTION_FONT_SIZE);
        let caption = Caption {
            text: diagram.attrs.label.clone(),
            x: width / 2.0,
            y: max_y + caption_height,
        };
        height += caption_height;
        Some(caption)
    };

    tracing::debug!(
        ranks = max_rank + 1,
        clusters = clusters.len(),
        width,
        height,
        "layout computed"
    );

    Ok(GraphLayout {
        nodes,
        edges,
        clusters,
        caption,
        width,
        height,
        direction: diagram.direction,
        font_size,
    })
}

fn node_size(label: &str, font_size: f32) -> (f32, f32) {
    let width = ICON_SIZE.max(text_width_px(label, font_size));
    let height = ICON_SIZE + LABEL_GAP + text_height_px(label, font_size);
    (width, height)
}

/// Depth of the deepest non-empty cluster below `cluster`.
fn nesting_depth(cluster: &Cluster) -> usize {
    cluster
        .clusters
        .iter()
        .filter(|c| !c.is_empty())
        .map(|c| 1 + nesting_depth(c))
        .max()
        .unwrap_or(0)
}

fn bounds(
    nodes: &[NodeLayout],
    clusters: &[ClusterLayout],
    edges: &[EdgeLayout],
) -> (f32, f32, f32, f32) {
    let mut min = (f32::INFINITY, f32::INFINITY);
    let mut max = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    let mut include = |x: f32, y: f32, w: f32, h: f32| {
        min.0 = min.0.min(x);
        min.1 = min.1.min(y);
        max.0 = max.0.max(x + w);
        max.1 = max.1.max(y + h);
    };
    for n in nodes {
        include(n.x, n.y, n.width, n.height);
    }
    for c in clusters {
        include(c.x, c.y, c.width, c.height);
    }
    for &(x, y) in edges.iter().flat_map(|e| e.points.iter()) {
        include(x, y, 0.0, 0.0);
    }
    (min.0, min.1, max.0, max.1)
}

struct Band<'a> {
    label: &'a str,
    depth: usize,
    main_start: f32,
    main_end: f32,
    cross_start: f32,
    cross_extent: f32,
}

struct BandPlacer<'a> {
    axes: Axes,
    ranks: &'a [usize],
    sizes: &'a [(f32, f32)],
    main: &'a [f32],
    cross: Vec<f32>,
    bands: Vec<Band<'a>>,
}

impl<'a> BandPlacer<'a> {
    /// Places `cluster`'s direct nodes and child clusters in a strip starting at
    /// `start` on the cross axis. Returns the strip's cross extent and the
    /// main-axis range its content covers.
    fn place(
        &mut self,
        cluster: &'a Cluster,
        depth: usize,
        start: f32,
    ) -> (f32, Option<(f32, f32)>) {
        let mut per_rank: BTreeMap<usize, Vec<NodeId>> = BTreeMap::new();
        for &id in &cluster.node_ids {
            per_rank.entry(self.ranks[id.0]).or_default().push(id);
        }

        let content = per_rank
            .values()
            .map(|ids| self.stack_size(ids))
            .fold(0.0f32, f32::max);

        let mut main_range: Option<(f32, f32)> = None;
        for ids in per_rank.values() {
            let mut c = start + (content - self.stack_size(ids)) / 2.0;
            for id in ids {
                let size = self.sizes[id.0];
                self.cross[id.0] = c;
                c += self.axes.cross(size) + NODE_GAP;
                let m = self.main[id.0];
                main_range = Some(extend(main_range, m, m + self.axes.main(size)));
            }
        }

        let mut cursor = start + content;
        let mut placed_any = !cluster.node_ids.is_empty();
        for child in cluster.clusters.iter().filter(|c| !c.is_empty()) {
            if placed_any {
                cursor += CLUSTER_GAP;
            }
            let (inner, child_main) = self.place(child, depth + 1, cursor + self.axes.lead_cross);
            let extent = self.axes.lead_cross + inner + CLUSTER_PAD;
            // Non-empty clusters always cover some main-axis range.
            if let Some((lo, hi)) = child_main {
                let main_start = lo - self.axes.lead_main;
                let main_end = hi + CLUSTER_PAD;
                self.bands.push(Band {
                    label: &child.label,
                    depth: depth + 1,
                    main_start,
                    main_end,
                    cross_start: cursor,
                    cross_extent: extent,
                });
                main_range = Some(extend(main_range, main_start, main_end));
            }
            cursor += extent;
            placed_any = true;
        }

        (cursor - start, main_range)
    }

    fn stack_size(&self, ids: &[NodeId]) -> f32 {
        let total: f32 = ids.iter().map(|id| self.axes.cross(self.sizes[id.0])).sum();
        total + ids.len().saturating_sub(1) as f32 * NODE_GAP
    }
}

fn extend(range: Option<(f32, f32)>, lo: f32, hi: f32) -> (f32, f32) {
    match range {
        Some((a, b)) => (a.min(lo), b.max(hi)),
        None => (lo, hi),
    }
}

/// Orthogonal route between glyph anchors. Edges that skip ranks run along a
/// lane outside every node of the ranks in between, so they never cross them.
fn route(
    direction: Direction,
    nodes: &[NodeLayout],
    from: &NodeLayout,
    to: &NodeLayout,
    rank_gap: f32,
) -> Vec<(f32, f32)> {
    let axes = Axes::new(direction);
    let flip = |(x, y): (f32, f32)| match direction {
        Direction::LeftRight => (x, y),
        Direction::TopBottom => (y, x),
    };

    // Work in (main, cross) space.
    let start = flip(from.out_anchor(direction));
    let end = flip(to.in_anchor(direction));
    if to.rank <= from.rank || end.0 <= start.0 {
        return vec![axes.to_xy(start.0, start.1), axes.to_xy(end.0, end.1)];
    }

    let bend = ((end.0 - start.0) / 2.0).min(rank_gap / 2.0);
    let points = if to.rank == from.rank + 1 {
        if (start.1 - end.1).abs() < 0.5 {
            vec![start, end]
        } else {
            let m = end.0 - bend;
            vec![start, (m, start.1), (m, end.1), end]
        }
    } else {
        let lane = nodes
            .iter()
            .filter(|n| {
                n.id == from.id || n.id == to.id || (n.rank > from.rank && n.rank < to.rank)
            })
            .map(|n| flip((n.x, n.y)).1)
            .fold(f32::INFINITY, f32::min)
            - NODE_GAP / 2.0;
        let m1 = start.0 + bend;
        let m2 = end.0 - bend;
        vec![start, (m1, start.1), (m1, lane), (m2, lane), (m2, end.1), end]
    };

    points
        .into_iter()
        .map(|(m, c)| axes.to_xy(m, c))
        .collect()
}

fn assign_ranks(diagram: &Diagram) -> Vec<usize> {
    let n = diagram.nodes.len();
    let mut in_edges: Vec<Vec<usize>> = vec![Vec::new(); n];
    for edge in &diagram.edges {
        if edge.from != edge.to {
            in_edges[edge.to.0].push(edge.from.0);
        }
    }

    let mut ranks: Vec<Option<usize>> = vec![None; n];
    let mut visiting = vec![false; n];
    for id in 0..n {
        compute_rank(id, &in_edges, &mut ranks, &mut visiting);
    }

    ranks.into_iter().map(|r| r.unwrap_or(0)).collect()
}

/// Longest path from a source. A predecessor still on the DFS stack closes a
/// cycle and is skipped.
fn compute_rank(
    id: usize,
    in_edges: &[Vec<usize>],
    ranks: &mut [Option<usize>],
    visiting: &mut [bool],
) -> Option<usize> {
    if let Some(r) = ranks[id] {
        return Some(r);
    }
    if visiting[id] {
        return None;
    }

    visiting[id] = true;
    let rank = in_edges[id]
        .iter()
        .filter_map(|&p| compute_rank(p, in_edges, ranks, visiting))
        .map(|r| r + 1)
        .max()
        .unwrap_or(0);
    visiting[id] = false;

    ranks[id] = Some(rank);
    Some(rank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::architecture::token_management;
    use crate::builder::DiagramBuilder;
    use pretty_assertions::assert_eq;

    fn chain(labels: &[&str], direction: Direction) -> Diagram {
        let mut b = DiagramBuilder::new("test");
        b.direction(direction);
        let ids: Vec<NodeId> = labels.iter().map(|l| b.node(*l, NodeKind::Server)).collect();
        b.chain(&ids).unwrap();
        b.build().unwrap()
    }

    fn find<'a>(layout: &'a GraphLayout, diagram: &Diagram, label: &str) -> &'a NodeLayout {
        let id = diagram.node_by_label(label).unwrap().id;
        layout.nodes.iter().find(|n| n.id == id).unwrap()
    }

    #[test]
    fn rank_linear_chain() {
        let diagram = chain(&["A", "B", "C"], Direction::LeftRight);
        assert_eq!(assign_ranks(&diagram), vec![0, 1, 2]);
    }

    #[test]
    fn rank_fan_out_and_fan_in() {
        let mut b = DiagramBuilder::new("fan");
        let a = b.node("A", NodeKind::Server);
        let c = b.node("B", NodeKind::Server);
        let d = b.node("C", NodeKind::Server);
        let e = b.node("D", NodeKind::Server);
        b.edge(a, c).unwrap();
        b.edge(a, d).unwrap();
        b.edge(c, e).unwrap();
        b.edge(d, e).unwrap();
        let diagram = b.build().unwrap();
        assert_eq!(assign_ranks(&diagram), vec![0, 1, 1, 2]);
    }

    #[test]
    fn rank_is_longest_path() {
        let diagram = token_management().unwrap();
        let ranks = assign_ranks(&diagram);
        let rank = |label: &str| ranks[diagram.node_by_label(label).unwrap().id.0];
        assert_eq!(rank("End User"), 0);
        assert_eq!(rank("Server"), 3);
        assert_eq!(rank("Kafka Listener"), 5);
        assert_eq!(rank("PostgreSQL"), 6);
        assert_eq!(rank("Housekeeping"), 7);
        assert_eq!(rank("Identity Provider"), 4);
    }

    #[test]
    fn rank_cycle_terminates() {
        let mut b = DiagramBuilder::new("cycle");
        let a = b.node("A", NodeKind::Server);
        let c = b.node("B", NodeKind::Server);
        b.edge(a, c).unwrap();
        b.edge(c, a).unwrap();
        b.edge(a, a).unwrap();
        let diagram = b.build().unwrap();
        let ranks = assign_ranks(&diagram);
        assert_eq!(ranks.len(), 2);
        assert!(compute(&diagram).is_ok());
    }

    #[test]
    fn layout_lr_places_successor_right() {
        let diagram = chain(&["Start", "End"], Direction::LeftRight);
        let layout = compute(&diagram).unwrap();
        let a = &layout.nodes[0];
        let b = &layout.nodes[1];
        assert!(b.x > a.x + a.width, "B should be right of A in LR");
        assert_eq!(a.y, b.y, "single row in LR");
        assert_eq!(layout.edges[0].points.len(), 2, "straight edge between aligned nodes");
    }

    #[test]
    fn layout_tb_places_successor_below() {
        let diagram = chain(&["Start", "End"], Direction::TopBottom);
        let layout = compute(&diagram).unwrap();
        let a = &layout.nodes[0];
        let b = &layout.nodes[1];
        assert!(b.y > a.y + a.height, "B should be below A in TB");
        assert_eq!(a.center_x(), b.center_x());
    }

    #[test]
    fn layout_pads_drawing() {
        let diagram = chain(&["A", "B"], Direction::LeftRight);
        let layout = compute(&diagram).unwrap();
        let pad = diagram.attrs.pad * DPI;
        let min_x = layout.nodes.iter().map(|n| n.x).fold(f32::INFINITY, f32::min);
        assert!((min_x - pad).abs() < 1e-3, "min x {min_x} != pad {pad}");
        let max_x = layout.nodes.iter().map(|n| n.x + n.width).fold(0.0, f32::max);
        assert!((layout.width - max_x - pad).abs() < 1e-3);
    }

    #[test]
    fn layout_node_size_fits_label() {
        let diagram = chain(&["A very long component name"], Direction::LeftRight);
        let layout = compute(&diagram).unwrap();
        let n = &layout.nodes[0];
        assert!(n.width > ICON_SIZE, "long label widens node");
        assert!(n.height > ICON_SIZE, "label sits below glyph");
    }

    #[test]
    fn layout_edge_keeps_arrow_dir() {
        let mut b = DiagramBuilder::new("dir");
        let a = b.node("A", NodeKind::Sql);
        let c = b.node("B", NodeKind::KubernetesEngine);
        b.reverse_edge(a, c).unwrap();
        let diagram = b.build().unwrap();
        let layout = compute(&diagram).unwrap();
        assert_eq!(layout.edges[0].dir, ArrowDir::Back);
        let first = layout.edges[0].points[0];
        let a = &layout.nodes[0];
        assert!((first.0 - (a.icon_x() + ICON_SIZE)).abs() < 1e-3, "starts at glyph edge");
        assert!((first.1 - (a.y + ICON_SIZE / 2.0)).abs() < 1e-3);
    }

    #[test]
    fn layout_clusters_contain_members() {
        let diagram = token_management().unwrap();
        let layout = compute(&diagram).unwrap();
        assert_eq!(layout.clusters.len(), 2);
        assert_eq!(layout.clusters[0].label, "Kubernetes");
        assert_eq!(layout.clusters[0].depth, 1);
        assert_eq!(layout.clusters[1].label, "Gafaelfawr");
        assert_eq!(layout.clusters[1].depth, 2);

        for cluster in &layout.clusters {
            let members = diagram.cluster(&cluster.label).unwrap().all_node_ids();
            for node in &layout.nodes {
                if members.contains(&node.id) {
                    assert!(cluster.contains(node), "{} outside {}", node.label, cluster.label);
                } else {
                    assert!(
                        !cluster.intersects(node),
                        "{} overlaps {}",
                        node.label,
                        cluster.label
                    );
                }
            }
        }

        let outer = &layout.clusters[0];
        let inner = &layout.clusters[1];
        assert!(inner.x > outer.x && inner.y > outer.y);
        assert!(inner.x + inner.width < outer.x + outer.width);
        assert!(inner.y + inner.height < outer.y + outer.height);
    }

    #[test]
    fn layout_sibling_clusters_do_not_overlap() {
        let mut b = DiagramBuilder::new("siblings");
        let left = b.cluster("Left");
        let right = b.cluster("Right");
        let a = b.node_in(left, "A", NodeKind::Server).unwrap();
        let c = b.node_in(left, "B", NodeKind::Server).unwrap();
        let d = b.node_in(right, "C", NodeKind::Server).unwrap();
        b.chain(&[a, c, d]).unwrap();
        let diagram = b.build().unwrap();
        let layout = compute(&diagram).unwrap();

        let l = &layout.clusters[0];
        let r = &layout.clusters[1];
        let disjoint = l.y + l.height <= r.y
            || r.y + r.height <= l.y
            || l.x + l.width <= r.x
            || r.x + r.width <= l.x;
        assert!(disjoint, "clusters overlap: {l:?} {r:?}");
    }

    #[test]
    fn layout_skips_empty_clusters() {
        let mut b = DiagramBuilder::new("empty cluster");
        let outer = b.cluster("Outer");
        b.subcluster(outer, "Nothing").unwrap();
        b.node("A", NodeKind::User);
        let diagram = b.build().unwrap();
        let layout = compute(&diagram).unwrap();
        assert!(layout.clusters.is_empty());
    }

    #[test]
    fn layout_long_edge_avoids_middle_rank() {
        let mut b = DiagramBuilder::new("skip");
        let a = b.node("A", NodeKind::User);
        let m = b.node("M", NodeKind::WebFrontend);
        let z = b.node("Z", NodeKind::Server);
        b.chain(&[a, m, z]).unwrap();
        b.edge(a, z).unwrap();
        let diagram = b.build().unwrap();
        let layout = compute(&diagram).unwrap();

        let middle = find(&layout, &diagram, "M");
        let long = &layout.edges[2];
        assert_eq!(long.points.len(), 6);
        let lane_y = long.points[2].1;
        assert!(lane_y < middle.y, "lane {lane_y} should pass above M at {}", middle.y);
    }

    /// Edges whose segments pass through the glyph of a node other than
    /// their own endpoints.
    fn edges_through_glyphs(layout: &GraphLayout) -> Vec<String> {
        let label = |id: NodeId| layout.nodes[id.0].label.as_str();
        let mut hits = Vec::new();
        for edge in &layout.edges {
            for seg in edge.points.windows(2) {
                let (lo_x, hi_x) = (seg[0].0.min(seg[1].0), seg[0].0.max(seg[1].0));
                let (lo_y, hi_y) = (seg[0].1.min(seg[1].1), seg[0].1.max(seg[1].1));
                for node in &layout.nodes {
                    if node.id == edge.from || node.id == edge.to {
                        continue;
                    }
                    let (gx, gy) = (node.icon_x(), node.icon_y());
                    if lo_x < gx + ICON_SIZE && hi_x > gx && lo_y < gy + ICON_SIZE && hi_y > gy {
                        hits.push(format!(
                            "{}->{} crosses {}",
                            label(edge.from),
                            label(edge.to),
                            node.label
                        ));
                    }
                }
            }
        }
        hits
    }

    #[test]
    fn layout_edges_avoid_other_glyphs() {
        let mut diagram = token_management().unwrap();
        let layout = compute(&diagram).unwrap();
        assert_eq!(edges_through_glyphs(&layout), Vec::<String>::new());

        diagram.direction = Direction::TopBottom;
        let layout = compute(&diagram).unwrap();
        assert_eq!(edges_through_glyphs(&layout), Vec::<String>::new());
    }

    #[test]
    fn layout_long_edge_clears_stacked_middle_rank() {
        let mut b = DiagramBuilder::new("stacked");
        let a = b.node("A", NodeKind::User);
        let upper = b.node("Upper", NodeKind::Server);
        let lower = b.node("Lower", NodeKind::Server);
        let z = b.node("Z", NodeKind::Sql);
        b.chain(&[a, upper, z]).unwrap();
        b.chain(&[a, lower, z]).unwrap();
        b.edge(a, z).unwrap();
        let diagram = b.build().unwrap();
        let layout = compute(&diagram).unwrap();

        let top = find(&layout, &diagram, "Upper").y.min(find(&layout, &diagram, "Lower").y);
        let lane_y = layout.edges[4].points[2].1;
        assert!(lane_y < top, "lane {lane_y} should pass above the stack at {top}");
        assert_eq!(edges_through_glyphs(&layout), Vec::<String>::new());
    }

    #[test]
    fn layout_caption_adds_height() {
        let mut b = DiagramBuilder::new("Captioned");
        b.node("A", NodeKind::Server);
        let captioned = compute(&b.build().unwrap()).unwrap();

        let plain = compute(&chain(&["A"], Direction::LeftRight)).unwrap();
        assert!(plain.caption.is_some(), "label defaults to the name");

        let mut b = DiagramBuilder::new("Bare");
        b.attrs(DiagramAttrs::default());
        b.node("A", NodeKind::Server);
        let bare = compute(&b.build().unwrap()).unwrap();
        assert!(bare.caption.is_none());
        assert!(captioned.height > bare.height);
        assert_eq!(captioned.caption.unwrap().text, "Captioned");
    }
}
