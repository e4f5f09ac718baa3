#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    LeftRight,
    TopBottom,
}

/// What a node depicts. Only affects the glyph drawn above the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    User,
    WebFrontend,
    KubernetesEngine,
    Sql,
    Datastore,
    PersistentDisk,
    LoadBalancer,
    Server,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClusterId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub kind: NodeKind,
}

/// Where arrowheads go. Layout always treats `from -> to` as the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrowDir {
    #[default]
    Forward,
    Back,
    Both,
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub dir: ArrowDir,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub label: String,
    pub node_ids: Vec<NodeId>,
    pub clusters: Vec<Cluster>,
}

impl Cluster {
    /// All node ids in this cluster and its descendants, depth first.
    pub fn all_node_ids(&self) -> Vec<NodeId> {
        let mut ids = self.node_ids.clone();
        for child in &self.clusters {
            ids.extend(child.all_node_ids());
        }
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty() && self.clusters.iter().all(Cluster::is_empty)
    }

    pub fn find(&self, label: &str) -> Option<&Cluster> {
        self.clusters.iter().find_map(|c| {
            if c.label == label {
                Some(c)
            } else {
                c.find(label)
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagramAttrs {
    /// Caption drawn under the diagram. Empty means no caption.
    pub label: String,
    /// Padding around the drawing, in inches.
    pub pad: f32,
    /// Node label size, in points.
    pub font_size: f32,
}

impl Default for DiagramAttrs {
    fn default() -> Self {
        Self {
            label: String::new(),
            pad: 2.0,
            font_size: 13.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagram {
    pub name: String,
    pub direction: Direction,
    pub attrs: DiagramAttrs,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// Unlabeled top level; its children are the real clusters.
    pub root: Cluster,
}

impl Diagram {
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_by_label(&self, label: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.label == label)
    }

    pub fn cluster(&self, label: &str) -> Option<&Cluster> {
        self.root.find(label)
    }

    /// Labels of the clusters enclosing `id`, outermost first.
    pub fn cluster_path(&self, id: NodeId) -> Vec<&str> {
        fn walk<'a>(cluster: &'a Cluster, id: NodeId, path: &mut Vec<&'a str>) -> bool {
            if cluster.node_ids.contains(&id) {
                return true;
            }
            for child in &cluster.clusters {
                path.push(child.label.as_str());
                if walk(child, id, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        walk(&self.root, id, &mut path);
        path
    }

    /// Edges as `(from label, to label)` pairs, in declaration order.
    pub fn edge_labels(&self) -> Vec<(&str, &str)> {
        self.edges
            .iter()
            .map(|e| {
                (
                    self.node(e.from).label.as_str(),
                    self.node(e.to).label.as_str(),
                )
            })
            .collect()
    }
}
