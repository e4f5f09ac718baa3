use crate::error::{Error, Result};
use crate::graph_ast::*;

struct PendingCluster {
    label: String,
    node_ids: Vec<NodeId>,
    children: Vec<ClusterId>,
}

/// Builds a [`Diagram`] from explicit ids instead of nested scopes.
///
/// Clusters and nodes are handed out as ids; edges reference node ids. Every id
/// is checked against this builder, so a finished diagram never points at a
/// node it does not own.
pub struct DiagramBuilder {
    name: String,
    direction: Direction,
    attrs: DiagramAttrs,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    clusters: Vec<PendingCluster>,
}

impl DiagramBuilder {
    pub const ROOT: ClusterId = ClusterId(0);

    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            attrs: DiagramAttrs {
                label: name.clone(),
                ..DiagramAttrs::default()
            },
            name,
            direction: Direction::default(),
            nodes: Vec::new(),
            edges: Vec::new(),
            clusters: vec![PendingCluster {
                label: String::new(),
                node_ids: Vec::new(),
                children: Vec::new(),
            }],
        }
    }

    pub fn direction(&mut self, direction: Direction) -> &mut Self {
        self.direction = direction;
        self
    }

    pub fn attrs(&mut self, attrs: DiagramAttrs) -> &mut Self {
        self.attrs = attrs;
        self
    }

    /// Adds a top-level cluster.
    pub fn cluster(&mut self, label: impl Into<String>) -> ClusterId {
        self.push_cluster(Self::ROOT, label.into())
    }

    pub fn subcluster(&mut self, parent: ClusterId, label: impl Into<String>) -> Result<ClusterId> {
        self.check_cluster(parent)?;
        Ok(self.push_cluster(parent, label.into()))
    }

    /// Adds a node outside every cluster.
    pub fn node(&mut self, label: impl Into<String>, kind: NodeKind) -> NodeId {
        self.push_node(Self::ROOT, label.into(), kind)
    }

    pub fn node_in(
        &mut self,
        cluster: ClusterId,
        label: impl Into<String>,
        kind: NodeKind,
    ) -> Result<NodeId> {
        self.check_cluster(cluster)?;
        Ok(self.push_node(cluster, label.into(), kind))
    }

    pub fn edge(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        self.edge_with(from, to, ArrowDir::Forward)
    }

    /// Edge laid out `from -> to` with the arrowhead drawn at `from`.
    pub fn reverse_edge(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        self.edge_with(from, to, ArrowDir::Back)
    }

    pub fn edge_with(&mut self, from: NodeId, to: NodeId, dir: ArrowDir) -> Result<()> {
        self.check_node(from)?;
        self.check_node(to)?;
        self.edges.push(Edge { from, to, dir });
        Ok(())
    }

    /// Forward edges between each consecutive pair: `a >> b >> c`.
    pub fn chain(&mut self, ids: &[NodeId]) -> Result<()> {
        for pair in ids.windows(2) {
            self.edge(pair[0], pair[1])?;
        }
        Ok(())
    }

    pub fn build(self) -> Result<Diagram> {
        if self.nodes.is_empty() {
            return Err(Error::EmptyDiagram);
        }

        let root = assemble(&self.clusters, Self::ROOT);
        tracing::debug!(
            name = %self.name,
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "diagram built"
        );

        Ok(Diagram {
            name: self.name,
            direction: self.direction,
            attrs: self.attrs,
            nodes: self.nodes,
            edges: self.edges,
            root,
        })
    }

    fn push_cluster(&mut self, parent: ClusterId, label: String) -> ClusterId {
        let id = ClusterId(self.clusters.len());
        self.clusters.push(PendingCluster {
            label,
            node_ids: Vec::new(),
            children: Vec::new(),
        });
        self.clusters[parent.0].children.push(id);
        id
    }

    fn push_node(&mut self, cluster: ClusterId, label: String, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { id, label, kind });
        self.clusters[cluster.0].node_ids.push(id);
        id
    }

    fn check_cluster(&self, id: ClusterId) -> Result<()> {
        if id.0 < self.clusters.len() {
            Ok(())
        } else {
            Err(Error::UnknownCluster(id.0))
        }
    }

    fn check_node(&self, id: NodeId) -> Result<()> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(Error::UnknownNode(id.0))
        }
    }
}

fn assemble(clusters: &[PendingCluster], id: ClusterId) -> Cluster {
    let pending = &clusters[id.0];
    Cluster {
        label: pending.label.clone(),
        node_ids: pending.node_ids.clone(),
        clusters: pending
            .children
            .iter()
            .map(|&child| assemble(clusters, child))
            .collect(),
    }
}
