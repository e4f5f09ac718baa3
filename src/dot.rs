use crate::graph_ast::*;

const CLUSTER_FILLS: [&str; 4] = ["#E5F5FD", "#EBF3E7", "#ECE8F6", "#FDF7E3"];

/// Graphviz DOT for `diagram`. Nodes are named by id and clusters are
/// numbered in declaration order, so the output is stable across runs.
pub fn render(diagram: &Diagram) -> String {
    let mut out = String::new();
    let rankdir = match diagram.direction {
        Direction::LeftRight => "LR",
        Direction::TopBottom => "TB",
    };

    out.push_str(&format!("digraph {} {{\n", quote(&diagram.name)));
    out.push_str(&format!(
        "\tgraph [fontcolor=\"#2D3436\" fontname=\"Sans-Serif\" fontsize=15 label={} pad={:?} rankdir={rankdir} splines=ortho]\n",
        quote(&diagram.attrs.label),
        diagram.attrs.pad
    ));
    out.push_str(&format!(
        "\tnode [fixedsize=true fontcolor=\"#2D3436\" fontname=\"Sans-Serif\" fontsize={:?} height=1.4 labelloc=b shape=box style=rounded width=1.4]\n",
        diagram.attrs.font_size
    ));
    out.push_str("\tedge [color=\"#7B8894\"]\n");

    let mut next_cluster = 0;
    write_cluster_body(&mut out, diagram, &diagram.root, 0, &mut next_cluster);

    for edge in &diagram.edges {
        let attrs = match edge.dir {
            ArrowDir::Forward => "",
            ArrowDir::Back => " [dir=back]",
            ArrowDir::Both => " [dir=both]",
            ArrowDir::None => " [dir=none]",
        };
        out.push_str(&format!("\tn{} -> n{}{attrs}\n", edge.from.0, edge.to.0));
    }

    out.push_str("}\n");
    out
}

fn write_cluster_body(
    out: &mut String,
    diagram: &Diagram,
    cluster: &Cluster,
    depth: usize,
    next_cluster: &mut usize,
) {
    let indent = "\t".repeat(depth + 1);
    for &id in &cluster.node_ids {
        let node = diagram.node(id);
        out.push_str(&format!(
            "{indent}n{} [label={} tooltip={}]\n",
            id.0,
            quote(&node.label),
            quote(kind_name(node.kind))
        ));
    }

    for child in &cluster.clusters {
        let n = *next_cluster;
        *next_cluster += 1;
        let fill = CLUSTER_FILLS[depth % CLUSTER_FILLS.len()];
        out.push_str(&format!("{indent}subgraph cluster_{n} {{\n"));
        out.push_str(&format!(
            "{indent}\tgraph [bgcolor=\"{fill}\" label={} labeljust=l pencolor=\"#AEB6BE\" style=rounded]\n",
            quote(&child.label)
        ));
        write_cluster_body(out, diagram, child, depth + 1, next_cluster);
        out.push_str(&format!("{indent}}}\n"));
    }
}

fn kind_name(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::User => "user",
        NodeKind::WebFrontend => "web-frontend",
        NodeKind::KubernetesEngine => "kubernetes-engine",
        NodeKind::Sql => "sql",
        NodeKind::Datastore => "datastore",
        NodeKind::PersistentDisk => "persistent-disk",
        NodeKind::LoadBalancer => "load-balancer",
        NodeKind::Server => "server",
    }
}

fn quote(s: &str) -> String {
    let mut q = String::with_capacity(s.len() + 2);
    q.push('"');
    for ch in s.chars() {
        match ch {
            '"' => q.push_str("\\\""),
            '\\' => q.push_str("\\\\"),
            '\n' => q.push_str("\\n"),
            _ => q.push(ch),
        }
    }
    q.push('"');
    q
}
