use crate::display_width::{line_height_px, split_lines};
use crate::graph_ast::{ArrowDir, NodeKind};
use crate::graph_layout::*;

const FONT_FAMILY: &str = "'DejaVu Sans', 'Liberation Sans', Arial, sans-serif";
const FONT_COLOR: &str = "#2D3436";
const EDGE_COLOR: &str = "#7B8894";
const CLUSTER_BORDER: &str = "#AEB6BE";
const CLUSTER_FONT_SIZE: f32 = 12.0;
const CLUSTER_FILLS: [&str; 4] = ["#E5F5FD", "#EBF3E7", "#ECE8F6", "#FDF7E3"];

const GCP_BLUE: &str = "#4285F4";
const GCP_LIGHT: &str = "#AECBFA";

pub fn render(layout: &GraphLayout) -> String {
    let mut svg = String::new();
    let (width, height) = (layout.width, layout.height);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"0 0 {width:.2} {height:.2}\">"
    ));
    svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>");

    svg.push_str("<defs>");
    svg.push_str(&format!(
        "<marker id=\"arrow-end\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"7\" markerHeight=\"7\" orient=\"auto\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{EDGE_COLOR}\"/></marker>"
    ));
    svg.push_str(&format!(
        "<marker id=\"arrow-start\" viewBox=\"0 0 10 10\" refX=\"0\" refY=\"5\" markerWidth=\"7\" markerHeight=\"7\" orient=\"auto\"><path d=\"M 10 0 L 0 5 L 10 10 z\" fill=\"{EDGE_COLOR}\"/></marker>"
    ));
    svg.push_str("</defs>");

    for cluster in &layout.clusters {
        draw_cluster(&mut svg, cluster);
    }

    for edge in &layout.edges {
        draw_edge(&mut svg, edge);
    }

    for node in &layout.nodes {
        draw_node(&mut svg, node, layout.font_size);
    }

    if let Some(caption) = &layout.caption {
        svg.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"{FONT_FAMILY}\" font-size=\"15\" fill=\"{FONT_COLOR}\">{}</text>",
            caption.x,
            caption.y,
            escape_xml(&caption.text)
        ));
    }

    svg.push_str("</svg>");
    svg
}

fn draw_cluster(svg: &mut String, cluster: &ClusterLayout) {
    let fill = CLUSTER_FILLS[(cluster.depth.max(1) - 1) % CLUSTER_FILLS.len()];
    svg.push_str(&format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"4\" ry=\"4\" fill=\"{fill}\" stroke=\"{CLUSTER_BORDER}\" stroke-width=\"1\"/>",
        cluster.x, cluster.y, cluster.width, cluster.height
    ));
    svg.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{:.2}\" font-family=\"{FONT_FAMILY}\" font-size=\"{CLUSTER_FONT_SIZE}\" fill=\"{FONT_COLOR}\">{}</text>",
        cluster.x + 8.0,
        cluster.y + CLUSTER_TITLE - 2.0,
        escape_xml(&cluster.label)
    ));
}

fn draw_edge(svg: &mut String, edge: &EdgeLayout) {
    let (marker_start, marker_end) = match edge.dir {
        ArrowDir::Forward => (false, true),
        ArrowDir::Back => (true, false),
        ArrowDir::Both => (true, true),
        ArrowDir::None => (false, false),
    };
    let mut attrs = String::new();
    if marker_start {
        attrs.push_str(" marker-start=\"url(#arrow-start)\"");
    }
    if marker_end {
        attrs.push_str(" marker-end=\"url(#arrow-end)\"");
    }
    svg.push_str(&format!(
        "<path d=\"{}\" fill=\"none\" stroke=\"{EDGE_COLOR}\" stroke-width=\"1.2\"{attrs}/>",
        points_to_path(&edge.points)
    ));
}

fn points_to_path(points: &[(f32, f32)]) -> String {
    points
        .iter()
        .enumerate()
        .map(|(i, (x, y))| {
            let cmd = if i == 0 { 'M' } else { 'L' };
            format!("{cmd} {x:.2} {y:.2}")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn draw_node(svg: &mut String, node: &NodeLayout, font_size: f32) {
    svg.push_str(&icon(node.kind, node.icon_x(), node.icon_y(), ICON_SIZE));

    let line_height = line_height_px(font_size);
    let cx = node.center_x();
    for (i, line) in split_lines(&node.label).iter().enumerate() {
        let baseline = node.label_y() + font_size + i as f32 * line_height;
        svg.push_str(&format!(
            "<text x=\"{cx:.2}\" y=\"{baseline:.2}\" text-anchor=\"middle\" font-family=\"{FONT_FAMILY}\" font-size=\"{font_size}\" fill=\"{FONT_COLOR}\">{}</text>",
            escape_xml(line)
        ));
    }
}

/// Glyph for a node kind, drawn inside the `s` x `s` square at (`x`, `y`).
fn icon(kind: NodeKind, x: f32, y: f32, s: f32) -> String {
    let cx = x + s / 2.0;
    let cy = y + s / 2.0;
    match kind {
        NodeKind::User => format!(
            "<g fill=\"#5A6B7B\"><circle cx=\"{cx:.2}\" cy=\"{:.2}\" r=\"{:.2}\"/><path d=\"M {:.2} {:.2} Q {cx:.2} {:.2} {:.2} {:.2} Z\"/></g>",
            y + s * 0.3,
            s * 0.2,
            x + s * 0.15,
            y + s * 0.95,
            y + s * 0.35,
            x + s * 0.85,
            y + s * 0.95,
        ),
        NodeKind::WebFrontend => {
            let rx = s * 0.45;
            let ry = s * 0.17;
            let mut g = String::from("<g fill=\"none\" stroke=\"#61DAFB\" stroke-width=\"2.5\">");
            for angle in [0, 60, 120] {
                g.push_str(&format!(
                    "<ellipse cx=\"{cx:.2}\" cy=\"{cy:.2}\" rx=\"{rx:.2}\" ry=\"{ry:.2}\" transform=\"rotate({angle} {cx:.2} {cy:.2})\"/>"
                ));
            }
            g.push_str(&format!(
                "<circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{:.2}\" fill=\"#61DAFB\"/></g>",
                s * 0.08
            ));
            g
        }
        NodeKind::KubernetesEngine => {
            let r = s / 2.0;
            let points: Vec<String> = (0..6)
                .map(|i| {
                    let a = std::f32::consts::FRAC_PI_3 * i as f32 + std::f32::consts::FRAC_PI_6;
                    format!("{:.2},{:.2}", cx + r * a.cos(), cy + r * a.sin())
                })
                .collect();
            format!(
                "<g><polygon points=\"{}\" fill=\"{GCP_BLUE}\"/><circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{:.2}\" fill=\"none\" stroke=\"white\" stroke-width=\"3\"/></g>",
                points.join(" "),
                s * 0.18
            )
        }
        NodeKind::Sql | NodeKind::Datastore => {
            let fill = if kind == NodeKind::Sql { GCP_BLUE } else { "#669DF6" };
            let left = x + s * 0.15;
            let w = s * 0.7;
            let ry = s * 0.1;
            let top = y + s * 0.12;
            let bottom = y + s * 0.88;
            format!(
                "<g fill=\"{fill}\" stroke=\"white\" stroke-width=\"1.5\"><path d=\"M {left:.2} {top:.2} L {left:.2} {bottom:.2} A {:.2} {ry:.2} 0 0 0 {:.2} {bottom:.2} L {:.2} {top:.2} Z\"/><ellipse cx=\"{cx:.2}\" cy=\"{top:.2}\" rx=\"{:.2}\" ry=\"{ry:.2}\"/><path d=\"M {left:.2} {cy:.2} A {:.2} {ry:.2} 0 0 0 {:.2} {cy:.2}\" fill=\"none\"/></g>",
                w / 2.0,
                left + w,
                left + w,
                w / 2.0,
                w / 2.0,
                left + w,
            )
        }
        NodeKind::PersistentDisk => format!(
            "<g><rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"4\" fill=\"{GCP_LIGHT}\" stroke=\"{GCP_BLUE}\" stroke-width=\"2\"/><circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{:.2}\" fill=\"none\" stroke=\"{GCP_BLUE}\" stroke-width=\"3\"/><circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{:.2}\" fill=\"{GCP_BLUE}\"/></g>",
            x + s * 0.1,
            y + s * 0.1,
            s * 0.8,
            s * 0.8,
            s * 0.25,
            s * 0.06,
        ),
        NodeKind::LoadBalancer => format!(
            "<g><circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{:.2}\" fill=\"{GCP_BLUE}\"/><path d=\"M {:.2} {cy:.2} L {:.2} {cy:.2} M {cx:.2} {cy:.2} L {:.2} {:.2} M {cx:.2} {cy:.2} L {:.2} {:.2}\" stroke=\"white\" stroke-width=\"3\" fill=\"none\"/></g>",
            s * 0.45,
            x + s * 0.2,
            x + s * 0.8,
            x + s * 0.75,
            y + s * 0.3,
            x + s * 0.75,
            y + s * 0.7,
        ),
        NodeKind::Server => {
            let mut g = String::from("<g>");
            for i in 0..3 {
                g.push_str(&format!(
                    "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"2\" fill=\"#7B8894\"/><circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"#9EE493\"/>",
                    x + s * 0.15,
                    y + s * (0.1 + 0.28 * i as f32),
                    s * 0.7,
                    s * 0.22,
                    x + s * 0.75,
                    y + s * (0.21 + 0.28 * i as f32),
                    s * 0.04,
                ));
            }
            g.push_str("</g>");
            g
        }
    }
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
