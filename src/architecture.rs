use crate::builder::DiagramBuilder;
use crate::error::Result;
use crate::graph_ast::{Diagram, DiagramAttrs, NodeKind};

pub const NAME: &str = "Token management";
pub const FILE_STEM: &str = "architecture";

pub fn token_management() -> Result<Diagram> {
    let mut b = DiagramBuilder::new(NAME);
    b.attrs(DiagramAttrs {
        label: String::new(),
        pad: 0.2,
        font_size: 10.0,
    });

    let user = b.node("End User", NodeKind::User);
    let frontend = b.node("Web UI", NodeKind::WebFrontend);

    let kubernetes = b.cluster("Kubernetes");
    let ingress = b.node_in(kubernetes, "NGINX Ingress", NodeKind::LoadBalancer)?;
    let kafka = b.node_in(kubernetes, "Kafka", NodeKind::KubernetesEngine)?;

    let gafaelfawr = b.subcluster(kubernetes, "Gafaelfawr")?;
    let server = b.node_in(gafaelfawr, "Server", NodeKind::KubernetesEngine)?;
    let postgresql = b.node_in(gafaelfawr, "PostgreSQL", NodeKind::Sql)?;
    let redis = b.node_in(gafaelfawr, "Redis", NodeKind::Datastore)?;
    let redis_storage = b.node_in(gafaelfawr, "Redis Storage", NodeKind::PersistentDisk)?;

    b.chain(&[user, frontend, ingress, server, redis, redis_storage])?;
    b.edge(server, postgresql)?;

    let kafka_listener = b.node_in(gafaelfawr, "Kafka Listener", NodeKind::KubernetesEngine)?;
    b.chain(&[server, kafka, kafka_listener, postgresql])?;

    let housekeeping = b.node_in(gafaelfawr, "Housekeeping", NodeKind::KubernetesEngine)?;
    b.reverse_edge(postgresql, housekeeping)?;
    b.reverse_edge(redis, housekeeping)?;

    let app = b.node_in(kubernetes, "Application", NodeKind::KubernetesEngine)?;
    b.edge(ingress, app)?;

    let idp = b.node("Identity Provider", NodeKind::Server);
    b.edge(server, idp)?;
    b.edge(user, idp)?;

    b.build()
}
