use std::sync::Arc;

use actix_web::{web, HttpResponse};
use lldisc_core::GraphStore;
use lldisc_render::{render_dot, render_nwdiag};

use crate::json;

type SharedGraph = web::Data<Arc<GraphStore>>;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub async fn graph_json(graph: SharedGraph) -> HttpResponse {
    let snapshot = graph.snapshot();
    HttpResponse::Ok().json(json::build(&snapshot))
}

pub async fn graph_dot(graph: SharedGraph) -> HttpResponse {
    let snapshot = graph.snapshot();
    HttpResponse::Ok()
        .content_type("text/vnd.graphviz")
        .body(render_dot(&snapshot))
}

pub async fn graph_nwdiag(graph: SharedGraph) -> HttpResponse {
    let snapshot = graph.snapshot();
    HttpResponse::Ok()
        .content_type("text/plain")
        .body(render_nwdiag(&snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use lldisc_types::{LocalInterface, MachineId};

    #[actix_rt::test]
    async fn health_reports_ok() {
        let app = test::init_service(App::new().route("/health", web::get().to(health))).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    #[actix_rt::test]
    async fn graph_json_reflects_local_node() {
        let graph = Arc::new(GraphStore::new());
        graph.set_local(
            MachineId("local".into()),
            "local-host".into(),
            &[LocalInterface {
                name: "eth0".into(),
                link_local: "fe80::1".parse().unwrap(),
                global_prefixes: vec![],
                rdma_device: None,
                node_guid: None,
                sys_image_guid: None,
                speed: None,
            }],
        );

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(graph.clone()))
                .route("/graph", web::get().to(graph_json)),
        )
        .await;
        let req = test::TestRequest::get().uri("/graph").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["nodes"][0]["hostname"], "local-host");
    }
}
