use apm_injector_server::{InjectorServer, config::Config};
use axum::Router;
use hyper::{Request, Response};
use kube::client::Body;
use std::net::SocketAddr;

use crate::k8s_mock::{RequestLog, apm_cluster_scenario};

pub(crate) fn default_test_config() -> Config {
    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 3443)),
        tls_config: None,
        log_level: "info".to_owned(),
        log_fmt: "json".to_owned(),
        log_no_color: false,
    }
}

/// Build the webhook router, backed by a fake Kubernetes API server.
pub(crate) async fn app() -> (Router, RequestLog) {
    let (mocksvc, handle) = tower_test::mock::pair::<Request<Body>, Response<Body>>();
    let client = kube::Client::new(mocksvc, "default");
    let requests = apm_cluster_scenario(handle);

    let server = InjectorServer::new(default_test_config(), client)
        .await
        .unwrap();

    (server.router(), requests)
}
