mod fixtures;

use std::sync::{Arc, Mutex};

use hyper::{Method, Request, Response, StatusCode};
use kube::client::Body;
use serde::Serialize;
use tower_test::mock::{Handle, SendResponse};

/// Paths of the requests received by the fake API server, in order.
pub(crate) type RequestLog = Arc<Mutex<Vec<String>>>;

/// Fake API server exposing:
/// * namespace `apm-enabled`, opted in
/// * namespace `default`, without the opt-in label
/// * ReplicaSet `apm-enabled/web-7d4b9`, owned by Deployment `web` which opts out
/// * ReplicaSet `apm-enabled/api-5f6c8`, owned by Deployment `api` which doesn't exist
///
/// Everything else is answered with a `404 NotFound` status.
pub(crate) fn apm_cluster_scenario(handle: Handle<Request<Body>, Response<Body>>) -> RequestLog {
    let log = RequestLog::default();
    let requests = log.clone();

    tokio::spawn(async move {
        let mut handle = handle;

        while let Some((request, send)) = handle.next_request().await {
            let path = request.uri().path().to_owned();
            requests.lock().unwrap().push(path.clone());

            if request.method() != Method::GET {
                panic!("unexpected request: {request:?}");
            }

            match path.as_str() {
                "/api/v1/namespaces/apm-enabled" => {
                    send_response(send, fixtures::namespace("apm-enabled", Some("true")));
                }
                "/api/v1/namespaces/default" => {
                    send_response(send, fixtures::namespace("default", None));
                }
                "/apis/apps/v1/namespaces/apm-enabled/replicasets/web-7d4b9" => {
                    send_response(send, fixtures::replica_set("web-7d4b9", "web"));
                }
                "/apis/apps/v1/namespaces/apm-enabled/replicasets/api-5f6c8" => {
                    send_response(send, fixtures::replica_set("api-5f6c8", "api"));
                }
                "/apis/apps/v1/namespaces/apm-enabled/deployments/web" => {
                    send_response(send, fixtures::deployment("web", Some("false")));
                }
                _ => send_not_found(send, &path),
            }
        }
    });

    log
}

fn send_response<T: Serialize>(send: SendResponse<Response<Body>>, response: T) {
    let response = serde_json::to_vec(&response).unwrap();
    send.send_response(Response::builder().body(Body::from(response)).unwrap());
}

fn send_not_found(send: SendResponse<Response<Body>>, path: &str) {
    let name = path.rsplit('/').next().unwrap_or_default();
    let status = serde_json::to_vec(&fixtures::not_found(name)).unwrap();
    send.send_response(
        Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from(status))
            .unwrap(),
    );
}
