pub(crate) struct ApiServerState {
    /// Client built at startup. Every request works on its own clone.
    pub(crate) kube_client: kube::Client,
}
