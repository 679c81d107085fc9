pub const DEFAULT_LISTEN: &str = "0.0.0.0:5000";
/// Per-request budget for every call to a peer.
pub const PEER_TIMEOUT_MS: u64 = 500;
/// Routed-to but never contacted; used only to learn the outbound interface.
pub(crate) const ROUTE_PROBE_ADDR: &str = "8.8.8.8:80";
