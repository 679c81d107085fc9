use std::collections::BTreeSet;

use tracing::debug;

use crate::{
    config::LoopbackPolicy,
    constants::{HTTP_SCHEME, LOOPBACK_HOSTS},
};

/// Known peers, stored as `host[:port]` without a scheme.
#[derive(Clone, Debug, Default)]
pub struct NodeRegistry {
    nodes: BTreeSet<String>,
    policy: LoopbackPolicy,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: LoopbackPolicy) -> Self {
        Self {
            nodes: BTreeSet::new(),
            policy,
        }
    }

    pub fn policy(&self) -> LoopbackPolicy {
        self.policy
    }

    /// Add a peer given as `host:port` or `http://host:port[/...]`.
    ///
    /// Returns false without touching the registry when the address has no
    /// usable network location or names a loopback host the policy rejects.
    /// Registering a known peer again succeeds and changes nothing.
    pub fn register(&mut self, address: &str) -> bool {
        let Some(location) = netloc(address) else {
            debug!(address, "rejected unparsable peer address");
            return false;
        };
        if self.policy == LoopbackPolicy::Reject && is_loopback(&location) {
            debug!(address, "rejected loopback peer address");
            return false;
        }
        if self.nodes.insert(location.clone()) {
            debug!(node = %location, "registered peer");
        }
        true
    }

    pub fn contains(&self, node: &str) -> bool {
        self.nodes.contains(node)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.nodes.iter()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.nodes.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// The `host[:port]` part of an address, with or without `http://`.
///
/// Path, query, fragment and userinfo are dropped. `None` when the host is
/// empty or the port is not a number.
pub fn netloc(address: &str) -> Option<String> {
    let address = address.trim();
    let rest = address.strip_prefix(HTTP_SCHEME).unwrap_or(address);
    let end = rest
        .find(|c: char| matches!(c, '/' | '?' | '#'))
        .unwrap_or(rest.len());
    let authority = &rest[..end];
    let authority = authority
        .rsplit_once('@')
        .map_or(authority, |(_, host_port)| host_port);

    let host = match split_port(authority) {
        (host, Some(port)) => {
            port.parse::<u16>().ok()?;
            host
        }
        (host, None) => host,
    };
    if host.is_empty() {
        return None;
    }
    Some(authority.to_string())
}

/// Splits `host[:port]`, keeping bracketed IPv6 hosts such as `[::1]` whole.
fn split_port(authority: &str) -> (&str, Option<&str>) {
    if authority.ends_with(']') {
        return (authority, None);
    }
    match authority.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (authority, None),
    }
}

fn is_loopback(location: &str) -> bool {
    let host = split_port(location).0.to_ascii_lowercase();
    LOOPBACK_HOSTS.contains(&host.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn netloc_examples() {
        assert_eq!(netloc("203.0.113.5:5000").as_deref(), Some("203.0.113.5:5000"));
        assert_eq!(
            netloc("http://203.0.113.5:5000/chain?x=1").as_deref(),
            Some("203.0.113.5:5000")
        );
        assert_eq!(netloc("http://user@peer.example:80").as_deref(), Some("peer.example:80"));
        assert_eq!(netloc("peer.example").as_deref(), Some("peer.example"));
        assert_eq!(netloc("http://"), None);
        assert_eq!(netloc(""), None);
        assert_eq!(netloc(":5000"), None);
        assert_eq!(netloc("peer.example:http"), None);
    }

    #[test]
    fn rejects_loopback_hosts() {
        let mut registry = NodeRegistry::new();
        assert!(!registry.register("127.0.0.1:5000"));
        assert!(!registry.register("localhost:5000"));
        assert!(!registry.register("http://0.0.0.0:5000"));
        assert!(!registry.register("LOCALHOST:5000"));
        assert!(!registry.register("[::1]"));
        assert!(!registry.register("http://[::1]:5000/"));
        assert!(registry.is_empty());
    }

    #[test]
    fn registers_once() {
        let mut registry = NodeRegistry::new();
        assert!(registry.register("203.0.113.5:5000"));
        assert!(registry.register("http://203.0.113.5:5000"));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("203.0.113.5:5000"));
    }

    #[test]
    fn rejects_unparsable_addresses() {
        let mut registry = NodeRegistry::new();
        assert!(!registry.register("http://"));
        assert!(!registry.register("203.0.113.5:port"));
        assert!(registry.is_empty());
    }

    #[test]
    fn allow_policy_admits_loopback() {
        let mut registry = NodeRegistry::with_policy(LoopbackPolicy::Allow);
        assert!(registry.register("127.0.0.1:5000"));
        assert!(registry.register("localhost:5001"));
        assert_eq!(
            registry.to_vec(),
            vec!["127.0.0.1:5000".to_string(), "localhost:5001".to_string()]
        );
    }
}
