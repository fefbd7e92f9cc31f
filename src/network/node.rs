use serde::{Deserialize, Serialize};

/// A remote replica of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    /// Base URL, e.g. `http://127.0.0.1:8081`.
    pub address: String,
}

impl Node {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    /// Endpoint serving and accepting the peer's chain snapshot.
    pub fn chain_url(&self) -> String {
        format!("{}/chain", self.address.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::Node;

    #[test]
    fn chain_url_tolerates_trailing_slash() {
        assert_eq!(
            Node::new("a", "http://10.0.0.1:8080").chain_url(),
            "http://10.0.0.1:8080/chain"
        );
        assert_eq!(
            Node::new("a", "http://10.0.0.1:8080/").chain_url(),
            "http://10.0.0.1:8080/chain"
        );
    }
}
