use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::net::SocketAddr;
use std::sync::Arc;

/// Live connections, keyed by connection id.
#[derive(Clone, Default)]
pub struct ServerState {
    pub connections: Arc<DashMap<String, SocketAddr>>
}

impl ServerState {

    /// Claims `id` for `peer`, or `None` if a live connection already holds it.
    /// The returned guard releases the id when dropped.
    pub fn try_register(&self, id: String, peer: SocketAddr) -> Option<Registration> {
        match self.connections.entry(id) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                let id = slot.key().clone();
                slot.insert(peer);

                Some(Registration {
                    connections: Arc::clone(&self.connections),
                    id
                })
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.connections.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn list_connections(&self) -> Vec<(String, SocketAddr)> {
        self.connections
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect()
    }
}

pub struct Registration {
    connections: Arc<DashMap<String, SocketAddr>>,
    id: String
}

impl Registration {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.connections.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_is_removed_on_drop() {
        let state = ServerState::default();
        let peer: SocketAddr = "127.0.0.1:4000".parse().unwrap();

        let reg = state.try_register("ABCD".into(), peer).unwrap();
        assert!(state.contains("ABCD"));
        assert_eq!(state.list_connections(), vec![("ABCD".to_string(), peer)]);

        drop(reg);
        assert!(state.is_empty());
    }

    #[test]
    fn taken_id_is_refused_and_survives_the_loser() {
        let state = ServerState::default();
        let first: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        let second: SocketAddr = "127.0.0.1:4001".parse().unwrap();

        let held = state.try_register("SAME".into(), first).unwrap();
        assert!(state.try_register("SAME".into(), second).is_none());

        assert!(state.contains("SAME"));
        assert_eq!(state.list_connections(), vec![("SAME".to_string(), first)]);

        drop(held);
        assert!(state.is_empty());
    }
}
