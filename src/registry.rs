//! Connected peers.
//!
//! The registry is the only state shared between connections. Every
//! operation takes the lock for a short moment; callers get snapshots
//! and deliver frames after the lock is released.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::Rng;

/// Length of a generated peer id.
pub const ID_LEN: usize = 8;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Outbound side of a connection.
///
/// Delivery is fire-and-forget: a peer which went away
/// silently drops whatever is queued for it.
pub trait Sink: Clone {
    fn deliver(&self, frame: Arc<[u8]>);
}

cfg_if::cfg_if! {
    if #[cfg(feature = "tokio")] {
        use tokio::sync::mpsc::UnboundedSender;

        impl Sink for UnboundedSender<Arc<[u8]>> {
            #[inline]
            fn deliver(&self, frame: Arc<[u8]>) {
                // receiver is gone if the writer failed
                let _ = self.send(frame);
            }
        }
    }
}

/// A registered connection.
#[derive(Debug, Clone)]
pub struct Peer<S> {
    pub id: String,
    /// `None` until the peer sets a name.
    pub name: Option<String>,
    pub sink: S,
}

impl<S> Peer<S> {
    /// Name shown to others, falls back to the id.
    #[inline]
    pub fn display_name(&self) -> &str { self.name.as_deref().unwrap_or(&self.id) }
}

/// Generate a random id, like `k3x9a0qz`.
pub fn new_peer_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Set of open connections, in connection order.
#[derive(Debug)]
pub struct Registry<S> {
    peers: Mutex<Vec<Peer<S>>>,
}

impl<S> Default for Registry<S> {
    fn default() -> Self { Self::new() }
}

impl<S> Registry<S> {
    #[inline]
    pub const fn new() -> Self {
        Self {
            peers: Mutex::new(Vec::new()),
        }
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, Vec<Peer<S>>> {
        // the peer list stays consistent even if a holder panicked
        self.peers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a peer under a fresh id, return the id.
    #[inline]
    pub fn add(&self, sink: S) -> String { self.add_with(sink, |_| {}) }

    /// Like [`add`](Self::add), `on_added` runs before any other operation
    /// can observe the new peer. It is called under the lock and must not block.
    pub fn add_with<F>(&self, sink: S, on_added: F) -> String
    where
        F: FnOnce(&Peer<S>),
    {
        let mut peers = self.lock();

        // ids are short, regenerate on the rare clash
        let id = loop {
            let id = new_peer_id();
            if !peers.iter().any(|p| p.id == id) {
                break id;
            }
        };

        let peer = Peer {
            id: id.clone(),
            name: None,
            sink,
        };
        on_added(&peer);
        peers.push(peer);
        id
    }

    /// Unregister a peer. Only the first call for an id returns it.
    pub fn remove(&self, id: &str) -> Option<Peer<S>> {
        let mut peers = self.lock();
        let idx = peers.iter().position(|p| p.id == id)?;
        Some(peers.remove(idx))
    }

    /// Store a display name, returns false if the peer is gone.
    pub fn set_name(&self, id: &str, name: String) -> bool {
        match self.lock().iter_mut().find(|p| p.id == id) {
            Some(peer) => {
                peer.name = Some(name);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn len(&self) -> usize { self.lock().len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.lock().is_empty() }

    /// Run `f` over the current peers, under the lock.
    ///
    /// Nothing can join or leave while `f` runs, so deliveries made from
    /// it reach every sink in the order the snapshots were taken.
    /// `f` must not block.
    pub fn with_peers<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[Peer<S>]) -> R,
    {
        f(&self.lock())
    }
}

impl<S: Clone> Registry<S> {
    /// Snapshot of every peer.
    #[inline]
    pub fn all(&self) -> Vec<Peer<S>> { self.lock().clone() }

    #[inline]
    pub fn find_by_id(&self, id: &str) -> Option<Peer<S>> {
        self.lock().iter().find(|p| p.id == id).cloned()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn peer_id() {
        for _ in 0..1024 {
            let id = new_peer_id();
            assert_eq!(id.len(), ID_LEN);
            assert!(id.bytes().all(|b| ID_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn add_remove() {
        let registry = Registry::<()>::new();
        assert!(registry.is_empty());

        let a = registry.add(());
        let b = registry.add(());
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);

        let all: Vec<String> = registry.all().into_iter().map(|p| p.id).collect();
        assert_eq!(all, vec![a.clone(), b.clone()]);

        assert!(registry.remove(&a).is_some());
        assert!(registry.remove(&a).is_none());
        assert!(registry.find_by_id(&a).is_none());
        assert!(registry.find_by_id(&b).is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn add_remove_random() {
        let registry = Registry::<u32>::new();
        let mut expected: HashSet<String> = HashSet::new();
        let mut rng = thread_rng();

        for i in 0..2000 {
            if expected.is_empty() || rng.gen_bool(0.6) {
                expected.insert(registry.add(i));
            } else {
                let victim = expected.iter().choose(&mut rng).unwrap().clone();
                expected.remove(&victim);
                assert!(registry.remove(&victim).is_some());
            }

            let all: HashSet<String> = registry.all().into_iter().map(|p| p.id).collect();
            assert_eq!(all, expected);
        }
    }

    #[test]
    fn names() {
        let registry = Registry::<()>::new();
        let id = registry.add(());

        let peer = registry.find_by_id(&id).unwrap();
        assert_eq!(peer.name, None);
        assert_eq!(peer.display_name(), id);

        assert!(registry.set_name(&id, "alice".to_string()));
        assert_eq!(registry.find_by_id(&id).unwrap().display_name(), "alice");

        registry.remove(&id);
        assert!(!registry.set_name(&id, "bob".to_string()));
    }

    #[test]
    fn add_with_sees_peer() {
        let registry = Registry::<u8>::new();
        let mut seen = None;
        let id = registry.add_with(7, |p| seen = Some((p.id.clone(), p.sink)));
        assert_eq!(seen, Some((id, 7)));
    }

    #[test]
    fn with_peers_sees_all() {
        let registry = Registry::<u8>::new();
        let a = registry.add(1);
        let b = registry.add(2);

        let ids = registry.with_peers(|peers| peers.iter().map(|p| p.id.clone()).collect::<Vec<_>>());
        assert_eq!(ids, vec![a, b]);
        assert_eq!(registry.with_peers(|peers| peers.iter().map(|p| p.sink).sum::<u8>()), 3);
    }

    #[test]
    fn concurrent_add_remove() {
        let registry = Arc::new(Registry::<usize>::new());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    let ids: Vec<String> = (0..200).map(|i| registry.add(t * 1000 + i)).collect();
                    for id in ids.iter().step_by(2) {
                        assert!(registry.remove(id).is_some());
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(registry.len(), 8 * 100);
    }
}
