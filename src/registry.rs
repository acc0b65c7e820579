//! Process-wide datasource registry.
//!
//! Maps datasource names to reference-counted holders under one exclusive
//! lock. Lookup-or-create is a single atomic step, so concurrent first
//! acquires of one name can never build two holders. The reference count
//! lives inside the registry entry, which makes it impossible to touch it
//! without holding the registry lock.

use std::collections::HashMap;
use std::collections::hash_map::Entry as MapEntry;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, trace};

use crate::holder::ConnectionHolder;

struct Entry {
    holder: Arc<ConnectionHolder>,
    ref_count: usize,
}

/// Outcome of releasing one reference to a named holder.
pub(crate) enum Released {
    /// Other handles still reference the holder; nothing to tear down.
    StillShared { remaining: usize },
    /// That was the last reference. The entry is already removed; the caller
    /// must tear the holder down, outside the registry lock.
    LastHandle(Arc<ConnectionHolder>),
    /// No entry for that name. Only reachable through a double release,
    /// which the client handle prevents.
    Missing,
}

/// Registry of live holders, keyed by datasource name.
///
/// The backing map itself is allocated on first use and disposed when the
/// last entry is removed.
pub(crate) struct SharedRegistry {
    inner: Mutex<Option<HashMap<String, Entry>>>,
}

impl SharedRegistry {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Look up `name`, creating a holder via `make` on a miss.
    ///
    /// A hit increments the entry's reference count; a miss inserts a fresh
    /// entry at count 1. Both happen under the same lock acquisition.
    pub(crate) fn acquire(
        &self,
        name: &str,
        make: impl FnOnce() -> Arc<ConnectionHolder>,
    ) -> Arc<ConnectionHolder> {
        let mut guard = self.inner.lock().unwrap();
        let map = guard.get_or_insert_with(HashMap::new);
        match map.get_mut(name) {
            Some(entry) => {
                entry.ref_count += 1;
                debug!(
                    datasource = %name,
                    ref_count = entry.ref_count,
                    "Reusing shared datasource holder"
                );
                entry.holder.clone()
            }
            None => {
                let holder = make();
                map.insert(
                    name.to_string(),
                    Entry {
                        holder: holder.clone(),
                        ref_count: 1,
                    },
                );
                info!(datasource = %name, "Created datasource holder");
                holder
            }
        }
    }

    /// Drop one reference to `name`.
    ///
    /// Reaching zero removes the entry in the same lock acquisition as the
    /// decrement, so a racing [`SharedRegistry::acquire`] either sees the
    /// still-counted entry or no entry at all, never a zombie.
    pub(crate) fn release(&self, name: &str) -> Released {
        let mut guard = self.inner.lock().unwrap();
        let Some(map) = guard.as_mut() else {
            return Released::Missing;
        };
        match map.entry(name.to_string()) {
            MapEntry::Vacant(_) => Released::Missing,
            MapEntry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if entry.ref_count > 1 {
                    entry.ref_count -= 1;
                    debug!(
                        datasource = %name,
                        ref_count = entry.ref_count,
                        "Released shared datasource holder"
                    );
                    Released::StillShared {
                        remaining: entry.ref_count,
                    }
                } else {
                    let entry = occupied.remove();
                    info!(datasource = %name, "Removed datasource holder");
                    if map.is_empty() {
                        trace!("Registry backing map disposed");
                        *guard = None;
                    }
                    Released::LastHandle(entry.holder)
                }
            }
        }
    }

    /// Number of live holders.
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().unwrap().as_ref().map_or(0, HashMap::len)
    }
}
