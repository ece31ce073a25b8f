//! Single-writer, multi-reader replicated map.
//!
//! Consistency model: every write made by the authority is stamped with a version
//! taken from one monotonically increasing counter. A replica applies an update only
//! when its version is newer than the one it already holds for that (key, field).
//! Fields are independent: there is no cross-field atomicity, so a reader may see
//! `health = 0` before `dead = true`. Delivery is assumed best-effort and
//! at-least-once; duplicates and stale reorderings are dropped by the version check.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::error::SessionError;

pub trait FieldSet: Default + Clone {
    type Field: Copy + Eq + Hash + Debug;
    type Value: Clone + PartialEq + Debug;

    fn field_of(value: &Self::Value) -> Self::Field;
    fn read(&self, field: Self::Field) -> Self::Value;
    fn write(&mut self, value: Self::Value);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    Writer,
    Replica,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate<K, V> {
    pub key: K,
    pub version: u64,
    pub value: V,
}

#[derive(Debug, Clone)]
struct Entry<S: FieldSet> {
    fields: S,
    versions: HashMap<S::Field, u64>,
}

impl<S: FieldSet> Default for Entry<S> {
    fn default() -> Self {
        Self {
            fields: S::default(),
            versions: HashMap::new(),
        }
    }
}

#[derive(Debug)]
pub struct ReplicatedMap<K, S: FieldSet> {
    authority: Authority,
    entries: HashMap<K, Entry<S>>,
    next_version: u64,
    outbox: Vec<FieldUpdate<K, S::Value>>,
}

impl<K, S> ReplicatedMap<K, S>
where
    K: Copy + Eq + Hash + Debug,
    S: FieldSet,
{
    pub fn writer() -> Self {
        Self::new(Authority::Writer)
    }

    pub fn replica() -> Self {
        Self::new(Authority::Replica)
    }

    fn new(authority: Authority) -> Self {
        Self {
            authority,
            entries: HashMap::new(),
            next_version: 1,
            outbox: Vec::new(),
        }
    }

    /// Writes one field and queues the update for publication.
    ///
    /// Fails with `NotAuthorized` on a replica and leaves the stored value untouched.
    pub fn set_state(&mut self, key: K, value: S::Value) -> Result<u64, SessionError> {
        if self.authority != Authority::Writer {
            log::warn!("rejected replica write to {:?}: {:?}", key, value);
            return Err(SessionError::NotAuthorized);
        }

        let version = self.next_version;
        self.next_version += 1;

        let entry = self.entries.entry(key).or_default();
        entry.fields.write(value.clone());
        entry.versions.insert(S::field_of(&value), version);

        self.outbox.push(FieldUpdate {
            key,
            version,
            value,
        });
        Ok(version)
    }

    /// Last received value, or the initialization default when nothing arrived yet.
    pub fn get_state(&self, key: K, field: S::Field) -> S::Value {
        match self.entries.get(&key) {
            Some(entry) => entry.fields.read(field),
            None => S::default().read(field),
        }
    }

    pub fn fields(&self, key: K) -> Option<&S> {
        self.entries.get(&key).map(|e| &e.fields)
    }

    pub fn version(&self, key: K, field: S::Field) -> Option<u64> {
        self.entries
            .get(&key)
            .and_then(|e| e.versions.get(&field).copied())
    }

    /// Applies a remote update. Returns false when it is a duplicate or stale.
    pub fn apply(&mut self, update: &FieldUpdate<K, S::Value>) -> bool {
        let field = S::field_of(&update.value);
        let entry = self.entries.entry(update.key).or_default();

        let stale = entry
            .versions
            .get(&field)
            .is_some_and(|&current| current >= update.version);
        if stale {
            return false;
        }

        entry.fields.write(update.value.clone());
        entry.versions.insert(field, update.version);
        true
    }

    pub fn remove(&mut self, key: K) -> Option<S> {
        self.outbox.retain(|u| u.key != key);
        self.entries.remove(&key).map(|e| e.fields)
    }

    pub fn contains(&self, key: K) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn take_updates(&mut self) -> Vec<FieldUpdate<K, S::Value>> {
        std::mem::take(&mut self.outbox)
    }

    /// Latest update for every written field, versions unchanged.
    pub fn retained(&self) -> Vec<FieldUpdate<K, S::Value>>
    where
        S::Field: Ord,
    {
        let mut updates = Vec::new();
        for (key, entry) in &self.entries {
            let mut fields: Vec<_> = entry.versions.iter().collect();
            fields.sort_by_key(|(field, _)| **field);
            for (field, version) in fields {
                updates.push(FieldUpdate {
                    key: *key,
                    version: *version,
                    value: entry.fields.read(*field),
                });
            }
        }
        updates
    }
}
