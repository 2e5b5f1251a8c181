/**
 * Connection Registry
 *
 * Single source of truth for who should receive an event.
 *
 * The registry maps subjects to their live connections and indexes
 * connections by the scopes they may receive events for. Every connection is
 * associated with its own subject scope on registration; further scopes are
 * added through `subscribe` as the membership collaborator allows.
 *
 * # Concurrency
 *
 * All maps live behind one `std::sync::Mutex`. No method awaits or enqueues
 * while holding it: `resolve` copies the matching connections out and
 * releases the lock before the caller touches any queue.
 *
 * The maps only hold plain data, so a poisoned lock is recovered instead of
 * propagated.
 */

use crate::backend::realtime::connection::{Connection, ConnectionId};
use crate::shared::{Scope, ScopeKind, SubjectId};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Registry size counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub connections: usize,
    pub subjects: usize,
    pub scopes: usize,
}

#[derive(Debug, Default)]
struct RegistryInner {
    connections: HashMap<ConnectionId, Arc<Connection>>,
    subjects: HashMap<SubjectId, HashSet<ConnectionId>>,
    scopes: HashMap<Scope, HashSet<ConnectionId>>,
    memberships: HashMap<ConnectionId, HashSet<Scope>>,
}

impl RegistryInner {
    fn associate(&mut self, id: ConnectionId, scope: Scope) {
        self.scopes.entry(scope).or_default().insert(id);
        self.memberships.entry(id).or_default().insert(scope);
    }

    /// A connection never leaves its own subject scope
    fn dissociate(&mut self, id: ConnectionId, scope: &Scope) -> bool {
        let own_scope = self
            .connections
            .get(&id)
            .is_some_and(|connection| *scope == Scope::Subject(connection.subject()));
        if own_scope {
            return false;
        }

        let removed = match self.scopes.get_mut(scope) {
            Some(members) => {
                let removed = members.remove(&id);
                if members.is_empty() {
                    self.scopes.remove(scope);
                }
                removed
            }
            None => false,
        };
        if let Some(scopes) = self.memberships.get_mut(&id) {
            scopes.remove(scope);
        }
        removed
    }
}

/// Shared registry handle
///
/// Cloning yields another handle to the same registry.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a connection under its subject
    ///
    /// Idempotent per connection id. The connection is also associated with
    /// its own subject scope. Returns false if it was already registered.
    pub fn register(&self, connection: Arc<Connection>) -> bool {
        let id = connection.id();
        let subject = connection.subject();

        let mut inner = self.lock();
        if inner.connections.contains_key(&id) {
            return false;
        }
        inner.connections.insert(id, connection);
        inner.subjects.entry(subject).or_default().insert(id);
        inner.associate(id, Scope::Subject(subject));
        drop(inner);

        tracing::debug!(connection_id = %id, subject = %subject, "connection registered");
        true
    }

    /// Remove a connection from the subject map and every scope it was in
    ///
    /// A second call for the same id is a no-op and returns `None`.
    pub fn unregister(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        let mut inner = self.lock();
        let connection = inner.connections.remove(&id)?;

        let subject = connection.subject();
        if let Some(ids) = inner.subjects.get_mut(&subject) {
            ids.remove(&id);
            if ids.is_empty() {
                inner.subjects.remove(&subject);
            }
        }

        for scope in inner.memberships.remove(&id).unwrap_or_default() {
            if let Some(members) = inner.scopes.get_mut(&scope) {
                members.remove(&id);
                if members.is_empty() {
                    inner.scopes.remove(&scope);
                }
            }
        }
        drop(inner);

        tracing::debug!(connection_id = %id, subject = %subject, "connection unregistered");
        Some(connection)
    }

    /// Snapshot of the open connections associated with `scope`
    pub fn resolve(&self, scope: &Scope) -> Vec<Arc<Connection>> {
        let inner = self.lock();
        let Some(ids) = inner.scopes.get(scope) else {
            return Vec::new();
        };
        ids.iter()
            .filter_map(|id| inner.connections.get(id))
            .filter(|connection| connection.is_open())
            .cloned()
            .collect()
    }

    /// Snapshot of the open connections for a scope given by kind and id
    pub fn resolve_scope(&self, kind: ScopeKind, id: Uuid) -> Vec<Arc<Connection>> {
        self.resolve(&Scope::new(kind, id))
    }

    /// Associate one connection with a scope
    ///
    /// Refused (returns false) for unknown or non-open connections.
    pub fn subscribe(&self, id: ConnectionId, scope: Scope) -> bool {
        let mut inner = self.lock();
        match inner.connections.get(&id) {
            Some(connection) if connection.is_open() => {}
            _ => return false,
        }
        inner.associate(id, scope);
        true
    }

    /// Remove one connection's association with a scope
    ///
    /// Refused for the connection's own subject scope.
    pub fn unsubscribe(&self, id: ConnectionId, scope: &Scope) -> bool {
        self.lock().dissociate(id, scope)
    }

    /// Associate every open connection of `subject` with a scope
    ///
    /// Returns the number of connections associated.
    pub fn subscribe_subject(&self, subject: SubjectId, scope: Scope) -> usize {
        let mut inner = self.lock();
        let ids: Vec<ConnectionId> = match inner.subjects.get(&subject) {
            Some(ids) => ids
                .iter()
                .filter(|id| inner.connections.get(id).is_some_and(|c| c.is_open()))
                .copied()
                .collect(),
            None => return 0,
        };
        for id in &ids {
            inner.associate(*id, scope);
        }
        ids.len()
    }

    /// Remove the association of every connection of `subject` with a scope
    ///
    /// The subject's own scope is never removed.
    pub fn unsubscribe_subject(&self, subject: SubjectId, scope: &Scope) -> usize {
        let mut inner = self.lock();
        let ids: Vec<ConnectionId> = match inner.subjects.get(&subject) {
            Some(ids) => ids.iter().copied().collect(),
            None => return 0,
        };
        ids.into_iter()
            .filter(|id| inner.dissociate(*id, scope))
            .count()
    }

    pub fn is_subscribed(&self, id: ConnectionId, scope: &Scope) -> bool {
        self.lock()
            .scopes
            .get(scope)
            .is_some_and(|members| members.contains(&id))
    }

    /// All registered connections of a subject
    pub fn connections_for(&self, subject: SubjectId) -> Vec<Arc<Connection>> {
        let inner = self.lock();
        inner
            .subjects
            .get(&subject)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.connections.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn connection_count_for(&self, subject: SubjectId) -> usize {
        self.lock().subjects.get(&subject).map_or(0, HashSet::len)
    }

    pub fn get(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        self.lock().connections.get(&id).cloned()
    }

    /// Close every registered connection; used on server shutdown
    ///
    /// Each session unregisters its own connection as it winds down.
    pub fn close_all(&self) -> usize {
        let connections: Vec<Arc<Connection>> = self.lock().connections.values().cloned().collect();
        connections.iter().filter(|connection| connection.close()).count()
    }

    pub fn stats(&self) -> RegistryStats {
        let inner = self.lock();
        RegistryStats {
            connections: inner.connections.len(),
            subjects: inner.subjects.len(),
            scopes: inner.scopes.len(),
        }
    }
}
