//! Property-based tests for the connection registry
//!
//! Random register/unregister/subscribe/close sequences, including attempts
//! to leave a subject scope, are applied to both the registry and a plain
//! model; resolution must always agree with the model.

use huddle::backend::realtime::{Connection, OutboundQueue, Registry, RegistryStats};
use huddle::shared::{GatewayConfig, Scope};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
enum Op {
    Open { subject: usize },
    Unregister { conn: usize },
    Close { conn: usize },
    Subscribe { conn: usize, scope: usize },
    Unsubscribe { conn: usize, scope: usize },
    LeaveSubject { conn: usize },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize).prop_map(|subject| Op::Open { subject }),
        (0..8usize).prop_map(|conn| Op::Unregister { conn }),
        (0..8usize).prop_map(|conn| Op::Close { conn }),
        (0..8usize, 0..4usize).prop_map(|(conn, scope)| Op::Subscribe { conn, scope }),
        (0..8usize, 0..4usize).prop_map(|(conn, scope)| Op::Unsubscribe { conn, scope }),
        (0..8usize).prop_map(|conn| Op::LeaveSubject { conn }),
    ]
}

struct Model {
    registered: HashSet<usize>,
    scopes: HashMap<usize, HashSet<Scope>>,
}

proptest! {
    #[test]
    fn test_resolve_matches_model(ops in prop::collection::vec(op(), 1..60)) {
        let config = GatewayConfig::default();
        let subjects: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let channels: Vec<Scope> = (0..4).map(|_| Scope::Channel(Uuid::new_v4())).collect();

        let registry = Registry::new();
        let mut connections: Vec<(Arc<Connection>, OutboundQueue)> = Vec::new();
        let mut model = Model { registered: HashSet::new(), scopes: HashMap::new() };

        for op in ops {
            match op {
                Op::Open { subject } => {
                    let (conn, queue) = Connection::new(subjects[subject], &config);
                    prop_assert!(registry.register(conn.clone()));
                    prop_assert!(!registry.register(conn.clone()));
                    let index = connections.len();
                    model.registered.insert(index);
                    model.scopes.entry(index).or_default().insert(Scope::Subject(subjects[subject]));
                    connections.push((conn, queue));
                }
                Op::Unregister { conn } if conn < connections.len() => {
                    let removed = registry.unregister(connections[conn].0.id());
                    prop_assert_eq!(removed.is_some(), model.registered.remove(&conn));
                    model.scopes.remove(&conn);
                }
                Op::Close { conn } if conn < connections.len() => {
                    connections[conn].0.close();
                }
                Op::Subscribe { conn, scope } if conn < connections.len() => {
                    let (connection, _) = &connections[conn];
                    let accepted = registry.subscribe(connection.id(), channels[scope]);
                    let expected = model.registered.contains(&conn) && connection.is_open();
                    prop_assert_eq!(accepted, expected);
                    if accepted {
                        model.scopes.entry(conn).or_default().insert(channels[scope]);
                    }
                }
                Op::Unsubscribe { conn, scope } if conn < connections.len() => {
                    registry.unsubscribe(connections[conn].0.id(), &channels[scope]);
                    if let Some(scopes) = model.scopes.get_mut(&conn) {
                        scopes.remove(&channels[scope]);
                    }
                }
                Op::LeaveSubject { conn } if conn < connections.len() => {
                    let connection = &connections[conn].0;
                    let own = Scope::Subject(connection.subject());
                    prop_assert!(!registry.unsubscribe(connection.id(), &own));
                    prop_assert_eq!(registry.unsubscribe_subject(connection.subject(), &own), 0);
                }
                _ => {}
            }

            let all_scopes = channels.iter().copied().chain(subjects.iter().map(|s| Scope::Subject(*s)));
            for scope in all_scopes {
                let resolved: HashSet<Uuid> = registry.resolve(&scope).iter().map(|c| c.id()).collect();
                let expected: HashSet<Uuid> = model
                    .registered
                    .iter()
                    .filter(|index| connections[**index].0.is_open())
                    .filter(|index| model.scopes.get(*index).is_some_and(|s| s.contains(&scope)))
                    .map(|index| connections[*index].0.id())
                    .collect();
                prop_assert_eq!(resolved, expected);
            }

            let stats = registry.stats();
            prop_assert_eq!(stats.connections, model.registered.len());
        }
    }

    #[test]
    fn test_unregister_is_idempotent(extra_scopes in 0..6usize) {
        let config = GatewayConfig::default();
        let registry = Registry::new();
        let (conn, _queue) = Connection::new(Uuid::new_v4(), &config);
        registry.register(conn.clone());
        for _ in 0..extra_scopes {
            registry.subscribe(conn.id(), Scope::Dm(Uuid::new_v4()));
        }

        prop_assert!(registry.unregister(conn.id()).is_some());
        prop_assert!(registry.unregister(conn.id()).is_none());
        prop_assert_eq!(registry.stats(), RegistryStats::default());
    }
}
