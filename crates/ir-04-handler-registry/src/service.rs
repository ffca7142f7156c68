//! # Handler Registry Service

use parking_lot::RwLock;
use regex::Regex;
use shared_types::{InteractionKind, ParsedToken};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::HandlerDescriptor;
use crate::error::RegistryError;

#[derive(Default)]
struct KindTable {
    exact: HashMap<String, Arc<HandlerDescriptor>>,
    /// Checked in registration order.
    patterns: Vec<(Regex, Arc<HandlerDescriptor>)>,
}

/// Per-kind handler tables.
///
/// Registration normally happens at startup, but the tables sit behind a
/// read-write lock so late registration from a running host is safe.
#[derive(Default)]
pub struct HandlerRegistry {
    tables: RwLock<HashMap<InteractionKind, KindTable>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under an exact `ns:action` or `ns:action:version` key.
    pub fn register(
        &self,
        kind: InteractionKind,
        key: &str,
        descriptor: HandlerDescriptor,
    ) -> Result<(), RegistryError> {
        validate_key(key)?;

        let mut tables = self.tables.write();
        let table = tables.entry(kind).or_default();
        if table.exact.contains_key(key) {
            return Err(RegistryError::Duplicate {
                kind,
                key: key.to_string(),
            });
        }
        table.exact.insert(key.to_string(), Arc::new(descriptor));
        info!(kind = %kind, key = key, "Handler registered");
        Ok(())
    }

    /// Register a regex route, tried against `ns:action:version` after all
    /// exact keys miss.
    pub fn register_pattern(
        &self,
        kind: InteractionKind,
        pattern: &str,
        descriptor: HandlerDescriptor,
    ) -> Result<(), RegistryError> {
        let regex = Regex::new(pattern).map_err(|e| RegistryError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        let mut tables = self.tables.write();
        let table = tables.entry(kind).or_default();
        if table.patterns.iter().any(|(existing, _)| existing.as_str() == pattern) {
            return Err(RegistryError::Duplicate {
                kind,
                key: pattern.to_string(),
            });
        }
        table.patterns.push((regex, Arc::new(descriptor)));
        info!(kind = %kind, pattern = pattern, "Pattern handler registered");
        Ok(())
    }

    /// Resolve the handler for a verified token.
    pub fn find_handler(
        &self,
        kind: InteractionKind,
        token: &ParsedToken,
    ) -> Option<Arc<HandlerDescriptor>> {
        let tables = self.tables.read();
        let table = tables.get(&kind)?;

        let route = token.route_key();
        if let Some(found) = table.exact.get(&route) {
            return Some(found.clone());
        }
        if let Some(found) = table.exact.get(&token.unversioned_key()) {
            return Some(found.clone());
        }

        let found = table
            .patterns
            .iter()
            .find(|(regex, _)| regex.is_match(&route))
            .map(|(_, descriptor)| descriptor.clone());
        if found.is_some() {
            debug!(kind = %kind, route = %route, "Resolved through pattern");
        }
        found
    }

    /// Registered handlers (exact keys plus patterns) per kind.
    pub fn handler_counts(&self) -> BTreeMap<String, usize> {
        let tables = self.tables.read();
        InteractionKind::ALL
            .iter()
            .map(|kind| {
                let count = tables
                    .get(kind)
                    .map(|t| t.exact.len() + t.patterns.len())
                    .unwrap_or(0);
                (kind.as_str().to_string(), count)
            })
            .collect()
    }
}

/// `ns:action` or `ns:action:version`, no empty segments, numeric version.
fn validate_key(key: &str) -> Result<(), RegistryError> {
    let invalid = || RegistryError::InvalidKey(key.to_string());
    let parts: Vec<&str> = key.split(':').collect();

    if !(2..=3).contains(&parts.len()) || parts.iter().any(|p| p.is_empty()) {
        return Err(invalid());
    }
    if let Some(version) = parts.get(2) {
        version.parse::<u16>().map_err(|_| invalid())?;
    }
    Ok(())
}
