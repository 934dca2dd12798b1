//! Keyspace-level schema records consumed by ring building, plus the CQL
//! identifier helpers callers use to normalize names before metadata
//! lookups.

use std::collections::HashMap;

use crate::errors::KeyspaceStrategyError;
use crate::routing::replication::ReplicationStrategy;

/// Describes a keyspace known to the cluster.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct Keyspace {
    /// The keyspace name, exactly as stored in the schema tables.
    pub name: String,
    /// `None` when the keyspace reported no replication config. Such a
    /// keyspace still takes part in ring building, as non-replicated: each
    /// token lives only on its primary owner.
    pub strategy: Option<ReplicationStrategy>,
}

impl Keyspace {
    /// Builds keyspace metadata from the raw replication config reported on
    /// schema change.
    ///
    /// An unsupported or garbled config is an error here, at metadata build
    /// time; it never gets as far as ring building.
    pub fn new(
        name: impl Into<String>,
        replication: Option<&HashMap<String, String>>,
    ) -> Result<Self, KeyspaceStrategyError> {
        let strategy = replication
            .map(ReplicationStrategy::from_config)
            .transpose()?;
        Ok(Keyspace {
            name: name.into(),
            strategy,
        })
    }
}

/// Normalizes a keyspace, table or column identifier for lookups.
///
/// CQL identifiers are case insensitive unless double-quoted: a plain
/// identifier is folded to lowercase, a quoted one has its quotes stripped
/// and keeps its case. Anything else is returned as is.
pub fn handle_id(id: &str) -> String {
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return id.to_lowercase();
    }

    if id.len() >= 2 && id.starts_with('"') && id.ends_with('"') {
        return id[1..id.len() - 1].to_owned();
    }

    id.to_owned()
}

/// Escapes an identifier as read back from the schema tables. Identifiers
/// coming from the cluster could always be quoted, but for nicer output
/// plain lowercase ones are left alone.
pub fn escape_id(ident: &str) -> String {
    let plain_lowercase = ident
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase())
        && ident
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if plain_lowercase {
        ident.to_owned()
    } else {
        quote(ident)
    }
}

/// Quotes an identifier to make it case sensitive, for use in methods like
/// [`MetadataStore::replicas_for_key`](crate::cluster::store::MetadataStore::replicas_for_key)
/// or [`MetadataStore::get_keyspace`](crate::cluster::store::MetadataStore::get_keyspace).
pub fn quote(id: &str) -> String {
    format!("\"{id}\"")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::{escape_id, handle_id, quote, Keyspace};
    use crate::errors::KeyspaceStrategyError;
    use crate::routing::replication::ReplicationStrategy;

    #[test]
    fn handle_id_folds_and_unquotes() {
        assert_eq!(handle_id("MyKeyspace"), "mykeyspace");
        assert_eq!(handle_id("my_ks1"), "my_ks1");
        assert_eq!(handle_id("\"MyKeyspace\""), "MyKeyspace");
        // Neither a plain identifier nor quoted: passed through untouched.
        assert_eq!(handle_id("weird-name"), "weird-name");
        assert_eq!(handle_id(""), "");
    }

    #[test]
    fn escape_id_quotes_only_when_needed() {
        assert_eq!(escape_id("plain_id9"), "plain_id9");
        assert_eq!(escape_id("MixedCase"), "\"MixedCase\"");
        assert_eq!(escape_id("9starts_with_digit"), "\"9starts_with_digit\"");
        assert_eq!(quote("ks"), "\"ks\"");
    }

    #[test]
    fn keyspace_without_replication_config() {
        let ks = Keyspace::new("system", None).unwrap();
        assert_eq!(ks.strategy, None);
    }

    #[test]
    fn keyspace_with_bad_config_fails_to_build() {
        let config: HashMap<String, String> = [(
            "class".to_string(),
            "org.example.WeirdStrategy".to_string(),
        )]
        .into();
        assert_matches!(
            Keyspace::new("ks", Some(&config)),
            Err(KeyspaceStrategyError::UnsupportedStrategy(_))
        );
    }

    #[test]
    fn keyspace_with_simple_config() {
        let config: HashMap<String, String> = [
            ("class".to_string(), "SimpleStrategy".to_string()),
            ("replication_factor".to_string(), "2".to_string()),
        ]
        .into();
        let ks = Keyspace::new("ks", Some(&config)).unwrap();
        assert_eq!(
            ks.strategy,
            Some(ReplicationStrategy::Simple {
                replication_factor: 2
            })
        );
    }
}
