//! Read-through list/map view over a server-side set of entities.
//!
//! Implementors supply one primitive, [`RemoteCollection::fetch`], which asks
//! the server for every item of the kind and keys it by name. Every other
//! operation is derived from exactly one fresh fetch, so each answer reflects
//! the server as of that call. Nothing is cached: callers that need a stable
//! view take one snapshot with [`RemoteCollection::to_list`] or
//! [`RemoteCollection::to_map`] and work from it.

use crate::{Result, XflrError};
use indexmap::IndexMap;
use tracing::warn;

/// Items keyed by name, in the order the server reported them.
pub type Snapshot<T> = IndexMap<String, T>;

/// Key for [`RemoteCollection::lookup`]: by position or by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKey<'a> {
    Index(usize),
    Name(&'a str),
}

impl From<usize> for CollectionKey<'_> {
    fn from(index: usize) -> Self {
        CollectionKey::Index(index)
    }
}

impl<'a> From<&'a str> for CollectionKey<'a> {
    fn from(name: &'a str) -> Self {
        CollectionKey::Name(name)
    }
}

impl<'a> From<&'a String> for CollectionKey<'a> {
    fn from(name: &'a String) -> Self {
        CollectionKey::Name(name.as_str())
    }
}

/// Uniform list-and-map read access over a server-fetched set.
#[async_trait::async_trait]
pub trait RemoteCollection: Send + Sync {
    type Item: Send;

    /// Entity kind, used in lookup errors.
    const KIND: &'static str;

    /// Fetch every item from the server, keyed by name, in server order.
    async fn fetch(&self) -> Result<Snapshot<Self::Item>>;

    /// Number of items right now.
    async fn len(&self) -> Result<usize> {
        Ok(self.fetch().await?.len())
    }

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Iterate one fresh fetch in server order.
    ///
    /// Each call fetches again; the returned iterator never re-fetches.
    async fn iter(&self) -> Result<indexmap::map::IntoValues<String, Self::Item>> {
        Ok(self.fetch().await?.into_values())
    }

    /// One fresh fetch as a list.
    async fn to_list(&self) -> Result<Vec<Self::Item>> {
        Ok(self.fetch().await?.into_values().collect())
    }

    /// One fresh fetch as a name-keyed map.
    async fn to_map(&self) -> Result<Snapshot<Self::Item>> {
        self.fetch().await
    }

    /// Positional lookup. Out of range fails with `IndexOutOfRange`.
    async fn get_by_index(&self, index: usize) -> Result<Self::Item> {
        let items = self.fetch().await?;
        let len = items.len();
        items
            .into_values()
            .nth(index)
            .ok_or(XflrError::IndexOutOfRange {
                kind: Self::KIND,
                index,
                len,
            })
    }

    /// Name lookup. An absent name fails with `NotFound`.
    async fn get_by_key(&self, key: &str) -> Result<Self::Item> {
        let mut items = self.fetch().await?;
        items.swap_remove(key).ok_or_else(|| XflrError::NotFound {
            kind: Self::KIND,
            key: key.to_string(),
        })
    }

    /// Lookup by either kind of key.
    async fn lookup<'k>(&self, key: CollectionKey<'k>) -> Result<Self::Item> {
        match key {
            CollectionKey::Index(index) => self.get_by_index(index).await,
            CollectionKey::Name(name) => self.get_by_key(name).await,
        }
    }

    /// Whether an item with this name exists right now.
    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.fetch().await?.contains_key(key))
    }

    /// Names in server order.
    async fn names(&self) -> Result<Vec<String>> {
        Ok(self.fetch().await?.into_keys().collect())
    }
}

/// Build a snapshot, keeping the first item for any repeated name.
pub(crate) fn unique_by_name<T>(
    kind: &'static str,
    items: impl IntoIterator<Item = (String, T)>,
) -> Snapshot<T> {
    let mut out = Snapshot::new();
    for (name, item) in items {
        if out.contains_key(&name) {
            warn!("Server listed {} '{}' twice, keeping the first", kind, name);
            continue;
        }
        out.insert(name, item);
    }
    out
}
