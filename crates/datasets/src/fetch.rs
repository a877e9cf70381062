use foundation::ids::IndustryId;

/// The four static resources the application consumes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResourceKind {
    Catalog,
    Scores,
    Demographics,
    Boundaries,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResourceKind::Catalog => "catalog",
            ResourceKind::Scores => "scores",
            ResourceKind::Demographics => "demographics",
            ResourceKind::Boundaries => "boundaries",
        };
        f.write_str(name)
    }
}

/// Cache key for one fetchable resource.
///
/// `Scores` carries a validated id; the path is built from the closed id
/// alphabet, never from raw caller input.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResourceKey {
    Catalog,
    Scores(IndustryId),
    Demographics,
    Boundaries,
}

impl ResourceKey {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceKey::Catalog => ResourceKind::Catalog,
            ResourceKey::Scores(_) => ResourceKind::Scores,
            ResourceKey::Demographics => ResourceKind::Demographics,
            ResourceKey::Boundaries => ResourceKind::Boundaries,
        }
    }

    /// Resource path relative to the data root.
    pub fn path(&self) -> String {
        match self {
            ResourceKey::Catalog => "industries.json".to_string(),
            ResourceKey::Scores(id) => format!("scores/{id}.json"),
            ResourceKey::Demographics => "demographics/counties.json".to_string(),
            ResourceKey::Boundaries => "counties.geojson".to_string(),
        }
    }
}

/// One fetch a store wants performed.
///
/// `epoch` is the store's liveness stamp at queue time; the driver echoes it
/// back on completion and the store drops commits from a stale epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub key: ResourceKey,
    pub epoch: u64,
}

/// Pending fetch requests, drained by the I/O driver.
///
/// Deduplication is the owning store's job; the outbox is a plain ordered
/// queue so the driver sees requests in queue order.
#[derive(Debug, Default)]
pub struct Outbox {
    requests: Vec<FetchRequest>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: ResourceKey, epoch: u64) {
        self.requests.push(FetchRequest { key, epoch });
    }

    pub fn drain(&mut self) -> Vec<FetchRequest> {
        std::mem::take(&mut self.requests)
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Outbox, ResourceKey, ResourceKind};
    use foundation::ids::IndustryId;

    #[test]
    fn paths_are_fixed_except_for_the_validated_id() {
        assert_eq!(ResourceKey::Catalog.path(), "industries.json");
        assert_eq!(
            ResourceKey::Demographics.path(),
            "demographics/counties.json"
        );
        assert_eq!(ResourceKey::Boundaries.path(), "counties.geojson");

        let id = IndustryId::parse("coffee-shops").unwrap();
        assert_eq!(ResourceKey::Scores(id).path(), "scores/coffee-shops.json");
    }

    #[test]
    fn drain_empties_in_queue_order() {
        let mut outbox = Outbox::new();
        outbox.push(ResourceKey::Catalog, 0);
        outbox.push(ResourceKey::Demographics, 0);

        let drained = outbox.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].key.kind(), ResourceKind::Catalog);
        assert_eq!(drained[1].key.kind(), ResourceKind::Demographics);
        assert!(outbox.is_empty());
    }
}
