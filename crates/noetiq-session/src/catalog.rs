//! Vault catalog controller.
//!
//! The catalog is never patched locally. Every mutation is followed by a full
//! `list_vaults` fetch, and the fresh list is what the mutation returns.

use std::sync::Arc;

use tracing::{debug, info, warn};

use noetiq_core::{
    Credential, EventBus, Result, SessionEvent, StorageGateway, Vault, VaultDraft, VaultId,
};

/// What the vault list screen should render for a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogView {
    /// No vaults exist at all.
    Empty,
    /// Vaults exist but none match the query.
    NoMatches,
    Matches(Vec<Vault>),
}

pub struct VaultCatalog {
    gateway: Arc<dyn StorageGateway>,
    events: EventBus,
}

impl VaultCatalog {
    pub fn new(gateway: Arc<dyn StorageGateway>, events: EventBus) -> Self {
        Self { gateway, events }
    }

    /// Fetch the catalog. Never served from a cache.
    pub async fn list(&self, credential: &Credential) -> Result<Vec<Vault>> {
        let vaults = self.gateway.list_vaults(credential).await?;
        debug!(component = "catalog", op = "list", result_count = vaults.len(), "Catalog fetched");
        self.events.emit(SessionEvent::CatalogRefreshed {
            vault_count: vaults.len(),
        });
        Ok(vaults)
    }

    /// Case-insensitive substring match on name or description. A blank
    /// query matches everything.
    pub fn filter(vaults: &[Vault], query: &str) -> Vec<Vault> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return vaults.to_vec();
        }
        vaults
            .iter()
            .filter(|v| {
                v.name.to_lowercase().contains(&needle)
                    || v.description.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    pub fn view(vaults: &[Vault], query: &str) -> CatalogView {
        if vaults.is_empty() {
            return CatalogView::Empty;
        }
        let matches = Self::filter(vaults, query);
        if matches.is_empty() {
            CatalogView::NoMatches
        } else {
            CatalogView::Matches(matches)
        }
    }

    /// Create a vault and return the refreshed catalog.
    pub async fn create(&self, credential: &Credential, draft: &VaultDraft) -> Result<Vec<Vault>> {
        draft.validate()?;
        self.gateway.create_vault(credential, draft).await?;
        info!(component = "catalog", op = "create_vault", "Vault created");
        self.list(credential).await
    }

    /// Replace every mutable field of a vault and return the refreshed catalog.
    pub async fn update(
        &self,
        credential: &Credential,
        id: &VaultId,
        draft: &VaultDraft,
    ) -> Result<Vec<Vault>> {
        draft.validate()?;
        self.gateway
            .update_vault(credential, id, &draft.name, &draft.description, &draft.icon)
            .await?;
        info!(component = "catalog", op = "update_vault", vault_id = %id, "Vault updated");
        self.list(credential).await
    }

    /// Delete a vault with all its notes and return the refreshed catalog.
    pub async fn delete(&self, credential: &Credential, id: &VaultId) -> Result<Vec<Vault>> {
        if let Err(e) = self.gateway.delete_vault(credential, id).await {
            warn!(
                component = "catalog",
                op = "delete_vault",
                vault_id = %id,
                error = %e,
                "Vault delete failed"
            );
            return Err(e);
        }
        info!(component = "catalog", op = "delete_vault", vault_id = %id, "Vault deleted");
        self.list(credential).await
    }

    pub async fn note_count(&self, id: &VaultId) -> Result<usize> {
        self.gateway.get_vault_notes_number(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault(name: &str, description: &str) -> Vault {
        Vault {
            id: VaultId::new(name),
            icon: "📦".into(),
            name: name.into(),
            description: description.into(),
        }
    }

    #[test]
    fn test_filter_matches_name_or_description_any_case() {
        let vaults = vec![vault("Work", "x"), vault("Home", "work stuff"), vault("Trips", "")];
        for query in ["work", "WORK", "  Work "] {
            let names: Vec<_> = VaultCatalog::filter(&vaults, query)
                .into_iter()
                .map(|v| v.name)
                .collect();
            assert_eq!(names, vec!["Work", "Home"]);
        }
    }

    #[test]
    fn test_filter_blank_query_returns_all() {
        let vaults = vec![vault("Work", ""), vault("Home", "")];
        assert_eq!(VaultCatalog::filter(&vaults, "   ").len(), 2);
    }

    #[test]
    fn test_view_distinguishes_empty_and_no_matches() {
        assert_eq!(VaultCatalog::view(&[], "x"), CatalogView::Empty);
        let vaults = vec![vault("Work", "")];
        assert_eq!(VaultCatalog::view(&vaults, "zzz"), CatalogView::NoMatches);
        assert!(matches!(
            VaultCatalog::view(&vaults, "wor"),
            CatalogView::Matches(ref v) if v.len() == 1
        ));
    }
}
