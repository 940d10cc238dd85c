//! Entity link resolution
//!
//! Maps an audited entity (or the acting user) to a frontend navigation
//! path. Resolution is best-effort: unknown entity types simply produce no
//! link, never an error.

use uuid::Uuid;

/// Resolves display links for audited entities and actors
pub trait EntityLinkResolver: Send + Sync {
    /// Navigation path for the affected entity, when one exists
    fn entity_link(&self, entity_type: &str, entity_id: &str) -> Option<String>;

    /// Navigation path for the acting user
    fn actor_link(&self, actor_id: Uuid) -> Option<String>;
}

/// Resolver backed by the frontend's static route table
#[derive(Debug, Default, Clone)]
pub struct RouteLinkResolver;

impl EntityLinkResolver for RouteLinkResolver {
    fn entity_link(&self, entity_type: &str, entity_id: &str) -> Option<String> {
        let base = match entity_type {
            "product" => "/products",
            "sale" => "/sales",
            "purchase" => "/purchases",
            "customer" => "/customers",
            "debt" => "/debts",
            "payment" => "/payments",
            "user" => "/users",
            _ => return None,
        };
        Some(format!("{}/{}", base, entity_id))
    }

    fn actor_link(&self, actor_id: Uuid) -> Option<String> {
        Some(format!("/users/{}", actor_id))
    }
}
