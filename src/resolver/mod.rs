//! Factor resolution and the pricing service.
//!
//! The collaborator traits describe what the engine needs from the shop,
//! item, exchange-rate and merchant services; [`PriceService`] resolves
//! every factor for a query and hands them to [`crate::calculation`].

mod collaborators;
mod memory;
mod service;

pub use collaborators::{AffiliateItemRepository, FactorResolver, PersistenceSink};
pub use memory::InMemoryCollaborators;
pub use service::{Collaborators, PriceService};
