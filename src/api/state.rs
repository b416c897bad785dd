//! Application state for the SIP price engine API.

use std::sync::Arc;

use crate::resolver::PriceService;

/// Shared application state.
///
/// Holds the pricing service shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    service: Arc<PriceService>,
}

impl AppState {
    /// Creates the state around a pricing service.
    pub fn new(service: PriceService) -> Self {
        Self::from_shared(Arc::new(service))
    }

    /// Creates the state around an already shared pricing service.
    pub fn from_shared(service: Arc<PriceService>) -> Self {
        Self { service }
    }

    /// Returns the pricing service.
    pub fn service(&self) -> &PriceService {
        &self.service
    }
}
