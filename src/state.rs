//! Application state for Axum web framework.

use crate::services::DispatchGateway;

/// Shared per-request state. Cloning is cheap: the gateway holds `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub gateway: DispatchGateway,
    /// Treat every dispatch as a simulation (`serve --simulate-only`)
    pub simulate_only: bool,
}

impl AppState {
    pub fn new(gateway: DispatchGateway, simulate_only: bool) -> Self {
        Self { gateway, simulate_only }
    }

    /// Memory store, default policy, no provider
    #[cfg(test)]
    pub fn for_tests() -> Self {
        use crate::phone::PhoneValidator;
        use crate::quota::{MemoryQuotaStore, QuotaPolicy};
        use jiff::tz::TimeZone;
        use std::sync::Arc;

        let gateway = DispatchGateway::new(
            PhoneValidator::default(),
            QuotaPolicy::new(3, 60, TimeZone::UTC),
            Arc::new(MemoryQuotaStore::new()),
            None,
        );
        Self::new(gateway, false)
    }
}
