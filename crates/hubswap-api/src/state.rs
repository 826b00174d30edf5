//! Application state shared across API handlers

use std::sync::Arc;
use std::time::Duration;

use cross_chain::{CrossChainOrchestrator, TokenIcons};
use dex_router::SwapRouter;
use hubswap_core::{AppConfig, ChainId, RequestContext};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    orchestrator: Arc<CrossChainOrchestrator>,
    icons: TokenIcons,
}

impl AppState {
    pub fn new(config: AppConfig, orchestrator: Arc<CrossChainOrchestrator>, icons: TokenIcons) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                orchestrator,
                icons,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn orchestrator(&self) -> &CrossChainOrchestrator {
        &self.inner.orchestrator
    }

    /// Same-chain router, if the chain is wired.
    pub fn router(&self, chain_id: ChainId) -> Option<&Arc<SwapRouter>> {
        self.inner.orchestrator.router(chain_id)
    }

    pub fn icons(&self) -> &TokenIcons {
        &self.inner.icons
    }

    /// Fresh context bounded by the configured request timeout.
    pub fn request_context(&self) -> RequestContext {
        RequestContext::new(Some(Duration::from_millis(self.inner.config.request_timeout_ms)))
    }
}
