use crate::parent::ParentService;
use genesis_core::advisory::{Advisor, AdvisoryError, AdvisoryRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// Runs an async [`ParentService`] from the synchronous tick.
///
/// Every call is bounded by `timeout`. The simulation must run on a thread
/// outside the async executor (for example under `spawn_blocking`), since
/// `advise` blocks on the runtime handle.
pub struct BlockingAdvisor {
    handle: Handle,
    service: Arc<dyn ParentService>,
    timeout: Duration,
    name: String,
}

impl BlockingAdvisor {
    #[must_use]
    pub fn new(handle: Handle, service: Arc<dyn ParentService>, timeout: Duration) -> Self {
        let name = format!("blocking:{}", service.name());
        Self {
            handle,
            service,
            timeout,
            name,
        }
    }
}

impl Advisor for BlockingAdvisor {
    fn advise(&mut self, request: &AdvisoryRequest) -> Result<String, AdvisoryError> {
        let service = Arc::clone(&self.service);
        let timeout = self.timeout;
        self.handle.block_on(async move {
            match tokio::time::timeout(timeout, service.ask(request)).await {
                Ok(answer) => answer,
                Err(_) => Err(AdvisoryError::Timeout(timeout.as_millis() as u64)),
            }
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
