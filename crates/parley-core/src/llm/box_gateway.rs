//! BoxCompletionGateway -- object-safe dynamic dispatch wrapper for CompletionGateway.
//!
//! 1. Define an object-safe `CompletionGatewayDyn` trait with boxed futures
//! 2. Blanket-impl `CompletionGatewayDyn` for all `T: CompletionGateway`
//! 3. `BoxCompletionGateway` wraps `Box<dyn CompletionGatewayDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use parley_types::error::GatewayError;
use parley_types::llm::{CompletionRequest, CompletionResponse};

use super::gateway::CompletionGateway;

/// Object-safe version of [`CompletionGateway`] with boxed futures.
pub trait CompletionGatewayDyn: Send + Sync {
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    fn complete_boxed<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, GatewayError>> + Send + 'a>>;
}

impl<T: CompletionGateway> CompletionGatewayDyn for T {
    fn name(&self) -> &str {
        CompletionGateway::name(self)
    }

    fn model(&self) -> &str {
        CompletionGateway::model(self)
    }

    fn complete_boxed<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, GatewayError>> + Send + 'a>> {
        Box::pin(self.complete(request))
    }
}

/// Type-erased completion gateway.
///
/// Since `CompletionGateway` uses RPITIT, it cannot be used as a trait
/// object directly. `BoxCompletionGateway` provides equivalent methods that
/// delegate to the inner `CompletionGatewayDyn` trait object.
pub struct BoxCompletionGateway {
    inner: Box<dyn CompletionGatewayDyn + Send + Sync>,
}

impl BoxCompletionGateway {
    /// Wrap a concrete `CompletionGateway` in a type-erased box.
    pub fn new<T: CompletionGateway + 'static>(gateway: T) -> Self {
        Self {
            inner: Box::new(gateway),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn model(&self) -> &str {
        self.inner.model()
    }

    /// Send a prompt and receive the generated reply.
    pub async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, GatewayError> {
        self.inner.complete_boxed(request).await
    }
}
