//! Model invocation: the seam between the debate engine and inference.
//!
//! The engine only knows [`ModelInvoker`]: one async call per turn that
//! either returns generated text or fails. Transport, authentication and
//! retry policy live behind it.

pub mod openai_compat;
pub mod retry;

use async_trait::async_trait;

use crate::debate::context::ContextEntry;
use crate::error::InvocationFailure;

pub use openai_compat::{ChatMessage, OpenAiCompatClient, ProviderConfig};
pub use retry::{RetryPolicy, RetryingInvoker};

/// Generates text for a model given an ordered context.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// Invoke `model_id` once with `context`.
    async fn invoke(
        &self,
        model_id: &str,
        context: &[ContextEntry],
    ) -> Result<String, InvocationFailure>;
}

#[async_trait]
impl<T: ModelInvoker + ?Sized> ModelInvoker for std::sync::Arc<T> {
    async fn invoke(
        &self,
        model_id: &str,
        context: &[ContextEntry],
    ) -> Result<String, InvocationFailure> {
        (**self).invoke(model_id, context).await
    }
}
