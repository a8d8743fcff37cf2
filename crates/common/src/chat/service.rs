use super::client::GenerativeBackend;
use super::context::{assemble_context, ChatTurn};
use crate::errors::{AppError, Result};
use crate::metrics;
use std::sync::Arc;

/// Chat proxy: assembles context and forwards it to the generative backend.
///
/// The backend is absent when no credential is configured; every request
/// then fails with a configuration error before touching the network.
pub struct ChatService {
    backend: Option<Arc<dyn GenerativeBackend>>,
    history_window: usize,
}

impl ChatService {
    pub fn new(backend: Option<Arc<dyn GenerativeBackend>>, history_window: usize) -> Self {
        Self {
            backend,
            history_window,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    fn backend(&self) -> Result<&Arc<dyn GenerativeBackend>> {
        self.backend.as_ref().ok_or_else(|| AppError::Configuration {
            message: "API Key is missing".to_string(),
        })
    }

    /// Send one user message with its client history; returns the reply text.
    pub async fn send(&self, message: &str, history: &[ChatTurn]) -> Result<String> {
        let backend = self.backend()?;

        if message.trim().is_empty() {
            return Err(AppError::validation("message", "Message must not be empty"));
        }

        let context = assemble_context(message, history, self.history_window);

        tracing::info!(
            model = backend.model_name(),
            client_turns = history.len(),
            forwarded_turns = context.history.len(),
            "Forwarding chat message"
        );

        let result = backend.generate(&context).await;
        metrics::record_chat(result.is_ok());
        result
    }

    /// Upstream model catalog, passed through unmodified
    pub async fn model_catalog(&self) -> Result<serde_json::Value> {
        self.backend()?.list_models().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::client::MockGenerativeBackend;
    use crate::chat::context::CANNED_GREETING;
    use tokio_test::assert_err;

    #[tokio::test]
    async fn test_missing_backend_is_configuration_error() {
        let service = ChatService::new(None, 10);
        let err = service.send("hello", &[]).await.unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
        assert!(err.to_string().contains("API Key is missing"));

        assert_err!(service.model_catalog().await);
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected_before_call() {
        let mock = Arc::new(MockGenerativeBackend::new("reply"));
        let service = ChatService::new(Some(mock.clone()), 10);

        let err = service.send("   ", &[]).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_send_forwards_windowed_context() {
        let mock = Arc::new(MockGenerativeBackend::new("Seva is selfless service."));
        let service = ChatService::new(Some(mock.clone()), 10);

        let mut history = vec![ChatTurn::assistant(CANNED_GREETING)];
        for i in 0..15 {
            history.push(ChatTurn::user(format!("q{}", i)));
            history.push(ChatTurn::assistant(format!("a{}", i)));
        }

        let reply = service.send("What is seva?", &history).await.unwrap();
        assert_eq!(reply, "Seva is selfless service.");

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].history.len(), 12);
        assert_eq!(calls[0].message, "What is seva?");
        assert_eq!(calls[0].history[2].text, "q10");
    }
}
