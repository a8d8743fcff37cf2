//! Chat proxy
//!
//! Persona chat over a generative-language backend:
//! - Context assembly (preamble, seed exclusion, sliding window)
//! - Backend clients (Gemini, mock)
//! - The request-level service used by the gateway

mod client;
mod context;
mod service;

pub use client::{
    create_backend, GeminiClient, GenerativeBackend, MockGenerativeBackend, GENERATIVE_SERVICE,
};
pub use context::{
    assemble_context, persona_preamble, BackendMessage, BackendRole, ChatContext, ChatRole,
    ChatTurn, CANNED_GREETING, DEFAULT_HISTORY_WINDOW, SYSTEM_INSTRUCTION, UI_SEED_GREETING,
};
pub use service::ChatService;
