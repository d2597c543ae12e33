//! Supportline: a WhatsApp support backend bridging the Twilio webhook/API
//! with a persisted conversation log, behind a small REST surface.

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Messaging provider client (Twilio).
pub mod provider;
/// HTTP server and API routes.
pub mod server;
/// Entry helpers to start the server.
pub mod start_supportline;
/// Conversation log domain: records, storage, manager, recorder.
pub mod support;
