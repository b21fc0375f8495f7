//! Test doubles for the Telegram transport and the polling session
//!
//! Both record what the code under test asked of them so flows can be
//! asserted call by call without network access.

#![allow(dead_code)]

pub mod mock_session;
pub mod mock_transport;

pub use mock_session::{RecordingPause, ScriptedSession, Step};
pub use mock_transport::{Call, RecordingTransport};
