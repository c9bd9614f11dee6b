// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Supervisor for the out-of-process audio recognition service.
//!
//! The service is a local HTTP server started on demand. It must answer
//! `GET /health` with 200 once ready and accept raw audio on
//! `POST /recognize`.

pub mod protocol;
pub mod settings;
pub mod supervisor;

pub use protocol::{decode_response, song_url};
pub use settings::RecognitionSettings;
pub use supervisor::{RecognitionSupervisor, SupervisorState};
