// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform registry, input matching, and built-in platform catalog.
//!
//! Every provider, built-in or scripted, is registered as a
//! [`PlatformHandle`] in the [`PlatformRegistry`]. Inbound text is resolved
//! through the registry: alias lookup, then URL and text matchers in
//! registration order.

pub mod builtin;
pub mod extract;
pub mod handle;
pub mod lyrics;
pub mod policy;
pub mod quality;
pub mod registry;
pub mod resolve;

pub use builtin::{BUILTIN_NAMES, is_builtin_name, register_builtins};
pub use extract::{command_arguments, extract_first_url, extract_quality_override};
pub use handle::{HandleState, Origin, PlatformHandle, Registration};
pub use lyrics::normalize_lrc_timestamps;
pub use policy::auto_link_detect_enabled;
pub use quality::Quality;
pub use registry::{PlatformRegistry, normalize};
pub use resolve::{
    Resolution, ResolutionSource, resolve_message, resolve_track, route_recognition,
};
