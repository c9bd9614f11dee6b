// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebAssembly script plugin runtime for Tunebot.
//!
//! A plugin is a directory of `.wasm`/`.wat` modules under the configured
//! script directory. The runtime instantiates each package in its own
//! wasmtime store, reads the platforms it declares, and registers one
//! [`ScriptedPlatform`] per declaration in the shared
//! [`tunebot_platform::PlatformRegistry`].

pub mod descriptor;
pub mod loader;
pub mod runtime;
pub mod sandbox;
pub mod scripted;

pub use descriptor::{HOST_VERSION, PlatformDeclaration, PluginDescriptor, parse_descriptor};
pub use loader::{LoadedPlugin, discover_files, load_plugin};
pub use runtime::{PluginRuntime, PluginState, RuntimeSettings, ScriptedPlatformState};
pub use sandbox::{HOST_MODULE, PluginSandbox, SandboxLimits, capability_export};
pub use scripted::ScriptedPlatform;
