// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebAssembly plugin sandbox using wasmtime.
//!
//! Each plugin load gets its own [`Store`] and [`Linker`]: modules of one
//! package are instantiated in file order and registered under their file
//! stem, so later files can import earlier ones. Nothing is shared between
//! packages except the [`Engine`].
//!
//! Every entry point is `() -> i32`. Input and the target platform name are
//! pulled by the guest through host functions; the result is pushed back with
//! `set_output`. A zero return is success; anything else is an error whose
//! message is the output buffer.
//!
//! Host module `"tunebot"`:
//!
//! | import | signature |
//! |--------|-----------|
//! | `log` | `(level, ptr, len)` |
//! | `input_len` | `() -> i32` |
//! | `read_input` | `(ptr)` |
//! | `platform_len` | `() -> i32` |
//! | `read_platform` | `(ptr)` |
//! | `set_output` | `(ptr, len)` |

use std::path::{Path, PathBuf};

use anyhow::anyhow;
use tracing::{debug, error, info, trace, warn};
use tunebot_core::{Capability, TunebotError};
use wasmtime::{
    Caller, Config, Engine, Extern, Instance, Linker, Memory, Module, Store, StoreLimits,
    StoreLimitsBuilder,
};

/// Name of the host import module.
pub const HOST_MODULE: &str = "tunebot";

/// Largest output a single call may produce.
pub const MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Exports every plugin must provide.
const REQUIRED_EXPORTS: &[&str] = &["memory", "init", "meta"];

/// Per-call resource limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SandboxLimits {
    pub fuel_per_call: u64,
    pub memory_limit_bytes: usize,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            fuel_per_call: 10_000_000,
            memory_limit_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Returns the export implementing `capability`.
pub fn capability_export(capability: Capability) -> &'static str {
    match capability {
        Capability::MatchText => "match_text",
        Capability::MatchUrl => "match_url",
        Capability::Search => "search",
        Capability::FetchLyrics => "lyrics",
        Capability::FetchTrack => "track",
        Capability::ProvidesTags => "tags",
    }
}

/// Builds the engine shared by all plugin stores.
pub fn new_engine() -> Result<Engine, TunebotError> {
    let mut config = Config::new();
    config.consume_fuel(true);
    Engine::new(&config).map_err(|e| TunebotError::Internal(format!(
        "failed to create wasmtime engine: {e:#}"
    )))
}

/// State stored in a plugin's wasmtime Store.
struct HostState {
    plugin: String,
    input: Vec<u8>,
    platform: String,
    output: Vec<u8>,
    limits: StoreLimits,
}

/// One instantiated plugin package.
pub struct PluginSandbox {
    plugin: String,
    store: Store<HostState>,
    /// Instances in file order, with their file stems.
    instances: Vec<(String, Instance)>,
    fuel_per_call: u64,
}

impl PluginSandbox {
    /// Compiles and instantiates `files` in order in a fresh store.
    pub fn load(
        engine: &Engine,
        plugin: &str,
        files: &[PathBuf],
        limits: SandboxLimits,
    ) -> Result<Self, TunebotError> {
        let state = HostState {
            plugin: plugin.to_string(),
            input: Vec::new(),
            platform: String::new(),
            output: Vec::new(),
            limits: StoreLimitsBuilder::new()
                .memory_size(limits.memory_limit_bytes)
                .build(),
        };
        let mut store = Store::new(engine, state);
        store.limiter(|s| &mut s.limits);
        // Start functions run during instantiation and need fuel too.
        store
            .set_fuel(limits.fuel_per_call)
            .map_err(|e| eval_err(plugin, format!("failed to set fuel: {e:#}")))?;

        let mut linker = Linker::new(engine);
        define_host_functions(&mut linker).map_err(|e| eval_err(plugin, e))?;

        let mut instances = Vec::with_capacity(files.len());
        for path in files {
            let stem = module_stem(path)
                .ok_or_else(|| eval_err(plugin, format!("bad file name {}", path.display())))?;
            let module = Module::from_file(engine, path).map_err(|e| {
                eval_err(plugin, format!("failed to compile {}: {e:#}", path.display()))
            })?;
            let instance = linker.instantiate(&mut store, &module).map_err(|e| {
                eval_err(plugin, format!("failed to instantiate {}: {e:#}", path.display()))
            })?;
            linker.instance(&mut store, &stem, instance).map_err(|e| {
                eval_err(plugin, format!("failed to register module `{stem}`: {e:#}"))
            })?;
            debug!(plugin = %plugin, module = %stem, "plugin module instantiated");
            instances.push((stem, instance));
        }

        let mut sandbox = Self {
            plugin: plugin.to_string(),
            store,
            instances,
            fuel_per_call: limits.fuel_per_call,
        };
        for export in REQUIRED_EXPORTS {
            if !sandbox.has_export(export) {
                return Err(eval_err(plugin, format!("missing required export `{export}`")));
            }
        }
        Ok(sandbox)
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Returns true when any module of the package exports `name`.
    pub fn has_export(&mut self, name: &str) -> bool {
        self.find_export(name).is_some()
    }

    /// The last module in file order that exports `name` provides it.
    fn find_export(&mut self, name: &str) -> Option<Extern> {
        let store = &mut self.store;
        self.instances
            .iter()
            .rev()
            .find_map(|(_, instance)| instance.get_export(&mut *store, name))
    }

    /// Runs one entry point with `input` for `platform`.
    ///
    /// Returns the output buffer on success.
    pub fn call(&mut self, export: &str, platform: &str, input: &[u8]) -> Result<Vec<u8>, TunebotError> {
        let func = match self.find_export(export) {
            Some(Extern::Func(func)) => func,
            _ => {
                return Err(eval_err(&self.plugin, format!("missing export `{export}`")));
            }
        };
        let func = func
            .typed::<(), i32>(&self.store)
            .map_err(|e| eval_err(&self.plugin, format!("export `{export}` has wrong signature: {e:#}")))?;

        {
            let state = self.store.data_mut();
            state.input = input.to_vec();
            state.platform = platform.to_string();
            state.output.clear();
        }
        self.store
            .set_fuel(self.fuel_per_call)
            .map_err(|e| eval_err(&self.plugin, format!("failed to set fuel: {e:#}")))?;

        let result = func.call(&mut self.store, ());
        let output = std::mem::take(&mut self.store.data_mut().output);
        self.store.data_mut().input.clear();

        match result {
            Ok(0) => Ok(output),
            Ok(status) => {
                let message = String::from_utf8_lossy(&output).trim().to_string();
                let message = if message.is_empty() {
                    format!("`{export}` returned status {status}")
                } else {
                    format!("`{export}` failed: {message}")
                };
                Err(eval_err(&self.plugin, message))
            }
            Err(e) => {
                let error_msg = format!("{e:#}");
                let message = if error_msg.contains("all fuel consumed") {
                    format!(
                        "`{export}` exceeded fuel limit ({} fuel units): {error_msg}",
                        self.fuel_per_call
                    )
                } else {
                    format!("`{export}` trapped: {error_msg}")
                };
                Err(eval_err(&self.plugin, message))
            }
        }
    }
}

fn module_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
}

fn eval_err(plugin: &str, message: impl Into<String>) -> TunebotError {
    TunebotError::evaluation(plugin, message)
}

/// Defines the host functions every plugin may import.
fn define_host_functions(linker: &mut Linker<HostState>) -> Result<(), String> {
    linker
        .func_wrap(
            HOST_MODULE,
            "log",
            |mut caller: Caller<'_, HostState>, level: i32, ptr: i32, len: i32| {
                let Some(memory) = exported_memory(&mut caller) else {
                    return;
                };
                let Some(bytes) = read_bytes(&memory, &caller, ptr, len) else {
                    return;
                };
                let msg = String::from_utf8_lossy(&bytes);
                let plugin = caller.data().plugin.as_str();
                match level {
                    0 => trace!(plugin = %plugin, "{msg}"),
                    1 => debug!(plugin = %plugin, "{msg}"),
                    3 => warn!(plugin = %plugin, "{msg}"),
                    4 => error!(plugin = %plugin, "{msg}"),
                    _ => info!(plugin = %plugin, "{msg}"),
                }
            },
        )
        .map_err(linker_err)?;

    linker
        .func_wrap(HOST_MODULE, "input_len", |caller: Caller<'_, HostState>| -> i32 {
            caller.data().input.len() as i32
        })
        .map_err(linker_err)?;

    linker
        .func_wrap(
            HOST_MODULE,
            "read_input",
            |mut caller: Caller<'_, HostState>, ptr: i32| -> Result<(), wasmtime::Error> {
                let input = caller.data().input.clone();
                copy_into_guest(&mut caller, ptr, &input, "read_input")
            },
        )
        .map_err(linker_err)?;

    linker
        .func_wrap(HOST_MODULE, "platform_len", |caller: Caller<'_, HostState>| -> i32 {
            caller.data().platform.len() as i32
        })
        .map_err(linker_err)?;

    linker
        .func_wrap(
            HOST_MODULE,
            "read_platform",
            |mut caller: Caller<'_, HostState>, ptr: i32| -> Result<(), wasmtime::Error> {
                let platform = caller.data().platform.clone();
                copy_into_guest(&mut caller, ptr, platform.as_bytes(), "read_platform")
            },
        )
        .map_err(linker_err)?;

    linker
        .func_wrap(
            HOST_MODULE,
            "set_output",
            |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| -> Result<(), wasmtime::Error> {
                if usize::try_from(len).map_or(true, |l| l > MAX_OUTPUT_BYTES) {
                    return Err(anyhow!("output length {len} exceeds {MAX_OUTPUT_BYTES} bytes").into());
                }
                let memory = exported_memory(&mut caller)
                    .ok_or_else(|| anyhow!("plugin module has no exported memory"))?;
                let bytes = read_bytes(&memory, &caller, ptr, len)
                    .ok_or_else(|| anyhow!("set_output range {ptr}+{len} is out of bounds"))?;
                caller.data_mut().output = bytes;
                Ok(())
            },
        )
        .map_err(linker_err)?;

    Ok(())
}

fn exported_memory(caller: &mut Caller<'_, HostState>) -> Option<Memory> {
    match caller.get_export("memory") {
        Some(Extern::Memory(mem)) => Some(mem),
        _ => None,
    }
}

/// Reads `len` bytes at `ptr`, or `None` when the range is out of bounds.
fn read_bytes(memory: &Memory, caller: &Caller<'_, HostState>, ptr: i32, len: i32) -> Option<Vec<u8>> {
    let start = usize::try_from(ptr).ok()?;
    let len = usize::try_from(len).ok()?;
    let end = start.checked_add(len)?;
    memory.data(caller).get(start..end).map(<[u8]>::to_vec)
}

fn copy_into_guest(
    caller: &mut Caller<'_, HostState>,
    ptr: i32,
    bytes: &[u8],
    what: &str,
) -> Result<(), wasmtime::Error> {
    let memory =
        exported_memory(caller).ok_or_else(|| anyhow!("plugin module has no exported memory"))?;
    let start = usize::try_from(ptr).map_err(|_| anyhow!("{what}: negative pointer {ptr}"))?;
    let target = start
        .checked_add(bytes.len())
        .and_then(|end| memory.data_mut(&mut *caller).get_mut(start..end))
        .ok_or_else(|| anyhow!("{what}: {} bytes at {ptr} is out of bounds", bytes.len()))?;
    target.copy_from_slice(bytes);
    Ok(())
}

fn linker_err(e: impl std::fmt::Display) -> String {
    format!("failed to define host function: {e}")
}
