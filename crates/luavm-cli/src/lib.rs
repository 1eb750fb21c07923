//! # luavm-cli
//!
//! Interactive front-end for luavm: a menu for creating Lua VMs, attaching
//! to their consoles, installing LuaRocks packages and managing the saved
//! configuration.
//!
//! ## Environment
//!
//! | Variable | Default | Purpose |
//! |----------|---------|---------|
//! | `LUAVM_CONFIG` | `luavm_config.json` | Saved credentials and VM defaults |
//! | `LUAVM_LUA` | `lua` | Interpreter for basic VMs |
//! | `LUAVM_LUAROCKS` | `luarocks` | Package manager |
//! | `LUAVM_OUTPUT_TIMEOUT_MS` | `2000` | Wait for a VM's answer |
//! | `RUST_LOG` | `luavm=warn` | Log filter (logs go to stderr) |

pub mod config;
pub mod console;
pub mod menu;

pub use config::{AppConfig, ConfigError, ConfigStore, Settings};
pub use console::ConsoleLines;
pub use menu::{App, MenuAction};
