//! # Lua 5.1 C API on top of Luau or Lua 5.5
//!
//! The `lua51-compat` crate exposes the Lua 5.1 C API (`lua.h`, `lauxlib.h` and `lualib.h`) as a
//! set of `unsafe` Rust functions, so code written against Lua 5.1 keeps working when linked with
//! a different virtual machine.
//!
//! # Backends
//!
//! Exactly one backend is selected at build time:
//!
//! * `luau` (default): the Roblox Luau VM, always built from source.
//! * `lua55`: upstream Lua 5.5, built from source with `vendored` or located with `pkg-config`.
//!
//! # What gets translated
//!
//! Pseudo-indices ([`LUA_REGISTRYINDEX`], [`LUA_ENVIRONINDEX`], [`LUA_GLOBALSINDEX`] and
//! [`lua_upvalueindex`]), type tags, status codes and garbage collector commands use the
//! Lua 5.1 numbering. Debug records are reported in the Lua 5.1 [`lua_Debug`] layout and hooks
//! receive 5.1 events. Functionality a backend dropped is emulated where it matters for 5.1
//! clients: the reference system, string buffers, `luaL_loadfile`, and the `io`/`package`
//! libraries on Luau.
//!
//! Everything in this crate is a thin layer over raw FFI. The usual Lua C API rules apply: stack
//! indices must be valid, Lua errors unwind through the caller with the backend's native error
//! mechanism, and a `lua_State` must not be shared between threads.

// Deny warnings inside doc tests / examples. When this isn't present, rustdoc doesn't show *any*
// warnings at all.
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(non_camel_case_types, non_snake_case)]
#![allow(clippy::missing_safety_doc)]

#[cfg(not(any(feature = "luau", feature = "lua55")))]
compile_error!("one of the `luau` or `lua55` features must be enabled");

#[cfg(all(feature = "luau", feature = "lua55"))]
compile_error!("the `luau` and `lua55` features are mutually exclusive");

#[macro_use]
mod macros;

mod buffer;
mod error;
mod index;
mod lauxlib;
mod lua;
mod lualib;
mod state;

#[cfg(feature = "luau")]
mod luau;
#[cfg(feature = "luau")]
use luau as backend;

#[cfg(feature = "lua55")]
mod lua55;
#[cfg(feature = "lua55")]
use lua55 as backend;

pub use crate::buffer::*;
pub use crate::error::Status;
pub use crate::lauxlib::*;
pub use crate::lua::*;
pub use crate::lualib::*;

/// Raw bindings of the selected backend.
///
/// Mixing these with the Lua 5.1 functions on the same state is allowed, but indices, type tags
/// and status codes then follow the backend's own numbering.
pub use ffi as sys;
