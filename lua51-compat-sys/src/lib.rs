//! Low level bindings to the Luau and Lua 5.5 virtual machines.
//!
//! Only the declarations needed to emulate the Lua 5.1 API on top of each backend are present.
//! Exactly one of the `luau` and `lua55` features selects the backend that is linked in.

#![allow(non_camel_case_types, non_snake_case)]
#![allow(clippy::missing_safety_doc)]
#![allow(unsafe_op_in_unsafe_fn)]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "lua55")]
pub use lua55::*;

#[cfg(feature = "luau")]
pub use luau::*;

#[macro_use]
mod macros;

#[cfg(any(feature = "lua55", doc))]
#[cfg_attr(docsrs, doc(cfg(feature = "lua55")))]
pub mod lua55;

#[cfg(any(feature = "luau", doc))]
#[cfg_attr(docsrs, doc(cfg(feature = "luau")))]
pub mod luau;
