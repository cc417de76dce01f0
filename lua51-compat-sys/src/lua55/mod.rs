//! Low level bindings to Lua 5.5.

pub use lauxlib::*;
pub use lua::*;
pub use lualib::*;

pub mod lauxlib;
pub mod lua;
pub mod lualib;
