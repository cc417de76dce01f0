//! Low level bindings to Luau.

pub use lauxlib::*;
pub use lua::*;
pub use luacode::*;
pub use lualib::*;

pub mod lauxlib;
pub mod lua;
pub mod luacode;
pub mod lualib;
