//! Contains definitions from `lualib.h` (the auxiliary part).

use std::os::raw::{c_char, c_int};

use super::lua::{lua_CFunction, lua_State};

#[repr(C)]
pub struct luaL_Reg {
    pub name: *const c_char,
    pub func: Option<lua_CFunction>,
}

unsafe extern "C-unwind" {
    pub fn luaL_newstate() -> *mut lua_State;

    // Luau raises and never returns, the Lua 5.1 signature is kept so that
    // `return luaL_error(L, ...)` type-checks in C functions.
    #[link_name = "luaL_errorL"]
    pub fn luaL_error(L: *mut lua_State, fmt: *const c_char, ...) -> c_int;
}
