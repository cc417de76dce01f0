//! Contains definitions from `lualib.h`.

use std::os::raw::{c_char, c_int};

use super::lua::lua_State;

pub const LUA_LOADLIBNAME: *const c_char = cstr!("package");
pub const LUA_COLIBNAME: *const c_char = cstr!("coroutine");
pub const LUA_DBLIBNAME: *const c_char = cstr!("debug");
pub const LUA_IOLIBNAME: *const c_char = cstr!("io");
pub const LUA_MATHLIBNAME: *const c_char = cstr!("math");
pub const LUA_OSLIBNAME: *const c_char = cstr!("os");
pub const LUA_STRLIBNAME: *const c_char = cstr!("string");
pub const LUA_TABLIBNAME: *const c_char = cstr!("table");
pub const LUA_UTF8LIBNAME: *const c_char = cstr!("utf8");

unsafe extern "C-unwind" {
    pub fn luaopen_base(L: *mut lua_State) -> c_int;
    pub fn luaopen_package(L: *mut lua_State) -> c_int;
    pub fn luaopen_coroutine(L: *mut lua_State) -> c_int;
    pub fn luaopen_debug(L: *mut lua_State) -> c_int;
    pub fn luaopen_io(L: *mut lua_State) -> c_int;
    pub fn luaopen_math(L: *mut lua_State) -> c_int;
    pub fn luaopen_os(L: *mut lua_State) -> c_int;
    pub fn luaopen_string(L: *mut lua_State) -> c_int;
    pub fn luaopen_table(L: *mut lua_State) -> c_int;
    pub fn luaopen_utf8(L: *mut lua_State) -> c_int;

    // open selected libraries, every bit of `load` set opens everything
    pub fn luaL_openselectedlibs(L: *mut lua_State, load: c_int, preload: c_int);
}

#[inline(always)]
pub unsafe fn luaL_openlibs(L: *mut lua_State) {
    luaL_openselectedlibs(L, !0, 0);
}
