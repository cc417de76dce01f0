//! Lua 5.1 core API over Luau.
//!
//! Luau is itself a Lua 5.1 descendant, so most functions only translate indices, type tags
//! and status codes.

use std::os::raw::{c_char, c_int, c_void};
use std::ptr;

use crate::index::Slot;
use crate::lua::*;
use crate::state;

pub use self::debug::{
    lua_atpanic, lua_gethook, lua_gethookcount, lua_gethookmask, lua_getinfo, lua_getlocal, lua_getstack,
    lua_getupvalue, lua_sethook, lua_setlocal, lua_setupvalue,
};
pub use self::load::{lua_dump, lua_load, luaL_loadbuffer};

mod debug;
mod io;
mod load;
mod package;

/// Translates a Lua 5.1 index into the Luau index addressing the same slot.
#[inline]
pub(crate) fn index(idx: c_int) -> c_int {
    match Slot::classify(idx) {
        Slot::Stack(i) => i,
        Slot::Registry => ffi::LUA_REGISTRYINDEX,
        Slot::Environ => ffi::LUA_ENVIRONINDEX,
        Slot::Globals => ffi::LUA_GLOBALSINDEX,
        Slot::Upvalue(n) => ffi::lua_upvalueindex(n),
    }
}

/// Maps a Luau type tag to the Lua 5.1 one.
///
/// Vectors and buffers have no 5.1 counterpart and are reported as full userdata.
pub(crate) fn type_tag(tt: c_int) -> c_int {
    match tt {
        ffi::LUA_TNIL => LUA_TNIL,
        ffi::LUA_TBOOLEAN => LUA_TBOOLEAN,
        ffi::LUA_TLIGHTUSERDATA => LUA_TLIGHTUSERDATA,
        ffi::LUA_TNUMBER => LUA_TNUMBER,
        ffi::LUA_TSTRING => LUA_TSTRING,
        ffi::LUA_TTABLE => LUA_TTABLE,
        ffi::LUA_TFUNCTION => LUA_TFUNCTION,
        ffi::LUA_TUSERDATA | ffi::LUA_TVECTOR | ffi::LUA_TBUFFER => LUA_TUSERDATA,
        ffi::LUA_TTHREAD => LUA_TTHREAD,
        _ => LUA_TNONE,
    }
}

/// Maps a Luau status code to the Lua 5.1 one.
pub(crate) fn status(code: c_int) -> c_int {
    match code {
        ffi::LUA_BREAK => LUA_YIELD,
        code => code,
    }
}

//
// State manipulation
//

pub unsafe fn lua_newstate(f: lua_Alloc, ud: *mut c_void) -> *mut lua_State {
    ffi::lua_newstate(f, ud)
}

pub unsafe fn lua_close(L: *mut lua_State) {
    let main = ffi::lua_mainthread(L);
    state::forget(main);
    ffi::lua_close(main);
}

pub unsafe fn lua_newthread(L: *mut lua_State) -> *mut lua_State {
    ffi::lua_newthread(L)
}

//
// Basic stack manipulation
//

pub unsafe fn lua_gettop(L: *mut lua_State) -> c_int {
    ffi::lua_gettop(L)
}

pub unsafe fn lua_settop(L: *mut lua_State, idx: c_int) {
    ffi::lua_settop(L, idx)
}

pub unsafe fn lua_pushvalue(L: *mut lua_State, idx: c_int) {
    ffi::lua_pushvalue(L, index(idx))
}

pub unsafe fn lua_remove(L: *mut lua_State, idx: c_int) {
    ffi::lua_remove(L, index(idx))
}

pub unsafe fn lua_insert(L: *mut lua_State, idx: c_int) {
    ffi::lua_insert(L, index(idx))
}

pub unsafe fn lua_replace(L: *mut lua_State, idx: c_int) {
    ffi::lua_replace(L, index(idx))
}

pub unsafe fn lua_checkstack(L: *mut lua_State, sz: c_int) -> c_int {
    ffi::lua_checkstack(L, sz)
}

pub unsafe fn lua_xmove(from: *mut lua_State, to: *mut lua_State, n: c_int) {
    ffi::lua_xmove(from, to, n)
}

//
// Access functions (stack -> C)
//

pub unsafe fn lua_isnumber(L: *mut lua_State, idx: c_int) -> c_int {
    ffi::lua_isnumber(L, index(idx))
}

pub unsafe fn lua_isstring(L: *mut lua_State, idx: c_int) -> c_int {
    ffi::lua_isstring(L, index(idx))
}

pub unsafe fn lua_iscfunction(L: *mut lua_State, idx: c_int) -> c_int {
    ffi::lua_iscfunction(L, index(idx))
}

pub unsafe fn lua_isuserdata(L: *mut lua_State, idx: c_int) -> c_int {
    ffi::lua_isuserdata(L, index(idx))
}

pub unsafe fn lua_type(L: *mut lua_State, idx: c_int) -> c_int {
    type_tag(ffi::lua_type(L, index(idx)))
}

pub unsafe fn lua_equal(L: *mut lua_State, idx1: c_int, idx2: c_int) -> c_int {
    ffi::lua_equal(L, index(idx1), index(idx2))
}

pub unsafe fn lua_rawequal(L: *mut lua_State, idx1: c_int, idx2: c_int) -> c_int {
    ffi::lua_rawequal(L, index(idx1), index(idx2))
}

pub unsafe fn lua_lessthan(L: *mut lua_State, idx1: c_int, idx2: c_int) -> c_int {
    ffi::lua_lessthan(L, index(idx1), index(idx2))
}

pub unsafe fn lua_tonumber(L: *mut lua_State, idx: c_int) -> lua_Number {
    ffi::lua_tonumber(L, index(idx))
}

pub unsafe fn lua_tointeger(L: *mut lua_State, idx: c_int) -> lua_Integer {
    // `as` truncates towards zero and saturates, non-numbers read as 0
    ffi::lua_tonumber(L, index(idx)) as lua_Integer
}

pub unsafe fn lua_toboolean(L: *mut lua_State, idx: c_int) -> c_int {
    ffi::lua_toboolean(L, index(idx))
}

pub unsafe fn lua_tolstring(L: *mut lua_State, idx: c_int, len: *mut usize) -> *const c_char {
    ffi::lua_tolstring(L, index(idx), len)
}

pub(crate) unsafe fn rawlen(L: *mut lua_State, idx: c_int) -> usize {
    ffi::lua_objlen(L, index(idx))
}

pub unsafe fn lua_tocfunction(L: *mut lua_State, idx: c_int) -> Option<lua_CFunction> {
    ffi::lua_tocfunction(L, index(idx))
}

pub unsafe fn lua_touserdata(L: *mut lua_State, idx: c_int) -> *mut c_void {
    ffi::lua_touserdata(L, index(idx))
}

pub unsafe fn lua_tothread(L: *mut lua_State, idx: c_int) -> *mut lua_State {
    ffi::lua_tothread(L, index(idx))
}

pub unsafe fn lua_topointer(L: *mut lua_State, idx: c_int) -> *const c_void {
    ffi::lua_topointer(L, index(idx))
}

//
// Push functions (C -> stack)
//

pub unsafe fn lua_pushnil(L: *mut lua_State) {
    ffi::lua_pushnil(L)
}

pub unsafe fn lua_pushnumber(L: *mut lua_State, n: lua_Number) {
    ffi::lua_pushnumber(L, n)
}

pub unsafe fn lua_pushinteger(L: *mut lua_State, n: lua_Integer) {
    // Luau integers are `int`, numbers keep the full value
    ffi::lua_pushnumber(L, n as lua_Number)
}

pub unsafe fn lua_pushlstring(L: *mut lua_State, s: *const c_char, len: usize) {
    if len == 0 {
        ffi::lua_pushlstring(L, cstr!(""), 0)
    } else {
        ffi::lua_pushlstring(L, s, len)
    }
}

pub unsafe fn lua_pushstring(L: *mut lua_State, s: *const c_char) {
    if s.is_null() {
        ffi::lua_pushnil(L)
    } else {
        ffi::lua_pushstring(L, s)
    }
}

pub unsafe fn lua_pushcclosure(L: *mut lua_State, f: lua_CFunction, n: c_int) {
    ffi::lua_pushcclosurek(L, f, ptr::null(), n, None)
}

pub unsafe fn lua_pushboolean(L: *mut lua_State, b: c_int) {
    ffi::lua_pushboolean(L, b)
}

pub unsafe fn lua_pushlightuserdata(L: *mut lua_State, p: *mut c_void) {
    ffi::lua_pushlightuserdata(L, p)
}

pub unsafe fn lua_pushthread(L: *mut lua_State) -> c_int {
    ffi::lua_pushthread(L)
}

//
// Get functions (Lua -> stack)
//

pub unsafe fn lua_gettable(L: *mut lua_State, idx: c_int) {
    ffi::lua_gettable(L, index(idx));
}

pub unsafe fn lua_getfield(L: *mut lua_State, idx: c_int, k: *const c_char) {
    ffi::lua_getfield(L, index(idx), k);
}

pub unsafe fn lua_rawget(L: *mut lua_State, idx: c_int) {
    ffi::lua_rawget(L, index(idx));
}

pub unsafe fn lua_rawgeti(L: *mut lua_State, idx: c_int, n: c_int) {
    ffi::lua_rawgeti(L, index(idx), n);
}

pub unsafe fn lua_createtable(L: *mut lua_State, narr: c_int, nrec: c_int) {
    ffi::lua_createtable(L, narr, nrec)
}

pub unsafe fn lua_newuserdata(L: *mut lua_State, sz: usize) -> *mut c_void {
    ffi::lua_newuserdata(L, sz)
}

pub unsafe fn lua_getmetatable(L: *mut lua_State, objindex: c_int) -> c_int {
    ffi::lua_getmetatable(L, index(objindex))
}

pub unsafe fn lua_getfenv(L: *mut lua_State, idx: c_int) {
    ffi::lua_getfenv(L, index(idx))
}

//
// Set functions (stack -> Lua)
//

pub unsafe fn lua_settable(L: *mut lua_State, idx: c_int) {
    ffi::lua_settable(L, index(idx))
}

pub unsafe fn lua_setfield(L: *mut lua_State, idx: c_int, k: *const c_char) {
    ffi::lua_setfield(L, index(idx), k)
}

pub unsafe fn lua_rawset(L: *mut lua_State, idx: c_int) {
    ffi::lua_rawset(L, index(idx))
}

pub unsafe fn lua_rawseti(L: *mut lua_State, idx: c_int, n: c_int) {
    ffi::lua_rawseti(L, index(idx), n)
}

pub unsafe fn lua_setmetatable(L: *mut lua_State, objindex: c_int) -> c_int {
    ffi::lua_setmetatable(L, index(objindex))
}

pub unsafe fn lua_setfenv(L: *mut lua_State, idx: c_int) -> c_int {
    ffi::lua_setfenv(L, index(idx))
}

//
// `load' and `call' functions
//

pub unsafe fn lua_call(L: *mut lua_State, nargs: c_int, nresults: c_int) {
    ffi::lua_call(L, nargs, nresults)
}

pub unsafe fn lua_pcall(L: *mut lua_State, nargs: c_int, nresults: c_int, errfunc: c_int) -> c_int {
    status(ffi::lua_pcall(L, nargs, nresults, index(errfunc)))
}

//
// Coroutine functions
//

pub unsafe fn lua_yield(L: *mut lua_State, nresults: c_int) -> c_int {
    ffi::lua_yield(L, nresults)
}

pub unsafe fn lua_resume(L: *mut lua_State, narg: c_int) -> c_int {
    status(ffi::lua_resume(L, ptr::null_mut(), narg))
}

pub unsafe fn lua_status(L: *mut lua_State) -> c_int {
    status(ffi::lua_status(L))
}

//
// Garbage-collection function
//

/// Controls the garbage collector with the Lua 5.1 commands.
///
/// `LUA_GCSETPAUSE` maps to Luau's collection goal, which takes a percentage as well.
/// Unknown commands return -1.
pub unsafe fn lua_gc(L: *mut lua_State, what: c_int, data: c_int) -> c_int {
    let what = match what {
        LUA_GCSTOP => ffi::LUA_GCSTOP,
        LUA_GCRESTART => ffi::LUA_GCRESTART,
        LUA_GCCOLLECT => ffi::LUA_GCCOLLECT,
        LUA_GCCOUNT => ffi::LUA_GCCOUNT,
        LUA_GCCOUNTB => ffi::LUA_GCCOUNTB,
        LUA_GCSTEP => ffi::LUA_GCSTEP,
        LUA_GCSETPAUSE => ffi::LUA_GCSETGOAL,
        LUA_GCSETSTEPMUL => ffi::LUA_GCSETSTEPMUL,
        _ => return -1,
    };
    ffi::lua_gc(L, what, data)
}

//
// Miscellaneous functions
//

/// Raises the value on top of the stack as an error. Never returns.
pub unsafe fn lua_error(L: *mut lua_State) -> c_int {
    ffi::lua_error(L)
}

pub unsafe fn lua_next(L: *mut lua_State, idx: c_int) -> c_int {
    ffi::lua_next(L, index(idx))
}

pub unsafe fn lua_concat(L: *mut lua_State, n: c_int) {
    ffi::lua_concat(L, n)
}

pub unsafe fn lua_getallocf(L: *mut lua_State, ud: *mut *mut c_void) -> lua_Alloc {
    ffi::lua_getallocf(L, ud)
}

/// Luau fixes the allocator at state creation, the call is ignored.
pub unsafe fn lua_setallocf(_L: *mut lua_State, _f: lua_Alloc, _ud: *mut c_void) {}

//
// Auxiliary library
//

pub unsafe fn luaL_newstate() -> *mut lua_State {
    ffi::luaL_newstate()
}

//
// Standard libraries
//

pub(crate) use self::io::luaopen_io as open_io;
pub(crate) use self::package::luaopen_package as open_package;
pub(crate) use ffi::{
    luaL_openlibs as openlibs, luaopen_base as open_base, luaopen_debug as open_debug,
    luaopen_math as open_math, luaopen_os as open_os, luaopen_string as open_string,
    luaopen_table as open_table,
};
