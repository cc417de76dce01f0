//! Lua 5.1 core API over Lua 5.5.
//!
//! Lua 5.5 has no pseudo-index for globals or function environments. Operations addressing
//! them fetch the globals table from the registry, run against its stack slot and drop it.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;

use crate::index::Slot;
use crate::lua::*;
use crate::state;

pub use self::debug::{
    lua_gethook, lua_gethookcount, lua_gethookmask, lua_getinfo, lua_getlocal, lua_getstack,
    lua_getupvalue, lua_sethook, lua_setlocal, lua_setupvalue,
};
pub use self::load::{lua_dump, lua_load, luaL_loadbuffer};

mod debug;
mod load;

#[inline]
unsafe fn push_globals(L: *mut lua_State) {
    ffi::lua_rawgeti(L, ffi::LUA_REGISTRYINDEX, ffi::LUA_RIDX_GLOBALS);
}

/// Runs `op` against the native index for `idx`.
///
/// `nops` is the number of operands on top of the stack `op` consumes. A globals table fetched
/// for the operation is placed beneath them and removed afterwards.
unsafe fn at<R>(L: *mut lua_State, idx: c_int, nops: c_int, op: impl FnOnce(c_int) -> R) -> R {
    match Slot::classify(idx) {
        Slot::Stack(i) => op(i),
        Slot::Registry => op(ffi::LUA_REGISTRYINDEX),
        Slot::Upvalue(n) => op(ffi::lua_upvalueindex(n)),
        Slot::Globals | Slot::Environ => {
            push_globals(L);
            if nops > 0 {
                ffi::lua_insert(L, -nops - 1);
            }
            let slot = ffi::lua_gettop(L) - nops;
            let res = op(slot);
            ffi::lua_remove(L, slot);
            res
        }
    }
}

/// Same as [`at`] for operations reading two values without consuming any.
unsafe fn at2<R>(L: *mut lua_State, idx1: c_int, idx2: c_int, op: impl FnOnce(c_int, c_int) -> R) -> R {
    let needs_globals = |idx| matches!(Slot::classify(idx), Slot::Globals | Slot::Environ);
    if !needs_globals(idx1) && !needs_globals(idx2) {
        return op(native(idx1), native(idx2));
    }
    let (idx1, idx2) = (abs_index(L, idx1), abs_index(L, idx2));
    push_globals(L);
    let slot = ffi::lua_gettop(L);
    let resolve = |idx| if needs_globals(idx) { slot } else { native(idx) };
    let res = op(resolve(idx1), resolve(idx2));
    ffi::lua_remove(L, slot);
    res
}

/// Translates indices that have a native counterpart.
fn native(idx: c_int) -> c_int {
    match Slot::classify(idx) {
        Slot::Stack(i) => i,
        Slot::Registry => ffi::LUA_REGISTRYINDEX,
        Slot::Upvalue(n) => ffi::lua_upvalueindex(n),
        Slot::Globals | Slot::Environ => ffi::LUA_REGISTRYINDEX,
    }
}

//
// State manipulation
//

pub unsafe fn lua_newstate(f: lua_Alloc, ud: *mut c_void) -> *mut lua_State {
    ffi::lua_newstate(f, ud, ffi::luaL_makeseed(ptr::null_mut()))
}

unsafe fn main_thread(L: *mut lua_State) -> *mut lua_State {
    ffi::lua_rawgeti(L, ffi::LUA_REGISTRYINDEX, ffi::LUA_RIDX_MAINTHREAD);
    let main = ffi::lua_tothread(L, -1);
    ffi::lua_pop(L, 1);
    main
}

pub unsafe fn lua_close(L: *mut lua_State) {
    let main = main_thread(L);
    state::forget(main);
    ffi::lua_close(main);
}

pub unsafe fn lua_newthread(L: *mut lua_State) -> *mut lua_State {
    let main = main_thread(L);
    let thread = ffi::lua_newthread(L);
    // Hooks are per thread, new threads inherit the creator's one
    if let Some(extra) = state::get(L) {
        state::update(thread, main, |e| {
            e.hook = extra.hook;
            e.mask = extra.mask;
            e.count = extra.count;
        });
    }
    thread
}

pub unsafe fn lua_atpanic(L: *mut lua_State, panicf: Option<lua_CFunction>) -> Option<lua_CFunction> {
    ffi::lua_atpanic(L, panicf)
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
    match Slot::classify(idx) {
        Slot::Globals | Slot::Environ => push_globals(L),
        _ => ffi::lua_pushvalue(L, native(idx)),
    }
}

pub unsafe fn lua_remove(L: *mut lua_State, idx: c_int) {
    ffi::lua_remove(L, idx)
}

pub unsafe fn lua_insert(L: *mut lua_State, idx: c_int) {
    ffi::lua_insert(L, idx)
}

pub unsafe fn lua_replace(L: *mut lua_State, idx: c_int) {
    match Slot::classify(idx) {
        Slot::Globals => {
            ffi::lua_rawseti(L, ffi::LUA_REGISTRYINDEX, ffi::LUA_RIDX_GLOBALS);
        }
        // A C function environment cannot be replaced
        Slot::Environ => ffi::lua_pop(L, 1),
        _ => ffi::lua_replace(L, native(idx)),
    }
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
    at(L, idx, 0, |i| ffi::lua_isnumber(L, i))
}

pub unsafe fn lua_isstring(L: *mut lua_State, idx: c_int) -> c_int {
    at(L, idx, 0, |i| ffi::lua_isstring(L, i))
}

pub unsafe fn lua_iscfunction(L: *mut lua_State, idx: c_int) -> c_int {
    at(L, idx, 0, |i| ffi::lua_iscfunction(L, i))
}

pub unsafe fn lua_isuserdata(L: *mut lua_State, idx: c_int) -> c_int {
    at(L, idx, 0, |i| ffi::lua_isuserdata(L, i))
}

pub unsafe fn lua_type(L: *mut lua_State, idx: c_int) -> c_int {
    match Slot::classify(idx) {
        Slot::Globals | Slot::Environ => LUA_TTABLE,
        _ => ffi::lua_type(L, native(idx)),
    }
}

pub unsafe fn lua_equal(L: *mut lua_State, idx1: c_int, idx2: c_int) -> c_int {
    at2(L, idx1, idx2, |i1, i2| ffi::lua_compare(L, i1, i2, ffi::LUA_OPEQ))
}

pub unsafe fn lua_rawequal(L: *mut lua_State, idx1: c_int, idx2: c_int) -> c_int {
    at2(L, idx1, idx2, |i1, i2| ffi::lua_rawequal(L, i1, i2))
}

pub unsafe fn lua_lessthan(L: *mut lua_State, idx1: c_int, idx2: c_int) -> c_int {
    at2(L, idx1, idx2, |i1, i2| ffi::lua_compare(L, i1, i2, ffi::LUA_OPLT))
}

pub unsafe fn lua_tonumber(L: *mut lua_State, idx: c_int) -> lua_Number {
    at(L, idx, 0, |i| ffi::lua_tonumber(L, i))
}

pub unsafe fn lua_tointeger(L: *mut lua_State, idx: c_int) -> lua_Integer {
    at(L, idx, 0, |i| {
        if ffi::lua_isinteger(L, i) != 0 {
            return ffi::lua_tointegerx(L, i, ptr::null_mut()) as lua_Integer;
        }
        // Floats and numeric strings truncate towards zero
        ffi::lua_tonumberx(L, i, ptr::null_mut()) as lua_Integer
    })
}

pub unsafe fn lua_toboolean(L: *mut lua_State, idx: c_int) -> c_int {
    at(L, idx, 0, |i| ffi::lua_toboolean(L, i))
}

pub unsafe fn lua_tolstring(L: *mut lua_State, idx: c_int, len: *mut usize) -> *const c_char {
    at(L, idx, 0, |i| ffi::lua_tolstring(L, i, len))
}

pub(crate) unsafe fn rawlen(L: *mut lua_State, idx: c_int) -> usize {
    at(L, idx, 0, |i| ffi::lua_rawlen(L, i) as usize)
}

pub unsafe fn lua_tocfunction(L: *mut lua_State, idx: c_int) -> Option<lua_CFunction> {
    at(L, idx, 0, |i| ffi::lua_tocfunction(L, i))
}

pub unsafe fn lua_touserdata(L: *mut lua_State, idx: c_int) -> *mut c_void {
    at(L, idx, 0, |i| ffi::lua_touserdata(L, i))
}

pub unsafe fn lua_tothread(L: *mut lua_State, idx: c_int) -> *mut lua_State {
    at(L, idx, 0, |i| ffi::lua_tothread(L, i))
}

pub unsafe fn lua_topointer(L: *mut lua_State, idx: c_int) -> *const c_void {
    at(L, idx, 0, |i| ffi::lua_topointer(L, i))
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
    ffi::lua_pushinteger(L, n as ffi::lua_Integer)
}

pub unsafe fn lua_pushlstring(L: *mut lua_State, s: *const c_char, len: usize) {
    ffi::lua_pushlstring(L, s, len);
}

pub unsafe fn lua_pushstring(L: *mut lua_State, s: *const c_char) {
    ffi::lua_pushstring(L, s);
}

pub unsafe fn lua_pushcclosure(L: *mut lua_State, f: lua_CFunction, n: c_int) {
    ffi::lua_pushcclosure(L, f, n)
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
    at(L, idx, 1, |i| ffi::lua_gettable(L, i));
}

pub unsafe fn lua_getfield(L: *mut lua_State, idx: c_int, k: *const c_char) {
    at(L, idx, 0, |i| ffi::lua_getfield(L, i, k));
}

pub unsafe fn lua_rawget(L: *mut lua_State, idx: c_int) {
    at(L, idx, 1, |i| ffi::lua_rawget(L, i));
}

pub unsafe fn lua_rawgeti(L: *mut lua_State, idx: c_int, n: c_int) {
    at(L, idx, 0, |i| ffi::lua_rawgeti(L, i, n as ffi::lua_Integer));
}

pub unsafe fn lua_createtable(L: *mut lua_State, narr: c_int, nrec: c_int) {
    ffi::lua_createtable(L, narr, nrec)
}

/// Allocates a full userdata with one user value that holds its environment.
pub unsafe fn lua_newuserdata(L: *mut lua_State, sz: usize) -> *mut c_void {
    ffi::lua_newuserdatauv(L, sz, 1)
}

pub unsafe fn lua_getmetatable(L: *mut lua_State, objindex: c_int) -> c_int {
    at(L, objindex, 0, |i| ffi::lua_getmetatable(L, i))
}

/// Returns the position of the `_ENV` upvalue of the Lua function at `idx`, if any.
unsafe fn env_upvalue(L: *mut lua_State, idx: c_int) -> Option<c_int> {
    let mut n = 1;
    loop {
        let name = ffi::lua_getupvalue(L, idx, n);
        if name.is_null() {
            return None;
        }
        ffi::lua_pop(L, 1);
        if CStr::from_ptr(name) == c"_ENV" {
            return Some(n);
        }
        n += 1;
    }
}

/// Pushes the environment of the value at `idx`.
///
/// Lua functions report their `_ENV` upvalue, userdata their first user value. C functions
/// and threads share the globals table, anything else has no environment.
pub unsafe fn lua_getfenv(L: *mut lua_State, idx: c_int) {
    let idx = native(abs_index(L, idx));
    match ffi::lua_type(L, idx) {
        ffi::LUA_TFUNCTION if ffi::lua_iscfunction(L, idx) == 0 => match env_upvalue(L, idx) {
            Some(n) => {
                ffi::lua_getupvalue(L, idx, n);
            }
            None => push_globals(L),
        },
        ffi::LUA_TFUNCTION | ffi::LUA_TTHREAD => push_globals(L),
        ffi::LUA_TUSERDATA => {
            ffi::lua_getiuservalue(L, idx, 1);
        }
        _ => ffi::lua_pushnil(L),
    }
}

//
// Set functions (stack -> Lua)
//

pub unsafe fn lua_settable(L: *mut lua_State, idx: c_int) {
    at(L, idx, 2, |i| ffi::lua_settable(L, i))
}

pub unsafe fn lua_setfield(L: *mut lua_State, idx: c_int, k: *const c_char) {
    at(L, idx, 1, |i| ffi::lua_setfield(L, i, k))
}

pub unsafe fn lua_rawset(L: *mut lua_State, idx: c_int) {
    at(L, idx, 2, |i| ffi::lua_rawset(L, i))
}

pub unsafe fn lua_rawseti(L: *mut lua_State, idx: c_int, n: c_int) {
    at(L, idx, 1, |i| ffi::lua_rawseti(L, i, n as ffi::lua_Integer))
}

pub unsafe fn lua_setmetatable(L: *mut lua_State, objindex: c_int) -> c_int {
    at(L, objindex, 1, |i| ffi::lua_setmetatable(L, i))
}

/// Pops a table and sets it as the environment of the value at `idx`.
///
/// Returns 0 when the value cannot hold an environment.
pub unsafe fn lua_setfenv(L: *mut lua_State, idx: c_int) -> c_int {
    let idx = native(abs_index(L, idx));
    match ffi::lua_type(L, idx) {
        ffi::LUA_TFUNCTION if ffi::lua_iscfunction(L, idx) == 0 => {
            if let Some(n) = env_upvalue(L, idx) {
                ffi::lua_setupvalue(L, idx, n);
                return 1;
            }
        }
        ffi::LUA_TUSERDATA => {
            if ffi::lua_setiuservalue(L, idx, 1) != 0 {
                return 1;
            }
            // `lua_setiuservalue` pops the value even on failure
            return 0;
        }
        _ => {}
    }
    ffi::lua_pop(L, 1);
    0
}

//
// `load' and `call' functions
//

pub unsafe fn lua_call(L: *mut lua_State, nargs: c_int, nresults: c_int) {
    ffi::lua_call(L, nargs, nresults)
}

pub unsafe fn lua_pcall(L: *mut lua_State, nargs: c_int, nresults: c_int, errfunc: c_int) -> c_int {
    ffi::lua_pcall(L, nargs, nresults, errfunc)
}

//
// Coroutine functions
//

pub unsafe fn lua_yield(L: *mut lua_State, nresults: c_int) -> c_int {
    ffi::lua_yield(L, nresults)
}

pub unsafe fn lua_resume(L: *mut lua_State, narg: c_int) -> c_int {
    let mut nres = 0;
    ffi::lua_resume(L, ptr::null_mut(), narg, &mut nres)
}

pub unsafe fn lua_status(L: *mut lua_State) -> c_int {
    ffi::lua_status(L)
}

//
// Garbage-collection function
//

/// Controls the garbage collector with the Lua 5.1 commands.
///
/// Tuning commands set the matching incremental-mode parameter and return its previous value.
/// Unknown commands return -1.
pub unsafe fn lua_gc(L: *mut lua_State, what: c_int, data: c_int) -> c_int {
    match what {
        LUA_GCSTOP => ffi::lua_gc(L, ffi::LUA_GCSTOP),
        LUA_GCRESTART => ffi::lua_gc(L, ffi::LUA_GCRESTART),
        LUA_GCCOLLECT => ffi::lua_gc(L, ffi::LUA_GCCOLLECT),
        LUA_GCCOUNT => ffi::lua_gc(L, ffi::LUA_GCCOUNT),
        LUA_GCCOUNTB => ffi::lua_gc(L, ffi::LUA_GCCOUNTB),
        LUA_GCSTEP => ffi::lua_gc(L, ffi::LUA_GCSTEP, data.max(0) as usize),
        LUA_GCSETPAUSE => ffi::lua_gc(L, ffi::LUA_GCPARAM, ffi::LUA_GCPPAUSE, data),
        LUA_GCSETSTEPMUL => ffi::lua_gc(L, ffi::LUA_GCPARAM, ffi::LUA_GCPSTEPMUL, data),
        _ => -1,
    }
}

//
// Miscellaneous functions
//

/// Raises the value on top of the stack as an error. Never returns.
pub unsafe fn lua_error(L: *mut lua_State) -> c_int {
    ffi::lua_error(L)
}

pub unsafe fn lua_next(L: *mut lua_State, idx: c_int) -> c_int {
    at(L, idx, 1, |i| ffi::lua_next(L, i))
}

pub unsafe fn lua_concat(L: *mut lua_State, n: c_int) {
    ffi::lua_concat(L, n)
}

pub unsafe fn lua_getallocf(L: *mut lua_State, ud: *mut *mut c_void) -> lua_Alloc {
    ffi::lua_getallocf(L, ud)
}

pub unsafe fn lua_setallocf(L: *mut lua_State, f: lua_Alloc, ud: *mut c_void) {
    ffi::lua_setallocf(L, f, ud)
}

//
// Auxiliary library
//

pub unsafe fn luaL_newstate() -> *mut lua_State {
    ffi::luaL_newstate()
}

//
// Standard libraries
//

pub(crate) use ffi::{
    luaL_openlibs as openlibs, luaopen_base as open_base, luaopen_debug as open_debug,
    luaopen_io as open_io, luaopen_math as open_math, luaopen_os as open_os,
    luaopen_package as open_package, luaopen_string as open_string, luaopen_table as open_table,
};
