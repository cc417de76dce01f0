//! The `lua.h` surface.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;

use crate::backend;

pub use ffi::{lua_Alloc, lua_State};

pub use crate::backend::{
    lua_atpanic, lua_call, lua_checkstack, lua_close, lua_concat, lua_createtable, lua_dump,
    lua_equal, lua_error, lua_getallocf, lua_getfenv, lua_getfield, lua_gethook, lua_gethookcount,
    lua_gethookmask, lua_getinfo, lua_getlocal, lua_getmetatable, lua_getstack, lua_gettable,
    lua_gettop, lua_getupvalue, lua_insert, lua_iscfunction, lua_isnumber, lua_isstring,
    lua_isuserdata, lua_lessthan, lua_load, lua_newstate, lua_newthread, lua_newuserdata, lua_next,
    lua_pcall, lua_pushboolean, lua_pushcclosure, lua_pushinteger, lua_pushlightuserdata,
    lua_pushlstring, lua_pushnil, lua_pushnumber, lua_pushstring, lua_pushthread, lua_pushvalue,
    lua_rawequal, lua_rawget, lua_rawgeti, lua_rawset, lua_rawseti, lua_remove, lua_replace,
    lua_resume, lua_setallocf, lua_setfenv, lua_setfield, lua_sethook, lua_setlocal,
    lua_setmetatable, lua_settable, lua_settop, lua_setupvalue, lua_status, lua_toboolean,
    lua_tocfunction, lua_tointeger, lua_tolstring, lua_tonumber, lua_topointer, lua_tothread,
    lua_touserdata, lua_type, lua_xmove, lua_yield,
};

/// Pushes a string built from a `printf`-like format.
///
/// Supports `%%`, `%s`, `%f`, `%p`, `%d` and `%c` like Lua 5.1.
pub use ffi::lua_pushfstring;

pub const LUA_VERSION: &CStr = c"Lua 5.1";
pub const LUA_RELEASE: &CStr = c"Lua 5.1.5";
pub const LUA_VERSION_NUM: c_int = 501;

// Mark for precompiled code (`<esc>Lua`)
pub const LUA_SIGNATURE: &[u8] = b"\x1bLua";

// Option for multiple returns in 'lua_pcall' and 'lua_call'
pub const LUA_MULTRET: c_int = -1;

//
// Pseudo-indices
//
pub const LUA_REGISTRYINDEX: c_int = -10000;
pub const LUA_ENVIRONINDEX: c_int = -10001;
pub const LUA_GLOBALSINDEX: c_int = -10002;

pub const fn lua_upvalueindex(i: c_int) -> c_int {
    LUA_GLOBALSINDEX - i
}

//
// Thread status; 0 is OK
//
pub const LUA_OK: c_int = 0;
pub const LUA_YIELD: c_int = 1;
pub const LUA_ERRRUN: c_int = 2;
pub const LUA_ERRSYNTAX: c_int = 3;
pub const LUA_ERRMEM: c_int = 4;
pub const LUA_ERRERR: c_int = 5;

/// A Lua number, `f64`.
pub type lua_Number = f64;

/// A Lua integer, `ptrdiff_t` in Lua 5.1.
pub type lua_Integer = isize;

/// Type for native C functions that can be passed to Lua.
pub type lua_CFunction = unsafe extern "C-unwind" fn(L: *mut lua_State) -> c_int;

// Type for functions that read/write blocks when loading/dumping Lua chunks
#[rustfmt::skip]
pub type lua_Reader =
    unsafe extern "C-unwind" fn(L: *mut lua_State, ud: *mut c_void, sz: *mut usize) -> *const c_char;
#[rustfmt::skip]
pub type lua_Writer =
    unsafe extern "C-unwind" fn(L: *mut lua_State, p: *const c_void, sz: usize, ud: *mut c_void) -> c_int;

//
// Basic types
//
pub const LUA_TNONE: c_int = -1;

pub const LUA_TNIL: c_int = 0;
pub const LUA_TBOOLEAN: c_int = 1;
pub const LUA_TLIGHTUSERDATA: c_int = 2;
pub const LUA_TNUMBER: c_int = 3;
pub const LUA_TSTRING: c_int = 4;
pub const LUA_TTABLE: c_int = 5;
pub const LUA_TFUNCTION: c_int = 6;
pub const LUA_TUSERDATA: c_int = 7;
pub const LUA_TTHREAD: c_int = 8;

/// Minimum Lua stack available to a C function
pub const LUA_MINSTACK: c_int = 20;

//
// Garbage-collection options
//
pub const LUA_GCSTOP: c_int = 0;
pub const LUA_GCRESTART: c_int = 1;
pub const LUA_GCCOLLECT: c_int = 2;
pub const LUA_GCCOUNT: c_int = 3;
pub const LUA_GCCOUNTB: c_int = 4;
pub const LUA_GCSTEP: c_int = 5;
pub const LUA_GCSETPAUSE: c_int = 6;
pub const LUA_GCSETSTEPMUL: c_int = 7;

pub use crate::backend::lua_gc;

//
// Event codes
//
pub const LUA_HOOKCALL: c_int = 0;
pub const LUA_HOOKRET: c_int = 1;
pub const LUA_HOOKLINE: c_int = 2;
pub const LUA_HOOKCOUNT: c_int = 3;
pub const LUA_HOOKTAILRET: c_int = 4;

//
// Event masks
//
pub const LUA_MASKCALL: c_int = 1 << LUA_HOOKCALL;
pub const LUA_MASKRET: c_int = 1 << LUA_HOOKRET;
pub const LUA_MASKLINE: c_int = 1 << LUA_HOOKLINE;
pub const LUA_MASKCOUNT: c_int = 1 << LUA_HOOKCOUNT;

// Size of `lua_Debug::short_src`
pub const LUA_IDSIZE: usize = 60;

/// Type for functions to be called on debug events.
pub type lua_Hook = unsafe extern "C-unwind" fn(L: *mut lua_State, ar: *mut lua_Debug);

/// Activation record in the Lua 5.1 layout.
///
/// `lua_getstack` and hooks fill only `i_ci`, which identifies the activation for later
/// `lua_getinfo`, `lua_getlocal` and `lua_setlocal` calls.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct lua_Debug {
    pub event: c_int,
    pub name: *const c_char,
    pub namewhat: *const c_char,
    pub what: *const c_char,
    pub source: *const c_char,
    pub currentline: c_int,
    pub nups: c_int,
    pub linedefined: c_int,
    pub lastlinedefined: c_int,
    pub short_src: [c_char; LUA_IDSIZE],
    pub i_ci: c_int,
}

impl lua_Debug {
    pub const fn new() -> Self {
        lua_Debug {
            event: 0,
            name: ptr::null(),
            namewhat: ptr::null(),
            what: ptr::null(),
            source: ptr::null(),
            currentline: 0,
            nups: 0,
            linedefined: 0,
            lastlinedefined: 0,
            short_src: [0; LUA_IDSIZE],
            i_ci: 0,
        }
    }

    /// Copies `src` into `short_src`, truncating to fit and keeping the trailing NUL.
    pub(crate) unsafe fn set_short_src(&mut self, src: *const c_char) {
        self.short_src = [0; LUA_IDSIZE];
        if src.is_null() {
            return;
        }
        let bytes = CStr::from_ptr(src).to_bytes();
        let n = bytes.len().min(LUA_IDSIZE - 1);
        for (dst, &b) in self.short_src.iter_mut().zip(&bytes[..n]) {
            *dst = b as c_char;
        }
    }
}

impl Default for lua_Debug {
    fn default() -> Self {
        Self::new()
    }
}

static TYPE_NAMES: [&CStr; 9] = [
    c"nil",
    c"boolean",
    c"userdata",
    c"number",
    c"string",
    c"table",
    c"function",
    c"userdata",
    c"thread",
];

/// Returns the name of the type encoded by the value `tp`, which must be one of the
/// Lua 5.1 type tags.
pub unsafe fn lua_typename(_L: *mut lua_State, tp: c_int) -> *const c_char {
    match usize::try_from(tp) {
        Ok(i) if i < TYPE_NAMES.len() => TYPE_NAMES[i].as_ptr(),
        _ => c"no value".as_ptr(),
    }
}

/// Returns the "length" of the value at `idx`.
///
/// Numbers are converted to strings in place and measured, as in Lua 5.1.
pub unsafe fn lua_objlen(L: *mut lua_State, idx: c_int) -> usize {
    if lua_type(L, idx) == LUA_TNUMBER {
        let mut len = 0;
        lua_tolstring(L, idx, &mut len);
        return len;
    }
    backend::rawlen(L, idx)
}

/// Calls `func` in protected mode with `ud` as its single light userdata argument.
///
/// Results of `func` are discarded.
pub unsafe fn lua_cpcall(L: *mut lua_State, func: lua_CFunction, ud: *mut c_void) -> c_int {
    lua_pushcfunction(L, func);
    lua_pushlightuserdata(L, ud);
    lua_pcall(L, 1, 0, 0)
}

/// Kept for source compatibility, C call depth is managed by the backend.
pub unsafe fn lua_setlevel(_from: *mut lua_State, _to: *mut lua_State) {}

//
// Some useful macros (implemented as Rust functions)
//

#[inline(always)]
pub unsafe fn lua_pop(L: *mut lua_State, n: c_int) {
    lua_settop(L, -n - 1)
}

#[inline(always)]
pub unsafe fn lua_newtable(L: *mut lua_State) {
    lua_createtable(L, 0, 0)
}

#[inline(always)]
pub unsafe fn lua_register(L: *mut lua_State, n: *const c_char, f: lua_CFunction) {
    lua_pushcfunction(L, f);
    lua_setglobal(L, n)
}

#[inline(always)]
pub unsafe fn lua_pushcfunction(L: *mut lua_State, f: lua_CFunction) {
    lua_pushcclosure(L, f, 0)
}

#[inline(always)]
pub unsafe fn lua_strlen(L: *mut lua_State, i: c_int) -> usize {
    lua_objlen(L, i)
}

#[inline(always)]
pub unsafe fn lua_isfunction(L: *mut lua_State, n: c_int) -> c_int {
    (lua_type(L, n) == LUA_TFUNCTION) as c_int
}

#[inline(always)]
pub unsafe fn lua_istable(L: *mut lua_State, n: c_int) -> c_int {
    (lua_type(L, n) == LUA_TTABLE) as c_int
}

#[inline(always)]
pub unsafe fn lua_islightuserdata(L: *mut lua_State, n: c_int) -> c_int {
    (lua_type(L, n) == LUA_TLIGHTUSERDATA) as c_int
}

#[inline(always)]
pub unsafe fn lua_isnil(L: *mut lua_State, n: c_int) -> c_int {
    (lua_type(L, n) == LUA_TNIL) as c_int
}

#[inline(always)]
pub unsafe fn lua_isboolean(L: *mut lua_State, n: c_int) -> c_int {
    (lua_type(L, n) == LUA_TBOOLEAN) as c_int
}

#[inline(always)]
pub unsafe fn lua_isthread(L: *mut lua_State, n: c_int) -> c_int {
    (lua_type(L, n) == LUA_TTHREAD) as c_int
}

#[inline(always)]
pub unsafe fn lua_isnone(L: *mut lua_State, n: c_int) -> c_int {
    (lua_type(L, n) == LUA_TNONE) as c_int
}

#[inline(always)]
pub unsafe fn lua_isnoneornil(L: *mut lua_State, n: c_int) -> c_int {
    (lua_type(L, n) <= 0) as c_int
}

#[inline(always)]
pub unsafe fn lua_pushliteral(L: *mut lua_State, s: &'static CStr) {
    lua_pushlstring(L, s.as_ptr(), s.count_bytes());
}

#[inline(always)]
pub unsafe fn lua_setglobal(L: *mut lua_State, s: *const c_char) {
    lua_setfield(L, LUA_GLOBALSINDEX, s)
}

#[inline(always)]
pub unsafe fn lua_getglobal(L: *mut lua_State, s: *const c_char) {
    lua_getfield(L, LUA_GLOBALSINDEX, s)
}

#[inline(always)]
pub unsafe fn lua_tostring(L: *mut lua_State, i: c_int) -> *const c_char {
    lua_tolstring(L, i, ptr::null_mut())
}

#[inline(always)]
pub unsafe fn lua_open() -> *mut lua_State {
    crate::lauxlib::luaL_newstate()
}

#[inline(always)]
pub unsafe fn lua_getregistry(L: *mut lua_State) {
    lua_pushvalue(L, LUA_REGISTRYINDEX)
}

#[inline(always)]
pub unsafe fn lua_getgccount(L: *mut lua_State) -> c_int {
    lua_gc(L, LUA_GCCOUNT, 0)
}

/// Converts a relative stack index into an absolute one, leaving pseudo-indices untouched.
#[inline(always)]
pub(crate) unsafe fn abs_index(L: *mut lua_State, idx: c_int) -> c_int {
    if idx > 0 || idx <= LUA_REGISTRYINDEX {
        idx
    } else {
        lua_gettop(L) + idx + 1
    }
}
