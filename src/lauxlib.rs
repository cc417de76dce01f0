//! The `lauxlib.h` surface.
//!
//! Implemented on top of the core API, so both backends share the Lua 5.1 behavior.

use std::borrow::Cow;
use std::ffi::CStr;
use std::io::{self, Read};
use std::os::raw::{c_char, c_int, c_long, c_void};
use std::path::Path;
use std::{fs, ptr};

use crate::buffer::{luaL_Buffer, luaL_addlstring, luaL_addstring, luaL_buffinit, luaL_pushresult};
use crate::lua::*;

pub use crate::backend::{luaL_loadbuffer, luaL_newstate};

/// Raises an error with a message built from a `printf`-like format, prefixed with the
/// current position. Never returns.
pub use ffi::luaL_error;

// Extra error code for `luaL_load`
pub const LUA_ERRFILE: c_int = LUA_ERRERR + 1;

// Pre-defined references
pub const LUA_NOREF: c_int = -2;
pub const LUA_REFNIL: c_int = -1;

// Index of the free list head in a reference table
const FREELIST_REF: c_int = 1;

#[repr(C)]
pub struct luaL_Reg {
    pub name: *const c_char,
    pub func: Option<lua_CFunction>,
}

/// Opens a library.
///
/// With a `libname`, reuses `package.loaded[libname]` or the global `libname` (creating it if
/// needed) and leaves it on the stack. Functions in `l` (terminated by a null name) are then
/// registered into the table on top of the stack, sharing the `nup` upvalues below it.
pub unsafe fn luaI_openlib(L: *mut lua_State, libname: *const c_char, mut l: *const luaL_Reg, nup: c_int) {
    if !libname.is_null() {
        let size = libsize(l);
        luaL_findtable(L, LUA_REGISTRYINDEX, cstr!("_LOADED"), 1);
        lua_getfield(L, -1, libname);
        if lua_istable(L, -1) == 0 {
            lua_pop(L, 1);
            if !luaL_findtable(L, LUA_GLOBALSINDEX, libname, size).is_null() {
                luaL_error(L, cstr!("name conflict for module '%s'"), libname);
            }
            lua_pushvalue(L, -1);
            lua_setfield(L, -3, libname); // _LOADED[libname] = new table
        }
        lua_remove(L, -2); // remove _LOADED table
        lua_insert(L, -(nup + 1)); // move library table to below upvalues
    }
    if l.is_null() {
        lua_pop(L, nup);
        return;
    }
    while !(*l).name.is_null() {
        if let Some(func) = (*l).func {
            for _ in 0..nup {
                lua_pushvalue(L, -nup);
            }
            lua_pushcclosure(L, func, nup);
            lua_setfield(L, -(nup + 2), (*l).name);
        }
        l = l.add(1);
    }
    lua_pop(L, nup); // remove upvalues
}

unsafe fn libsize(mut l: *const luaL_Reg) -> c_int {
    let mut size = 0;
    if l.is_null() {
        return size;
    }
    while !(*l).name.is_null() {
        size += 1;
        l = l.add(1);
    }
    size
}

#[inline(always)]
pub unsafe fn luaL_register(L: *mut lua_State, libname: *const c_char, l: *const luaL_Reg) {
    luaI_openlib(L, libname, l, 0)
}

#[inline(always)]
pub unsafe fn luaL_openlib(L: *mut lua_State, libname: *const c_char, l: *const luaL_Reg, nup: c_int) {
    luaI_openlib(L, libname, l, nup)
}

/// Walks the dotted path `fname` starting from the table at `idx`, creating missing tables.
///
/// Leaves the last table on the stack and returns null, or returns the part of the name that
/// refers to a non-table value (pushing nothing).
pub unsafe fn luaL_findtable(
    L: *mut lua_State,
    idx: c_int,
    mut fname: *const c_char,
    szhint: c_int,
) -> *const c_char {
    lua_pushvalue(L, idx);
    loop {
        let mut e = libc::strchr(fname, b'.' as c_int) as *const c_char;
        if e.is_null() {
            e = fname.add(libc::strlen(fname));
        }
        let len = e.offset_from(fname) as usize;
        lua_pushlstring(L, fname, len);
        lua_rawget(L, -2);
        if lua_isnil(L, -1) != 0 {
            lua_pop(L, 1);
            lua_createtable(L, 0, if *e == b'.' as c_char { 1 } else { szhint });
            lua_pushlstring(L, fname, len);
            lua_pushvalue(L, -2);
            lua_settable(L, -4);
        } else if lua_istable(L, -1) == 0 {
            lua_pop(L, 2);
            return fname;
        }
        lua_remove(L, -2);
        if *e != b'.' as c_char {
            return ptr::null();
        }
        fname = e.add(1);
    }
}

//
// Metatables and metamethods
//

pub unsafe fn luaL_getmetafield(L: *mut lua_State, obj: c_int, e: *const c_char) -> c_int {
    if lua_getmetatable(L, obj) == 0 {
        return 0;
    }
    lua_pushstring(L, e);
    lua_rawget(L, -2);
    if lua_isnil(L, -1) != 0 {
        lua_pop(L, 2); // remove metatable and metafield
        return 0;
    }
    lua_remove(L, -2); // remove only metatable
    1
}

/// Calls the metamethod `e` of the object at `obj` with the object as its only argument.
///
/// Returns 0 (pushing nothing) when there is no such metamethod.
pub unsafe fn luaL_callmeta(L: *mut lua_State, obj: c_int, e: *const c_char) -> c_int {
    let obj = abs_index(L, obj);
    if luaL_getmetafield(L, obj, e) == 0 {
        return 0;
    }
    lua_pushvalue(L, obj);
    lua_call(L, 1, 1);
    1
}

pub unsafe fn luaL_newmetatable(L: *mut lua_State, tname: *const c_char) -> c_int {
    lua_getfield(L, LUA_REGISTRYINDEX, tname);
    if lua_isnil(L, -1) == 0 {
        return 0; // leave previous value on top
    }
    lua_pop(L, 1);
    lua_newtable(L);
    lua_pushvalue(L, -1);
    lua_setfield(L, LUA_REGISTRYINDEX, tname);
    1
}

#[inline(always)]
pub unsafe fn luaL_getmetatable(L: *mut lua_State, tname: *const c_char) {
    lua_getfield(L, LUA_REGISTRYINDEX, tname)
}

pub unsafe fn luaL_checkudata(L: *mut lua_State, ud: c_int, tname: *const c_char) -> *mut c_void {
    let p = lua_touserdata(L, ud);
    if !p.is_null() && lua_getmetatable(L, ud) != 0 {
        lua_getfield(L, LUA_REGISTRYINDEX, tname);
        if lua_rawequal(L, -1, -2) != 0 {
            lua_pop(L, 2);
            return p;
        }
    }
    luaL_typerror(L, ud, tname);
    ptr::null_mut()
}

//
// Argument errors and checks
//

/// Raises `bad argument #narg to 'fname' (extramsg)`. Never returns.
pub unsafe fn luaL_argerror(L: *mut lua_State, mut narg: c_int, extramsg: *const c_char) -> c_int {
    let mut ar = lua_Debug::new();
    if lua_getstack(L, 0, &mut ar) == 0 {
        // no stack frame
        return luaL_error(L, cstr!("bad argument #%d (%s)"), narg, extramsg);
    }
    lua_getinfo(L, cstr!("n"), &mut ar);
    if !ar.namewhat.is_null() && CStr::from_ptr(ar.namewhat) == c"method" {
        narg -= 1;
        if narg == 0 {
            return luaL_error(L, cstr!("calling '%s' on bad self (%s)"), ar.name, extramsg);
        }
    }
    if ar.name.is_null() {
        ar.name = cstr!("?");
    }
    luaL_error(L, cstr!("bad argument #%d to '%s' (%s)"), narg, ar.name, extramsg)
}

pub unsafe fn luaL_typerror(L: *mut lua_State, narg: c_int, tname: *const c_char) -> c_int {
    let msg = lua_pushfstring(L, cstr!("%s expected, got %s"), tname, luaL_typename(L, narg));
    luaL_argerror(L, narg, msg)
}

unsafe fn tag_error(L: *mut lua_State, narg: c_int, tag: c_int) {
    luaL_typerror(L, narg, lua_typename(L, tag));
}

pub unsafe fn luaL_checklstring(L: *mut lua_State, narg: c_int, len: *mut usize) -> *const c_char {
    let s = lua_tolstring(L, narg, len);
    if s.is_null() {
        tag_error(L, narg, LUA_TSTRING);
    }
    s
}

pub unsafe fn luaL_optlstring(L: *mut lua_State, narg: c_int, def: *const c_char, len: *mut usize) -> *const c_char {
    if lua_isnoneornil(L, narg) != 0 {
        if !len.is_null() {
            *len = if def.is_null() { 0 } else { libc::strlen(def) };
        }
        return def;
    }
    luaL_checklstring(L, narg, len)
}

pub unsafe fn luaL_checknumber(L: *mut lua_State, narg: c_int) -> lua_Number {
    let d = lua_tonumber(L, narg);
    if d == 0.0 && lua_isnumber(L, narg) == 0 {
        tag_error(L, narg, LUA_TNUMBER);
    }
    d
}

pub unsafe fn luaL_optnumber(L: *mut lua_State, narg: c_int, def: lua_Number) -> lua_Number {
    if lua_isnoneornil(L, narg) != 0 {
        return def;
    }
    luaL_checknumber(L, narg)
}

pub unsafe fn luaL_checkinteger(L: *mut lua_State, narg: c_int) -> lua_Integer {
    let d = lua_tointeger(L, narg);
    if d == 0 && lua_isnumber(L, narg) == 0 {
        tag_error(L, narg, LUA_TNUMBER);
    }
    d
}

pub unsafe fn luaL_optinteger(L: *mut lua_State, narg: c_int, def: lua_Integer) -> lua_Integer {
    if lua_isnoneornil(L, narg) != 0 {
        return def;
    }
    luaL_checkinteger(L, narg)
}

#[inline(always)]
pub unsafe fn luaL_checkint(L: *mut lua_State, n: c_int) -> c_int {
    luaL_checkinteger(L, n) as c_int
}

#[inline(always)]
pub unsafe fn luaL_optint(L: *mut lua_State, n: c_int, d: c_int) -> c_int {
    luaL_optinteger(L, n, d as lua_Integer) as c_int
}

#[inline(always)]
pub unsafe fn luaL_checklong(L: *mut lua_State, n: c_int) -> c_long {
    luaL_checkinteger(L, n) as c_long
}

#[inline(always)]
pub unsafe fn luaL_optlong(L: *mut lua_State, n: c_int, d: c_long) -> c_long {
    luaL_optinteger(L, n, d as lua_Integer) as c_long
}

pub unsafe fn luaL_checkstack(L: *mut lua_State, sz: c_int, msg: *const c_char) {
    if lua_checkstack(L, sz) == 0 {
        luaL_error(L, cstr!("stack overflow (%s)"), msg);
    }
}

pub unsafe fn luaL_checktype(L: *mut lua_State, narg: c_int, t: c_int) {
    if lua_type(L, narg) != t {
        tag_error(L, narg, t);
    }
}

pub unsafe fn luaL_checkany(L: *mut lua_State, narg: c_int) {
    if lua_type(L, narg) == LUA_TNONE {
        luaL_argerror(L, narg, cstr!("value expected"));
    }
}

/// Checks that argument `narg` is a string found in the null-terminated array `lst` and
/// returns its position.
pub unsafe fn luaL_checkoption(
    L: *mut lua_State,
    narg: c_int,
    def: *const c_char,
    lst: *const *const c_char,
) -> c_int {
    let name = if def.is_null() {
        luaL_checkstring(L, narg)
    } else {
        luaL_optstring(L, narg, def)
    };
    let name_bytes = CStr::from_ptr(name);
    let mut i = 0;
    while !(*lst.add(i)).is_null() {
        if CStr::from_ptr(*lst.add(i)) == name_bytes {
            return i as c_int;
        }
        i += 1;
    }
    let msg = lua_pushfstring(L, cstr!("invalid option '%s'"), name);
    luaL_argerror(L, narg, msg)
}

#[inline(always)]
pub unsafe fn luaL_argcheck(L: *mut lua_State, cond: c_int, narg: c_int, extramsg: *const c_char) {
    if cond == 0 {
        luaL_argerror(L, narg, extramsg);
    }
}

#[inline(always)]
pub unsafe fn luaL_checkstring(L: *mut lua_State, n: c_int) -> *const c_char {
    luaL_checklstring(L, n, ptr::null_mut())
}

#[inline(always)]
pub unsafe fn luaL_optstring(L: *mut lua_State, n: c_int, d: *const c_char) -> *const c_char {
    luaL_optlstring(L, n, d, ptr::null_mut())
}

#[inline(always)]
pub unsafe fn luaL_typename(L: *mut lua_State, i: c_int) -> *const c_char {
    lua_typename(L, lua_type(L, i))
}

/// Pushes `chunkname:currentline: ` for the function at `lvl`, or an empty string when no
/// position is known.
pub unsafe fn luaL_where(L: *mut lua_State, lvl: c_int) {
    let mut ar = lua_Debug::new();
    if lua_getstack(L, lvl, &mut ar) != 0 {
        lua_getinfo(L, cstr!("Sl"), &mut ar);
        if ar.currentline > 0 {
            lua_pushfstring(L, cstr!("%s:%d: "), ar.short_src.as_ptr(), ar.currentline);
            return;
        }
    }
    lua_pushliteral(L, c"");
}

//
// Reference system
//

/// Creates a reference in the table at `t` for the value on top of the stack, popping it.
pub unsafe fn luaL_ref(L: *mut lua_State, t: c_int) -> c_int {
    let t = abs_index(L, t);
    if lua_isnil(L, -1) != 0 {
        lua_pop(L, 1);
        return LUA_REFNIL;
    }
    lua_rawgeti(L, t, FREELIST_REF);
    if lua_type(L, -1) != LUA_TNUMBER {
        // Claim the free list slot before the first reference is made, Lua 5.5 leaves a
        // `false` placeholder in the registry there
        lua_pop(L, 1);
        lua_pushinteger(L, 0);
        lua_pushvalue(L, -1);
        lua_rawseti(L, t, FREELIST_REF);
    }
    let mut r#ref = lua_tointeger(L, -1) as c_int;
    lua_pop(L, 1);
    if r#ref != 0 {
        lua_rawgeti(L, t, r#ref);
        lua_rawseti(L, t, FREELIST_REF); // (t[FREELIST_REF] = t[ref])
    } else {
        r#ref = lua_objlen(L, t) as c_int + 1;
    }
    lua_rawseti(L, t, r#ref);
    r#ref
}

pub unsafe fn luaL_unref(L: *mut lua_State, t: c_int, r#ref: c_int) {
    if r#ref <= FREELIST_REF {
        return;
    }
    let t = abs_index(L, t);
    lua_rawgeti(L, t, FREELIST_REF);
    lua_rawseti(L, t, r#ref); // t[ref] = t[FREELIST_REF]
    lua_pushinteger(L, r#ref as lua_Integer);
    lua_rawseti(L, t, FREELIST_REF); // t[FREELIST_REF] = ref
}

/// Creates a registry reference. Unlocked references are no longer supported.
pub unsafe fn lua_ref(L: *mut lua_State, lock: c_int) -> c_int {
    if lock == 0 {
        lua_pushliteral(L, c"unlocked references are obsolete");
        lua_error(L);
    }
    luaL_ref(L, LUA_REGISTRYINDEX)
}

#[inline(always)]
pub unsafe fn lua_unref(L: *mut lua_State, r#ref: c_int) {
    luaL_unref(L, LUA_REGISTRYINDEX, r#ref)
}

#[inline(always)]
pub unsafe fn lua_getref(L: *mut lua_State, r#ref: c_int) {
    lua_rawgeti(L, LUA_REGISTRYINDEX, r#ref)
}

//
// Loading
//

pub unsafe fn luaL_loadstring(L: *mut lua_State, s: *const c_char) -> c_int {
    luaL_loadbuffer(L, s, libc::strlen(s), s)
}

unsafe fn errfile(L: *mut lua_State, what: &CStr, fnameindex: c_int, errno: c_int) -> c_int {
    let filename = lua_tostring(L, fnameindex).add(1);
    lua_pushfstring(L, cstr!("cannot %s %s: %s"), what.as_ptr(), filename, libc::strerror(errno));
    lua_remove(L, fnameindex);
    LUA_ERRFILE
}

/// Converts a C file name to a path, keeping bytes that are not valid UTF-8.
#[cfg(unix)]
pub(crate) fn cstr_to_path(filename: &CStr) -> Cow<'_, Path> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(Path::new(OsStr::from_bytes(filename.to_bytes())))
}

#[cfg(not(unix))]
pub(crate) fn cstr_to_path(filename: &CStr) -> Cow<'_, Path> {
    match filename.to_string_lossy() {
        Cow::Borrowed(name) => Cow::Borrowed(Path::new(name)),
        Cow::Owned(name) => Cow::Owned(name.into()),
    }
}

/// Reads a whole file, or the standard input for `None`.
///
/// Errors carry the failed operation for the error message.
fn read_source(filename: Option<&CStr>) -> Result<Vec<u8>, (&'static CStr, io::Error)> {
    let mut source = Vec::new();
    let Some(filename) = filename else {
        io::stdin().read_to_end(&mut source).map_err(|err| (c"read", err))?;
        return Ok(source);
    };
    let mut file = fs::File::open(cstr_to_path(filename)).map_err(|err| (c"open", err))?;
    file.read_to_end(&mut source).map_err(|err| (c"read", err))?;
    Ok(source)
}

/// Loads a file as a Lua chunk, or the standard input when `filename` is null.
///
/// A first line starting with `#` is skipped.
pub unsafe fn luaL_loadfile(L: *mut lua_State, filename: *const c_char) -> c_int {
    let fnameindex = lua_gettop(L) + 1;
    let filename = if filename.is_null() {
        lua_pushliteral(L, c"=stdin");
        None
    } else {
        lua_pushfstring(L, cstr!("@%s"), filename);
        Some(CStr::from_ptr(filename))
    };
    let source = match read_source(filename) {
        Ok(source) => source,
        Err((what, err)) => {
            let errno = err.raw_os_error().unwrap_or(libc::EIO);
            drop(err);
            return errfile(L, what, fnameindex, errno);
        }
    };

    // Skip a first line starting with '#', keeping its newline so line numbers stay intact
    let start = match source.first() {
        Some(b'#') => source.iter().position(|&c| c == b'\n').unwrap_or(source.len()),
        _ => 0,
    };
    lua_pushlstring(L, source[start..].as_ptr() as *const c_char, source.len() - start);
    drop(source);

    let mut len = 0;
    let text = lua_tolstring(L, -1, &mut len);
    let status = luaL_loadbuffer(L, text, len, lua_tostring(L, fnameindex));
    lua_remove(L, -2); // remove source text
    lua_remove(L, fnameindex);
    status
}

/// Loads and runs a file. Returns 0 on success and 1 on error.
pub unsafe fn luaL_dofile(L: *mut lua_State, filename: *const c_char) -> c_int {
    (luaL_loadfile(L, filename) != 0 || lua_pcall(L, 0, LUA_MULTRET, 0) != 0) as c_int
}

/// Loads and runs a string. Returns 0 on success and 1 on error.
pub unsafe fn luaL_dostring(L: *mut lua_State, s: *const c_char) -> c_int {
    (luaL_loadstring(L, s) != 0 || lua_pcall(L, 0, LUA_MULTRET, 0) != 0) as c_int
}

/// Pushes a copy of `s` with every occurrence of `p` replaced by `r` and returns it.
pub unsafe fn luaL_gsub(L: *mut lua_State, mut s: *const c_char, p: *const c_char, r: *const c_char) -> *const c_char {
    let l = libc::strlen(p);
    let mut b = luaL_Buffer::new();
    luaL_buffinit(L, &mut b);
    if l > 0 {
        loop {
            let wild = libc::strstr(s, p) as *const c_char;
            if wild.is_null() {
                break;
            }
            luaL_addlstring(&mut b, s, wild.offset_from(s) as usize);
            luaL_addstring(&mut b, r);
            s = wild.add(l);
        }
    }
    luaL_addstring(&mut b, s);
    luaL_pushresult(&mut b);
    lua_tostring(L, -1)
}
