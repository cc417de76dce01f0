//! `package` library and `require` for Luau, which ships neither.
//!
//! Modules are found through `package.loaded`, then the `package.loaders` list: a loader for
//! `package.preload` entries and one for Lua files matching `package.path`. Every function
//! holds the `package` table as its first upvalue.

use std::env;
use std::fs::File;
use std::os::raw::{c_char, c_int};
use std::ffi::CStr;

use crate::lauxlib::*;
use crate::lua::*;

const LUA_PATH_DEFAULT: &CStr = c"./?.lua;./?/init.lua";
const LUA_CPATH_DEFAULT: &CStr = c"./?.so";

// Marks a module being loaded in `package.loaded`
static SENTINEL: u8 = 0;

#[inline(always)]
fn sentinel() -> *mut std::os::raw::c_void {
    &SENTINEL as *const u8 as *mut _
}

/// Sets `package[field]` from the environment variable `envname`, where `;;` stands for the
/// default path.
unsafe fn setpath(L: *mut lua_State, field: *const c_char, envname: &str, default: &'static CStr) {
    match env::var(envname) {
        Ok(path) => {
            lua_pushlstring(L, path.as_ptr() as *const c_char, path.len());
            drop(path);
            let path = luaL_gsub(L, lua_tostring(L, -1), cstr!(";;"), cstr!(";\x01;"));
            luaL_gsub(L, path, cstr!("\x01"), default.as_ptr());
            lua_replace(L, -3);
            lua_pop(L, 1);
        }
        Err(_) => lua_pushliteral(L, default),
    }
    lua_setfield(L, -2, field);
}

unsafe fn readable(filename: *const c_char) -> bool {
    File::open(cstr_to_path(CStr::from_ptr(filename))).is_ok()
}

/// Pushes the next template of `path` and returns the rest, or returns null when done.
unsafe fn pushnexttemplate(L: *mut lua_State, mut path: *const c_char) -> *const c_char {
    while *path == b';' as c_char {
        path = path.add(1); // skip separators
    }
    if *path == 0 {
        return std::ptr::null();
    }
    let mut l = libc::strchr(path, b';' as c_int) as *const c_char;
    if l.is_null() {
        l = path.add(libc::strlen(path));
    }
    lua_pushlstring(L, path, l.offset_from(path) as usize);
    l
}

/// Searches `package[pname]` for `name`.
///
/// Returns the file name (left on the stack), or null with the list of tried files pushed.
unsafe fn findfile(L: *mut lua_State, name: *const c_char, pname: *const c_char) -> *const c_char {
    let name = luaL_gsub(L, name, cstr!("."), cstr!("/"));
    lua_getfield(L, lua_upvalueindex(1), pname);
    let mut path = lua_tostring(L, -1);
    if path.is_null() {
        luaL_error(L, cstr!("'package.%s' must be a string"), pname);
    }
    lua_pushliteral(L, c""); // error accumulator
    loop {
        path = pushnexttemplate(L, path);
        if path.is_null() {
            return std::ptr::null();
        }
        let filename = luaL_gsub(L, lua_tostring(L, -1), cstr!("?"), name);
        lua_remove(L, -2); // remove path template
        if readable(filename) {
            return filename;
        }
        lua_pushfstring(L, cstr!("\n\tno file '%s'"), filename);
        lua_remove(L, -2); // remove file name
        lua_concat(L, 2); // add entry to possible error message
    }
}

unsafe extern "C-unwind" fn loader_preload(L: *mut lua_State) -> c_int {
    let name = luaL_checkstring(L, 1);
    lua_getfield(L, lua_upvalueindex(1), cstr!("preload"));
    if lua_istable(L, -1) == 0 {
        luaL_error(L, cstr!("'package.preload' must be a table"));
    }
    lua_getfield(L, -1, name);
    if lua_isnil(L, -1) != 0 {
        lua_pushfstring(L, cstr!("\n\tno field package.preload['%s']"), name);
    }
    1
}

unsafe extern "C-unwind" fn loader_lua(L: *mut lua_State) -> c_int {
    let name = luaL_checkstring(L, 1);
    let filename = findfile(L, name, cstr!("path"));
    if filename.is_null() {
        return 1; // library not found in this path
    }
    if luaL_loadfile(L, filename) != 0 {
        luaL_error(
            L,
            cstr!("error loading module '%s' from file '%s':\n\t%s"),
            lua_tostring(L, 1),
            filename,
            lua_tostring(L, -1),
        );
    }
    1
}

unsafe extern "C-unwind" fn require(L: *mut lua_State) -> c_int {
    let name = luaL_checkstring(L, 1);
    lua_settop(L, 1); // _LOADED table will be at index 2
    lua_getfield(L, LUA_REGISTRYINDEX, cstr!("_LOADED"));
    lua_getfield(L, 2, name);
    if lua_toboolean(L, -1) != 0 {
        if lua_touserdata(L, -1) == sentinel() {
            luaL_error(L, cstr!("loop or previous error loading module '%s'"), name);
        }
        return 1; // package is already loaded
    }

    // Iterate over available loaders
    lua_getfield(L, lua_upvalueindex(1), cstr!("loaders"));
    if lua_istable(L, -1) == 0 {
        luaL_error(L, cstr!("'package.loaders' must be a table"));
    }
    lua_pushliteral(L, c""); // error message accumulator
    let mut i = 1;
    loop {
        lua_rawgeti(L, -2, i);
        if lua_isnil(L, -1) != 0 {
            luaL_error(L, cstr!("module '%s' not found:%s"), name, lua_tostring(L, -2));
        }
        lua_pushstring(L, name);
        lua_call(L, 1, 1);
        if lua_isfunction(L, -1) != 0 {
            break; // module loader found
        } else if lua_isstring(L, -1) != 0 {
            lua_concat(L, 2); // accumulate error message
        } else {
            lua_pop(L, 1);
        }
        i += 1;
    }

    lua_pushlightuserdata(L, sentinel());
    lua_setfield(L, 2, name); // _LOADED[name] = sentinel
    lua_pushstring(L, name);
    lua_call(L, 1, 1); // run loaded module
    if lua_isnil(L, -1) == 0 {
        lua_setfield(L, 2, name); // _LOADED[name] = returned value
    }
    lua_getfield(L, 2, name);
    if lua_touserdata(L, -1) == sentinel() {
        // module did not set a value
        lua_pushboolean(L, 1);
        lua_pushvalue(L, -1);
        lua_setfield(L, 2, name); // _LOADED[name] = true
    }
    1
}

/// Opens the `package` library and sets the global `require`. Leaves `package` on the stack.
pub unsafe extern "C-unwind" fn luaopen_package(L: *mut lua_State) -> c_int {
    lua_newtable(L);

    setpath(L, cstr!("path"), "LUA_PATH", LUA_PATH_DEFAULT);
    setpath(L, cstr!("cpath"), "LUA_CPATH", LUA_CPATH_DEFAULT);

    luaL_findtable(L, LUA_REGISTRYINDEX, cstr!("_LOADED"), 2);
    lua_setfield(L, -2, cstr!("loaded"));
    lua_newtable(L);
    lua_setfield(L, -2, cstr!("preload"));

    let loaders: [lua_CFunction; 2] = [loader_preload, loader_lua];
    lua_createtable(L, loaders.len() as c_int, 0);
    for (i, loader) in loaders.into_iter().enumerate() {
        lua_pushvalue(L, -2); // package
        lua_pushcclosure(L, loader, 1);
        lua_rawseti(L, -2, i as c_int + 1);
    }
    lua_setfield(L, -2, cstr!("loaders"));

    lua_pushvalue(L, -1);
    lua_pushcclosure(L, require, 1);
    lua_setglobal(L, cstr!("require"));

    lua_pushvalue(L, -1);
    lua_setglobal(L, cstr!("package"));
    1
}
