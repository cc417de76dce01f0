//! The `lualib.h` surface.

use std::os::raw::{c_char, c_int};

use crate::backend;
use crate::lauxlib::*;
use crate::lua::*;

pub const LUA_COLIBNAME: *const c_char = cstr!("coroutine");
pub const LUA_TABLIBNAME: *const c_char = cstr!("table");
pub const LUA_IOLIBNAME: *const c_char = cstr!("io");
pub const LUA_OSLIBNAME: *const c_char = cstr!("os");
pub const LUA_STRLIBNAME: *const c_char = cstr!("string");
pub const LUA_MATHLIBNAME: *const c_char = cstr!("math");
pub const LUA_DBLIBNAME: *const c_char = cstr!("debug");
pub const LUA_LOADLIBNAME: *const c_char = cstr!("package");

/// Runs the backend opener of a library, records the result in `package.loaded[name]` and sets
/// the global `name`. Leaves the library on the stack.
unsafe fn open_lib(L: *mut lua_State, name: *const c_char, openf: lua_CFunction) -> c_int {
    luaL_findtable(L, LUA_REGISTRYINDEX, cstr!("_LOADED"), 1);
    lua_pushcfunction(L, openf);
    lua_pushstring(L, name);
    lua_call(L, 1, 1);
    lua_pushvalue(L, -1);
    lua_setfield(L, -3, name);
    lua_pushvalue(L, -1);
    lua_setglobal(L, name);
    lua_remove(L, -2); // remove _LOADED table
    1
}

pub unsafe extern "C-unwind" fn luaopen_base(L: *mut lua_State) -> c_int {
    open_lib(L, cstr!("_G"), backend::open_base)
}

pub unsafe extern "C-unwind" fn luaopen_table(L: *mut lua_State) -> c_int {
    open_lib(L, LUA_TABLIBNAME, backend::open_table)
}

pub unsafe extern "C-unwind" fn luaopen_io(L: *mut lua_State) -> c_int {
    open_lib(L, LUA_IOLIBNAME, backend::open_io)
}

pub unsafe extern "C-unwind" fn luaopen_os(L: *mut lua_State) -> c_int {
    open_lib(L, LUA_OSLIBNAME, backend::open_os)
}

pub unsafe extern "C-unwind" fn luaopen_string(L: *mut lua_State) -> c_int {
    open_lib(L, LUA_STRLIBNAME, backend::open_string)
}

pub unsafe extern "C-unwind" fn luaopen_math(L: *mut lua_State) -> c_int {
    open_lib(L, LUA_MATHLIBNAME, backend::open_math)
}

pub unsafe extern "C-unwind" fn luaopen_debug(L: *mut lua_State) -> c_int {
    open_lib(L, LUA_DBLIBNAME, backend::open_debug)
}

pub unsafe extern "C-unwind" fn luaopen_package(L: *mut lua_State) -> c_int {
    open_lib(L, LUA_LOADLIBNAME, backend::open_package)
}

/// Opens all standard libraries, then adds the Lua 5.1 functions the backend lacks.
pub unsafe fn luaL_openlibs(L: *mut lua_State) {
    backend::openlibs(L);

    #[cfg(feature = "luau")]
    for (name, openf) in [
        (LUA_IOLIBNAME, luaopen_io as lua_CFunction),
        (LUA_LOADLIBNAME, luaopen_package),
    ] {
        lua_getglobal(L, name);
        let missing = lua_isnil(L, -1) != 0;
        lua_pop(L, 1);
        if missing {
            lua_pushcfunction(L, openf);
            lua_call(L, 0, 0);
        }
    }

    open_compat(L);
}

//
// Lua 5.1 functions removed or renamed by the backends
//

unsafe extern "C-unwind" fn base_loadstring(L: *mut lua_State) -> c_int {
    let mut l = 0;
    let s = luaL_checklstring(L, 1, &mut l);
    let chunkname = luaL_optstring(L, 2, s);
    if luaL_loadbuffer(L, s, l, chunkname) == 0 {
        return 1;
    }
    lua_pushnil(L);
    lua_insert(L, -2); // put before error message
    2
}

unsafe extern "C-unwind" fn base_loadfile(L: *mut lua_State) -> c_int {
    let fname = luaL_optstring(L, 1, std::ptr::null());
    if luaL_loadfile(L, fname) == 0 {
        return 1;
    }
    lua_pushnil(L);
    lua_insert(L, -2);
    2
}

unsafe extern "C-unwind" fn base_dofile(L: *mut lua_State) -> c_int {
    let fname = luaL_optstring(L, 1, std::ptr::null());
    let n = lua_gettop(L);
    if luaL_loadfile(L, fname) != 0 {
        lua_error(L);
    }
    lua_call(L, 0, LUA_MULTRET);
    lua_gettop(L) - n
}

unsafe extern "C-unwind" fn base_gcinfo(L: *mut lua_State) -> c_int {
    lua_pushinteger(L, lua_getgccount(L) as lua_Integer);
    1
}

unsafe extern "C-unwind" fn tab_getn(L: *mut lua_State) -> c_int {
    luaL_checktype(L, 1, LUA_TTABLE);
    lua_pushinteger(L, lua_objlen(L, 1) as lua_Integer);
    1
}

unsafe extern "C-unwind" fn tab_maxn(L: *mut lua_State) -> c_int {
    let mut max: lua_Number = 0.0;
    luaL_checktype(L, 1, LUA_TTABLE);
    lua_pushnil(L); // first key
    while lua_next(L, 1) != 0 {
        lua_pop(L, 1); // remove value
        if lua_type(L, -1) == LUA_TNUMBER {
            let v = lua_tonumber(L, -1);
            if v > max {
                max = v;
            }
        }
    }
    lua_pushnumber(L, max);
    1
}

unsafe extern "C-unwind" fn tab_foreach(L: *mut lua_State) -> c_int {
    luaL_checktype(L, 1, LUA_TTABLE);
    luaL_checktype(L, 2, LUA_TFUNCTION);
    lua_pushnil(L); // first key
    while lua_next(L, 1) != 0 {
        lua_pushvalue(L, 2); // function
        lua_pushvalue(L, -3); // key
        lua_pushvalue(L, -3); // value
        lua_call(L, 2, 1);
        if lua_isnil(L, -1) == 0 {
            return 1;
        }
        lua_pop(L, 2); // remove value and result
    }
    0
}

unsafe extern "C-unwind" fn tab_foreachi(L: *mut lua_State) -> c_int {
    luaL_checktype(L, 1, LUA_TTABLE);
    let n = lua_objlen(L, 1) as c_int;
    luaL_checktype(L, 2, LUA_TFUNCTION);
    for i in 1..=n {
        lua_pushvalue(L, 2); // function
        lua_pushinteger(L, i as lua_Integer); // 1st argument
        lua_rawgeti(L, 1, i); // 2nd argument
        lua_call(L, 2, 1);
        if lua_isnil(L, -1) == 0 {
            return 1;
        }
        lua_pop(L, 1); // remove nil result
    }
    0
}

unsafe extern "C-unwind" fn math_pow(L: *mut lua_State) -> c_int {
    lua_pushnumber(L, luaL_checknumber(L, 1).powf(luaL_checknumber(L, 2)));
    1
}

unsafe extern "C-unwind" fn math_log10(L: *mut lua_State) -> c_int {
    lua_pushnumber(L, luaL_checknumber(L, 1).log10());
    1
}

enum Compat {
    Func(lua_CFunction),
    /// Another field of the same table.
    Alias(*const c_char),
}

/// Sets the missing `fields` of the global table `table`, or of the globals for null.
unsafe fn install(L: *mut lua_State, table: *const c_char, fields: &[(*const c_char, Compat)]) {
    if table.is_null() {
        lua_pushvalue(L, LUA_GLOBALSINDEX);
    } else {
        lua_getglobal(L, table);
        if lua_istable(L, -1) == 0 {
            lua_pop(L, 1);
            return;
        }
    }
    for (name, compat) in fields {
        lua_getfield(L, -1, *name);
        let present = lua_isnil(L, -1) == 0;
        lua_pop(L, 1);
        if present {
            continue;
        }
        match compat {
            Compat::Func(f) => lua_pushcfunction(L, *f),
            Compat::Alias(other) => lua_getfield(L, -1, *other),
        }
        lua_setfield(L, -2, *name);
    }
    lua_pop(L, 1);
}

unsafe fn open_compat(L: *mut lua_State) {
    use Compat::*;

    install(
        L,
        std::ptr::null(),
        &[
            (cstr!("loadstring"), Func(base_loadstring)),
            (cstr!("gcinfo"), Func(base_gcinfo)),
            (cstr!("loadfile"), Func(base_loadfile)),
            (cstr!("dofile"), Func(base_dofile)),
        ],
    );
    // `unpack` moved into `table`
    lua_getglobal(L, cstr!("unpack"));
    if lua_isnil(L, -1) != 0 {
        lua_getglobal(L, LUA_TABLIBNAME);
        if lua_istable(L, -1) != 0 {
            lua_getfield(L, -1, cstr!("unpack"));
            lua_setglobal(L, cstr!("unpack"));
        }
        lua_pop(L, 1);
    }
    lua_pop(L, 1);

    install(
        L,
        LUA_TABLIBNAME,
        &[
            (cstr!("getn"), Func(tab_getn)),
            (cstr!("maxn"), Func(tab_maxn)),
            (cstr!("foreach"), Func(tab_foreach)),
            (cstr!("foreachi"), Func(tab_foreachi)),
        ],
    );
    install(
        L,
        LUA_MATHLIBNAME,
        &[
            (cstr!("mod"), Alias(cstr!("fmod"))),
            (cstr!("pow"), Func(math_pow)),
            (cstr!("log10"), Func(math_log10)),
        ],
    );
    install(L, LUA_STRLIBNAME, &[(cstr!("gfind"), Alias(cstr!("gmatch")))]);
}
