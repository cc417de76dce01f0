//! Loading chunks through the Luau compiler.

use std::ffi::CStr;
use std::mem;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;

use crate::buffer::{luaL_Buffer, luaL_addlstring, luaL_buffinit, luaL_pushresult};
use crate::lua::*;

/// Compiles and loads a buffer as a Lua chunk.
///
/// Precompiled chunks are rejected, bytecode produced by one Lua dialect cannot run on another.
pub unsafe fn luaL_loadbuffer(L: *mut lua_State, buff: *const c_char, sz: usize, name: *const c_char) -> c_int {
    unsafe extern "C" fn bytecode_dtor(_: *mut ffi::lua_State, data: *mut c_void) {
        libc::free(*(data as *mut *mut c_char) as *mut c_void);
    }

    if sz > 0 && *buff as u8 == LUA_SIGNATURE[0] {
        lua_pushliteral(L, c"attempt to load a binary chunk");
        return LUA_ERRSYNTAX;
    }
    let name = if name.is_null() { cstr!("?") } else { name };

    // Keep local and upvalue names for `lua_getlocal` and friends
    let mut options = ffi::lua_CompileOptions::default();
    options.debugLevel = 2;

    let mut size = 0;
    let data_ud = ffi::lua_newuserdatadtor(L, mem::size_of::<*mut c_char>(), bytecode_dtor) as *mut *mut c_char;
    let data = ffi::luau_compile(buff, sz, &mut options, &mut size);
    ptr::write(data_ud, data);
    load_bytecode(L, name, data, size)
}

/// Loads bytecode owned by the userdata on top of the stack, replacing the userdata with the
/// chunk or an error message.
unsafe fn load_bytecode(L: *mut lua_State, name: *const c_char, data: *const c_char, size: usize) -> c_int {
    if data.is_null() {
        ffi::lua_pop(L, 1);
        lua_pushliteral(L, c"not enough memory");
        return LUA_ERRMEM;
    }
    // The userdata frees the bytecode even if `luau_load` raises
    let status = ffi::luau_load(L, name, data, size, 0);
    ffi::lua_replace(L, -2);

    if status != 0 {
        if ffi::lua_isstring(L, -1) != 0 && CStr::from_ptr(ffi::lua_tostring(L, -1)) == c"not enough memory" {
            return LUA_ERRMEM;
        }
        return LUA_ERRSYNTAX;
    }
    LUA_OK
}

/// Loads a chunk delivered piecewise by `reader`.
pub unsafe fn lua_load(
    L: *mut lua_State,
    reader: lua_Reader,
    data: *mut c_void,
    chunkname: *const c_char,
) -> c_int {
    let mut b = luaL_Buffer::new();
    luaL_buffinit(L, &mut b);
    loop {
        let mut size = 0;
        let piece = reader(L, data, &mut size);
        if piece.is_null() || size == 0 {
            break;
        }
        luaL_addlstring(&mut b, piece, size);
    }
    luaL_pushresult(&mut b);

    let mut len = 0;
    let source = ffi::lua_tolstring(L, -1, &mut len);
    let status = luaL_loadbuffer(L, source, len, chunkname);
    ffi::lua_remove(L, -2);
    status
}

/// Luau has no bytecode writer for loaded functions, dumping always fails.
pub unsafe fn lua_dump(_L: *mut lua_State, _writer: lua_Writer, _data: *mut c_void) -> c_int {
    1
}
