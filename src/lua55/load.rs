use std::os::raw::{c_char, c_int, c_void};
use std::ptr;

use crate::lua::*;

/// Loads a buffer as a Lua chunk, text or precompiled.
pub unsafe fn luaL_loadbuffer(L: *mut lua_State, buff: *const c_char, sz: usize, name: *const c_char) -> c_int {
    ffi::luaL_loadbufferx(L, buff, sz, name, ptr::null())
}

pub unsafe fn lua_load(
    L: *mut lua_State,
    reader: lua_Reader,
    data: *mut c_void,
    chunkname: *const c_char,
) -> c_int {
    ffi::lua_load(L, reader, data, chunkname, ptr::null())
}

struct DumpState {
    writer: lua_Writer,
    data: *mut c_void,
}

unsafe extern "C-unwind" fn dump_trampoline(L: *mut lua_State, p: *const c_void, sz: usize, ud: *mut c_void) -> c_int {
    // Lua 5.5 ends a dump with an empty block, a 5.1 writer never sees one
    if p.is_null() || sz == 0 {
        return 0;
    }
    let state = &*(ud as *const DumpState);
    (state.writer)(L, p, sz, state.data)
}

/// Dumps the function on top of the stack as a binary chunk through `writer`.
pub unsafe fn lua_dump(L: *mut lua_State, writer: lua_Writer, data: *mut c_void) -> c_int {
    let mut state = DumpState { writer, data };
    ffi::lua_dump(L, dump_trampoline, &mut state as *mut DumpState as *mut c_void, 0)
}
