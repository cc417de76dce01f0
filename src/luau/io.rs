//! Minimal `io` library for Luau: only `io.write` to the standard output.

use std::io::{self, Write};
use std::os::raw::{c_char, c_int};
use std::slice;

use crate::lauxlib::*;
use crate::lua::*;

unsafe extern "C-unwind" fn io_write(L: *mut lua_State) -> c_int {
    let nargs = lua_gettop(L);
    // Convert everything first, writing must not be interrupted by a Lua error
    for arg in 1..=nargs {
        luaL_checklstring(L, arg, std::ptr::null_mut());
    }

    let result = {
        let mut out = io::stdout().lock();
        (1..=nargs)
            .try_for_each(|arg| {
                let mut len = 0;
                let s = lua_tolstring(L, arg, &mut len);
                out.write_all(slice::from_raw_parts(s as *const u8, len))
            })
            .and_then(|_| out.flush())
    };

    match result {
        Ok(()) => {
            lua_getglobal(L, cstr!("io"));
            1
        }
        Err(err) => {
            let errno = err.raw_os_error().unwrap_or(libc::EIO);
            drop(err);
            lua_pushnil(L);
            lua_pushstring(L, libc::strerror(errno) as *const c_char);
            lua_pushinteger(L, errno as lua_Integer);
            3
        }
    }
}

/// Opens the `io` library. Leaves `io` on the stack.
pub unsafe extern "C-unwind" fn luaopen_io(L: *mut lua_State) -> c_int {
    let funcs = [
        luaL_Reg {
            name: cstr!("write"),
            func: Some(io_write),
        },
        luaL_Reg {
            name: std::ptr::null(),
            func: None,
        },
    ];
    luaL_register(L, cstr!("io"), funcs.as_ptr());
    1
}
