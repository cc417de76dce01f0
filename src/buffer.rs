//! String buffers (`luaL_Buffer`).
//!
//! Bytes accumulate in a scratch array inside the buffer. Full arrays are flushed to the Lua
//! stack as strings, and adjacent pieces are concatenated as they grow so only a handful stay
//! on the stack at once.
//!
//! A buffer points into itself after [`luaL_buffinit`], so it must not move until
//! [`luaL_pushresult`]. While a buffer is in use the caller must keep the stack balanced above
//! the pieces it owns.

use std::os::raw::{c_char, c_int};
use std::ptr;

use crate::lua::{lua_State, lua_concat, lua_insert, lua_pop, lua_pushlstring, lua_strlen, lua_tolstring};
use crate::lua::LUA_MINSTACK;

/// Size of the scratch array of a [`luaL_Buffer`].
pub const LUAL_BUFFERSIZE: usize = 8192;

// Pieces on the stack beyond which they are always merged
const LIMIT: c_int = LUA_MINSTACK / 2;

#[repr(C)]
pub struct luaL_Buffer {
    /// Current position in `buffer`.
    pub p: *mut c_char,
    /// Number of string pieces on the stack.
    pub lvl: c_int,
    pub L: *mut lua_State,
    pub buffer: [c_char; LUAL_BUFFERSIZE],
}

impl luaL_Buffer {
    /// Returns an uninitialized buffer, to be set up with [`luaL_buffinit`] once in place.
    pub const fn new() -> Self {
        luaL_Buffer {
            p: ptr::null_mut(),
            lvl: 0,
            L: ptr::null_mut(),
            buffer: [0; LUAL_BUFFERSIZE],
        }
    }

    #[inline(always)]
    fn len(&self) -> usize {
        (self.p as usize).wrapping_sub(self.buffer.as_ptr() as usize)
    }

    #[inline(always)]
    fn free(&self) -> usize {
        LUAL_BUFFERSIZE - self.len()
    }
}

impl Default for luaL_Buffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Flushes the scratch array to the stack. Returns 1 if a piece was pushed.
unsafe fn emptybuffer(B: &mut luaL_Buffer) -> c_int {
    let l = B.len();
    if l == 0 {
        return 0;
    }
    lua_pushlstring(B.L, B.buffer.as_ptr(), l);
    B.p = B.buffer.as_mut_ptr();
    B.lvl += 1;
    1
}

/// Merges stack pieces while the lower one is not longer than the pieces above it.
unsafe fn adjuststack(B: &mut luaL_Buffer) {
    if B.lvl <= 1 {
        return;
    }
    let L = B.L;
    let mut toget = 1; // number of levels to concat
    let mut toplen = lua_strlen(L, -1);
    loop {
        let l = lua_strlen(L, -(toget + 1));
        if B.lvl - toget + 1 >= LIMIT || toplen > l {
            toplen += l;
            toget += 1;
        } else {
            break;
        }
        if toget >= B.lvl {
            break;
        }
    }
    lua_concat(L, toget);
    B.lvl = B.lvl - toget + 1;
}

pub unsafe fn luaL_buffinit(L: *mut lua_State, B: *mut luaL_Buffer) {
    let B = &mut *B;
    B.L = L;
    B.p = B.buffer.as_mut_ptr();
    B.lvl = 0;
}

/// Returns a scratch area of [`LUAL_BUFFERSIZE`] bytes to write into, to be committed with
/// [`luaL_addsize`].
pub unsafe fn luaL_prepbuffer(B: *mut luaL_Buffer) -> *mut c_char {
    let B = &mut *B;
    if emptybuffer(B) != 0 {
        adjuststack(B);
    }
    B.buffer.as_mut_ptr()
}

#[inline(always)]
pub unsafe fn luaL_addsize(B: *mut luaL_Buffer, n: usize) {
    compat_debug_assert!(n <= (*B).free(), "buffer size overflows the scratch array");
    (*B).p = (*B).p.add(n);
}

#[inline(always)]
pub unsafe fn luaL_addchar(B: *mut luaL_Buffer, c: c_char) {
    if (*B).free() == 0 {
        luaL_prepbuffer(B);
    }
    *(*B).p = c;
    (*B).p = (*B).p.add(1);
}

#[inline(always)]
pub unsafe fn luaL_putchar(B: *mut luaL_Buffer, c: c_char) {
    luaL_addchar(B, c)
}

pub unsafe fn luaL_addlstring(B: *mut luaL_Buffer, mut s: *const c_char, mut l: usize) {
    while l > 0 {
        if (*B).free() == 0 {
            luaL_prepbuffer(B);
        }
        let n = l.min((*B).free());
        ptr::copy_nonoverlapping(s, (*B).p, n);
        (*B).p = (*B).p.add(n);
        s = s.add(n);
        l -= n;
    }
}

pub unsafe fn luaL_addstring(B: *mut luaL_Buffer, s: *const c_char) {
    luaL_addlstring(B, s, libc::strlen(s))
}

/// Adds the value on top of the stack to the buffer, popping it.
pub unsafe fn luaL_addvalue(B: *mut luaL_Buffer) {
    let B = &mut *B;
    let L = B.L;
    let mut vl = 0;
    let s = lua_tolstring(L, -1, &mut vl);
    if vl <= B.free() {
        // fits into the scratch array
        ptr::copy_nonoverlapping(s, B.p, vl);
        B.p = B.p.add(vl);
        lua_pop(L, 1);
    } else {
        if emptybuffer(B) != 0 {
            lua_insert(L, -2); // put buffer before new value
        }
        B.lvl += 1;
        adjuststack(B);
    }
}

/// Leaves the accumulated string on top of the stack.
pub unsafe fn luaL_pushresult(B: *mut luaL_Buffer) {
    let B = &mut *B;
    emptybuffer(B);
    lua_concat(B.L, B.lvl);
    B.lvl = 1;
}
