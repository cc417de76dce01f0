#![allow(non_snake_case)]

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::slice;

use lua51_compat::*;

struct State(*mut lua_State);

impl State {
    fn new() -> Self {
        unsafe {
            let L = luaL_newstate();
            assert!(!L.is_null());
            State(L)
        }
    }
}

impl Drop for State {
    fn drop(&mut self) {
        unsafe { lua_close(self.0) }
    }
}

unsafe fn to_bytes(L: *mut lua_State, idx: c_int) -> Vec<u8> {
    let mut len = 0;
    let s = lua_tolstring(L, idx, &mut len);
    assert!(!s.is_null());
    slice::from_raw_parts(s as *const u8, len).to_vec()
}

#[test]
fn test_small_pieces() {
    let state = State::new();
    let L = state.0;
    unsafe {
        let mut b = luaL_Buffer::new();
        luaL_buffinit(L, &mut b);
        luaL_addlstring(&mut b, c"hel".as_ptr(), 3);
        luaL_addstring(&mut b, c"lo".as_ptr());
        luaL_addchar(&mut b, b',' as c_char);
        luaL_putchar(&mut b, b' ' as c_char);
        luaL_addlstring(&mut b, c"world!!!".as_ptr(), 5);
        luaL_pushresult(&mut b);

        assert_eq!(lua_gettop(L), 1);
        assert_eq!(to_bytes(L, -1), b"hello, world");
    }
}

#[test]
fn test_empty_buffer() {
    let state = State::new();
    let L = state.0;
    unsafe {
        let mut b = luaL_Buffer::default();
        luaL_buffinit(L, &mut b);
        luaL_pushresult(&mut b);
        assert_eq!(lua_gettop(L), 1);
        assert_eq!(lua_type(L, -1), LUA_TSTRING);
        assert_eq!(lua_objlen(L, -1), 0);
    }
}

#[test]
fn test_accumulation_across_flushes() {
    let state = State::new();
    let L = state.0;
    unsafe {
        let total = LUAL_BUFFERSIZE * 25 + 17;
        let expected = (0..total).map(|i| b'a' + (i % 26) as u8).collect::<Vec<_>>();

        let mut b = Box::new(luaL_Buffer::new());
        luaL_buffinit(L, &mut *b);
        for &c in &expected {
            luaL_addchar(&mut *b, c as c_char);
        }
        // Pending pieces are merged as they grow
        assert!(lua_gettop(L) <= LUA_MINSTACK / 2, "{} pieces on the stack", lua_gettop(L));
        luaL_pushresult(&mut *b);

        assert_eq!(lua_gettop(L), 1);
        assert_eq!(to_bytes(L, -1), expected);
    }
}

#[test]
fn test_large_strings() {
    let state = State::new();
    let L = state.0;
    unsafe {
        let chunk = vec![b'x'; LUAL_BUFFERSIZE * 2 + 3];
        let mut b = luaL_Buffer::new();
        luaL_buffinit(L, &mut b);
        luaL_addchar(&mut b, b'<' as c_char);
        luaL_addlstring(&mut b, chunk.as_ptr() as *const c_char, chunk.len());
        luaL_addchar(&mut b, b'>' as c_char);
        luaL_pushresult(&mut b);

        let result = to_bytes(L, -1);
        assert_eq!(result.len(), chunk.len() + 2);
        assert_eq!(result.first(), Some(&b'<'));
        assert_eq!(result.last(), Some(&b'>'));
        assert!(result[1..result.len() - 1].iter().all(|&c| c == b'x'));
    }
}

#[test]
fn test_addvalue() {
    let state = State::new();
    let L = state.0;
    unsafe {
        let large = vec![b'y'; LUAL_BUFFERSIZE + 100];

        let mut b = luaL_Buffer::new();
        luaL_buffinit(L, &mut b);
        luaL_addstring(&mut b, c"[".as_ptr());
        lua_pushinteger(L, 42);
        luaL_addvalue(&mut b);
        luaL_addstring(&mut b, c"|".as_ptr());
        // Does not fit into the scratch area
        lua_pushlstring(L, large.as_ptr() as *const c_char, large.len());
        luaL_addvalue(&mut b);
        luaL_addstring(&mut b, c"]".as_ptr());
        luaL_pushresult(&mut b);

        assert_eq!(lua_gettop(L), 1);
        let mut expected = b"[42|".to_vec();
        expected.extend_from_slice(&large);
        expected.push(b']');
        assert_eq!(to_bytes(L, -1), expected);
    }
}

#[test]
fn test_prepbuffer() {
    let state = State::new();
    let L = state.0;
    unsafe {
        let mut b = luaL_Buffer::new();
        luaL_buffinit(L, &mut b);
        luaL_addstring(&mut b, c"head:".as_ptr());

        let p = luaL_prepbuffer(&mut b);
        for (i, &c) in b"body".iter().enumerate() {
            *p.add(i) = c as c_char;
        }
        luaL_addsize(&mut b, 4);
        luaL_pushresult(&mut b);

        assert_eq!(to_bytes(L, -1), b"head:body");
    }
}

#[test]
fn test_stack_below_buffer_is_kept() {
    let state = State::new();
    let L = state.0;
    unsafe {
        lua_pushliteral(L, c"below");
        let mut b = luaL_Buffer::new();
        luaL_buffinit(L, &mut b);
        for _ in 0..LUAL_BUFFERSIZE * 3 {
            luaL_addchar(&mut b, b'z' as c_char);
        }
        luaL_pushresult(&mut b);

        assert_eq!(lua_gettop(L), 2);
        assert_eq!(to_bytes(L, 1), b"below");
        assert_eq!(lua_objlen(L, 2), LUAL_BUFFERSIZE * 3);
    }
}

#[test]
fn test_gsub() {
    let state = State::new();
    let L = state.0;
    unsafe {
        let s = luaL_gsub(L, c"a.b.c".as_ptr(), c".".as_ptr(), c"/".as_ptr());
        assert_eq!(CStr::from_ptr(s), c"a/b/c");

        let s = luaL_gsub(L, c"./?.lua;;".as_ptr(), c";;".as_ptr(), c";default;".as_ptr());
        assert_eq!(CStr::from_ptr(s), c"./?.lua;default;");

        let s = luaL_gsub(L, c"unchanged".as_ptr(), c"xyz".as_ptr(), c"!".as_ptr());
        assert_eq!(CStr::from_ptr(s), c"unchanged");

        let s = luaL_gsub(L, c"aaa".as_ptr(), c"a".as_ptr(), c"".as_ptr());
        assert_eq!(CStr::from_ptr(s), c"");

        assert_eq!(lua_gettop(L), 4);
    }
}
