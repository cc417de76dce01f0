#![allow(non_snake_case)]

use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;

use lua51_compat::*;

struct State(*mut lua_State);

impl State {
    fn new() -> Self {
        unsafe {
            let L = luaL_newstate();
            assert!(!L.is_null());
            luaL_openlibs(L);
            State(L)
        }
    }
}

impl Drop for State {
    fn drop(&mut self) {
        unsafe { lua_close(self.0) }
    }
}

unsafe fn to_string(L: *mut lua_State, idx: c_int) -> String {
    let s = lua_tostring(L, idx);
    assert!(!s.is_null(), "value at {idx} is not a string");
    CStr::from_ptr(s).to_string_lossy().into_owned()
}

unsafe fn run(L: *mut lua_State, code: &CStr) {
    if luaL_dostring(L, code.as_ptr()) != 0 {
        panic!("{}", to_string(L, -1));
    }
}

#[test]
fn test_stack_manipulation() {
    let state = State::new();
    let L = state.0;
    unsafe {
        assert_eq!(lua_gettop(L), 0);
        for i in 1..=5 {
            lua_pushinteger(L, i);
        }
        assert_eq!(lua_gettop(L), 5);

        // 1 2 3 4 5 -> 1 5 2 3 4
        lua_insert(L, 2);
        assert_eq!(lua_tointeger(L, 2), 5);
        assert_eq!(lua_tointeger(L, -1), 4);

        // 1 5 2 3 4 -> 1 2 3 4
        lua_remove(L, 2);
        assert_eq!(lua_gettop(L), 4);
        assert_eq!(lua_tointeger(L, 2), 2);

        // 1 2 3 4 -> 1 4 3
        lua_replace(L, 2);
        assert_eq!(lua_gettop(L), 3);
        assert_eq!(lua_tointeger(L, 2), 4);

        lua_pushvalue(L, 1);
        assert_eq!(lua_tointeger(L, -1), 1);

        lua_settop(L, 6);
        assert_eq!(lua_gettop(L), 6);
        assert_eq!(lua_isnil(L, 6), 1);

        assert_eq!(lua_checkstack(L, 1000), 1);
        lua_settop(L, 0);
        assert_eq!(lua_gettop(L), 0);
    }
}

#[test]
fn test_type_tags() {
    let state = State::new();
    let L = state.0;
    unsafe {
        lua_pushnil(L);
        lua_pushboolean(L, 0);
        lua_pushlightuserdata(L, ptr::null_mut());
        lua_pushnumber(L, 1.0);
        lua_pushliteral(L, c"s");
        lua_newtable(L);
        lua_getglobal(L, c"print".as_ptr());
        lua_newuserdata(L, 8);
        lua_newthread(L);

        let expected = [
            (LUA_TNIL, "nil"),
            (LUA_TBOOLEAN, "boolean"),
            (LUA_TLIGHTUSERDATA, "userdata"),
            (LUA_TNUMBER, "number"),
            (LUA_TSTRING, "string"),
            (LUA_TTABLE, "table"),
            (LUA_TFUNCTION, "function"),
            (LUA_TUSERDATA, "userdata"),
            (LUA_TTHREAD, "thread"),
        ];
        for (i, (tag, name)) in expected.into_iter().enumerate() {
            let idx = i as c_int + 1;
            assert_eq!(lua_type(L, idx), tag, "type of value {idx}");
            assert_eq!(CStr::from_ptr(luaL_typename(L, idx)).to_str().unwrap(), name);
        }

        assert_eq!(lua_type(L, 15), LUA_TNONE);
        assert_eq!(CStr::from_ptr(lua_typename(L, LUA_TNONE)), c"no value");
        assert_eq!(lua_isnone(L, 15), 1);
        assert_eq!(lua_isnoneornil(L, 1), 1);
        assert_eq!(lua_isnoneornil(L, 2), 0);
    }
}

#[test]
fn test_conversions() {
    let state = State::new();
    let L = state.0;
    unsafe {
        lua_pushnumber(L, 3.9);
        assert_eq!(lua_tointeger(L, -1), 3);
        lua_pushnumber(L, -3.9);
        assert_eq!(lua_tointeger(L, -1), -3);
        lua_pushinteger(L, 1 << 40);
        assert_eq!(lua_tointeger(L, -1), 1 << 40);

        lua_pushliteral(L, c"10");
        assert_eq!(lua_isnumber(L, -1), 1);
        assert_eq!(lua_tonumber(L, -1), 10.0);
        assert_eq!(lua_tointeger(L, -1), 10);

        lua_pushliteral(L, c"abc");
        assert_eq!(lua_isnumber(L, -1), 0);
        assert_eq!(lua_tonumber(L, -1), 0.0);
        assert_eq!(lua_tointeger(L, -1), 0);

        // Numbers are strings, but not the other way around
        lua_pushinteger(L, 12);
        assert_eq!(lua_isstring(L, -1), 1);
        assert_eq!(lua_objlen(L, -1), 2);
        assert_eq!(lua_type(L, -1), LUA_TSTRING);

        lua_pushboolean(L, 1);
        assert_eq!(lua_isstring(L, -1), 0);
        assert!(lua_tostring(L, -1).is_null());

        let mut len = 0;
        let bytes = b"a\0b";
        lua_pushlstring(L, bytes.as_ptr() as *const c_char, bytes.len());
        let s = lua_tolstring(L, -1, &mut len);
        assert_eq!(len, 3);
        assert_eq!(*s.add(2) as u8, b'b');
        assert_eq!(lua_objlen(L, -1), 3);

        lua_pushlstring(L, ptr::null(), 0);
        assert_eq!(lua_objlen(L, -1), 0);
        lua_pushstring(L, ptr::null());
        assert_eq!(lua_isnil(L, -1), 1);
    }
}

#[test]
fn test_compare() {
    let state = State::new();
    let L = state.0;
    unsafe {
        lua_pushnumber(L, 1.0);
        lua_pushnumber(L, 2.0);
        lua_pushnumber(L, 2.0);
        assert_eq!(lua_lessthan(L, 1, 2), 1);
        assert_eq!(lua_lessthan(L, 2, 1), 0);
        assert_eq!(lua_equal(L, 2, 3), 1);
        assert_eq!(lua_rawequal(L, 1, 3), 0);
        // Invalid indices compare unequal
        assert_eq!(lua_equal(L, 1, 10), 0);
        assert_eq!(lua_rawequal(L, 10, 11), 0);
        lua_settop(L, 0);

        run(
            L,
            c"
            local mt = { __eq = function() return true end, __lt = function() return true end }
            a, b = setmetatable({}, mt), setmetatable({}, mt)
            ",
        );
        lua_getglobal(L, c"a".as_ptr());
        lua_getglobal(L, c"b".as_ptr());
        assert_eq!(lua_equal(L, 1, 2), 1);
        assert_eq!(lua_rawequal(L, 1, 2), 0);
        assert_eq!(lua_lessthan(L, 1, 2), 1);
    }
}

#[test]
fn test_tables() {
    let state = State::new();
    let L = state.0;
    unsafe {
        lua_createtable(L, 4, 2);
        for i in 1..=4 {
            lua_pushinteger(L, i as lua_Integer * 10);
            lua_rawseti(L, 1, i);
        }
        assert_eq!(lua_objlen(L, 1), 4);

        lua_pushliteral(L, c"x");
        lua_pushinteger(L, 7);
        lua_settable(L, 1);
        lua_getfield(L, 1, c"x".as_ptr());
        assert_eq!(lua_tointeger(L, -1), 7);
        lua_pop(L, 1);

        lua_pushliteral(L, c"y");
        lua_pushboolean(L, 1);
        lua_rawset(L, 1);
        lua_pushliteral(L, c"y");
        lua_gettable(L, 1);
        assert_eq!(lua_toboolean(L, -1), 1);
        lua_pop(L, 1);

        lua_rawgeti(L, 1, 3);
        assert_eq!(lua_tointeger(L, -1), 30);
        lua_pop(L, 1);

        let mut keys = 0;
        lua_pushnil(L);
        while lua_next(L, 1) != 0 {
            keys += 1;
            lua_pop(L, 1);
        }
        assert_eq!(keys, 6);
        assert_eq!(lua_gettop(L), 1);
    }
}

#[test]
fn test_metatables() {
    let state = State::new();
    let L = state.0;
    unsafe {
        lua_newtable(L);
        assert_eq!(lua_getmetatable(L, 1), 0);
        assert_eq!(lua_gettop(L), 1);

        lua_newtable(L);
        lua_newtable(L);
        lua_pushliteral(L, c"fallback");
        lua_setfield(L, -2, c"anything".as_ptr());
        lua_setfield(L, -2, c"__index".as_ptr());
        assert_eq!(lua_setmetatable(L, 1), 1);

        lua_getfield(L, 1, c"anything".as_ptr());
        assert_eq!(to_string(L, -1), "fallback");
        lua_pop(L, 1);

        // Raw access skips `__index`
        lua_pushliteral(L, c"anything");
        lua_rawget(L, 1);
        assert_eq!(lua_isnil(L, -1), 1);
        lua_pop(L, 1);

        assert_eq!(lua_getmetatable(L, 1), 1);
        lua_getfield(L, -1, c"__index".as_ptr());
        assert_eq!(lua_istable(L, -1), 1);
    }
}

#[test]
fn test_userdata() {
    let state = State::new();
    let L = state.0;
    unsafe {
        let ud = lua_newuserdata(L, 16) as *mut u64;
        *ud = 0xDEADBEEF;
        *ud.add(1) = 1;
        assert_eq!(lua_isuserdata(L, -1), 1);
        assert_eq!(lua_touserdata(L, -1), ud as *mut c_void);
        assert_eq!(lua_objlen(L, -1), 16);
        assert_eq!(lua_topointer(L, -1), ud as *const c_void);

        lua_pushlightuserdata(L, 42 as *mut c_void);
        assert_eq!(lua_isuserdata(L, -1), 1);
        assert_eq!(lua_touserdata(L, -1), 42 as *mut c_void);
    }
}

// Luau userdata carry no environment
#[cfg(feature = "lua55")]
#[test]
fn test_userdata_environment() {
    let state = State::new();
    let L = state.0;
    unsafe {
        lua_newuserdata(L, 4);
        lua_newtable(L);
        lua_pushinteger(L, 5);
        lua_setfield(L, -2, c"tag".as_ptr());
        assert_eq!(lua_setfenv(L, 1), 1);
        assert_eq!(lua_gettop(L), 1);

        lua_getfenv(L, 1);
        assert_eq!(lua_istable(L, -1), 1);
        lua_getfield(L, -1, c"tag".as_ptr());
        assert_eq!(lua_tointeger(L, -1), 5);
    }
}

#[test]
fn test_function_environment() {
    let state = State::new();
    let L = state.0;
    unsafe {
        assert_eq!(luaL_loadstring(L, c"return x".as_ptr()), 0);
        lua_newtable(L);
        lua_pushinteger(L, 5);
        lua_setfield(L, -2, c"x".as_ptr());
        assert_eq!(lua_setfenv(L, 1), 1);

        lua_getfenv(L, 1);
        lua_getfield(L, -1, c"x".as_ptr());
        assert_eq!(lua_tointeger(L, -1), 5);
        lua_pop(L, 2);

        lua_call(L, 0, 1);
        assert_eq!(lua_tointeger(L, -1), 5);
    }
}

unsafe extern "C-unwind" fn add(L: *mut lua_State) -> c_int {
    let a = luaL_checknumber(L, 1);
    let b = luaL_checknumber(L, 2);
    lua_pushnumber(L, a + b);
    1
}

unsafe extern "C-unwind" fn raise(L: *mut lua_State) -> c_int {
    lua_pushliteral(L, c"raised");
    lua_error(L)
}

unsafe extern "C-unwind" fn traceback(L: *mut lua_State) -> c_int {
    lua_pushfstring(L, c"handled: %s".as_ptr(), lua_tostring(L, 1));
    1
}

unsafe extern "C-unwind" fn count_args(L: *mut lua_State) -> c_int {
    let n = lua_gettop(L);
    for i in 1..=n {
        lua_pushinteger(L, i as lua_Integer);
    }
    n
}

#[test]
fn test_call_and_pcall() {
    let state = State::new();
    let L = state.0;
    unsafe {
        lua_pushcfunction(L, add);
        lua_pushnumber(L, 1.5);
        lua_pushnumber(L, 2.0);
        lua_call(L, 2, 1);
        assert_eq!(lua_tonumber(L, -1), 3.5);
        lua_pop(L, 1);

        lua_pushcfunction(L, count_args);
        lua_pushnil(L);
        lua_pushnil(L);
        lua_pushnil(L);
        lua_call(L, 3, LUA_MULTRET);
        assert_eq!(lua_gettop(L), 3);
        lua_settop(L, 0);

        lua_pushcfunction(L, raise);
        assert_eq!(lua_pcall(L, 0, 0, 0), LUA_ERRRUN);
        assert_eq!(to_string(L, -1), "raised");
        lua_pop(L, 1);

        // Error handler
        lua_pushcfunction(L, traceback);
        lua_pushcfunction(L, raise);
        assert_eq!(lua_pcall(L, 0, 0, 1), LUA_ERRRUN);
        assert_eq!(to_string(L, -1), "handled: raised");
        lua_settop(L, 0);

        // Argument errors follow the Lua 5.1 wording
        lua_register(L, c"add".as_ptr(), add);
        assert_eq!(luaL_loadstring(L, c"return add(1, {})".as_ptr()), 0);
        assert_eq!(lua_pcall(L, 0, 1, 0), LUA_ERRRUN);
        let msg = to_string(L, -1);
        assert!(msg.contains("bad argument #2"), "{msg}");
        assert!(msg.contains("number expected, got table"), "{msg}");
        lua_pop(L, 1);

        assert_eq!(luaL_loadstring(L, c"error({})".as_ptr()), 0);
        assert_eq!(Status::try_from(lua_pcall(L, 0, 0, 0)), Ok(Status::RuntimeError));
        assert_eq!(lua_istable(L, -1), 1);
    }
}

unsafe extern "C-unwind" fn write_marker(L: *mut lua_State) -> c_int {
    let data = lua_touserdata(L, 1) as *mut c_int;
    *data = 7;
    lua_pushliteral(L, c"ignored");
    1
}

#[test]
fn test_cpcall() {
    let state = State::new();
    let L = state.0;
    unsafe {
        let mut data: c_int = 0;
        let status = lua_cpcall(L, write_marker, &mut data as *mut c_int as *mut c_void);
        assert_eq!(status, 0);
        assert_eq!(data, 7);
        assert_eq!(lua_gettop(L), 0);

        assert_eq!(lua_cpcall(L, raise, ptr::null_mut()), LUA_ERRRUN);
        assert_eq!(to_string(L, -1), "raised");
    }
}

#[test]
fn test_concat() {
    let state = State::new();
    let L = state.0;
    unsafe {
        lua_pushliteral(L, c"a");
        lua_pushinteger(L, 1);
        lua_pushliteral(L, c"b");
        lua_concat(L, 3);
        assert_eq!(lua_gettop(L), 1);
        assert_eq!(to_string(L, 1), "a1b");

        lua_concat(L, 1);
        assert_eq!(to_string(L, 1), "a1b");

        lua_concat(L, 0);
        assert_eq!(lua_gettop(L), 2);
        assert_eq!(to_string(L, 2), "");
    }
}

#[test]
fn test_pushfstring() {
    let state = State::new();
    let L = state.0;
    unsafe {
        let s = lua_pushfstring(L, c"%s=%d%%".as_ptr(), c"x".as_ptr(), 42 as c_int);
        assert_eq!(CStr::from_ptr(s), c"x=42%");
        assert_eq!(to_string(L, -1), "x=42%");
    }
}

#[test]
fn test_threads() {
    let state = State::new();
    let L = state.0;
    unsafe {
        let L1 = lua_newthread(L);
        assert_eq!(lua_tothread(L, -1), L1);
        assert_eq!(lua_status(L1), 0);

        // Threads share globals
        lua_pushinteger(L1, 99);
        lua_setglobal(L1, c"shared".as_ptr());
        lua_getglobal(L, c"shared".as_ptr());
        assert_eq!(lua_tointeger(L, -1), 99);
        lua_pop(L, 1);

        lua_pushinteger(L, 1);
        lua_pushinteger(L, 2);
        lua_xmove(L, L1, 2);
        assert_eq!(lua_gettop(L1), 2);
        assert_eq!(lua_tointeger(L1, -1), 2);
        lua_settop(L1, 0);

        assert_eq!(lua_pushthread(L1), 0);
        assert_eq!(lua_pushthread(L), 1);
    }
}

#[test]
fn test_resume_yield() {
    let state = State::new();
    let L = state.0;
    unsafe {
        let L1 = lua_newthread(L);
        let code = c"local a = ... ; local b = coroutine.yield(a + 1) ; return b * 2";
        assert_eq!(luaL_loadstring(L1, code.as_ptr()), 0);

        lua_pushinteger(L1, 10);
        assert_eq!(lua_resume(L1, 1), LUA_YIELD);
        assert_eq!(lua_status(L1), LUA_YIELD);
        assert_eq!(lua_tointeger(L1, -1), 11);

        lua_pop(L1, 1);
        lua_pushinteger(L1, 5);
        assert_eq!(lua_resume(L1, 1), 0);
        assert_eq!(lua_status(L1), 0);
        assert_eq!(lua_tointeger(L1, -1), 10);
    }
}

unsafe extern "C-unwind" fn yield_twice(L: *mut lua_State) -> c_int {
    lua_pushinteger(L, 1);
    lua_pushinteger(L, 2);
    lua_yield(L, 2)
}

#[test]
fn test_yield_from_c() {
    let state = State::new();
    let L = state.0;
    unsafe {
        let L1 = lua_newthread(L);
        lua_pushcfunction(L1, yield_twice);
        assert_eq!(lua_resume(L1, 0), LUA_YIELD);
        assert_eq!(lua_tointeger(L1, -2), 1);
        assert_eq!(lua_tointeger(L1, -1), 2);
    }
}

#[test]
fn test_gc() {
    let state = State::new();
    let L = state.0;
    unsafe {
        lua_gc(L, LUA_GCSTOP, 0);
        run(L, c"local t = {} for i = 1, 10000 do t[i] = {} end");
        let before = lua_getgccount(L);
        assert!(before > 0);
        lua_gc(L, LUA_GCRESTART, 0);
        lua_gc(L, LUA_GCCOLLECT, 0);
        assert!(lua_gc(L, LUA_GCCOUNT, 0) < before);

        let bytes = lua_gc(L, LUA_GCCOUNTB, 0);
        assert!((0..1024).contains(&bytes));

        lua_gc(L, LUA_GCSTEP, 0);
        assert!(lua_gc(L, LUA_GCSETPAUSE, 200) >= 0);
        assert!(lua_gc(L, LUA_GCSETSTEPMUL, 200) >= 0);
        assert_eq!(lua_gc(L, 100, 0), -1);
    }
}

unsafe extern "C-unwind" fn reference(L: *mut lua_State) -> c_int {
    lua_pushinteger(L, 1);
    1
}

#[test]
fn test_cfunctions() {
    let state = State::new();
    let L = state.0;
    unsafe {
        lua_pushcfunction(L, reference);
        assert_eq!(lua_iscfunction(L, -1), 1);
        assert_eq!(lua_tocfunction(L, -1).map(|f| f as usize), Some(reference as usize));

        assert_eq!(luaL_loadstring(L, c"return 1".as_ptr()), 0);
        assert_eq!(lua_isfunction(L, -1), 1);
        assert_eq!(lua_iscfunction(L, -1), 0);
        assert!(lua_tocfunction(L, -1).is_none());
    }
}

#[test]
fn test_allocator() {
    let state = State::new();
    let L = state.0;
    unsafe {
        let mut ud = ptr::null_mut();
        let f = lua_getallocf(L, &mut ud);
        lua_setallocf(L, f, ud);
        let mut ud2 = ptr::null_mut();
        let f2 = lua_getallocf(L, &mut ud2);
        assert_eq!(f as usize, f2 as usize);
        assert_eq!(ud, ud2);
    }
}

#[test]
fn test_atpanic() {
    unsafe extern "C-unwind" fn on_panic(_L: *mut lua_State) -> c_int {
        0
    }

    let state = State::new();
    let L = state.0;
    unsafe {
        let first = lua_atpanic(L, Some(on_panic));
        let second = lua_atpanic(L, first);
        assert_eq!(second.map(|f| f as usize), Some(on_panic as usize));
    }
}

#[test]
fn test_open() {
    unsafe {
        let L = lua_open();
        assert!(!L.is_null());
        lua_pushinteger(L, 1);
        assert_eq!(lua_gettop(L), 1);
        lua_close(L);
    }
}
