//! Runs a battery of Lua 5.1 C API exercises against the selected backend, then any Lua
//! scripts given on the command line.
//!
//! Exits with status 1 when a case or a script fails.

#![allow(non_snake_case)]

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_long, c_void};
use std::process::ExitCode;
use std::ptr;

use lua51_compat::*;

macro_rules! cstr {
    ($s:expr) => {
        concat!($s, "\0").as_ptr() as *const c_char
    };
}

macro_rules! ensure {
    ($cond:expr) => {
        if !$cond {
            return false;
        }
    };
}

unsafe fn to_str<'a>(L: *mut lua_State, idx: c_int) -> Option<&'a [u8]> {
    let s = lua_tostring(L, idx);
    (!s.is_null()).then(|| CStr::from_ptr(s).to_bytes())
}

/// Pops an error message and prints it inline.
unsafe fn report(L: *mut lua_State) {
    let msg = to_str(L, -1).map(String::from_utf8_lossy).unwrap_or_default();
    print!("({msg}) ");
    lua_pop(L, 1);
}

unsafe extern "C-unwind" fn panic_handler(L: *mut lua_State) -> c_int {
    let msg = to_str(L, -1).map(String::from_utf8_lossy);
    eprintln!("PANIC: {}", msg.as_deref().unwrap_or("(null)"));
    0
}

unsafe extern "C-unwind" fn answer(L: *mut lua_State) -> c_int {
    lua_pushnumber(L, 42.0);
    1
}

unsafe extern "C-unwind" fn greeting(L: *mut lua_State) -> c_int {
    lua_pushstring(L, cstr!("hello from C"));
    1
}

unsafe extern "C-unwind" fn failing(L: *mut lua_State) -> c_int {
    luaL_error(L, cstr!("intentional error"))
}

unsafe extern "C-unwind" fn store_marker(L: *mut lua_State) -> c_int {
    let data = lua_touserdata(L, 1) as *mut c_int;
    *data = 12345;
    0
}

unsafe extern "C-unwind" fn noop_hook(_L: *mut lua_State, _ar: *mut lua_Debug) {}

//
// State manipulation
//

unsafe fn atpanic(L: *mut lua_State) -> bool {
    let old = lua_atpanic(L, Some(panic_handler));
    lua_atpanic(L, old.or(Some(panic_handler)));
    true
}

unsafe fn newthread(L: *mut lua_State) -> bool {
    let L1 = lua_newthread(L);
    ensure!(!L1.is_null());
    ensure!(lua_isthread(L, -1) != 0);
    lua_pop(L, 1);
    true
}

//
// Stack manipulation
//

unsafe fn stack_ops(L: *mut lua_State) -> bool {
    let top = lua_gettop(L);
    lua_pushnumber(L, 1.0);
    lua_pushnumber(L, 2.0);
    lua_pushnumber(L, 3.0);
    ensure!(lua_gettop(L) == top + 3);

    lua_pushvalue(L, -1);
    ensure!(lua_tonumber(L, -1) == 3.0);
    lua_pop(L, 1);

    lua_remove(L, -2);
    ensure!(lua_tonumber(L, -1) == 3.0);
    ensure!(lua_tonumber(L, -2) == 1.0);

    lua_pushnil(L);
    lua_insert(L, -2);
    ensure!(lua_isnil(L, -2) != 0);

    lua_pushnumber(L, 99.0);
    lua_replace(L, -2);
    ensure!(lua_tonumber(L, -1) == 99.0);

    ensure!(lua_checkstack(L, 100) != 0);

    lua_settop(L, top);
    true
}

//
// Access functions
//

unsafe fn type_checks(L: *mut lua_State) -> bool {
    lua_pushnil(L);
    ensure!(lua_type(L, -1) == LUA_TNIL);
    ensure!(lua_isnil(L, -1) != 0);
    lua_pop(L, 1);

    lua_pushnumber(L, 3.14);
    ensure!(lua_isnumber(L, -1) != 0);
    ensure!(lua_tonumber(L, -1) == 3.14);
    ensure!(lua_tointeger(L, -1) == 3);
    lua_pop(L, 1);

    lua_pushstring(L, cstr!("test"));
    ensure!(lua_isstring(L, -1) != 0);
    ensure!(lua_type(L, -1) == LUA_TSTRING);
    let mut len = 0;
    let s = lua_tolstring(L, -1, &mut len);
    ensure!(len == 4 && CStr::from_ptr(s).to_bytes() == b"test");
    lua_pop(L, 1);

    lua_pushcfunction(L, answer);
    ensure!(lua_iscfunction(L, -1) != 0);
    ensure!(lua_isfunction(L, -1) != 0);
    ensure!(lua_tocfunction(L, -1) == Some(answer as lua_CFunction));
    lua_pop(L, 1);

    lua_pushboolean(L, 1);
    ensure!(lua_isboolean(L, -1) != 0);
    ensure!(lua_toboolean(L, -1) != 0);
    lua_pop(L, 1);

    lua_pushinteger(L, 42);
    ensure!(lua_tointeger(L, -1) == 42);
    lua_pop(L, 1);

    lua_pushlightuserdata(L, 0xDEAD as *mut c_void);
    ensure!(lua_islightuserdata(L, -1) != 0);
    ensure!(lua_touserdata(L, -1) == 0xDEAD as *mut c_void);
    lua_pop(L, 1);

    lua_pushthread(L);
    ensure!(lua_isthread(L, -1) != 0);
    ensure!(lua_tothread(L, -1) == L);
    lua_pop(L, 1);

    ensure!(lua_isnone(L, 100) != 0);
    ensure!(lua_isnoneornil(L, 100) != 0);

    lua_pushstring(L, cstr!("typename"));
    let tn = lua_typename(L, lua_type(L, -1));
    ensure!(CStr::from_ptr(tn).to_bytes() == b"string");
    lua_pop(L, 1);

    true
}

unsafe fn rawequal(L: *mut lua_State) -> bool {
    lua_pushnumber(L, 10.0);
    lua_pushnumber(L, 10.0);
    let equal = lua_rawequal(L, -1, -2) != 0;
    lua_pop(L, 2);
    equal
}

unsafe fn objlen(L: *mut lua_State) -> bool {
    lua_pushstring(L, cstr!("hello"));
    let len = lua_objlen(L, -1);
    lua_pop(L, 1);
    len == 5
}

unsafe fn topointer(L: *mut lua_State) -> bool {
    lua_newtable(L);
    let p = lua_topointer(L, -1);
    lua_pop(L, 1);
    !p.is_null()
}

//
// Push functions
//

unsafe fn push_functions(L: *mut lua_State) -> bool {
    lua_pushnil(L);
    lua_pushnumber(L, 1.5);
    lua_pushinteger(L, 10);
    lua_pushlstring(L, cstr!("abc\0def"), 7);
    lua_pushstring(L, cstr!("hello"));
    lua_pushboolean(L, 0);
    lua_pushlightuserdata(L, ptr::null_mut());
    lua_pushliteral(L, c"literal");
    let mut len = 0;
    lua_tolstring(L, -5, &mut len);
    ensure!(len == 7);
    lua_pop(L, 8);

    lua_pushfstring(L, cstr!("num=%d str=%s"), 42 as c_int, cstr!("test"));
    ensure!(to_str(L, -1) == Some(b"num=42 str=test".as_slice()));
    lua_pop(L, 1);

    lua_pushcclosure(L, answer, 0);
    ensure!(lua_iscfunction(L, -1) != 0);
    lua_pop(L, 1);

    true
}

//
// Get/set functions
//

unsafe fn table_ops(L: *mut lua_State) -> bool {
    lua_newtable(L);

    lua_pushstring(L, cstr!("key1"));
    lua_pushnumber(L, 100.0);
    lua_settable(L, -3);

    lua_pushstring(L, cstr!("key1"));
    lua_gettable(L, -2);
    ensure!(lua_tonumber(L, -1) == 100.0);
    lua_pop(L, 1);

    lua_pushnumber(L, 200.0);
    lua_setfield(L, -2, cstr!("key2"));
    lua_getfield(L, -1, cstr!("key2"));
    ensure!(lua_tonumber(L, -1) == 200.0);
    lua_pop(L, 1);

    lua_pushnumber(L, 300.0);
    lua_rawseti(L, -2, 1);
    lua_rawgeti(L, -1, 1);
    ensure!(lua_tonumber(L, -1) == 300.0);
    lua_pop(L, 1);

    lua_pushstring(L, cstr!("rk"));
    lua_pushnumber(L, 400.0);
    lua_rawset(L, -3);
    lua_pushstring(L, cstr!("rk"));
    lua_rawget(L, -2);
    ensure!(lua_tonumber(L, -1) == 400.0);
    lua_pop(L, 2);

    lua_createtable(L, 5, 5);
    ensure!(lua_istable(L, -1) != 0);
    lua_pop(L, 1);

    true
}

unsafe fn userdata(L: *mut lua_State) -> bool {
    let ud = lua_newuserdata(L, size_of::<c_int>()) as *mut c_int;
    *ud = 42;
    ensure!(lua_isuserdata(L, -1) != 0);
    ensure!(*(lua_touserdata(L, -1) as *mut c_int) == 42);
    lua_pop(L, 1);
    true
}

unsafe fn metatable(L: *mut lua_State) -> bool {
    lua_newtable(L);
    lua_newtable(L);
    lua_setmetatable(L, -2);
    ensure!(lua_getmetatable(L, -1) != 0);
    lua_pop(L, 2);
    true
}

unsafe fn global(L: *mut lua_State) -> bool {
    lua_pushnumber(L, 777.0);
    lua_setglobal(L, cstr!("myvar"));
    lua_getglobal(L, cstr!("myvar"));
    let n = lua_tonumber(L, -1);
    lua_pop(L, 1);
    n == 777.0
}

//
// Load and call
//

unsafe fn call_pcall(L: *mut lua_State) -> bool {
    lua_pushcfunction(L, answer);
    lua_call(L, 0, 1);
    ensure!(lua_tonumber(L, -1) == 42.0);
    lua_pop(L, 1);

    lua_pushcfunction(L, answer);
    ensure!(lua_pcall(L, 0, 1, 0) == LUA_OK);
    ensure!(lua_tonumber(L, -1) == 42.0);
    lua_pop(L, 1);

    lua_pushcfunction(L, failing);
    ensure!(lua_pcall(L, 0, 0, 0) == LUA_ERRRUN);
    lua_pop(L, 1);

    true
}

unsafe fn cpcall(L: *mut lua_State) -> bool {
    let mut data: c_int = 0;
    ensure!(lua_cpcall(L, store_marker, &mut data as *mut c_int as *mut c_void) == 0);
    data == 12345
}

unsafe fn gc(L: *mut lua_State) -> bool {
    lua_gc(L, LUA_GCSTOP, 0);
    lua_gc(L, LUA_GCRESTART, 0);
    lua_gc(L, LUA_GCCOLLECT, 0);
    ensure!(lua_gc(L, LUA_GCCOUNT, 0) >= 0);
    ensure!(lua_gc(L, LUA_GCCOUNTB, 0) >= 0);
    lua_gc(L, LUA_GCSTEP, 0);
    lua_gc(L, LUA_GCSETPAUSE, 200);
    lua_gc(L, LUA_GCSETSTEPMUL, 200);
    true
}

//
// Miscellaneous
//

unsafe fn error_handling(L: *mut lua_State) -> bool {
    lua_pushcfunction(L, failing);
    let status = lua_pcall(L, 0, 0, 0);
    ensure!(status == LUA_ERRRUN);
    let msg = to_str(L, -1).unwrap_or_default();
    ensure!(msg.ends_with(b"intentional error"));
    lua_pop(L, 1);
    true
}

unsafe fn next(L: *mut lua_State) -> bool {
    lua_newtable(L);
    lua_pushnumber(L, 1.0);
    lua_setfield(L, -2, cstr!("a"));
    lua_pushnumber(L, 2.0);
    lua_setfield(L, -2, cstr!("b"));

    let mut count = 0;
    lua_pushnil(L);
    while lua_next(L, -2) != 0 {
        count += 1;
        lua_pop(L, 1);
    }
    lua_pop(L, 1);
    count == 2
}

unsafe fn concat(L: *mut lua_State) -> bool {
    lua_pushstring(L, cstr!("hello"));
    lua_pushstring(L, cstr!(" "));
    lua_pushstring(L, cstr!("world"));
    lua_concat(L, 3);
    let ok = to_str(L, -1) == Some(b"hello world".as_slice());
    lua_pop(L, 1);
    ok
}

unsafe fn getallocf(L: *mut lua_State) -> bool {
    let mut ud = ptr::null_mut();
    let f = lua_getallocf(L, &mut ud);
    !(f as *const c_void).is_null()
}

unsafe fn macros(L: *mut lua_State) -> bool {
    lua_pushstring(L, cstr!("test"));
    ensure!(lua_strlen(L, -1) == 4);
    lua_pop(L, 1);

    lua_register(L, cstr!("my_cfunc2"), greeting);
    lua_getglobal(L, cstr!("my_cfunc2"));
    ensure!(lua_isfunction(L, -1) != 0);
    lua_pop(L, 1);

    lua_newtable(L);
    ensure!(lua_istable(L, -1) != 0);
    lua_pop(L, 1);

    true
}

//
// Debug interface
//

unsafe extern "C-unwind" fn inspect_caller(L: *mut lua_State) -> c_int {
    let mut ar = lua_Debug::new();
    if lua_getstack(L, 0, &mut ar) == 0 {
        lua_pushboolean(L, 0);
        return 1;
    }
    lua_getinfo(L, cstr!("nSl"), &mut ar);
    lua_pushboolean(L, 1);
    1
}

unsafe fn getstack_getinfo(L: *mut lua_State) -> bool {
    ensure!(luaL_dostring(L, cstr!("function test_getstack(f) return f() end")) == 0);
    lua_getglobal(L, cstr!("test_getstack"));
    lua_pushcfunction(L, inspect_caller);
    if lua_pcall(L, 1, 1, 0) != 0 {
        report(L);
        return false;
    }
    let ok = lua_toboolean(L, -1) != 0;
    lua_pop(L, 1);
    ok
}

unsafe fn upvalue(L: *mut lua_State) -> bool {
    lua_pushnumber(L, 99.0);
    lua_pushcclosure(L, answer, 1);
    ensure!(!lua_getupvalue(L, -1, 1).is_null());
    ensure!(lua_tonumber(L, -1) == 99.0);
    lua_pop(L, 1);

    lua_pushnumber(L, 50.0);
    ensure!(!lua_setupvalue(L, -2, 1).is_null());
    lua_getupvalue(L, -1, 1);
    ensure!(lua_tonumber(L, -1) == 50.0);
    lua_pop(L, 2);
    true
}

unsafe fn sethook(L: *mut lua_State) -> bool {
    lua_sethook(L, Some(noop_hook), LUA_MASKCALL, 0);
    lua_sethook(L, None, 0, 0);
    lua_gethook(L).is_none()
}

//
// Auxiliary library
//

unsafe fn register(L: *mut lua_State) -> bool {
    let lib = [
        luaL_Reg {
            name: cstr!("myfunc"),
            func: Some(answer),
        },
        luaL_Reg {
            name: cstr!("myfunc2"),
            func: Some(greeting),
        },
        luaL_Reg {
            name: ptr::null(),
            func: None,
        },
    ];
    luaL_register(L, cstr!("mylib"), lib.as_ptr());
    lua_getfield(L, -1, cstr!("myfunc"));
    ensure!(lua_isfunction(L, -1) != 0);
    lua_pop(L, 2);
    true
}

unsafe extern "C-unwind" fn meta_tostring(L: *mut lua_State) -> c_int {
    lua_pushstring(L, cstr!("meta_tostring_result"));
    1
}

unsafe fn callmeta(L: *mut lua_State) -> bool {
    lua_newuserdata(L, 4);
    lua_newtable(L);
    lua_pushcfunction(L, meta_tostring);
    lua_setfield(L, -2, cstr!("__tostring"));
    lua_setmetatable(L, -2);

    ensure!(luaL_callmeta(L, -1, cstr!("__tostring")) != 0);
    ensure!(to_str(L, -1) == Some(b"meta_tostring_result".as_slice()));
    lua_pop(L, 2);
    true
}

unsafe extern "C-unwind" fn expect_table(L: *mut lua_State) -> c_int {
    luaL_typerror(L, 1, cstr!("table"))
}

unsafe fn typerror(L: *mut lua_State) -> bool {
    lua_pushcfunction(L, expect_table);
    lua_pushnumber(L, 42.0);
    ensure!(lua_pcall(L, 1, 0, 0) == LUA_ERRRUN);
    let msg = to_str(L, -1).unwrap_or_default();
    let found = msg.windows(18).any(|w| w == b"table expected, go");
    lua_pop(L, 1);
    found
}

unsafe extern "C-unwind" fn check_args(L: *mut lua_State) -> c_int {
    luaL_checktype(L, 1, LUA_TNUMBER);
    luaL_checkany(L, 1);
    luaL_checkstack(L, 10, cstr!("not enough stack"));

    let n = luaL_checknumber(L, 1);
    luaL_optnumber(L, 2, 0.0);
    luaL_checkinteger(L, 1);
    luaL_optinteger(L, 2, 0);

    let mut len = 0;
    luaL_checklstring(L, 3, &mut len);
    luaL_optlstring(L, 4, cstr!("default"), ptr::null_mut());

    luaL_argcheck(L, (n > 0.0) as c_int, 1, cstr!("must be positive"));

    luaL_checkstring(L, 3);
    luaL_optstring(L, 4, cstr!("def"));

    let ci: c_int = luaL_checkint(L, 1);
    luaL_optint(L, 2, 0);
    let cl: c_long = luaL_checklong(L, 1);
    luaL_optlong(L, 2, 0);

    lua_pushboolean(L, (ci == 5 && cl == 5 && len == 3) as c_int);
    1
}

unsafe fn check_functions(L: *mut lua_State) -> bool {
    lua_pushcfunction(L, check_args);
    lua_pushnumber(L, 5.0);
    lua_pushnil(L);
    lua_pushstring(L, cstr!("str"));
    if lua_pcall(L, 3, 1, 0) != 0 {
        report(L);
        return false;
    }
    let ok = lua_toboolean(L, -1) != 0;
    lua_pop(L, 1);
    ok
}

unsafe fn newmetatable_checkudata(L: *mut lua_State) -> bool {
    luaL_newmetatable(L, cstr!("TestMeta"));
    lua_pop(L, 1);
    ensure!(luaL_newmetatable(L, cstr!("TestMeta")) == 0);
    lua_pop(L, 1);

    let ud = lua_newuserdata(L, size_of::<c_int>()) as *mut c_int;
    *ud = 99;
    luaL_getmetatable(L, cstr!("TestMeta"));
    lua_setmetatable(L, -2);

    let p = luaL_checkudata(L, -1, cstr!("TestMeta")) as *mut c_int;
    ensure!(!p.is_null() && *p == 99);
    lua_pop(L, 1);
    true
}

unsafe fn where_error(L: *mut lua_State) -> bool {
    luaL_where(L, 0);
    let ok = lua_isstring(L, -1) != 0;
    lua_pop(L, 1);
    ok
}

unsafe extern "C-unwind" fn pick_option(L: *mut lua_State) -> c_int {
    let opts = [cstr!("alpha"), cstr!("beta"), cstr!("gamma"), ptr::null()];
    let i = luaL_checkoption(L, 1, cstr!("alpha"), opts.as_ptr());
    lua_pushinteger(L, i as lua_Integer);
    1
}

unsafe fn checkoption(L: *mut lua_State) -> bool {
    lua_pushcfunction(L, pick_option);
    lua_pushstring(L, cstr!("beta"));
    if lua_pcall(L, 1, 1, 0) != 0 {
        report(L);
        return false;
    }
    let i = lua_tointeger(L, -1);
    lua_pop(L, 1);
    i == 1
}

unsafe fn ref_unref(L: *mut lua_State) -> bool {
    lua_pushnumber(L, 42.0);
    let r = luaL_ref(L, LUA_REGISTRYINDEX);
    ensure!(r != LUA_NOREF && r != LUA_REFNIL);

    lua_rawgeti(L, LUA_REGISTRYINDEX, r);
    ensure!(lua_tonumber(L, -1) == 42.0);
    lua_pop(L, 1);

    luaL_unref(L, LUA_REGISTRYINDEX, r);
    lua_pushboolean(L, 1);
    let reused = luaL_ref(L, LUA_REGISTRYINDEX);
    luaL_unref(L, LUA_REGISTRYINDEX, reused);
    reused == r
}

unsafe fn loadbuffer(L: *mut lua_State) -> bool {
    let code = b"return 1 + 2";
    if luaL_loadbuffer(L, code.as_ptr() as *const c_char, code.len(), cstr!("test")) != 0 {
        report(L);
        return false;
    }
    if lua_pcall(L, 0, 1, 0) != 0 {
        report(L);
        return false;
    }
    let n = lua_tonumber(L, -1);
    lua_pop(L, 1);
    n == 3.0
}

unsafe fn loadstring(L: *mut lua_State) -> bool {
    if luaL_loadstring(L, cstr!("return 'hello'")) != 0 || lua_pcall(L, 0, 1, 0) != 0 {
        report(L);
        return false;
    }
    let ok = to_str(L, -1) == Some(b"hello".as_slice());
    lua_pop(L, 1);
    ok
}

unsafe fn dostring(L: *mut lua_State) -> bool {
    if luaL_dostring(L, cstr!("myvar_ds = 123")) != 0 {
        report(L);
        return false;
    }
    lua_getglobal(L, cstr!("myvar_ds"));
    let n = lua_tonumber(L, -1);
    lua_pop(L, 1);
    n == 123.0
}

unsafe fn buffer_api(L: *mut lua_State) -> bool {
    let mut b = luaL_Buffer::new();
    luaL_buffinit(L, &mut b);
    luaL_addlstring(&mut b, cstr!("hel"), 3);
    luaL_addstring(&mut b, cstr!("lo"));
    luaL_addchar(&mut b, b'!' as c_char);
    luaL_pushresult(&mut b);
    let ok = to_str(L, -1) == Some(b"hello!".as_slice());
    lua_pop(L, 1);
    ok
}

unsafe fn typename_macro(L: *mut lua_State) -> bool {
    lua_pushnumber(L, 1.0);
    let tn = CStr::from_ptr(luaL_typename(L, -1));
    let ok = tn == c"number";
    lua_pop(L, 1);
    ok
}

//
// Standard libraries
//

unsafe fn openlibs(L: *mut lua_State) -> bool {
    for name in [
        LUA_TABLIBNAME,
        LUA_STRLIBNAME,
        LUA_MATHLIBNAME,
        LUA_OSLIBNAME,
        LUA_DBLIBNAME,
        LUA_IOLIBNAME,
        LUA_LOADLIBNAME,
    ] {
        lua_getglobal(L, name);
        let present = lua_istable(L, -1) != 0;
        lua_pop(L, 1);
        ensure!(present);
    }
    lua_getglobal(L, cstr!("require"));
    let present = lua_isfunction(L, -1) != 0;
    lua_pop(L, 1);
    present
}

type Case = unsafe fn(*mut lua_State) -> bool;

const CASES: &[(&str, Case)] = &[
    // State
    ("atpanic", atpanic),
    ("newthread", newthread),
    // Stack
    ("stack_ops", stack_ops),
    // Access
    ("type_checks", type_checks),
    ("rawequal", rawequal),
    ("objlen", objlen),
    ("topointer", topointer),
    // Push
    ("push_functions", push_functions),
    // Get/set
    ("table_ops", table_ops),
    ("userdata", userdata),
    ("metatable", metatable),
    ("global", global),
    // Load and call
    ("call_pcall", call_pcall),
    ("cpcall", cpcall),
    ("gc", gc),
    // Misc
    ("error_handling", error_handling),
    ("next", next),
    ("concat", concat),
    ("getallocf", getallocf),
    ("macros", macros),
    // Debug
    ("getstack_getinfo", getstack_getinfo),
    ("upvalue", upvalue),
    ("sethook", sethook),
    // Auxiliary library
    ("luaL_register", register),
    ("callmeta", callmeta),
    ("typerror", typerror),
    ("check_functions", check_functions),
    ("newmetatable_checkudata", newmetatable_checkudata),
    ("where_error", where_error),
    ("checkoption", checkoption),
    ("ref_unref", ref_unref),
    ("loadbuffer", loadbuffer),
    ("loadstring", loadstring),
    ("dostring", dostring),
    ("buffer_api", buffer_api),
    ("typename_macro", typename_macro),
    // Standard libraries
    ("openlibs", openlibs),
];

fn main() -> ExitCode {
    unsafe {
        let L = luaL_newstate();
        if L.is_null() {
            eprintln!("Failed to create Lua state");
            return ExitCode::FAILURE;
        }
        luaL_openlibs(L);

        println!("Running Lua 5.1 C API tests:");
        let mut fails = 0;
        for (name, case) in CASES {
            print!("  {name:<40}");
            let top = lua_gettop(L);
            if case(L) && lua_gettop(L) == top {
                println!("OK");
            } else {
                println!("FAIL");
                lua_settop(L, top);
                fails += 1;
            }
        }
        println!("\nResults: {fails} C API test(s) failed");

        let scripts = std::env::args().skip(1).collect::<Vec<_>>();
        if !scripts.is_empty() {
            println!("\nRunning Lua file tests:");
        }
        for script in scripts {
            println!("  Loading {script}");
            let Ok(path) = CString::new(script) else {
                println!("  FAIL: file name contains a NUL byte");
                fails += 1;
                continue;
            };
            let mut status = luaL_loadfile(L, path.as_ptr());
            if status == LUA_OK {
                status = lua_pcall(L, 0, LUA_MULTRET, 0);
            }
            if status != LUA_OK {
                let msg = to_str(L, -1).map(String::from_utf8_lossy).unwrap_or_default();
                match Status::try_from(status) {
                    Ok(kind) => println!("  FAIL ({kind}): {msg}"),
                    Err(code) => println!("  FAIL (status {code}): {msg}"),
                }
                fails += 1;
            }
            lua_settop(L, 0);
        }

        lua_close(L);
        if fails > 0 {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }
}
