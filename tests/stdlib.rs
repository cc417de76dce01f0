#![allow(non_snake_case)]

use std::ffi::{CStr, CString};
use std::fs;

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

unsafe fn run(L: *mut lua_State, code: &CStr) {
    if luaL_dostring(L, code.as_ptr()) != 0 {
        panic!("{}", CStr::from_ptr(lua_tostring(L, -1)).to_string_lossy());
    }
}

#[test]
fn test_libraries_are_registered() {
    let state = State::new();
    let L = state.0;
    unsafe {
        for name in [
            LUA_TABLIBNAME,
            LUA_STRLIBNAME,
            LUA_MATHLIBNAME,
            LUA_OSLIBNAME,
            LUA_DBLIBNAME,
            LUA_COLIBNAME,
            LUA_IOLIBNAME,
            LUA_LOADLIBNAME,
        ] {
            lua_getglobal(L, name);
            assert_eq!(lua_type(L, -1), LUA_TTABLE, "{:?}", CStr::from_ptr(name));
            lua_getfield(L, LUA_REGISTRYINDEX, c"_LOADED".as_ptr());
            lua_getfield(L, -1, name);
            assert_eq!(lua_rawequal(L, -1, -3), 1, "{:?}", CStr::from_ptr(name));
            lua_settop(L, 0);
        }
        run(L, c"assert(type(require) == 'function')");
    }
}

#[test]
fn test_single_library() {
    let state = State(unsafe { luaL_newstate() });
    let L = state.0;
    unsafe {
        lua_pushcfunction(L, luaopen_base);
        lua_call(L, 0, 0);
        lua_pushcfunction(L, luaopen_string);
        lua_call(L, 0, 1);
        assert_eq!(lua_type(L, -1), LUA_TTABLE);
        lua_getglobal(L, LUA_STRLIBNAME);
        assert_eq!(lua_rawequal(L, -1, -2), 1);
        lua_settop(L, 0);

        run(L, c"assert(string.upper('abc') == 'ABC')");
        lua_getglobal(L, LUA_MATHLIBNAME);
        assert_eq!(lua_isnil(L, -1), 1);
    }
}

#[test]
fn test_base_compat() {
    let state = State::new();
    let L = state.0;
    unsafe {
        run(
            L,
            cr##"
            local f = assert(loadstring("return 1 + ..."))
            assert(f(41) == 42)
            local g, err = loadstring("return +", "=broken")
            assert(g == nil and type(err) == "string")

            local a, b, c = unpack({1, 2, 3})
            assert(a == 1 and b == 2 and c == 3)
            assert(select("#", unpack({1, 2, 3}, 2)) == 2)

            assert(type(gcinfo()) == "number" and gcinfo() > 0)
            "##,
        );
    }
}

#[test]
fn test_table_compat() {
    let state = State::new();
    let L = state.0;
    unsafe {
        run(
            L,
            cr#"
            assert(table.getn({1, 2, 3}) == 3)
            assert(table.maxn({}) == 0)
            assert(table.maxn({[1] = 1, [10] = 2, x = 3}) == 10)

            local sum = 0
            assert(table.foreachi({5, 6, 7}, function(i, v) sum = sum + i * v end) == nil)
            assert(sum == 5 + 12 + 21)
            assert(table.foreachi({"a", "b", "c"}, function(i, v) if v == "b" then return i end end) == 2)

            local keys = 0
            table.foreach({x = 1, y = 2}, function(k, v) keys = keys + v end)
            assert(keys == 3)
            assert(table.foreach({x = 1}, function(k, v) return k .. "=" .. v end) == "x=1")
            "#,
        );
    }
}

#[test]
fn test_math_string_compat() {
    let state = State::new();
    let L = state.0;
    unsafe {
        run(
            L,
            cr#"
            assert(math.pow(2, 10) == 1024)
            assert(math.log10(1000) == 3)
            assert(math.mod(7, 3) == 1)
            assert(math.mod(-7, 3) == -1)

            local words = {}
            for w in string.gfind("one two three", "%a+") do
                words[#words + 1] = w
            end
            assert(#words == 3 and words[3] == "three")
            "#,
        );
    }
}

#[test]
fn test_require_preload() {
    let state = State::new();
    let L = state.0;
    unsafe {
        run(
            L,
            cr#"
            local loads = 0
            package.preload["compat.mod"] = function(name)
                loads = loads + 1
                return { name = name }
            end
            local m = require("compat.mod")
            assert(m.name == "compat.mod")
            assert(require("compat.mod") == m)
            assert(package.loaded["compat.mod"] == m)
            assert(loads == 1)

            package.preload.silent = function() end
            assert(require("silent") == true)
            "#,
        );
    }
}

#[test]
fn test_require_from_path() {
    let state = State::new();
    let L = state.0;
    unsafe {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("pkg")).unwrap();
        fs::write(dir.path().join("pkg").join("answer.lua"), "return { value = 42, name = ... }").unwrap();
        fs::write(dir.path().join("broken.lua"), "return (").unwrap();

        let path = CString::new(format!("{}/?.lua", dir.path().display())).unwrap();
        lua_getglobal(L, LUA_LOADLIBNAME);
        lua_pushstring(L, path.as_ptr());
        lua_setfield(L, -2, c"path".as_ptr());
        lua_pop(L, 1);

        run(
            L,
            cr#"
            local m = require("pkg.answer")
            assert(m.value == 42)
            assert(m.name == "pkg.answer")

            local ok, err = pcall(require, "absent")
            assert(not ok)
            assert(err:find("module 'absent' not found", 1, true), err)
            assert(err:find("absent.lua", 1, true), err)

            local ok, err = pcall(require, "broken")
            assert(not ok)
            assert(err:find("error loading module 'broken'", 1, true), err)
            "#,
        );
    }
}

#[cfg(unix)]
#[test]
fn test_require_non_utf8_path() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let state = State::new();
    let L = state.0;
    unsafe {
        let dir = tempfile::tempdir().unwrap();
        let modules = dir.path().join(OsStr::from_bytes(b"m\xf3dulos"));
        fs::create_dir(&modules).unwrap();
        fs::write(modules.join("latin.lua"), "return 'found'").unwrap();

        let mut path = modules.as_os_str().as_bytes().to_vec();
        path.extend_from_slice(b"/?.lua");
        lua_getglobal(L, LUA_LOADLIBNAME);
        lua_pushlstring(L, path.as_ptr() as *const _, path.len());
        lua_setfield(L, -2, c"path".as_ptr());
        lua_pop(L, 1);

        run(L, c"assert(require('latin') == 'found')");
    }
}

#[test]
fn test_io_write() {
    let state = State::new();
    let L = state.0;
    unsafe {
        run(L, c"assert(io.write(''))");

        lua_getglobal(L, LUA_IOLIBNAME);
        lua_getfield(L, -1, c"write".as_ptr());
        lua_newtable(L);
        assert_ne!(lua_pcall(L, 1, 1, 0), 0);
        let msg = CStr::from_ptr(lua_tostring(L, -1)).to_string_lossy();
        assert!(msg.contains("bad argument #1"), "{msg}");
    }
}
