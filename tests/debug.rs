#![allow(non_snake_case)]

use std::cell::RefCell;
use std::ffi::CStr;
use std::os::raw::c_int;

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

unsafe fn exec(L: *mut lua_State, code: &str, name: &CStr) {
    let status = luaL_loadbuffer(L, code.as_ptr() as *const _, code.len(), name.as_ptr());
    if status != 0 || lua_pcall(L, 0, 0, 0) != 0 {
        panic!("{}", CStr::from_ptr(lua_tostring(L, -1)).to_string_lossy());
    }
}

unsafe fn text(s: *const std::os::raw::c_char) -> String {
    assert!(!s.is_null());
    CStr::from_ptr(s).to_string_lossy().into_owned()
}

#[derive(Debug, Default)]
struct Frames {
    level0_what: String,
    level1_what: String,
    level1_line: c_int,
    level1_defined: c_int,
    level1_source: String,
    level1_short_src: String,
    local_name: String,
    local_value: lua_Integer,
    deep_level: bool,
}

thread_local! {
    static FRAMES: RefCell<Frames> = RefCell::new(Frames::default());
    static EVENTS: RefCell<Vec<(c_int, c_int)>> = const { RefCell::new(Vec::new()) };
}

unsafe extern "C-unwind" fn inspect_locals(L: *mut lua_State) -> c_int {
    let mut frames = Frames::default();

    let mut ar = lua_Debug::new();
    assert_eq!(lua_getstack(L, 0, &mut ar), 1);
    assert_eq!(lua_getinfo(L, c"S".as_ptr(), &mut ar), 1);
    frames.level0_what = text(ar.what);

    let mut ar = lua_Debug::new();
    assert_eq!(lua_getstack(L, 1, &mut ar), 1);
    assert_eq!(lua_getinfo(L, c"Sl".as_ptr(), &mut ar), 1);
    frames.level1_what = text(ar.what);
    frames.level1_line = ar.currentline;
    frames.level1_defined = ar.linedefined;
    frames.level1_source = text(ar.source);
    frames.level1_short_src = text(ar.short_src.as_ptr());

    let name = lua_getlocal(L, &ar, 1);
    frames.local_name = text(name);
    frames.local_value = lua_tointeger(L, -1);
    lua_pop(L, 1);

    lua_pushinteger(L, 7);
    assert!(!lua_setlocal(L, &ar, 1).is_null());

    frames.deep_level = lua_getstack(L, 50, &mut ar) != 0;
    FRAMES.with(|f| *f.borrow_mut() = frames);
    0
}

#[test]
fn test_stack_inspection() {
    let state = State::new();
    let L = state.0;
    unsafe {
        lua_register(L, c"inspect_locals".as_ptr(), inspect_locals);
        let code = "local function f()\n  local a = tonumber('42')\n  inspect_locals()\n  result = a\nend\nf()\n";
        exec(L, code, c"=inspection");

        FRAMES.with(|f| {
            let f = f.borrow();
            assert_eq!(f.level0_what, "C");
            assert_eq!(f.level1_what, "Lua");
            assert_eq!(f.level1_line, 3);
            assert_eq!(f.level1_defined, 1);
            assert_eq!(f.level1_source, "=inspection");
            assert_eq!(f.level1_short_src, "inspection");
            assert_eq!(f.local_name, "a");
            assert_eq!(f.local_value, 42);
            assert!(!f.deep_level);
        });

        lua_getglobal(L, c"result".as_ptr());
        assert_eq!(lua_tointeger(L, -1), 7);

        let mut ar = lua_Debug::new();
        assert_eq!(lua_getstack(L, -1, &mut ar), 0);
    }
}

#[test]
fn test_getinfo_function_on_stack() {
    let state = State::new();
    let L = state.0;
    unsafe {
        exec(L, "\nfunction g()\n  return 1\nend\n", c"=defs");

        lua_getglobal(L, c"g".as_ptr());
        let mut ar = lua_Debug::new();
        assert_eq!(lua_getinfo(L, c">S".as_ptr(), &mut ar), 1);
        assert_eq!(lua_gettop(L), 0);
        assert_eq!(text(ar.what), "Lua");
        assert_eq!(ar.linedefined, 2);
        assert_eq!(text(ar.short_src.as_ptr()), "defs");
        if cfg!(feature = "lua55") {
            assert_eq!(ar.lastlinedefined, 4);
        } else {
            assert_eq!(ar.lastlinedefined, -1);
        }

        lua_getglobal(L, c"print".as_ptr());
        let mut ar = lua_Debug::new();
        assert_eq!(lua_getinfo(L, c">Su".as_ptr(), &mut ar), 1);
        assert_eq!(lua_gettop(L), 0);
        assert_eq!(text(ar.what), "C");
        assert_eq!(ar.nups, 0);
    }
}

#[test]
fn test_short_src_is_truncated() {
    let state = State::new();
    let L = state.0;
    unsafe {
        let name = format!("@{}\0", "x".repeat(200));
        let code = "return 1";
        let status = luaL_loadbuffer(L, code.as_ptr() as *const _, code.len(), name.as_ptr() as *const _);
        assert_eq!(status, 0);

        let mut ar = lua_Debug::new();
        assert_eq!(lua_getinfo(L, c">S".as_ptr(), &mut ar), 1);
        let short_src = CStr::from_ptr(ar.short_src.as_ptr());
        assert!(short_src.to_bytes().len() < LUA_IDSIZE);
        assert_eq!(ar.short_src[LUA_IDSIZE - 1], 0);
    }
}

unsafe extern "C-unwind" fn record_event(L: *mut lua_State, ar: *mut lua_Debug) {
    let ar = &mut *ar;
    if ar.event == LUA_HOOKLINE {
        // The record describes the running function
        assert_eq!(lua_getinfo(L, c"Sl".as_ptr(), ar), 1);
        assert_eq!(CStr::from_ptr(ar.short_src.as_ptr()), c"hooked");
    }
    EVENTS.with(|events| events.borrow_mut().push((ar.event, ar.currentline)));
}

fn take_events() -> Vec<(c_int, c_int)> {
    EVENTS.with(|events| events.take())
}

#[test]
fn test_line_hook() {
    let state = State::new();
    let L = state.0;
    unsafe {
        take_events();
        lua_sethook(L, Some(record_event), LUA_MASKLINE, 0);
        exec(
            L,
            "\nlocal x = 2 + 3\nlocal y = x * 63\nlocal z = string.len(x .. ', ' .. y)\n",
            c"=hooked",
        );
        lua_sethook(L, None, 0, 0);

        let events = take_events();
        assert!(events.iter().all(|&(event, _)| event == LUA_HOOKLINE));
        let lines = events.iter().map(|&(_, line)| line).collect::<Vec<_>>();
        assert!(lines.windows(3).any(|w| w == [2, 3, 4]), "{lines:?}");

        // Removed hooks are not called anymore
        exec(L, "local a = 1", c"=hooked");
        assert!(take_events().is_empty());
    }
}

#[test]
fn test_count_hook() {
    let state = State::new();
    let L = state.0;
    unsafe {
        take_events();
        lua_sethook(L, Some(record_event), LUA_MASKCOUNT, 10);
        exec(L, "local n = 0\nfor i = 1, 1000 do n = n + i end\n", c"=hooked");
        lua_sethook(L, None, 0, 0);

        let events = take_events();
        assert!(events.len() >= 50, "{} count events", events.len());
        assert!(events.iter().all(|&(event, _)| event == LUA_HOOKCOUNT));
    }
}

#[test]
fn test_gethook() {
    let state = State::new();
    let L = state.0;
    unsafe {
        assert!(lua_gethook(L).is_none());
        assert_eq!(lua_gethookmask(L), 0);

        lua_sethook(L, Some(record_event), LUA_MASKLINE | LUA_MASKCOUNT, 5);
        assert_eq!(lua_gethook(L).map(|f| f as usize), Some(record_event as usize));
        assert_eq!(lua_gethookmask(L), LUA_MASKLINE | LUA_MASKCOUNT);
        assert_eq!(lua_gethookcount(L), 5);

        // A zero mask turns the hook off
        lua_sethook(L, Some(record_event), 0, 0);
        assert!(lua_gethook(L).is_none());
        assert_eq!(lua_gethookmask(L), 0);
    }
}

#[cfg(feature = "lua55")]
#[test]
fn test_call_return_hooks() {
    let state = State::new();
    let L = state.0;
    unsafe {
        exec(L, "function callee() return 1 end", c"=hooked");
        take_events();
        lua_sethook(L, Some(record_event), LUA_MASKCALL | LUA_MASKRET, 0);
        exec(L, "callee()", c"=hooked");
        lua_sethook(L, None, 0, 0);

        let events = take_events().into_iter().map(|(event, _)| event).collect::<Vec<_>>();
        assert!(events.contains(&LUA_HOOKCALL));
        assert!(events.contains(&LUA_HOOKRET));
        // The chunk itself and `callee`
        assert_eq!(events.iter().filter(|&&e| e == LUA_HOOKCALL).count(), 2);
    }
}
