//! Debug interface over Luau.
//!
//! Luau addresses activations by level on every call, so `lua_getstack` stores the level in
//! `i_ci`. Hooks are driven by the `debugstep` callback in single-step mode: line and count
//! events are synthesized, call and return events cannot be observed.

use std::ffi::CStr;
use std::mem;
use std::os::raw::{c_char, c_int};

use super::index;
use crate::lua::*;
use crate::state;

/// Translates Lua 5.1 `lua_getinfo` options into Luau ones.
///
/// Returns `None` for an option Lua 5.1 does not know.
fn translate_options(opts: &[u8], out: &mut [c_char; 8]) -> Option<()> {
    let mut n = 0;
    let mut push = |c: u8| {
        if !out[..n].contains(&(c as c_char)) {
            out[n] = c as c_char;
            n += 1;
        }
    };
    for &c in opts {
        match c {
            b'S' => push(b's'),
            b'l' => push(b'l'),
            b'n' => push(b'n'),
            b'f' => push(b'f'),
            b'u' => {
                push(b'a');
                push(b'u');
            }
            b'L' => {}
            _ => return None,
        }
    }
    Some(())
}

pub unsafe fn lua_getstack(L: *mut lua_State, level: c_int, ar: *mut lua_Debug) -> c_int {
    if level < 0 {
        return 0;
    }
    let mut info: ffi::lua_Debug = mem::zeroed();
    if ffi::lua_getinfo(L, level, cstr!(""), &mut info) == 0 {
        return 0;
    }
    (*ar).i_ci = level;
    1
}

pub unsafe fn lua_getinfo(L: *mut lua_State, what: *const c_char, ar: *mut lua_Debug) -> c_int {
    let mut opts = CStr::from_ptr(what).to_bytes();
    let from_stack = opts.first() == Some(&b'>');
    if from_stack {
        opts = &opts[1..];
    }

    let mut native = [0 as c_char; 8];
    if translate_options(opts, &mut native).is_none() {
        return 0;
    }
    // Luau addresses the function on top of the stack with a negative level
    let level = if from_stack { -1 } else { (*ar).i_ci };

    let mut info: ffi::lua_Debug = mem::zeroed();
    if ffi::lua_getinfo(L, level, native.as_ptr(), &mut info) == 0 {
        return 0;
    }

    let ar = &mut *ar;
    for &c in opts {
        match c {
            b'S' => {
                ar.source = info.source;
                ar.what = info.what;
                ar.linedefined = info.linedefined;
                ar.lastlinedefined = -1;
                ar.set_short_src(info.short_src);
            }
            b'l' => ar.currentline = info.currentline,
            b'u' => ar.nups = info.nupvals as c_int,
            b'n' => {
                ar.name = info.name;
                ar.namewhat = cstr!("");
            }
            _ => {}
        }
    }

    if from_stack {
        // Lua 5.1 pops the inspected function
        let pushed_f = opts.contains(&b'f') as c_int;
        ffi::lua_remove(L, -1 - pushed_f);
    }
    if opts.contains(&b'L') {
        // No line information is available for Luau bytecode
        ffi::lua_pushnil(L);
    }
    1
}

pub unsafe fn lua_getlocal(L: *mut lua_State, ar: *const lua_Debug, n: c_int) -> *const c_char {
    ffi::lua_getlocal(L, (*ar).i_ci, n)
}

pub unsafe fn lua_setlocal(L: *mut lua_State, ar: *const lua_Debug, n: c_int) -> *const c_char {
    ffi::lua_setlocal(L, (*ar).i_ci, n)
}

pub unsafe fn lua_getupvalue(L: *mut lua_State, funcindex: c_int, n: c_int) -> *const c_char {
    ffi::lua_getupvalue(L, index(funcindex), n)
}

pub unsafe fn lua_setupvalue(L: *mut lua_State, funcindex: c_int, n: c_int) -> *const c_char {
    ffi::lua_setupvalue(L, index(funcindex), n)
}

//
// Hooks
//

unsafe extern "C-unwind" fn step_trampoline(L: *mut lua_State, info: *mut ffi::lua_Debug) {
    let main = ffi::lua_mainthread(L);
    let line = (*info).currentline;
    let fired = state::modify(main, |extra| {
        let hook = extra.hook?;
        let mut count_event = false;
        if extra.mask & LUA_MASKCOUNT != 0 && extra.count > 0 {
            extra.steps += 1;
            if extra.steps >= extra.count {
                extra.steps = 0;
                count_event = true;
            }
        }
        let mut line_event = false;
        if extra.mask & LUA_MASKLINE != 0 && line != extra.last_line {
            extra.last_line = line;
            line_event = true;
        }
        Some((hook, count_event, line_event))
    });

    let Some(Some((hook, count_event, line_event))) = fired else {
        return;
    };
    // Level 0 is the Lua function being stepped
    if count_event {
        let mut ar = lua_Debug::new();
        ar.event = LUA_HOOKCOUNT;
        ar.currentline = line;
        hook(L, &mut ar);
    }
    if line_event {
        let mut ar = lua_Debug::new();
        ar.event = LUA_HOOKLINE;
        ar.currentline = line;
        hook(L, &mut ar);
    }
}

/// Sets the debug hook.
///
/// Luau shares the hook between all threads of a state. Only `LUA_MASKLINE` and
/// `LUA_MASKCOUNT` events are delivered.
pub unsafe fn lua_sethook(L: *mut lua_State, func: Option<lua_Hook>, mask: c_int, count: c_int) -> c_int {
    let main = ffi::lua_mainthread(L);
    let (func, mask) = match func {
        Some(func) if mask != 0 => (Some(func), mask),
        _ => (None, 0),
    };
    state::update(main, main, |extra| {
        extra.hook = func;
        extra.mask = mask;
        extra.count = count;
        extra.steps = 0;
        extra.last_line = -1;
    });

    let callbacks = ffi::lua_callbacks(L);
    if func.is_some() {
        (*callbacks).debugstep = Some(step_trampoline);
        ffi::lua_singlestep(L, 1);
    } else {
        (*callbacks).debugstep = None;
        ffi::lua_singlestep(L, 0);
    }
    1
}

pub unsafe fn lua_gethook(L: *mut lua_State) -> Option<lua_Hook> {
    state::get(ffi::lua_mainthread(L)).and_then(|extra| extra.hook)
}

pub unsafe fn lua_gethookmask(L: *mut lua_State) -> c_int {
    state::get(ffi::lua_mainthread(L)).map(|extra| extra.mask).unwrap_or(0)
}

pub unsafe fn lua_gethookcount(L: *mut lua_State) -> c_int {
    state::get(ffi::lua_mainthread(L)).map(|extra| extra.count).unwrap_or(0)
}

//
// Panic handler
//

unsafe extern "C-unwind" fn panic_trampoline(L: *mut lua_State, _errcode: c_int) {
    let panic = state::get(ffi::lua_mainthread(L)).and_then(|extra| extra.panic);
    if let Some(panic) = panic {
        panic(L);
    }
}

/// Sets a new panic function and returns the old one.
pub unsafe fn lua_atpanic(L: *mut lua_State, panicf: Option<lua_CFunction>) -> Option<lua_CFunction> {
    let main = ffi::lua_mainthread(L);
    let old = state::update(main, main, |extra| mem::replace(&mut extra.panic, panicf));
    (*ffi::lua_callbacks(L)).panic = Some(panic_trampoline);
    old
}
