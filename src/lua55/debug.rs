//! Debug interface over Lua 5.5.

use std::mem;
use std::os::raw::{c_char, c_int};

use super::{at, main_thread};
use crate::lua::*;
use crate::state;

/// `i_ci` marker of a record handed to a running hook.
const HOOK_ACTIVATION: c_int = -1;

/// Locates the native activation record for `ar`.
///
/// Records given to hooks point at the parked native record, records from `lua_getstack` are
/// looked up again by level.
unsafe fn activation(L: *mut lua_State, ar: *const lua_Debug, tmp: &mut ffi::lua_Debug) -> Option<*mut ffi::lua_Debug> {
    let level = (*ar).i_ci;
    if level == HOOK_ACTIVATION {
        let parked = state::get(L).map(|extra| extra.activation).unwrap_or(0);
        if parked != 0 {
            return Some(parked as *mut ffi::lua_Debug);
        }
        return (ffi::lua_getstack(L, 0, &mut *tmp) != 0).then_some(tmp as *mut _);
    }
    (ffi::lua_getstack(L, level, &mut *tmp) != 0).then_some(tmp as *mut _)
}

pub unsafe fn lua_getstack(L: *mut lua_State, level: c_int, ar: *mut lua_Debug) -> c_int {
    let mut tmp = ffi::lua_Debug::new();
    if level < 0 || ffi::lua_getstack(L, level, &mut tmp) == 0 {
        return 0;
    }
    (*ar).i_ci = level;
    1
}

pub unsafe fn lua_getinfo(L: *mut lua_State, what: *const c_char, ar: *mut lua_Debug) -> c_int {
    let mut tmp = ffi::lua_Debug::new();
    let native = if *what as u8 == b'>' {
        &mut tmp as *mut _
    } else {
        match activation(L, ar, &mut tmp) {
            Some(native) => native,
            None => return 0,
        }
    };
    if ffi::lua_getinfo(L, what, native) == 0 {
        return 0;
    }

    let (ar, info) = (&mut *ar, &*native);
    let mut opt = what;
    while *opt != 0 {
        match *opt as u8 {
            b'S' => {
                ar.source = info.source;
                ar.what = info.what;
                ar.linedefined = info.linedefined;
                ar.lastlinedefined = info.lastlinedefined;
                ar.set_short_src(info.short_src.as_ptr());
            }
            b'l' => ar.currentline = info.currentline,
            b'u' => ar.nups = info.nups as c_int,
            b'n' => {
                ar.name = info.name;
                ar.namewhat = if info.namewhat.is_null() { cstr!("") } else { info.namewhat };
            }
            _ => {}
        }
        opt = opt.add(1);
    }
    1
}

pub unsafe fn lua_getlocal(L: *mut lua_State, ar: *const lua_Debug, n: c_int) -> *const c_char {
    let mut tmp = ffi::lua_Debug::new();
    match activation(L, ar, &mut tmp) {
        Some(native) => ffi::lua_getlocal(L, native, n),
        None => std::ptr::null(),
    }
}

pub unsafe fn lua_setlocal(L: *mut lua_State, ar: *const lua_Debug, n: c_int) -> *const c_char {
    let mut tmp = ffi::lua_Debug::new();
    match activation(L, ar, &mut tmp) {
        Some(native) => ffi::lua_setlocal(L, native, n),
        None => {
            // Lua 5.1 pops the value in any case
            ffi::lua_pop(L, 1);
            std::ptr::null()
        }
    }
}

pub unsafe fn lua_getupvalue(L: *mut lua_State, funcindex: c_int, n: c_int) -> *const c_char {
    at(L, funcindex, 0, |i| ffi::lua_getupvalue(L, i, n))
}

pub unsafe fn lua_setupvalue(L: *mut lua_State, funcindex: c_int, n: c_int) -> *const c_char {
    at(L, funcindex, 1, |i| ffi::lua_setupvalue(L, i, n))
}

//
// Hooks
//

unsafe extern "C-unwind" fn hook_trampoline(L: *mut lua_State, native: *mut ffi::lua_Debug) {
    let main = main_thread(L);
    let hook = state::get(L)
        .and_then(|extra| extra.hook)
        .or_else(|| state::get(main).and_then(|extra| extra.hook));
    let Some(hook) = hook else {
        return;
    };

    let mut ar = lua_Debug::new();
    ar.event = match (*native).event {
        ffi::LUA_HOOKTAILCALL => LUA_HOOKCALL,
        event => event,
    };
    ar.currentline = (*native).currentline;
    ar.i_ci = HOOK_ACTIVATION;

    let parked = state::update(L, main, |extra| mem::replace(&mut extra.activation, native as usize));
    hook(L, &mut ar);
    state::modify(L, |extra| extra.activation = parked);
}

/// Sets the debug hook of the thread `L`.
pub unsafe fn lua_sethook(L: *mut lua_State, func: Option<lua_Hook>, mask: c_int, count: c_int) -> c_int {
    let main = main_thread(L);
    let (func, mask) = match func {
        Some(func) if mask != 0 => (Some(func), mask),
        _ => (None, 0),
    };
    state::update(L, main, |extra| {
        extra.hook = func;
        extra.mask = mask;
        extra.count = count;
    });
    match func {
        Some(_) => ffi::lua_sethook(L, Some(hook_trampoline), mask, count),
        None => ffi::lua_sethook(L, None, 0, 0),
    }
    1
}

pub unsafe fn lua_gethook(L: *mut lua_State) -> Option<lua_Hook> {
    ffi::lua_gethook(L)?;
    state::get(L).and_then(|extra| extra.hook)
}

pub unsafe fn lua_gethookmask(L: *mut lua_State) -> c_int {
    ffi::lua_gethookmask(L)
}

pub unsafe fn lua_gethookcount(L: *mut lua_State) -> c_int {
    ffi::lua_gethookcount(L)
}
