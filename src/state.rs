//! Per-state data the backends cannot store in a Lua 5.1 shape.
//!
//! Entries are keyed by the address of the `lua_State` that owns them and remember the main
//! thread they belong to, so `lua_close` can drop every entry of a closed state at once.
//! The lock is never held while calling into Lua.

use std::os::raw::c_int;
use std::sync::LazyLock;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

#[cfg(feature = "luau")]
use crate::lua::lua_CFunction;
use crate::lua::{lua_Hook, lua_State};

#[derive(Clone, Copy, Default)]
pub(crate) struct StateExtra {
    pub(crate) main: usize,
    pub(crate) hook: Option<lua_Hook>,
    pub(crate) mask: c_int,
    pub(crate) count: c_int,
    // Instructions executed since the last count event
    #[cfg(feature = "luau")]
    pub(crate) steps: c_int,
    #[cfg(feature = "luau")]
    pub(crate) last_line: c_int,
    #[cfg(feature = "luau")]
    pub(crate) panic: Option<lua_CFunction>,
    // Native activation record of the running hook
    #[cfg(feature = "lua55")]
    pub(crate) activation: usize,
}

static EXTRAS: LazyLock<Mutex<FxHashMap<usize, StateExtra>>> =
    LazyLock::new(|| Mutex::new(FxHashMap::default()));

/// Returns a copy of the entry for `L`, if any.
pub(crate) fn get(L: *mut lua_State) -> Option<StateExtra> {
    EXTRAS.lock().get(&(L as usize)).copied()
}

/// Runs `f` against the entry for `L`, creating it if needed.
pub(crate) fn update<R>(L: *mut lua_State, main: *mut lua_State, f: impl FnOnce(&mut StateExtra) -> R) -> R {
    let mut extras = EXTRAS.lock();
    let extra = extras.entry(L as usize).or_insert_with(|| StateExtra {
        main: main as usize,
        #[cfg(feature = "luau")]
        last_line: -1,
        ..Default::default()
    });
    f(extra)
}

/// Runs `f` against the entry for `L` only when one exists.
pub(crate) fn modify<R>(L: *mut lua_State, f: impl FnOnce(&mut StateExtra) -> R) -> Option<R> {
    EXTRAS.lock().get_mut(&(L as usize)).map(f)
}

/// Drops all entries that belong to the state with the main thread `main`.
pub(crate) fn forget(main: *mut lua_State) {
    let main = main as usize;
    EXTRAS.lock().retain(|_, extra| extra.main != main);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forget_drops_threads_of_state() {
        let main = 0x1000 as *mut lua_State;
        let thread = 0x2000 as *mut lua_State;
        let other = 0x3000 as *mut lua_State;

        update(main, main, |e| e.count = 1);
        update(thread, main, |e| e.count = 2);
        update(other, other, |e| e.count = 3);
        assert_eq!(get(thread).map(|e| e.count), Some(2));
        #[cfg(feature = "luau")]
        assert_eq!(get(thread).map(|e| e.last_line), Some(-1));

        forget(main);
        assert!(get(main).is_none());
        assert!(get(thread).is_none());
        assert_eq!(modify(other, |e| e.count), Some(3));

        forget(other);
        assert!(modify(other, |e| e.count).is_none());
    }
}
