use std::os::raw::c_int;

use crate::lua::{LUA_ENVIRONINDEX, LUA_GLOBALSINDEX, LUA_REGISTRYINDEX};

/// What a Lua 5.1 index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    /// Stack slot, relative (negative) or absolute (positive).
    Stack(c_int),
    Registry,
    Environ,
    Globals,
    /// Upvalue of the running C function, starting from 1.
    Upvalue(c_int),
}

impl Slot {
    pub(crate) const fn classify(idx: c_int) -> Slot {
        if idx > LUA_REGISTRYINDEX {
            Slot::Stack(idx)
        } else if idx == LUA_REGISTRYINDEX {
            Slot::Registry
        } else if idx == LUA_ENVIRONINDEX {
            Slot::Environ
        } else if idx == LUA_GLOBALSINDEX {
            Slot::Globals
        } else {
            Slot::Upvalue(LUA_GLOBALSINDEX - idx)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Slot;
    use crate::lua::*;

    #[test]
    fn test_classify() {
        assert_eq!(Slot::classify(1), Slot::Stack(1));
        assert_eq!(Slot::classify(-1), Slot::Stack(-1));
        assert_eq!(Slot::classify(-9999), Slot::Stack(-9999));
        assert_eq!(Slot::classify(LUA_REGISTRYINDEX), Slot::Registry);
        assert_eq!(Slot::classify(LUA_ENVIRONINDEX), Slot::Environ);
        assert_eq!(Slot::classify(LUA_GLOBALSINDEX), Slot::Globals);
        assert_eq!(Slot::classify(lua_upvalueindex(1)), Slot::Upvalue(1));
        assert_eq!(Slot::classify(lua_upvalueindex(255)), Slot::Upvalue(255));
    }
}
