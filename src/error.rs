use std::error::Error as StdError;
use std::fmt;
use std::os::raw::c_int;

use crate::lua::{LUA_ERRERR, LUA_ERRMEM, LUA_ERRRUN, LUA_ERRSYNTAX, LUA_OK, LUA_YIELD};
use crate::lauxlib::LUA_ERRFILE;

/// Status code in the Lua 5.1 numbering, as returned by `lua_pcall`, `lua_resume` and the
/// loading functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Status {
    Ok = LUA_OK,
    Yield = LUA_YIELD,
    /// Runtime error, aka `LUA_ERRRUN`.
    RuntimeError = LUA_ERRRUN,
    /// Syntax error during precompilation, aka `LUA_ERRSYNTAX`.
    SyntaxError = LUA_ERRSYNTAX,
    /// Memory allocation error, aka `LUA_ERRMEM`.
    MemoryError = LUA_ERRMEM,
    /// Error while running the error handler function, aka `LUA_ERRERR`.
    ErrorHandlerError = LUA_ERRERR,
    /// Cannot open or read a file, aka `LUA_ERRFILE`.
    FileError = LUA_ERRFILE,
}

impl Status {
    pub const fn code(self) -> c_int {
        self as c_int
    }

    /// Returns `true` for the statuses that leave an error message on the stack.
    pub const fn is_error(self) -> bool {
        !matches!(self, Status::Ok | Status::Yield)
    }
}

impl TryFrom<c_int> for Status {
    type Error = c_int;

    fn try_from(code: c_int) -> Result<Self, Self::Error> {
        Ok(match code {
            LUA_OK => Status::Ok,
            LUA_YIELD => Status::Yield,
            LUA_ERRRUN => Status::RuntimeError,
            LUA_ERRSYNTAX => Status::SyntaxError,
            LUA_ERRMEM => Status::MemoryError,
            LUA_ERRERR => Status::ErrorHandlerError,
            LUA_ERRFILE => Status::FileError,
            code => return Err(code),
        })
    }
}

impl fmt::Display for Status {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Status::Ok => write!(fmt, "success"),
            Status::Yield => write!(fmt, "coroutine yielded"),
            Status::RuntimeError => write!(fmt, "runtime error"),
            Status::SyntaxError => write!(fmt, "syntax error"),
            Status::MemoryError => write!(fmt, "memory allocation error"),
            Status::ErrorHandlerError => write!(fmt, "error in error handling"),
            Status::FileError => write!(fmt, "cannot open or read file"),
        }
    }
}

impl StdError for Status {}
