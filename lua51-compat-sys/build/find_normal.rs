#![allow(dead_code)]

use std::env;
use std::ops::Bound;

pub fn probe_lua() {
    let target_arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap();

    if target_arch == "wasm32" {
        panic!("Please enable `vendored` feature to build for wasm32");
    }

    let lib_dir = env::var("LUA_LIB").unwrap_or_default();
    let lua_lib = env::var("LUA_LIB_NAME").unwrap_or_default();

    println!("cargo:rerun-if-env-changed=LUA_LIB");
    println!("cargo:rerun-if-env-changed=LUA_LIB_NAME");
    println!("cargo:rerun-if-env-changed=LUA_LINK");

    if !lua_lib.is_empty() {
        if !lib_dir.is_empty() {
            println!("cargo:rustc-link-search=native={lib_dir}");
        }
        let link_lib = if env::var("LUA_LINK").as_deref() == Ok("static") {
            "static="
        } else {
            ""
        };
        println!("cargo:rustc-link-lib={link_lib}{lua_lib}");
        return;
    }

    // Only Lua 5.5 can come from the system, Luau is always built from source
    let mut lua = pkg_config::Config::new()
        .range_version((Bound::Included("5.5"), Bound::Excluded("5.6")))
        .cargo_metadata(true)
        .probe("lua");

    if lua.is_err() {
        for pkg in ["lua5.5", "lua-5.5", "lua55"] {
            lua = pkg_config::Config::new().cargo_metadata(true).probe(pkg);
            if lua.is_ok() {
                break;
            }
        }
    }

    lua.unwrap_or_else(|err| panic!("cannot find Lua5.5 using `pkg-config`: {err}"));
}
