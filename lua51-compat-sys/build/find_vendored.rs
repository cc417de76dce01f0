#![allow(dead_code)]

pub fn probe_lua() {
    #[cfg(feature = "lua55")]
    let artifacts = lua_src::Build::new().build(lua_src::Lua55);

    // The stack size must match `LUAI_MAXCSTACK` in the bindings
    #[cfg(feature = "luau")]
    let artifacts = luau0_src::Build::new()
        .enable_codegen(false)
        .set_max_cstack_size(1000000)
        .set_vector_size(3)
        .build();

    artifacts.print_cargo_metadata();
}
