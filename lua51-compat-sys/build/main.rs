cfg_if::cfg_if! {
    if #[cfg(all(feature = "lua55", not(feature = "luau")))] {
        include!("main_inner.rs");
    } else if #[cfg(all(feature = "luau", not(feature = "lua55")))] {
        include!("main_inner.rs");
    } else {
        fn main() {
            compile_error!("You must enable exactly one of the features: lua55, luau");
        }
    }
}
