pub mod aggregate;
pub mod criteria;
pub mod info;
pub mod logical;
pub mod lookup;
pub mod math;
pub mod text;
pub mod utils;

pub(crate) fn register_builtins() {
    aggregate::register_builtins();
    criteria::register_builtins();
    info::register_builtins();
    logical::register_builtins();
    lookup::register_builtins();
    math::register_builtins();
    text::register_builtins();
}
