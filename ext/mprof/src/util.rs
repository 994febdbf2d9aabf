use core::mem::transmute;
use std::ffi::{c_char, c_long};

use rb_sys::*;

// Convert str literal to C string literal
macro_rules! cstr {
    ($s:expr) => {
        concat!($s, "\0").as_ptr() as *const std::ffi::c_char
    };
}
pub(crate) use cstr;

pub type RubyCFunc = unsafe extern "C" fn() -> VALUE;

pub fn to_ruby_cfunc_with_args<T, U, V>(f: unsafe extern "C" fn(T, U, V) -> VALUE) -> RubyCFunc {
    unsafe { transmute::<unsafe extern "C" fn(T, U, V) -> VALUE, RubyCFunc>(f) }
}

#[allow(non_snake_case)]
pub fn RTEST(v: VALUE) -> bool {
    v != Qfalse as VALUE && v != Qnil as VALUE
}

#[allow(non_snake_case)]
pub fn NIL_OR_UNDEF(v: VALUE) -> bool {
    v == Qnil as VALUE || v == Qundef as VALUE
}

/// Copies a Rust string into a new UTF-8 Ruby String.
pub unsafe fn rb_utf8_str_from(s: &str) -> VALUE {
    unsafe { rb_utf8_str_new(s.as_ptr() as *const c_char, s.len() as c_long) }
}
