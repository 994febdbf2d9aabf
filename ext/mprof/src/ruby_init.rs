#![deny(unsafe_op_in_unsafe_fn)]

use rb_sys::*;

use crate::ruby_api;
use crate::util::{cstr, to_ruby_cfunc_with_args};

#[allow(non_snake_case)]
#[no_mangle]
extern "C" fn Init_mprof() {
    #[cfg(feature = "debug")]
    {
        env_logger::builder()
            .format_timestamp(None)
            .format_module_path(false)
            .init();
    }

    ruby_api::init();

    unsafe {
        let rb_mMprof: VALUE = rb_define_module(cstr!("Mprof"));
        rb_define_class_under(rb_mMprof, cstr!("NotStartedError"), rb_eRuntimeError);

        rb_define_module_function(
            rb_mMprof,
            cstr!("start"),
            Some(to_ruby_cfunc_with_args(ruby_api::rb_start)),
            -1,
        );
        rb_define_module_function(
            rb_mMprof,
            cstr!("stop"),
            Some(to_ruby_cfunc_with_args(ruby_api::rb_stop)),
            -1,
        );
        rb_define_module_function(
            rb_mMprof,
            cstr!("info"),
            Some(to_ruby_cfunc_with_args(ruby_api::rb_info)),
            -1,
        );
        rb_define_module_function(
            rb_mMprof,
            cstr!("info_json"),
            Some(to_ruby_cfunc_with_args(ruby_api::rb_info_json)),
            -1,
        );
        rb_define_module_function(
            rb_mMprof,
            cstr!("print"),
            Some(to_ruby_cfunc_with_args(ruby_api::rb_print)),
            -1,
        );
    }
}
