#![deny(unsafe_op_in_unsafe_fn)]

use std::ffi::c_int;
use std::slice;
use std::sync::OnceLock;

use mprof_core::{Configuration, Error, Profiler};
use rb_sys::*;

use crate::report_serializer::report_to_rb_hash;
use crate::ruby_host::RubyHost;
use crate::util::{cstr, rb_utf8_str_from, NIL_OR_UNDEF, RTEST};

static PROFILER: OnceLock<Profiler<RubyHost>> = OnceLock::new();

/// Must be called from Init_mprof, with the GVL held.
pub fn init() {
    PROFILER.get_or_init(|| Profiler::new(RubyHost::new()));
}

pub fn profiler() -> Option<&'static Profiler<RubyHost>> {
    PROFILER.get()
}

// Mprof.start(thread = Thread.current, capacity = 1000)
pub unsafe extern "C" fn rb_start(argc: c_int, argv: *const VALUE, _rbself: VALUE) -> VALUE {
    let args = unsafe { scan_args(argc, argv, 2) };
    let thread = unsafe { thread_arg(args) };
    let configuration = match args.get(1) {
        Some(&capacity) if !NIL_OR_UNDEF(capacity) => {
            Configuration::new(unsafe { rb_num2long(capacity) })
        }
        _ => Ok(Configuration::from_env()),
    };

    let result = configuration.and_then(|configuration| loaded().start(&thread, configuration));
    match result {
        Ok(()) => Qtrue.into(),
        Err(err) => unsafe { raise(err) },
    }
}

// Mprof.stop(thread = Thread.current)
pub unsafe extern "C" fn rb_stop(argc: c_int, argv: *const VALUE, _rbself: VALUE) -> VALUE {
    let thread = unsafe { thread_arg(scan_args(argc, argv, 1)) };
    match loaded().stop(&thread) {
        Ok(()) => Qtrue.into(),
        Err(err) => unsafe { raise(err) },
    }
}

// Mprof.info(thread = Thread.current) #=> [{ source => { line => stats } }, total_samples]
pub unsafe extern "C" fn rb_info(argc: c_int, argv: *const VALUE, _rbself: VALUE) -> VALUE {
    let thread = unsafe { thread_arg(scan_args(argc, argv, 1)) };
    let report = match loaded().info(&thread) {
        Ok(report) => report,
        Err(err) => unsafe { raise(err) },
    };
    log::debug!(
        "info: {} samples ({} evicted)",
        report.total_samples,
        report.evicted_samples()
    );

    unsafe {
        let result = rb_ary_new_capa(2);
        rb_ary_push(result, report_to_rb_hash(&report));
        rb_ary_push(result, rb_ull2inum(report.total_samples));
        result
    }
}

// Mprof.info_json(thread = Thread.current) #=> String
pub unsafe extern "C" fn rb_info_json(argc: c_int, argv: *const VALUE, _rbself: VALUE) -> VALUE {
    let thread = unsafe { thread_arg(scan_args(argc, argv, 1)) };
    let json = match loaded().info(&thread) {
        Ok(report) => report.to_json(),
        Err(err) => unsafe { raise(err) },
    };
    let json = match json {
        Ok(json) => json,
        Err(err) => {
            let message = format!("failed to serialize memory profile: {}", err);
            drop(err);
            unsafe { raise_with_class(rb_eRuntimeError, message) }
        }
    };
    unsafe { rb_utf8_str_from(&json) }
}

// Mprof.print(thread = Thread.current)
pub unsafe extern "C" fn rb_print(argc: c_int, argv: *const VALUE, _rbself: VALUE) -> VALUE {
    let thread = unsafe { thread_arg(scan_args(argc, argv, 1)) };
    unsafe {
        // Keep anything buffered in $stdout ahead of the report
        rb_io_flush(rb_stdout);
    }
    match loaded().print_to_stdout(&thread) {
        Ok(()) => Qnil.into(),
        Err(err) => unsafe { raise(err) },
    }
}

fn loaded() -> &'static Profiler<RubyHost> {
    match PROFILER.get() {
        Some(profiler) => profiler,
        None => panic!("[mprof FATAL] Profiler used before Init_mprof"),
    }
}

unsafe fn scan_args<'a>(argc: c_int, argv: *const VALUE, max: usize) -> &'a [VALUE] {
    let argc = usize::try_from(argc).unwrap_or(0);
    if argc > max {
        unsafe { rb_raise(rb_eArgError, cstr!("wrong number of arguments")) }
    }
    if argc == 0 {
        return &[];
    }
    unsafe { slice::from_raw_parts(argv, argc) }
}

// The first argument names the target Thread; defaults to the calling one.
unsafe fn thread_arg(args: &[VALUE]) -> VALUE {
    match args.first() {
        Some(&thread) if !NIL_OR_UNDEF(thread) => {
            if !RTEST(unsafe { rb_obj_is_kind_of(thread, rb_cThread) }) {
                unsafe { rb_raise(rb_eTypeError, cstr!("expected a Thread")) }
            }
            thread
        }
        _ => unsafe { rb_thread_current() },
    }
}

unsafe fn raise(err: Error) -> ! {
    let class = match err {
        Error::InvalidConfiguration { .. } | Error::CapacityTooLarge { .. } => unsafe {
            rb_eArgError
        },
        Error::NotStarted => unsafe { not_started_error_class() },
        Error::Io(_) => unsafe { rb_eIOError },
    };
    let message = err.to_string();
    drop(err);
    unsafe { raise_with_class(class, message) }
}

// rb_exc_raise does not return, so nothing owned may be left on the Rust stack.
unsafe fn raise_with_class(class: VALUE, message: String) -> ! {
    let message_value = unsafe { rb_utf8_str_from(&message) };
    drop(message);
    unsafe { rb_exc_raise(rb_exc_new_str(class, message_value)) }
}

#[allow(non_snake_case)]
unsafe fn not_started_error_class() -> VALUE {
    unsafe {
        let rb_mMprof = rb_define_module(cstr!("Mprof"));
        rb_const_get(rb_mMprof, rb_intern(cstr!("NotStartedError")))
    }
}
