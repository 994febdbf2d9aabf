#![deny(unsafe_op_in_unsafe_fn)]

use std::collections::HashMap;
use std::ffi::c_void;
use std::ptr::addr_of_mut;
use std::slice;
use std::sync::Mutex;

use mprof_core::{ContextId, Host, Location, LocationUnresolved, Statement};
use rb_sys::*;

use crate::ruby_api;
use crate::util::{cstr, NIL_OR_UNDEF};

/// Size of one object slot in the Ruby heap.
// FIXME: Variable Width Allocation uses larger slots for some objects
const SLOT_SIZE: u64 = 40;

/// CRuby as seen by the profiler.
///
/// A profiled context is a Ruby Thread. Its statement hook is a `:line` TracePoint
/// targeted at that Thread, which also listens for `:thread_end` so that a Thread dying
/// without `Mprof.stop` releases its session and GC roots.
pub struct RubyHost {
    hooks: Mutex<HashMap<ContextId, Box<HookTarget>>>,
    gc_stat_keys: GcStatKeys,
}

struct GcStatKeys {
    heap_live_slots: VALUE,
    malloc_increase_bytes: VALUE,
}

// Passed to the TracePoint callback as its data pointer.
// Both VALUEs are registered as GC roots while the hook is installed.
struct HookTarget {
    id: ContextId,
    thread: VALUE,
    tracepoint: VALUE,
}

impl RubyHost {
    /// Must be called with the GVL held.
    pub fn new() -> Self {
        let gc_stat_keys = unsafe {
            GcStatKeys {
                heap_live_slots: rb_id2sym(rb_intern(cstr!("heap_live_slots"))),
                malloc_increase_bytes: rb_id2sym(rb_intern(cstr!("malloc_increase_bytes"))),
            }
        };
        Self {
            hooks: Mutex::new(HashMap::new()),
            gc_stat_keys,
        }
    }

    unsafe extern "C" fn on_event(tracepoint: VALUE, data: *mut c_void) {
        let target = unsafe { &*(data as *const HookTarget) };
        // Guard against TracePoints which are not thread-targeted on this Ruby version
        if unsafe { rb_thread_current() } != target.thread {
            return;
        }
        let Some(profiler) = ruby_api::profiler() else {
            return;
        };

        let event = unsafe { rb_tracearg_event_flag(rb_tracearg_from_tracepoint(tracepoint)) };
        if event & RUBY_EVENT_THREAD_END as rb_event_flag_t != 0 {
            let thread = target.thread;
            // Frees `target`
            profiler.on_context_exit(&thread);
            return;
        }
        profiler.on_statement(target.id, &LineEvent { tracepoint });
    }

    fn remove_hook(mut target: Box<HookTarget>) {
        unsafe {
            rb_tracepoint_disable(target.tracepoint);
            rb_gc_unregister_address(addr_of_mut!(target.tracepoint));
            rb_gc_unregister_address(addr_of_mut!(target.thread));
        }
        log::trace!("Removed line hook for {}", target.id);
    }
}

impl Host for RubyHost {
    type Context = VALUE;

    fn context_id(&self, thread: &VALUE) -> ContextId {
        // Thread#object_id is never reused and survives compaction
        ContextId::new(unsafe { rb_num2ull(rb_obj_id(*thread)) })
    }

    fn set_hook(&self, thread: &VALUE, id: ContextId) {
        let mut target = Box::new(HookTarget {
            id,
            thread: *thread,
            tracepoint: Qnil.into(),
        });
        let data = &mut *target as *mut HookTarget as *mut c_void;
        unsafe {
            rb_gc_register_address(addr_of_mut!(target.thread));
            target.tracepoint = rb_tracepoint_new(
                *thread,
                (RUBY_EVENT_LINE | RUBY_EVENT_THREAD_END) as rb_event_flag_t,
                Some(Self::on_event),
                data,
            );
            rb_gc_register_address(addr_of_mut!(target.tracepoint));
            rb_tracepoint_enable(target.tracepoint);
        }
        log::trace!("Installed line hook for {}", id);

        let previous = match self.hooks.lock() {
            Ok(mut hooks) => hooks.insert(id, target),
            Err(_) => panic!("[mprof FATAL] set_hook: Failed to acquire hooks lock."),
        };
        if let Some(previous) = previous {
            Self::remove_hook(previous);
        }
    }

    fn clear_hook(&self, _thread: &VALUE, id: ContextId) {
        let target = match self.hooks.lock() {
            Ok(mut hooks) => hooks.remove(&id),
            Err(_) => panic!("[mprof FATAL] clear_hook: Failed to acquire hooks lock."),
        };
        if let Some(target) = target {
            Self::remove_hook(target);
        }
    }

    fn memory_used_bytes(&self) -> u64 {
        let (live_slots, malloc_increase) = unsafe {
            (
                rb_gc_stat(self.gc_stat_keys.heap_live_slots) as u64,
                rb_gc_stat(self.gc_stat_keys.malloc_increase_bytes) as u64,
            )
        };
        live_slots * SLOT_SIZE + malloc_increase
    }
}

/// The statement a `:line` TracePoint fired for.
struct LineEvent {
    tracepoint: VALUE,
}

impl Statement for LineEvent {
    fn location(&self) -> Result<Location<'_>, LocationUnresolved> {
        unsafe {
            let trace_arg = rb_tracearg_from_tracepoint(self.tracepoint);
            let path = rb_tracearg_path(trace_arg);
            if NIL_OR_UNDEF(path) || !RB_TYPE_P(path, ruby_value_type::RUBY_T_STRING) {
                return Err(LocationUnresolved);
            }
            let lineno = rb_num2long(rb_tracearg_lineno(trace_arg));

            let bytes =
                slice::from_raw_parts(RSTRING_PTR(path) as *const u8, RSTRING_LEN(path) as usize);
            let source = std::str::from_utf8(bytes).map_err(|_| LocationUnresolved)?;
            let line = i32::try_from(lineno).map_err(|_| LocationUnresolved)?;
            Ok(Location { source, line })
        }
    }
}
