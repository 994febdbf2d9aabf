use mprof_core::Report;
use rb_sys::*;

use crate::util::rb_utf8_str_from;

/// Converts a report into `{ source => { line => { "memory" =>, "memory_delta" => } } }`.
pub unsafe fn report_to_rb_hash(report: &Report) -> VALUE {
    unsafe {
        let sources = rb_hash_new();
        for group in report.sources.iter() {
            let lines = rb_hash_new();
            for entry in group.lines.iter() {
                let values = rb_hash_new();
                rb_hash_aset(values, rb_utf8_str_from("memory"), rb_ull2inum(entry.memory_used));
                rb_hash_aset(
                    values,
                    rb_utf8_str_from("memory_delta"),
                    rb_ll2inum(entry.memory_delta),
                );
                rb_hash_aset(lines, rb_ll2inum(entry.line as i64), values);
            }
            rb_hash_aset(sources, rb_utf8_str_from(&group.source), lines);
        }
        sources
    }
}
