//! times - Print accumulated process times
//!
//! The first line is the shell's own user and system time, the second
//! that of its waited-for children.

use crate::interpreter::helpers::result::BuiltinResult;

fn format_ticks(ticks: libc::clock_t, per_second: i64) -> String {
    let seconds = ticks as f64 / per_second as f64;
    let minutes = (seconds / 60.0).floor();
    format!("{}m{:.6}s", minutes as i64, seconds - minutes * 60.0)
}

pub fn handle_times() -> BuiltinResult {
    // SAFETY: a zeroed tms is a valid out-parameter for times
    let mut usage: libc::tms = unsafe { std::mem::zeroed() };
    // SAFETY: usage is a valid out-pointer; sysconf has no preconditions
    let (rc, per_second) = unsafe { (libc::times(&mut usage), libc::sysconf(libc::_SC_CLK_TCK)) };
    if rc as i64 == -1 || per_second <= 0 {
        return BuiltinResult::failure("posish: times: cannot read process times\n", 1);
    }
    let per_second = i64::from(per_second);
    BuiltinResult::success(format!(
        "{} {}\n{} {}\n",
        format_ticks(usage.tms_utime, per_second),
        format_ticks(usage.tms_stime, per_second),
        format_ticks(usage.tms_cutime, per_second),
        format_ticks(usage.tms_cstime, per_second),
    ))
}
