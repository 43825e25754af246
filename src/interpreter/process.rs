//! Process Layer
//!
//! Thin wrappers over fork, pipe, dup2 and waitpid. Every fork goes
//! through [`fork_process`], which flushes standard output first so a
//! child never inherits buffered bytes the parent will also write.

use crate::interpreter::errors::InterpreterError;
use std::io::{self, Write};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::sync::atomic::{AtomicBool, Ordering};

pub enum ForkResult {
    Parent(libc::pid_t),
    Child,
}

/// Flush Rust's stdout buffer. Shell output normally goes straight to the
/// descriptor, but anything buffered must not be duplicated by a fork.
pub fn flush_stdout() {
    let _ = io::stdout().flush();
}

pub fn fork_process() -> Result<ForkResult, InterpreterError> {
    flush_stdout();
    // SAFETY: the interpreter runs on one thread. The only other thread is
    // the main thread, parked in `join` and holding no locks, so the child
    // inherits no lock held elsewhere. It only continues running interpreter
    // code or calls exec/_exit.
    let pid = unsafe { libc::fork() };
    match pid {
        -1 => Err(InterpreterError::process("fork", io::Error::last_os_error())),
        0 => {
            tracing::trace!("forked child");
            Ok(ForkResult::Child)
        }
        pid => {
            tracing::debug!(pid, "forked");
            Ok(ForkResult::Parent(pid))
        }
    }
}

/// (read end, write end), both close-on-exec
pub fn create_pipe() -> Result<(OwnedFd, OwnedFd), InterpreterError> {
    let mut fds = [0 as libc::c_int; 2];
    // SAFETY: fds points at two writable ints
    let rc = unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) };
    if rc == -1 {
        return Err(InterpreterError::process("pipe", io::Error::last_os_error()));
    }
    // SAFETY: pipe2 succeeded, so both descriptors are open and owned by us
    Ok(unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) })
}

/// dup2 `fd` onto `target`; the copy does not carry close-on-exec
pub fn dup_onto(fd: RawFd, target: RawFd) -> io::Result<()> {
    if fd == target {
        // dup2 to itself keeps FD_CLOEXEC; clear it explicitly
        // SAFETY: plain fcntl on a descriptor we were handed
        let rc = unsafe { libc::fcntl(fd, libc::F_SETFD, 0) };
        return if rc == -1 { Err(io::Error::last_os_error()) } else { Ok(()) };
    }
    loop {
        // SAFETY: dup2 only manipulates the descriptor table
        let rc = unsafe { libc::dup2(fd, target) };
        if rc != -1 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::EINTR) {
            return Err(err);
        }
    }
}

/// Move an owned descriptor onto a fixed slot, consuming the original
pub fn move_onto(fd: OwnedFd, target: RawFd) -> io::Result<()> {
    if fd.as_raw_fd() == target {
        dup_onto(target, target)?;
        std::mem::forget(fd);
        return Ok(());
    }
    dup_onto(fd.as_raw_fd(), target)
}

pub fn close_fd(fd: RawFd) {
    // SAFETY: closing a descriptor number; errors (EBADF) are irrelevant here
    unsafe {
        libc::close(fd);
    }
}

/// True when `fd` is an open descriptor
pub fn is_open(fd: RawFd) -> bool {
    // SAFETY: F_GETFD only queries the descriptor table
    unsafe { libc::fcntl(fd, libc::F_GETFD) != -1 }
}

/// Write every byte to a raw descriptor, retrying on EINTR
pub fn write_all_fd(fd: RawFd, mut data: &[u8]) -> io::Result<()> {
    while !data.is_empty() {
        // SAFETY: data points at data.len() readable bytes
        let n = unsafe { libc::write(fd, data.as_ptr().cast(), data.len()) };
        if n < 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EINTR) {
                continue;
            }
            return Err(err);
        }
        data = &data[n as usize..];
    }
    Ok(())
}

/// Read until end of file
pub fn read_all_fd(fd: RawFd) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match read_fd(fd, &mut buf)? {
            0 => return Ok(out),
            n => out.extend_from_slice(&buf[..n]),
        }
    }
}

/// One read(2) call, retrying on EINTR
pub fn read_fd(fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        // SAFETY: buf points at buf.len() writable bytes
        let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
        if n >= 0 {
            return Ok(n as usize);
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::EINTR) {
            return Err(err);
        }
    }
}

/// Translate a raw waitpid status into a shell exit status
pub fn decode_wait_status(raw: libc::c_int) -> i32 {
    if libc::WIFEXITED(raw) {
        libc::WEXITSTATUS(raw)
    } else if libc::WIFSIGNALED(raw) {
        128 + libc::WTERMSIG(raw)
    } else {
        1
    }
}

/// Block until `pid` terminates and return its shell status
pub fn wait_for_pid(pid: libc::pid_t) -> Result<i32, InterpreterError> {
    let mut raw: libc::c_int = 0;
    loop {
        // SAFETY: raw is a valid out-pointer
        let rc = unsafe { libc::waitpid(pid, &mut raw, 0) };
        if rc == pid {
            let status = decode_wait_status(raw);
            tracing::debug!(pid, status, "child finished");
            return Ok(status);
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::EINTR) {
            return Err(InterpreterError::process("wait", err));
        }
    }
}

/// Collect `pid` if it has already exited, without blocking
pub fn try_reap(pid: libc::pid_t) -> Option<i32> {
    let mut raw: libc::c_int = 0;
    // SAFETY: raw is a valid out-pointer
    let rc = unsafe { libc::waitpid(pid, &mut raw, libc::WNOHANG) };
    (rc == pid).then(|| decode_wait_status(raw))
}

/// Leave a forked child without running the parent's destructors
pub fn exit_child(status: i32) -> ! {
    flush_stdout();
    // SAFETY: _exit never returns and skips atexit handlers, which belong
    // to the parent process
    unsafe { libc::_exit(status & 0xff) }
}

// ============================================================================
// Signal Dispositions
// ============================================================================

/// Highest signal number a trap can name
pub const MAX_SIGNAL: usize = 64;

#[allow(clippy::declare_interior_mutable_const)]
const NOT_PENDING: AtomicBool = AtomicBool::new(false);

/// Signals caught since the last [`take_pending_signals`]
static PENDING_SIGNALS: [AtomicBool; MAX_SIGNAL + 1] = [NOT_PENDING; MAX_SIGNAL + 1];

extern "C" fn record_signal(signal: libc::c_int) {
    if let Some(flag) = usize::try_from(signal).ok().and_then(|i| PENDING_SIGNALS.get(i)) {
        flag.store(true, Ordering::SeqCst);
    }
}

fn set_disposition(signal: libc::c_int, handler: libc::sighandler_t) -> io::Result<()> {
    // SAFETY: record_signal only stores to an atomic, which is async-signal-safe
    let previous = unsafe { libc::signal(signal, handler) };
    if previous == libc::SIG_ERR {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Record `signal` for a trap instead of taking its default action
pub fn catch_signal(signal: libc::c_int) -> io::Result<()> {
    set_disposition(signal, record_signal as extern "C" fn(libc::c_int) as libc::sighandler_t)
}

pub fn ignore_signal(signal: libc::c_int) -> io::Result<()> {
    set_disposition(signal, libc::SIG_IGN)
}

pub fn default_signal(signal: libc::c_int) -> io::Result<()> {
    if let Some(flag) = usize::try_from(signal).ok().and_then(|i| PENDING_SIGNALS.get(i)) {
        flag.store(false, Ordering::SeqCst);
    }
    set_disposition(signal, libc::SIG_DFL)
}

/// Block every signal in the calling thread, so signals sent to the
/// process are handled by the interpreter thread
pub fn block_signals_in_thread() {
    // SAFETY: set is initialised by sigfillset before use
    unsafe {
        let mut set: libc::sigset_t = std::mem::zeroed();
        libc::sigfillset(&mut set);
        libc::pthread_sigmask(libc::SIG_BLOCK, &set, std::ptr::null_mut());
    }
}

/// Signals that arrived since the last call, lowest number first
pub fn take_pending_signals() -> Vec<libc::c_int> {
    PENDING_SIGNALS
        .iter()
        .enumerate()
        .filter(|(_, flag)| flag.swap(false, Ordering::SeqCst))
        .filter_map(|(signal, _)| libc::c_int::try_from(signal).ok())
        .collect()
}

/// Restore default SIGPIPE handling so pipeline writers die quietly
pub fn reset_sigpipe() {
    // SAFETY: installing SIG_DFL for SIGPIPE has no preconditions
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

pub fn current_pgid() -> libc::pid_t {
    // SAFETY: getpgrp has no preconditions
    unsafe { libc::getpgrp() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caught_signal_is_recorded() {
        catch_signal(libc::SIGUSR2).unwrap();
        // SAFETY: SIGUSR2 is caught by record_signal at this point
        unsafe { libc::raise(libc::SIGUSR2) };
        assert!(take_pending_signals().contains(&libc::SIGUSR2));
        assert!(!take_pending_signals().contains(&libc::SIGUSR2));
        default_signal(libc::SIGUSR2).unwrap();
    }

    #[test]
    fn test_decode_wait_status() {
        // exit status 3: (3 << 8)
        assert_eq!(decode_wait_status(3 << 8), 3);
        // killed by SIGKILL
        assert_eq!(decode_wait_status(libc::SIGKILL), 128 + libc::SIGKILL);
    }

    #[test]
    fn test_pipe_round_trip() {
        let (reader, writer) = create_pipe().unwrap();
        write_all_fd(writer.as_raw_fd(), b"hello").unwrap();
        drop(writer);
        assert_eq!(read_all_fd(reader.as_raw_fd()).unwrap(), b"hello");
    }

    #[test]
    fn test_fork_and_wait() {
        match fork_process().unwrap() {
            ForkResult::Child => exit_child(7),
            ForkResult::Parent(pid) => assert_eq!(wait_for_pid(pid).unwrap(), 7),
        }
    }
}
