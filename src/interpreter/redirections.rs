//! Redirection Handling
//!
//! Applies redirections to the real descriptor table:
//! - < : Read from file
//! - > / >| : Write to file (> respects noclobber)
//! - >> : Append to file
//! - <> : Open for reading and writing
//! - n>&m / n<&m : Duplicate descriptor m onto n, `-` closes n
//! - << / <<- : Here-document on standard input
//!
//! In-process commands run under a [`RedirectionGuard`] that saves every
//! descriptor it touches and puts it back when dropped. Forked children
//! apply redirections without a guard.

use crate::ast::types::{HereDocNode, RedirectionNode, RedirectionOperator, RedirectionTarget};
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::execution_engine::ExecutionEngine;
use crate::interpreter::helpers::bytes::{encode_text, to_path};
use crate::interpreter::process::{close_fd, create_pipe, dup_onto, flush_stdout, is_open, move_onto, write_all_fd};
use crate::interpreter::types::InterpreterState;
use std::fs::{self, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Here-documents up to this size go through a pipe; larger ones through
/// an unlinked temporary file so the writer can never block.
const HEREDOC_PIPE_LIMIT: usize = 64 * 1024;

/// Saved descriptors live at or above this number
const SAVED_FD_BASE: RawFd = 10;

static HEREDOC_COUNTER: AtomicUsize = AtomicUsize::new(0);

// ============================================================================
// Guard
// ============================================================================

/// Restores redirected descriptors when dropped
#[derive(Debug, Default)]
pub struct RedirectionGuard {
    /// (descriptor, saved copy or None when it was closed), in save order
    saved: Vec<(RawFd, Option<OwnedFd>)>,
    persistent: bool,
}

impl RedirectionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the current state of `fd`; only the first save counts
    fn save(&mut self, fd: RawFd) -> Result<(), InterpreterError> {
        if self.saved.iter().any(|(saved, _)| *saved == fd) {
            return Ok(());
        }
        let copy = if is_open(fd) {
            // SAFETY: F_DUPFD_CLOEXEC duplicates an open descriptor we do not own
            let dup = unsafe { libc::fcntl(fd, libc::F_DUPFD_CLOEXEC, SAVED_FD_BASE) };
            if dup == -1 {
                return Err(InterpreterError::redirection(fd.to_string(), io::Error::last_os_error()));
            }
            // SAFETY: fcntl returned a fresh descriptor owned by nobody else
            Some(unsafe { OwnedFd::from_raw_fd(dup) })
        } else {
            None
        };
        self.saved.push((fd, copy));
        Ok(())
    }

    /// Keep the redirections in place (`exec` without a command)
    pub fn persist(&mut self) {
        self.persistent = true;
        self.saved.clear();
    }
}

impl Drop for RedirectionGuard {
    fn drop(&mut self) {
        if self.persistent || self.saved.is_empty() {
            return;
        }
        flush_stdout();
        while let Some((fd, copy)) = self.saved.pop() {
            match copy {
                Some(copy) => {
                    if let Err(e) = dup_onto(copy.as_raw_fd(), fd) {
                        tracing::debug!(fd, error = %e, "failed to restore descriptor");
                    }
                }
                None => close_fd(fd),
            }
        }
    }
}

// ============================================================================
// Sources
// ============================================================================

/// What a descriptor is rewired to
enum RedirectSource {
    File(OwnedFd),
    Dup(RawFd),
    Close,
}

fn open_target(path: &str, operator: RedirectionOperator, noclobber: bool) -> Result<OwnedFd, InterpreterError> {
    let mut options = OpenOptions::new();
    options.mode(0o666);
    match operator {
        RedirectionOperator::Less => {
            options.read(true);
        }
        RedirectionOperator::Great | RedirectionOperator::Clobber => {
            if operator == RedirectionOperator::Great && noclobber {
                if let Ok(meta) = fs::metadata(path) {
                    if meta.is_file() {
                        return Err(InterpreterError::Redirect(format!(
                            "{}: cannot overwrite existing file",
                            path
                        )));
                    }
                }
            }
            options.write(true).create(true).truncate(true);
        }
        RedirectionOperator::DGreat => {
            options.append(true).create(true);
        }
        RedirectionOperator::LessGreat => {
            options.read(true).write(true).create(true);
        }
        other => return Err(InterpreterError::Redirect(format!("{}: not a file redirection", other))),
    }
    let file = options
        .open(to_path(path))
        .map_err(|e| InterpreterError::redirection(path, e))?;
    Ok(OwnedFd::from(file))
}

/// Source descriptor for `n>&word` / `n<&word`
fn dup_source(word: &str) -> Result<RedirectSource, InterpreterError> {
    if word == "-" {
        return Ok(RedirectSource::Close);
    }
    let fd: RawFd = word
        .parse()
        .map_err(|_| InterpreterError::Redirect(format!("{}: ambiguous redirect", word)))?;
    if !is_open(fd) {
        return Err(InterpreterError::Redirect(format!("{}: Bad file descriptor", word)));
    }
    Ok(RedirectSource::Dup(fd))
}

/// Readable descriptor holding the here-document body
fn heredoc_source(body: &str) -> Result<OwnedFd, InterpreterError> {
    if body.len() <= HEREDOC_PIPE_LIMIT {
        let (reader, writer) = create_pipe()?;
        write_all_fd(writer.as_raw_fd(), &encode_text(body))
            .map_err(|e| InterpreterError::redirection("here-document", e))?;
        return Ok(reader);
    }

    let path = std::env::temp_dir().join(format!(
        "posish-heredoc-{}-{}",
        std::process::id(),
        HEREDOC_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    let to_err = |e: io::Error| InterpreterError::redirection("here-document", e);
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(&path)
        .map_err(to_err)?;
    fs::remove_file(&path).map_err(to_err)?;
    file.write_all(&encode_text(body)).map_err(to_err)?;
    file.seek(SeekFrom::Start(0)).map_err(to_err)?;
    Ok(OwnedFd::from(file))
}

impl<'a> ExecutionEngine<'a> {
    fn heredoc_text(&self, state: &mut InterpreterState, heredoc: &HereDocNode) -> Result<String, InterpreterError> {
        if heredoc.quoted {
            return Ok(heredoc.content.literal_text().unwrap_or_default());
        }
        self.expand_word_string(state, &heredoc.content)
    }

    fn redirect_source(&self, state: &mut InterpreterState, redir: &RedirectionNode) -> Result<RedirectSource, InterpreterError> {
        match (&redir.target, redir.operator) {
            (RedirectionTarget::HereDoc(heredoc), _) => {
                let body = self.heredoc_text(state, heredoc)?;
                Ok(RedirectSource::File(heredoc_source(&body)?))
            }
            (RedirectionTarget::Word(word), RedirectionOperator::GreatAnd | RedirectionOperator::LessAnd) => {
                let target = self.expand_redirect_target(state, word)?;
                dup_source(&target)
            }
            (RedirectionTarget::Word(word), operator) => {
                let target = self.expand_redirect_target(state, word)?;
                Ok(RedirectSource::File(open_target(&target, operator, state.options.noclobber)?))
            }
        }
    }

    /// Apply redirections left to right. With a guard, every touched
    /// descriptor is saved first so the guard can restore it.
    pub fn apply_redirections(
        &self,
        state: &mut InterpreterState,
        redirections: &[RedirectionNode],
        mut guard: Option<&mut RedirectionGuard>,
    ) -> Result<(), InterpreterError> {
        for redir in redirections {
            let fd = redir.target_fd();
            let source = self.redirect_source(state, redir)?;

            if let Some(guard) = guard.as_deref_mut() {
                guard.save(fd)?;
            }
            if fd == 1 {
                flush_stdout();
            }

            let applied = match source {
                RedirectSource::File(file) => move_onto(file, fd),
                RedirectSource::Dup(src) if src == fd => Ok(()),
                RedirectSource::Dup(src) => dup_onto(src, fd),
                RedirectSource::Close => {
                    close_fd(fd);
                    Ok(())
                }
            };
            applied.map_err(|e| InterpreterError::redirection(fd.to_string(), e))?;
            tracing::trace!(fd, op = %redir.operator, "redirection applied");
        }
        Ok(())
    }
}
