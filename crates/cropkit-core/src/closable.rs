//! Scoped release of closable handles.
//!
//! Streams handed out by a content backend may need an explicit close (a
//! provider connection, a file descriptor lease). [`Scoped`] guarantees that
//! close runs on every exit path, including `?` early returns and decode
//! failures, and discards whatever the close reports. A failed close never
//! turns into an error for the caller.

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::ops::{Deref, DerefMut};

use log::debug;

/// A handle that must be released explicitly.
pub trait Closable {
    fn close(&mut self) -> io::Result<()>;
}

impl Closable for File {
    fn close(&mut self) -> io::Result<()> {
        // The descriptor is released on drop
        Ok(())
    }
}

impl<T> Closable for Cursor<T> {
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<R: Closable> Closable for BufReader<R> {
    fn close(&mut self) -> io::Result<()> {
        self.get_mut().close()
    }
}

impl<C: Closable + ?Sized> Closable for Box<C> {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Close `resource` if present, ignoring any failure.
pub fn close_silently<C: Closable>(resource: Option<C>) {
    if let Some(mut resource) = resource {
        if let Err(e) = resource.close() {
            debug!("Ignoring close failure: {}", e);
        }
    }
}

/// Owns a [`Closable`] and closes it silently when dropped.
pub struct Scoped<C: Closable> {
    inner: C,
    closed: bool,
}

impl<C: Closable> Scoped<C> {
    pub fn new(resource: C) -> Self {
        Self {
            inner: resource,
            closed: false,
        }
    }

    /// Close now instead of at end of scope. Failures are still discarded.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.inner.close() {
            debug!("Ignoring close failure: {}", e);
        }
    }
}

impl<C: Closable> Deref for Scoped<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.inner
    }
}

impl<C: Closable> DerefMut for Scoped<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.inner
    }
}

impl<C: Closable> Drop for Scoped<C> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<C: Closable + Read> Read for Scoped<C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }
}

impl<C: Closable + Seek> Seek for Scoped<C> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        (**self).seek(pos)
    }
}
