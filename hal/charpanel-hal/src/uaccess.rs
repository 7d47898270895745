//! Caller-buffer access
//!
//! The driver never reads caller memory directly; it asks the host to
//! copy bytes into its own bounded buffer. On a hosted platform this
//! maps to a user-to-kernel copy primitive; in tests it is a fake that
//! can simulate partial copies.

/// Capability for copying bytes out of a caller's buffer
pub trait CallerBuffer {
    /// Copy `dest.len()` bytes from `src` into `dest`.
    ///
    /// Returns the number of bytes that could NOT be copied (0 on full
    /// success). Bytes before the first failure are valid in `dest`.
    /// `src` is at least as long as `dest`.
    fn copy_from_caller(&mut self, dest: &mut [u8], src: &[u8]) -> usize;
}

/// In-process copy, never fails
///
/// Used when the caller's buffer already lives in the driver's address
/// space (firmware builds, host-side tools).
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectCopy;

impl CallerBuffer for DirectCopy {
    fn copy_from_caller(&mut self, dest: &mut [u8], src: &[u8]) -> usize {
        let n = dest.len();
        dest.copy_from_slice(&src[..n]);
        0
    }
}

impl<C: CallerBuffer> CallerBuffer for &mut C {
    fn copy_from_caller(&mut self, dest: &mut [u8], src: &[u8]) -> usize {
        (**self).copy_from_caller(dest, src)
    }
}
