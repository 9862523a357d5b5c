use std::fmt;

use zeroize::Zeroize;

/// A wrapper that prevents accidental exposure of sensitive values.
///
/// `Secret<T>` holds credential material (candidate passwords, encoded
/// requests that embed them) for the duration of a single gate evaluation.
/// The wrapped value can only be read through the explicit
/// [`expose_secret`](Self::expose_secret) method and is wiped when the
/// wrapper is dropped.
///
/// # Security Properties
///
/// - Does NOT implement `Deref`, `AsRef`, `Borrow`, `Clone`, or `Copy`
/// - Debug and Display output is always `[REDACTED]`
/// - No type information is leaked in formatted output
/// - Contents are zeroed on drop
///
/// # Examples
///
/// ```
/// use credential_gate::Secret;
///
/// let password = Secret::new("hunter2".to_string());
///
/// // Safe: secrets are automatically redacted
/// println!("{:?}", password); // Prints: [REDACTED]
/// println!("{}", password);   // Prints: [REDACTED]
///
/// assert_eq!(password.expose_secret(), "hunter2");
/// ```
///
/// A secret cannot be duplicated:
///
/// ```compile_fail
/// use credential_gate::Secret;
///
/// let password = Secret::new("hunter2".to_string());
/// let _copy = password.clone();
/// ```
// BREAKING CHANGE WARNING: Do NOT add Clone, Copy, or Default derives.
// A clone is a second copy of the credential that outlives the wipe of the first.
pub struct Secret<T: Zeroize> {
    // BREAKING CHANGE WARNING: This field MUST remain private.
    inner: T,
}

impl<T: Zeroize> Secret<T> {
    /// Wraps a sensitive value in a `Secret`.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Explicitly exposes the secret value.
    ///
    /// # Security Warning
    ///
    /// The exposed reference must not reach a log, an error message or any
    /// persistent store.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }

    /// Mutable access for in-place construction of secret buffers.
    pub(crate) fn expose_secret_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    /// BREAKING CHANGE WARNING: This MUST unconditionally return "[REDACTED]" (CWE-532).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    /// BREAKING CHANGE WARNING: This MUST unconditionally return "[REDACTED]" (CWE-532).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
