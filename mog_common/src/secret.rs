use std::{
    fmt,
    fmt::{Debug, Display},
};

/// A wrapper that keeps credentials and tokens out of logs and debug output.
///
/// Both `Debug` and `Display` print `****` for any inner type; the only ways at
/// the value are [`Secret::reveal`] and [`Secret::take`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret<T> {
    inner: T,
}

impl<T> Secret<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Borrows the secret value. Callers must not forward it to a logger.
    pub fn reveal(&self) -> &T {
        &self.inner
    }

    /// Unwraps the secret, consuming the guard.
    pub fn take(self) -> T {
        self.inner
    }
}

impl<T> From<T> for Secret<T> {
    fn from(inner: T) -> Self {
        Self::new(inner)
    }
}

impl<T> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

#[cfg(test)]
mod test {
    use super::Secret;

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let secret = Secret::new("hunter2".to_string());
        assert_eq!(format!("{secret:?}"), "****");
        assert_eq!(format!("{secret}"), "****");
        assert_eq!(secret.reveal(), "hunter2");
    }

    #[test]
    fn secrets_wrap_non_default_types() {
        struct ApiKey(&'static str);
        let secret = Secret::from(ApiKey("k-123"));
        assert_eq!(format!("{secret:?}"), "****");
        assert_eq!(secret.take().0, "k-123");
    }
}
