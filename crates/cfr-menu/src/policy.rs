use cfr_error::Result;

/// Variable policy service: lock a variable read-only from now on.
///
/// Optional. Without one, read-only options are shown read-only but their
/// variables stay writable.
pub trait PolicyLock {
    fn lock_now(&self, name: &str) -> Result<()>;
}
