//! Exclusion flag for the pipeline.

/// Set while a decision or an enrollment is in progress.
///
/// While held, the pipeline does not poll either credential source.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingLock {
    held: bool,
}

impl ProcessingLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock. Returns `false` if it was already held.
    pub fn acquire(&mut self) -> bool {
        !std::mem::replace(&mut self.held, true)
    }

    pub fn release(&mut self) {
        self.held = false;
    }

    pub fn is_held(&self) -> bool {
        self.held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_release() {
        let mut lock = ProcessingLock::new();
        assert!(!lock.is_held());

        assert!(lock.acquire());
        assert!(lock.is_held());
        assert!(!lock.acquire());

        lock.release();
        assert!(!lock.is_held());
        assert!(lock.acquire());
    }
}
