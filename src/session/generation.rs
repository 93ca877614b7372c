/// Monotonic session identity.
///
/// Every new scanning or quiz session takes the next value; results tagged
/// with an older value belong to a session that no longer exists.
#[derive(Debug, Default)]
pub struct Generation {
    current: u64,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the id for a new session
    pub fn advance(&mut self) -> u64 {
        self.current += 1;
        self.current
    }

    /// Most recently issued id, 0 before any session
    pub fn current(&self) -> u64 {
        self.current
    }
}
