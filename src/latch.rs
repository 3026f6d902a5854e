/// Bridges "finishing event classified" to "history committed".
///
/// The classifier path is the only producer (`raise`) and the committer the only
/// consumer; submission and reset `clear` it. Raising an already raised latch is a
/// no-op, so at most one finalize is ever outstanding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FinalizeLatch {
    #[default]
    Clear,
    Raised,
}

impl FinalizeLatch {
    pub fn raise(&mut self) {
        *self = Self::Raised;
    }

    pub fn clear(&mut self) {
        *self = Self::Clear;
    }

    #[must_use]
    pub fn is_raised(&self) -> bool {
        matches!(self, Self::Raised)
    }
}
