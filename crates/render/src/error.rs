/// Errors from frame encoding and backend submission.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    /// No drawable target; the frame loop cannot continue.
    #[error("no drawable surface available")]
    MissingSurface,
    /// A transform that must be inverted is singular or non-finite.
    #[error("{0} matrix is degenerate")]
    DegenerateTransform(&'static str),
    #[error("uniform buffer is {actual} bytes, expected {expected}")]
    UniformSize { expected: usize, actual: usize },
}

impl RenderError {
    /// Whether the frame loop must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RenderError::MissingSurface)
    }
}
