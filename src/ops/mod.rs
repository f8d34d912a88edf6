// ============================================================================
// SIMULATION OPERATORS — physics passes and brush deposition
// ============================================================================

pub mod brush;
pub mod physics;
