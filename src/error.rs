//! Error types for body construction, contact solving and time stepping.

use thiserror::Error;

/// A malformed body path or an invalid construction call.
///
/// Construction errors are always fatal for the body being built; a body
/// that failed to `finish` must not be added to a simulation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    /// An edge was added while no path was open.
    #[error("open path required: call start_path before adding edges")]
    OpenPathRequired,

    /// The edge does not start where the path currently ends.
    #[error("edge not connected: edge {edge} does not start at the last vertex of the path")]
    EdgeNotConnected {
        /// Construction index the edge would have received.
        edge: usize,
    },

    /// `close_path` found the end of the path too far from its start.
    #[error("path not closed: end vertex is {gap} away from the start vertex")]
    PathNotClosed {
        /// Distance between the two vertices that should coincide.
        gap: f64,
    },

    /// A path was opened while another one was still open.
    #[error("path already open: close the current path first")]
    PathAlreadyOpen,

    /// Shape-changing call after `finish`.
    #[error("body already finished; its shape is locked")]
    AlreadyFinished,

    /// Query that needs a finished body.
    #[error("body not finished")]
    NotFinished,

    /// `finish` was called with open paths or without any edge.
    #[error("body has no closed paths")]
    EmptyBody,

    /// Zero-length straight edge or a circular edge with bad radius.
    #[error("degenerate edge: {reason}")]
    DegenerateEdge {
        /// What was wrong with the edge.
        reason: String,
    },

    /// Reference to an edge index that does not exist.
    #[error("invalid edge index {index} (body has {count} edges)")]
    InvalidEdgeIndex {
        /// Requested index.
        index: usize,
        /// Number of edges on the body.
        count: usize,
    },

    /// Special edges are only supported on four-sided straight bodies.
    #[error("special edge requires a rectangular body with 4 straight edges")]
    SpecialEdgeRequiresRectangle,

    /// Non-positive or non-finite mass or moment of inertia.
    #[error("invalid mass properties: {reason}")]
    InvalidMass {
        /// Description of the problem.
        reason: String,
    },

    /// The centroid search failed while finishing the body.
    #[error(transparent)]
    Convergence(#[from] ConvergenceError),
}

impl GeometryError {
    /// Create a degenerate edge error.
    #[must_use]
    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateEdge { reason: reason.into() }
    }

    /// Create an invalid mass error.
    #[must_use]
    pub fn invalid_mass(reason: impl Into<String>) -> Self {
        Self::InvalidMass { reason: reason.into() }
    }
}

/// The smallest-enclosing-circle search did not settle.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("centroid search did not converge after {iterations} iterations (best value {value})")]
pub struct ConvergenceError {
    /// Iterations performed before giving up.
    pub iterations: usize,
    /// Best objective value reached.
    pub value: f64,
}

/// The contact force or impulse system could not be solved.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    /// The influence matrix is singular and least squares also failed.
    #[error("singular contact system of size {size}")]
    Singular {
        /// Number of contacts in the system.
        size: usize,
    },

    /// Dropping negative forces never produced an admissible solution.
    #[error("no admissible non-negative solution for {contacts} contacts")]
    NoAdmissibleSolution {
        /// Number of contacts in the original system.
        contacts: usize,
    },

    /// NaN or infinity appeared in inputs or results.
    #[error("non-finite value in contact system")]
    NonFinite,
}

/// An `advance` call could not make progress.
///
/// The simulation state after a `StuckError` is the last consistent state
/// reached; callers are expected to report it and offer a reset.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StuckError {
    /// Bisection could not isolate the collision instant.
    #[error("bisection failed to isolate a collision at time {time} after {iterations} iterations")]
    BisectionFailed {
        /// Simulation time at the start of the failed sub-step.
        time: f64,
        /// Halvings performed.
        iterations: usize,
    },

    /// Serial impulse handling kept finding collisions, even after the
    /// bounded panic-mode retries.
    #[error("collision handling exhausted its retry budget ({attempts} attempts, {collisions} collisions remain)")]
    RetryBudgetExhausted {
        /// Collisions still needing an impulse.
        collisions: usize,
        /// Total resolution attempts made.
        attempts: usize,
    },

    /// Too many sub-steps were needed to consume the requested interval.
    #[error("sub-step limit reached at time {time} after {steps} sub-steps")]
    SubStepLimit {
        /// Simulation time when the limit was hit.
        time: f64,
        /// Sub-steps taken.
        steps: usize,
    },

    /// A contact force or impulse solve failed.
    #[error("contact solver failed: {0}")]
    Solver(#[from] SolverError),

    /// State became NaN or infinite.
    #[error("simulation diverged: {reason}")]
    Diverged {
        /// What went wrong.
        reason: String,
    },

    /// `advance` was asked to step by a negative or non-finite interval.
    #[error("invalid time step: {0} (must be finite and non-negative)")]
    InvalidTimeStep(f64),
}

impl StuckError {
    /// Create a diverged error.
    #[must_use]
    pub fn diverged(reason: impl Into<String>) -> Self {
        Self::Diverged { reason: reason.into() }
    }
}

/// Any error produced by this crate.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Convergence(#[from] ConvergenceError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Stuck(#[from] StuckError),
}
