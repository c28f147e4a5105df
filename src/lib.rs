#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_doc_code_examples)]
#![warn(clippy::missing_docs_in_private_items)]
#![doc = include_str!("../README.md")]

pub mod analysis;
pub mod constraints;
pub mod errors;
pub mod geometry;
pub mod matrix;
pub mod member;
pub mod optimizer;
pub mod problem;
pub mod report;
pub mod truss;

pub use analysis::{optimize_until_converged, ConvergenceReport, RoundOutcome, Settings};
pub use constraints::{Band, ValidityPredicate};
pub use errors::{
    AnalysisError, ConvergenceError, DisplacementError, ProblemError, TrussEditError,
};
pub use geometry::{point, Point};
pub use matrix::LinearSystemSolver;
pub use member::Member;
pub use optimizer::{BestSnapshot, DisplacementSet, RoundStats, UNSOLVED_COST};
pub use problem::parse_problem;
pub use report::{joint_label, render_best, render_report, render_round, render_truss};
pub use truss::Truss;
