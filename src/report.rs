//! Text rendering of trusses and optimization results.

use std::fmt::Write;

use crate::analysis::{ConvergenceReport, RoundOutcome};
use crate::geometry::Point;
use crate::optimizer::BestSnapshot;
use crate::truss::Truss;

/// Letter label for a joint: `A` to `Z`, then `J26`, `J27`, ...
#[must_use]
pub fn joint_label(joint: usize) -> String {
    match u8::try_from(joint) {
        Ok(offset) if offset < 26 => char::from(b'A' + offset).to_string(),
        _ => format!("J{joint}"),
    }
}

/// Append one `label: (x, y)` line per joint.
fn write_coordinates(output: &mut String, coordinates: &[Point]) {
    for (joint, position) in coordinates.iter().enumerate() {
        writeln!(
            output,
            "{}: ({:.4}, {:.4})",
            joint_label(joint),
            position.x,
            position.y
        )
        .expect("writing to string cannot fail");
    }
}

/// Render the current joint positions and member forces.
#[must_use]
pub fn render_truss(truss: &Truss) -> String {
    let coordinates: Vec<Point> = (0..truss.joint_count())
        .filter_map(|joint| truss.joint_position(joint))
        .collect();
    let mut output = String::new();
    write_coordinates(&mut output, &coordinates);

    for member in truss.members() {
        let (a, b) = member.endpoints();
        let label = format!("{}{}", joint_label(a), joint_label(b));
        let written = match truss.member_force(a, b) {
            Some(force) => writeln!(output, "Member {label}: {force:+.4}"),
            None => writeln!(output, "Member {label}: unsolved"),
        };
        written.expect("writing to string cannot fail");
    }
    output
}

/// Render the best recorded cost and its joint coordinates.
#[must_use]
pub fn render_best(best: &BestSnapshot) -> String {
    let mut output = String::new();
    if best.is_solved() {
        writeln!(output, "Cost: {:.6}", best.cost()).expect("writing to string cannot fail");
    } else {
        output.push_str("Cost: unsolved\n");
    }
    write_coordinates(&mut output, best.coordinates());
    output
}

/// Render the outcome of a single round.
#[must_use]
pub fn render_round(outcome: &RoundOutcome) -> String {
    let mut output = String::new();
    writeln!(
        output,
        "Round {} ({} of {} leaves solved)",
        outcome.round, outcome.stats.solved, outcome.stats.leaves
    )
    .expect("writing to string cannot fail");
    writeln!(output, "Cost: {:.6}", outcome.best_cost).expect("writing to string cannot fail");
    write_coordinates(&mut output, &outcome.coordinates);
    output
}

/// Render every round of a run followed by its final status.
#[must_use]
pub fn render_report(report: &ConvergenceReport) -> String {
    let mut output = String::new();
    for outcome in &report.rounds {
        output.push_str(&render_round(outcome));
    }
    if report.converged {
        output.push_str("done!\n");
    } else {
        output.push_str("stopped at round limit\n");
    }
    output
}
