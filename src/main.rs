use std::error::Error;
use std::io::Read;
use std::{env, fs, io};

use trussopt::{optimize_until_converged, parse_problem, render_report, render_truss, Settings};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let mut args = env::args().skip(1);

    // The problem comes from the first argument, or standard input when the
    // argument is missing or `-`.
    let text = match args.next().as_deref() {
        None | Some("-") => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
        Some(path) => fs::read_to_string(path)?,
    };
    let mut truss = parse_problem(&text)?;

    // An optional JSON file overrides the search settings.
    let settings = match args.next() {
        Some(path) => Settings::from_json(&fs::read_to_string(path)?)?,
        None => Settings::default(),
    };

    // Keep moving the free joints until a round stops paying off, then show
    // every round and the forces in the final geometry.
    let report = optimize_until_converged(&mut truss, &settings)?;
    print!("{}", render_report(&report));
    print!("{}", render_truss(&truss));

    Ok(())
}
