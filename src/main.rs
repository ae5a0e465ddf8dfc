//! `thinfilm` command-line entry point.

use std::io::{self, BufWriter, Write};

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::ProgressBar;
use log::info;
use thinfilm::output::{self, ResultReport, SweepReport, ValidationJson};
use thinfilm::settings::{self, CliArgs, Settings, SweepSettings};
use thinfilm::sweep;
use thinfilm::trace::Trace;
use thinfilm::validation;

fn main() -> Result<()> {
    env_logger::init();
    let args = CliArgs::parse();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    let outcome = if args.validate {
        run_validation(&mut out, &args)
    } else {
        let settings = settings::load_config(&args)?;
        match settings.sweep {
            Some(range) => run_sweep(&mut out, &args, &settings, range),
            None => run_single(&mut out, &args, &settings),
        }
    };
    out.flush()?;
    outcome
}

fn run_single<W: Write>(out: &mut W, args: &CliArgs, settings: &Settings) -> Result<()> {
    let problem = settings.problem();
    let mut trace = Trace::new();
    match problem.compute_with_polarization(settings.polarization, &mut trace) {
        Ok(result) => {
            if args.json {
                output::write_json(out, &ResultReport::new(settings, &result, &trace))
            } else {
                output::write_result(out, settings, &result, &trace, args.quiet)
            }
        }
        Err(err) => {
            // the partial log shows which step failed
            if !args.quiet && !args.json {
                write!(out, "{}", trace.full_log())?;
            }
            Err(err).context("Calculation failed")
        }
    }
}

fn run_sweep<W: Write>(
    out: &mut W,
    args: &CliArgs,
    settings: &Settings,
    range: SweepSettings,
) -> Result<()> {
    let problem = settings.problem();
    let result = if args.quiet || args.json {
        sweep::angle_sweep_with(
            &problem,
            settings.polarization,
            range.start,
            range.end,
            range.points,
            ProgressBar::hidden(),
        )
    } else {
        sweep::angle_sweep(
            &problem,
            settings.polarization,
            range.start,
            range.end,
            range.points,
        )
    };
    let sweep = result.context("Angle sweep failed")?;

    if args.json {
        output::write_json(out, &SweepReport::new(settings, &sweep))
    } else {
        output::write_sweep(out, &sweep)
    }
}

fn run_validation<W: Write>(out: &mut W, args: &CliArgs) -> Result<()> {
    let mut trace = Trace::new();
    let report = validation::run_reference_suite(&mut trace).context("Validation run failed")?;

    if args.json {
        output::write_json(out, &ValidationJson::new(&report, &trace))?;
    } else {
        output::write_validation(out, &report, &trace, args.quiet)?;
    }

    if !report.passed() {
        bail!("Reference validation failed");
    }
    info!("reference validation passed");
    Ok(())
}
