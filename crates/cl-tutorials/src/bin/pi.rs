// 2025 Thomas Bicanic – MIT License

use std::process::ExitCode;

use clap::Parser;
use cl_tutorials::{
    config::{exit_status, init_logging, PiArgs},
    pi,
    platform::{enumerate_platforms, log_all_platforms},
    ClError, ClSession,
};

#[cfg(feature = "metrics")]
use cl_tutorials::summary;

fn run(args: &PiArgs) -> Result<(), ClError> {
    args.validate()?;

    log_all_platforms(&enumerate_platforms()?);
    let session = ClSession::open(&args.session.session_config())?;

    println!(
        "--------------- Kernel: 1 work item per iteration ({} groups of {}) ---------------",
        args.work_group_count(),
        args.work_group_size
    );
    let report = pi::run(&session, &args.program, args.subdivisions, args.work_group_size)?;

    println!("Result: {:.6}", report.pi);
    println!("Error vs pi: {:.3e}", report.error());
    println!(
        "Host reference: {:.6} ({})",
        report.reference,
        if report.matches_reference() { "OK" } else { "ERROR" }
    );
    println!("Executed in {} us", report.host_time.as_micros());
    if let Some(device) = report.device_time {
        println!("Device time: {} us", device.as_micros());
    }

    #[cfg(feature = "metrics")]
    summary();

    Ok(())
}

fn main() -> ExitCode {
    let args = PiArgs::parse();
    init_logging(args.session.log_filter());
    exit_status(run(&args))
}
