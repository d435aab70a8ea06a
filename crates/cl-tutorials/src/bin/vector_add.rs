// 2025 Thomas Bicanic – MIT License

use std::process::ExitCode;

use clap::Parser;
use cl_tutorials::{
    config::{exit_status, init_logging, VaddArgs},
    platform::{enumerate_platforms, log_all_platforms},
    vadd, ClError, ClSession,
};

#[cfg(feature = "metrics")]
use cl_tutorials::summary;

fn run(args: &VaddArgs) -> Result<(), ClError> {
    args.validate()?;

    /* ---------- 1. Platforms, context, queue ---------------------- */
    log_all_platforms(&enumerate_platforms()?);
    let session = ClSession::open(&args.session.session_config())?;

    /* ---------- 2. Build, upload, launch, read back ---------------- */
    let report = vadd::run(&session, &args.program, args.length)?;

    /* ---------- 3. Output ------------------------------------------ */
    println!("Kernel '{}' executed in {} ms", vadd::KERNEL_NAME, report.host_time.as_millis());
    if let Some(device) = report.device_time {
        println!("Device time: {} us", device.as_micros());
    }
    for (i, v) in report.result.iter().enumerate() {
        println!("h_d[{i}] = {v:.6}");
    }
    println!("Result: {}", if report.is_correct() { "OK" } else { "ERROR" });

    #[cfg(feature = "metrics")]
    summary();

    Ok(())
}

fn main() -> ExitCode {
    let args = VaddArgs::parse();
    init_logging(args.session.log_filter());
    exit_status(run(&args))
}
