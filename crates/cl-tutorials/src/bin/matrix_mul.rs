// 2025 Thomas Bicanic – MIT License

use std::process::ExitCode;

use clap::Parser;
use cl_tutorials::{
    config::{exit_status, init_logging, MmulArgs},
    matrix::format_matrix,
    mmul,
    platform::{enumerate_platforms, log_all_platforms},
    ClError, ClSession,
};

#[cfg(feature = "metrics")]
use cl_tutorials::summary;

fn run(args: &MmulArgs) -> Result<(), ClError> {
    args.validate()?;

    log_all_platforms(&enumerate_platforms()?);
    let session = ClSession::open(&args.session.session_config())?;

    let reports = mmul::run(&session, &args.program, args.order)?;

    for report in &reports {
        println!("---------- {} ----------", report.variant);
        if args.print {
            print!("{}", format_matrix(args.order, &report.result));
        }
        println!("Result: {}", if report.identity { "OK" } else { "ERROR" });
        println!(
            "Kernel '{}' executed in {} us",
            report.variant.kernel_name(),
            report.host_time.as_micros()
        );
        if let Some(device) = report.device_time {
            println!("Device time: {} us", device.as_micros());
        }
        println!();
    }

    #[cfg(feature = "metrics")]
    summary();

    Ok(())
}

fn main() -> ExitCode {
    let args = MmulArgs::parse();
    init_logging(args.session.log_filter());
    exit_status(run(&args))
}
