// 2025 Thomas Bicanic – MIT License

//! Command-line configuration of the three programs.

use std::{path::PathBuf, process::ExitCode};

use clap::{ArgAction, Args, Parser};

use crate::{mmul::MAX_ORDER, session::SessionConfig, ClError};

pub const VADD_PROGRAM: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/kernels/vadd.cl");
pub const MMUL_PROGRAM: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/kernels/mmul.cl");
pub const PI_PROGRAM: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/kernels/pi.cl");

/// Options shared by every program.
#[derive(Debug, Clone, Args)]
pub struct SessionArgs {
    /// Index of the OpenCL platform
    #[arg(long, default_value_t = 0)]
    pub platform: usize,

    /// Index of the context device the command queue runs on
    #[arg(short, long, default_value_t = 0)]
    pub device: usize,

    /// Create the queue without profiling (no device-side kernel timings)
    #[arg(long)]
    pub no_profiling: bool,

    /// More diagnostics (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only warnings and errors on stderr
    #[arg(short, long)]
    pub quiet: bool,
}

impl SessionArgs {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            platform: self.platform,
            device: self.device,
            profiling: !self.no_profiling,
        }
    }

    /// Default log filter; `RUST_LOG` still wins.
    pub fn log_filter(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "warn",
            (false, 0) => "info",
            (false, 1) => "debug",
            (false, _) => "trace",
        }
    }
}

/// Installs `env_logger` on stderr. Safe to call more than once.
pub fn init_logging(default_filter: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}

/// Maps a program outcome to the process exit status, logging failures.
///
/// Build failures also dump the vendor build log.
pub fn exit_status(result: Result<(), ClError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            if let ClError::Build { log, .. } = &err {
                log::error!("build log:\n{log}");
            }
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "vector_add", about = "OpenCL vector addition: d = a + b + c")]
pub struct VaddArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Kernel source file
    #[arg(long, default_value = VADD_PROGRAM)]
    pub program: PathBuf,

    /// Number of elements
    #[arg(short = 'n', long, default_value_t = 4)]
    pub length: usize,
}

impl VaddArgs {
    pub fn validate(&self) -> Result<(), ClError> {
        if self.length == 0 {
            return Err(ClError::Config("vector length must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "matrix_mul", about = "OpenCL matrix multiplication, four kernel variants")]
pub struct MmulArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Kernel source file
    #[arg(long, default_value = MMUL_PROGRAM)]
    pub program: PathBuf,

    /// Matrix order N (N x N matrices)
    #[arg(short = 'n', long, default_value_t = 1024)]
    pub order: usize,

    /// Print every result matrix (only sensible for small orders)
    #[arg(long)]
    pub print: bool,
}

impl MmulArgs {
    pub fn validate(&self) -> Result<(), ClError> {
        if self.order == 0 || self.order % 4 != 0 {
            return Err(ClError::Config(format!(
                "matrix order must be a positive multiple of 4, got {}",
                self.order
            )));
        }
        if self.order > MAX_ORDER {
            return Err(ClError::Config(format!(
                "matrix order {} exceeds the kernels' row limit of {MAX_ORDER}",
                self.order
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "pi", about = "OpenCL numerical integration of pi")]
pub struct PiArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Kernel source file
    #[arg(long, default_value = PI_PROGRAM)]
    pub program: PathBuf,

    /// Number of rectangles under 4 / (1 + x^2) on [0, 1]
    #[arg(short = 'n', long, default_value_t = 1024)]
    pub subdivisions: usize,

    /// Work items per work group (power of two); each group yields one partial area
    #[arg(short = 'w', long, default_value_t = 64)]
    pub work_group_size: usize,
}

impl PiArgs {
    pub fn validate(&self) -> Result<(), ClError> {
        if !self.work_group_size.is_power_of_two() {
            return Err(ClError::Config(format!(
                "work-group size must be a power of two, got {}",
                self.work_group_size
            )));
        }
        if self.subdivisions == 0 || self.subdivisions % self.work_group_size != 0 {
            return Err(ClError::Config(format!(
                "subdivisions ({}) must be a positive multiple of the work-group size ({})",
                self.subdivisions, self.work_group_size
            )));
        }
        Ok(())
    }

    pub fn work_group_count(&self) -> usize {
        self.subdivisions / self.work_group_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vadd_defaults() {
        let args = VaddArgs::try_parse_from(["vector_add"]).unwrap();
        assert_eq!(args.length, 4);
        assert_eq!(args.program, PathBuf::from(VADD_PROGRAM));
        assert_eq!(
            args.session.session_config(),
            SessionConfig { platform: 0, device: 0, profiling: true }
        );
        assert_eq!(args.session.log_filter(), "info");
        args.validate().unwrap();
    }

    #[test]
    fn verbosity_and_quiet_conflict() {
        let args = MmulArgs::try_parse_from(["matrix_mul", "-vv"]).unwrap();
        assert_eq!(args.session.log_filter(), "trace");
        assert!(MmulArgs::try_parse_from(["matrix_mul", "-v", "-q"]).is_err());
    }

    #[test]
    fn mmul_order_must_split_in_four() {
        let args = MmulArgs::try_parse_from(["matrix_mul", "--order", "30"]).unwrap();
        assert!(matches!(args.validate(), Err(ClError::Config(_))));
        let args = MmulArgs::try_parse_from(["matrix_mul", "-n", "32", "-d", "1"]).unwrap();
        args.validate().unwrap();
        assert_eq!(args.session.device, 1);
    }

    #[test]
    fn mmul_order_is_capped_by_the_kernel_row_limit() {
        let args = MmulArgs::try_parse_from(["matrix_mul", "-n", "8192"]).unwrap();
        assert!(matches!(args.validate(), Err(ClError::Config(_))));
        let args = MmulArgs::try_parse_from(["matrix_mul", "-n", &MAX_ORDER.to_string()]).unwrap();
        args.validate().unwrap();
    }

    #[test]
    fn pi_groups() {
        let args = PiArgs::try_parse_from(["pi"]).unwrap();
        args.validate().unwrap();
        assert_eq!(args.work_group_count(), 16);

        let args = PiArgs::try_parse_from(["pi", "-n", "1000", "-w", "64"]).unwrap();
        assert!(args.validate().is_err());

        let args = PiArgs::try_parse_from(["pi", "-w", "0"]).unwrap();
        assert!(args.validate().is_err());

        let args = PiArgs::try_parse_from(["pi", "-n", "960", "-w", "48"]).unwrap();
        assert!(args.validate().is_err());
    }

    #[test]
    fn failures_map_to_exit_failure() {
        assert_eq!(exit_status(Ok(())), ExitCode::SUCCESS);
        assert_eq!(exit_status(Err(ClError::NoPlatform)), ExitCode::FAILURE);
    }

    #[test]
    fn zero_length_vector_is_rejected() {
        let args = VaddArgs::try_parse_from(["vector_add", "-n", "0", "--no-profiling"]).unwrap();
        assert!(!args.session.session_config().profiling);
        assert!(args.validate().is_err());
    }
}
