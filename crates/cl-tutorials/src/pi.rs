// 2025 Thomas Bicanic – MIT License

//! π as the integral of `4 / (1 + x²)` over `[0, 1]`, midpoint rule.
//!
//! One work item evaluates one rectangle; each work group reduces its
//! rectangles in local memory and writes one partial area. The host sums
//! the partial areas.

use std::{path::Path, time::Duration};

use opencl3::kernel::ExecuteKernel;

use crate::{Access, ClError, ClSession, GpuBuffer, GpuEventGuard, Queued, Timer};

pub const KERNEL_NAME: &str = "pi_1wi_1iteration";

pub fn sum_group_areas(areas: &[f32]) -> f32 {
    areas.iter().sum()
}

/// Same midpoint sum as the kernel, in `f64` on the host.
pub fn reference_pi(subdivisions: usize) -> f64 {
    let step = 1.0 / subdivisions as f64;
    (0..subdivisions)
        .map(|i| {
            let x = (i as f64 + 0.5) * step;
            4.0 / (1.0 + x * x) * step
        })
        .sum()
}

#[derive(Debug, Clone)]
pub struct PiReport {
    pub pi: f32,
    pub reference: f64,
    pub group_areas: Vec<f32>,
    pub host_time: Duration,
    pub device_time: Option<Duration>,
}

impl PiReport {
    pub fn error(&self) -> f64 {
        (self.pi as f64 - std::f64::consts::PI).abs()
    }

    /// Device sum agrees with the host reference up to `f32` rounding.
    pub fn matches_reference(&self) -> bool {
        (self.pi as f64 - self.reference).abs() < 1e-4
    }
}

pub fn run(
    session: &ClSession,
    program: &Path,
    subdivisions: usize,
    work_group_size: usize,
) -> Result<PiReport, ClError> {
    let program = session.build_program(program, "")?;
    let (kernel, info) = session.kernel(&program, KERNEL_NAME)?;
    if work_group_size > info.work_group_size {
        return Err(ClError::Config(format!(
            "work-group size {work_group_size} exceeds the kernel limit {}",
            info.work_group_size
        )));
    }

    let group_count = subdivisions / work_group_size;
    let bytes = group_count * std::mem::size_of::<f32>();
    let d_areas = GpuBuffer::<Queued>::new(session.context(), bytes, Access::WriteOnly)?.launch();

    let timer = Timer::start();
    let evt = ExecuteKernel::new(&kernel)
        .set_arg_local_buffer(work_group_size * std::mem::size_of::<f32>())
        .set_arg(d_areas.raw())
        .set_global_work_size(subdivisions)
        .set_local_work_size(work_group_size)
        .enqueue_nd_range(session.queue())?;
    let guard = GpuEventGuard::from(evt);
    session.finish()?;
    let host_time = timer.elapsed();
    let device_time = guard.device_time();

    let d_areas = d_areas.into_ready(guard)?;
    let mut group_areas = vec![0.0_f32; group_count];
    d_areas.read_into(session.queue(), &mut group_areas)?;
    let pi = sum_group_areas(&group_areas);

    Ok(PiReport {
        pi,
        reference: reference_pi(subdivisions),
        group_areas,
        host_time,
        device_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_converges_to_pi() {
        let coarse = (reference_pi(16) - std::f64::consts::PI).abs();
        let fine = (reference_pi(1024) - std::f64::consts::PI).abs();
        assert!(fine < coarse);
        assert!(fine < 1e-6);
    }

    #[test]
    fn partial_areas_add_up() {
        assert_eq!(sum_group_areas(&[0.5, 1.0, 1.25]), 2.75);
        assert_eq!(sum_group_areas(&[]), 0.0);
    }

    #[test]
    fn report_compares_against_reference() {
        let report = PiReport {
            pi: std::f32::consts::PI,
            reference: reference_pi(1024),
            group_areas: Vec::new(),
            host_time: Duration::ZERO,
            device_time: None,
        };
        assert!(report.matches_reference());
        assert!(report.error() < 1e-6);
    }

    #[test]
    fn kernel_name_exists_in_the_shipped_source() {
        assert!(include_str!("../kernels/pi.cl").contains(&format!("void {KERNEL_NAME}(")));
    }
}
