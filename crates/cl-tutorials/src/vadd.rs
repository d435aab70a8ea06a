// 2025 Thomas Bicanic – MIT License

//! Vector addition: `d = a + b + c`.

use std::{path::Path, time::Duration};

use opencl3::kernel::ExecuteKernel;

use crate::{Access, ClError, ClSession, GpuBuffer, GpuEventGuard, Queued, Timer};

pub const KERNEL_NAME: &str = "vadd";

/// Host-side inputs of the tutorial: zeros, ones and minus ones.
pub fn inputs(length: usize) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
    (vec![0.0; length], vec![1.0; length], vec![-1.0; length])
}

pub fn vadd_reference(a: &[f32], b: &[f32], c: &[f32]) -> Vec<f32> {
    a.iter().zip(b).zip(c).map(|((a, b), c)| a + b + c).collect()
}

#[derive(Debug, Clone)]
pub struct VaddReport {
    pub result: Vec<f32>,
    pub expected: Vec<f32>,
    pub host_time: Duration,
    pub device_time: Option<Duration>,
}

impl VaddReport {
    pub fn is_correct(&self) -> bool {
        self.result.len() == self.expected.len()
            && self.result.iter().zip(&self.expected).all(|(r, e)| (r - e).abs() < 1e-6)
    }
}

pub fn run(session: &ClSession, program: &Path, length: usize) -> Result<VaddReport, ClError> {
    /* ---------- 1. Program ----------------------------------------- */
    let program = session.build_program(program, "")?;
    let (kernel, _info) = session.kernel(&program, KERNEL_NAME)?;

    /* ---------- 2. Host data & device buffers ---------------------- */
    let (h_a, h_b, h_c) = inputs(length);
    let mut h_d = vec![0.0_f32; length];
    let bytes = length * std::mem::size_of::<f32>();

    let ctx = session.context();
    let queue = session.queue();
    let d_a = GpuBuffer::<Queued>::from_slice(ctx, queue, &h_a, Access::ReadOnly)?;
    let d_b = GpuBuffer::<Queued>::from_slice(ctx, queue, &h_b, Access::ReadOnly)?;
    let d_c = GpuBuffer::<Queued>::from_slice(ctx, queue, &h_c, Access::ReadOnly)?;
    let d_d = GpuBuffer::<Queued>::new(ctx, bytes, Access::ReadWrite)?.launch();

    /* ---------- 3. Kernel ------------------------------------------ */
    let timer = Timer::start();
    let evt = ExecuteKernel::new(&kernel)
        .set_arg(d_a.raw())
        .set_arg(d_b.raw())
        .set_arg(d_c.raw())
        .set_arg(d_d.raw())
        .set_global_work_size(length)
        .enqueue_nd_range(queue)?;
    let guard = GpuEventGuard::from(evt);
    session.finish()?;
    let host_time = timer.elapsed();
    let device_time = guard.device_time();

    /* ---------- 4. Device → Host ----------------------------------- */
    let d_d = d_d.into_ready(guard)?;
    d_d.read_into(queue, &mut h_d)?;

    Ok(VaddReport {
        expected: vadd_reference(&h_a, &h_b, &h_c),
        result: h_d,
        host_time,
        device_time,
    })
}
