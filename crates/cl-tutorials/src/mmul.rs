// 2025 Thomas Bicanic – MIT License

//! Square matrix multiplication, four kernel variants over the same inputs.
//!
//! Every variant takes `(int rows_a, int cols_a, A, int rows_b, int cols_b,
//! B, C)`; the local-memory variant adds one `__local float*` scratch
//! column of `order` floats.

use std::{fmt, path::Path, time::Duration};

use opencl3::kernel::{ExecuteKernel, Kernel};

use crate::{
    matrix::{is_identity, set_identity, total_size},
    platform::KernelInfo,
    Access, ClError, ClSession, GpuBuffer, GpuEventGuard, Queued, Ready, Timer,
};

/// Longest row the private-memory kernels can hold; `MAX_ORDER` in mmul.cl.
pub const MAX_ORDER: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// C(i,j) per work item, N x N work items, global memory.
    CijGlobal,
    /// C(i,*) per work item, N work items, global memory.
    CiGlobal,
    /// C(i,*) per work item, row of A in private memory.
    CiPrivateRow,
    /// C(i,*) per work item, private row of A, column of B in local memory.
    CiPrivateRowLocalColumn,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::CijGlobal,
        Variant::CiGlobal,
        Variant::CiPrivateRow,
        Variant::CiPrivateRowLocalColumn,
    ];

    pub fn kernel_name(self) -> &'static str {
        match self {
            Variant::CijGlobal => "mmul_cij_gmem",
            Variant::CiGlobal => "mmul_ci_gmem",
            Variant::CiPrivateRow => "mmul_ci_pmemr_gmemc",
            Variant::CiPrivateRowLocalColumn => "mmul_ci_pmemr_lmemc",
        }
    }

    pub fn global_size(self, order: usize) -> Vec<usize> {
        match self {
            Variant::CijGlobal => vec![order, order],
            _ => vec![order],
        }
    }

    /// Requested work-group size; the row variants split the rows in four groups.
    pub fn local_size(self, order: usize) -> Option<usize> {
        match self {
            Variant::CijGlobal => None,
            _ => Some(order / 4),
        }
    }

    /// Bytes of `__local` scratch the kernel expects as its last argument.
    pub fn local_scratch_bytes(self, order: usize) -> Option<usize> {
        match self {
            Variant::CiPrivateRowLocalColumn => Some(order * std::mem::size_of::<f32>()),
            _ => None,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Variant::CijGlobal => "C(i,j) per work item (NxN work items), global memory",
            Variant::CiGlobal => "C(i,*) per work item (N work items), global memory",
            Variant::CiPrivateRow => "C(i,*) per work item (N work items), row in private memory",
            Variant::CiPrivateRowLocalColumn => {
                "C(i,*) per work item (N work items), private row, local column"
            }
        })
    }
}

/// Clamps the requested work-group size to what the compiled kernel allows.
///
/// Returns `None` (let the runtime choose) when the request does not fit or
/// does not divide the global size.
pub fn effective_local_size(requested: Option<usize>, global: usize, info: &KernelInfo) -> Option<usize> {
    let local = requested?;
    if local == 0 || local > info.work_group_size || global % local != 0 {
        log::warn!(
            "work-group size {local} not usable (kernel limit {}), runtime picks one",
            info.work_group_size
        );
        return None;
    }
    Some(local)
}

#[derive(Debug, Clone)]
pub struct VariantReport {
    pub variant: Variant,
    pub identity: bool,
    pub host_time: Duration,
    pub device_time: Option<Duration>,
    pub result: Vec<f32>,
}

struct Inputs {
    a: GpuBuffer<Ready>,
    b: GpuBuffer<Ready>,
}

fn launch(
    session: &ClSession,
    kernel: &Kernel,
    info: &KernelInfo,
    variant: Variant,
    order: usize,
    inputs: &Inputs,
    out: &GpuBuffer<crate::InFlight>,
) -> Result<GpuEventGuard, ClError> {
    let n = order as i32;
    let global = variant.global_size(order);
    let local = effective_local_size(variant.local_size(order), global[0], info);

    let mut exec = ExecuteKernel::new(kernel);
    exec.set_arg(&n)
        .set_arg(&n)
        .set_arg(inputs.a.raw())
        .set_arg(&n)
        .set_arg(&n)
        .set_arg(inputs.b.raw())
        .set_arg(out.raw());
    if let Some(bytes) = variant.local_scratch_bytes(order) {
        exec.set_arg_local_buffer(bytes);
    }
    exec.set_global_work_sizes(&global);
    if let Some(local) = local {
        let mut sizes = vec![1; global.len()];
        sizes[0] = local;
        exec.set_local_work_sizes(&sizes);
    }

    let evt = exec.enqueue_nd_range(session.queue())?;
    Ok(GpuEventGuard::from(evt))
}

/// Runs one variant on `A * B` and reads the product back.
fn run_variant(
    session: &ClSession,
    program: &opencl3::program::Program,
    variant: Variant,
    order: usize,
    inputs: &Inputs,
) -> Result<VariantReport, ClError> {
    log::info!("---------- {variant} ----------");
    let (kernel, info) = session.kernel(program, variant.kernel_name())?;

    let bytes = total_size(order) * std::mem::size_of::<f32>();
    let out = GpuBuffer::<Queued>::new(session.context(), bytes, Access::ReadWrite)?.launch();

    let timer = Timer::start();
    let guard = launch(session, &kernel, &info, variant, order, inputs, &out)?;
    session.finish()?;
    let host_time = timer.elapsed();
    let device_time = guard.device_time();

    let out = out.into_ready(guard)?;
    let mut result = vec![0.0_f32; total_size(order)];
    out.read_into(session.queue(), &mut result)?;

    Ok(VariantReport {
        variant,
        identity: is_identity(order, &result),
        host_time,
        device_time,
        result,
    })
}

/// Multiplies two identity matrices with every variant.
pub fn run(session: &ClSession, program: &Path, order: usize) -> Result<Vec<VariantReport>, ClError> {
    let program = session.build_program(program, "")?;

    let mut h_m = vec![0.0_f32; total_size(order)];
    set_identity(order, &mut h_m);

    let ctx = session.context();
    let queue = session.queue();
    let inputs = Inputs {
        a: GpuBuffer::<Queued>::from_slice(ctx, queue, &h_m, Access::ReadOnly)?,
        b: GpuBuffer::<Queued>::from_slice(ctx, queue, &h_m, Access::ReadOnly)?,
    };

    Variant::ALL
        .iter()
        .map(|&variant| run_variant(session, &program, variant, order, &inputs))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(work_group_size: usize) -> KernelInfo {
        KernelInfo { work_group_size, ..Default::default() }
    }

    #[test]
    fn geometry_per_variant() {
        assert_eq!(Variant::CijGlobal.global_size(1024), vec![1024, 1024]);
        assert_eq!(Variant::CijGlobal.local_size(1024), None);
        for v in &Variant::ALL[1..] {
            assert_eq!(v.global_size(1024), vec![1024]);
            assert_eq!(v.local_size(1024), Some(256));
        }
        assert_eq!(Variant::CiPrivateRowLocalColumn.local_scratch_bytes(1024), Some(4096));
        assert_eq!(Variant::CiPrivateRow.local_scratch_bytes(1024), None);
    }

    #[test]
    fn kernel_names_exist_in_the_shipped_source() {
        let src = include_str!("../kernels/mmul.cl");
        for v in Variant::ALL {
            assert!(src.contains(&format!("void {}(", v.kernel_name())), "{} missing", v.kernel_name());
        }
    }

    #[test]
    fn max_order_matches_the_shipped_source() {
        let src = include_str!("../kernels/mmul.cl");
        assert!(src.contains(&format!("#define MAX_ORDER {MAX_ORDER}\n")));
    }

    #[test]
    fn local_size_respects_kernel_limit() {
        assert_eq!(effective_local_size(Some(256), 1024, &info(1024)), Some(256));
        assert_eq!(effective_local_size(Some(256), 1024, &info(128)), None);
        assert_eq!(effective_local_size(Some(48), 1000, &info(256)), None);
        assert_eq!(effective_local_size(None, 1024, &info(256)), None);
    }
}
