// 2025 Thomas Bicanic – MIT License
//
// End-to-end runs against the first OpenCL device.
// Run with `cargo test -- --ignored` on a machine with an OpenCL runtime.

use std::{fs, path::PathBuf};

use cl_tutorials::{
    config::{MMUL_PROGRAM, PI_PROGRAM, VADD_PROGRAM},
    mmul, pi,
    platform::enumerate_platforms,
    vadd, Access, ClError, ClSession, GpuBuffer, Queued, SessionConfig,
};

fn session() -> ClSession {
    ClSession::open(&SessionConfig { profiling: true, ..Default::default() }).unwrap()
}

#[test]
#[ignore = "requires an OpenCL device"]
fn platforms_report_devices() {
    let reports = enumerate_platforms().unwrap();
    assert!(!reports.is_empty());
    assert!(reports.iter().any(|r| !r.devices.is_empty()));
}

#[test]
#[ignore = "requires an OpenCL device"]
fn vadd_cancels_to_zero() {
    let session = session();
    let report = vadd::run(&session, VADD_PROGRAM.as_ref(), 4).unwrap();
    assert_eq!(report.result, vec![0.0; 4]);
    assert!(report.is_correct());
}

#[test]
#[ignore = "requires an OpenCL device"]
fn identity_times_identity_for_every_variant() {
    let session = session();
    let reports = mmul::run(&session, MMUL_PROGRAM.as_ref(), 64).unwrap();
    assert_eq!(reports.len(), mmul::Variant::ALL.len());
    for report in reports {
        assert!(report.identity, "{} did not yield the identity", report.variant);
    }
}

#[test]
#[ignore = "requires an OpenCL device"]
fn pi_partial_areas_approximate_pi() {
    let session = session();
    let report = pi::run(&session, PI_PROGRAM.as_ref(), 1024, 64).unwrap();
    assert_eq!(report.group_areas.len(), 16);
    assert!(report.error() < 1e-3, "pi = {}", report.pi);
    assert!(report.matches_reference());
}

#[test]
#[ignore = "requires an OpenCL device"]
fn broken_kernel_returns_build_log() {
    let path: PathBuf = std::env::temp_dir().join("cl_tutorials_broken.cl");
    fs::write(&path, "__kernel void broken(__global float* x) { x[0] = ; }").unwrap();

    let session = session();
    match session.build_program(&path, "") {
        Err(ClError::Build { path: p, log, .. }) => {
            assert_eq!(p, path);
            assert!(!log.trim().is_empty());
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("broken kernel compiled"),
    }
    let _ = fs::remove_file(&path);
}

#[test]
#[ignore = "requires an OpenCL device"]
fn buffer_roundtrip_and_length_checks() {
    let session = session();
    let data: Vec<f32> = (0..16).map(|i| i as f32).collect();

    let ready = GpuBuffer::<Queued>::from_slice(session.context(), session.queue(), &data, Access::ReadWrite).unwrap();
    assert_eq!(ready.len(), 64);

    let mut back = vec![0.0_f32; 16];
    ready.read_into(session.queue(), &mut back).unwrap();
    assert_eq!(back, data);

    let mut short = vec![0.0_f32; 8];
    assert!(matches!(
        ready.read_into(session.queue(), &mut short),
        Err(ClError::LengthMismatch { expected: 64, actual: 32 })
    ));

    assert!(matches!(
        GpuBuffer::<Queued>::new(session.context(), 0, Access::ReadOnly),
        Err(ClError::InvalidSize(0))
    ));
}

#[test]
#[ignore = "requires an OpenCL device"]
fn out_of_range_platform_is_rejected() {
    let err = ClSession::open(&SessionConfig { platform: usize::MAX, ..Default::default() })
        .err()
        .unwrap();
    assert!(matches!(err, ClError::PlatformIndex { index: usize::MAX, .. }));
}

#[test]
#[ignore = "requires an OpenCL device"]
fn out_of_range_device_is_rejected() {
    let err = ClSession::open(&SessionConfig { device: usize::MAX, ..Default::default() })
        .err()
        .unwrap();
    assert!(matches!(err, ClError::DeviceIndex { index: usize::MAX, .. }));
}
