// 2025 Thomas Bicanic – MIT License

//! Context, command queue and program build shared by the tutorials.

use std::{
    fs,
    path::{Path, PathBuf},
    ptr,
};

use opencl3::{
    command_queue::{CommandQueue, CL_QUEUE_PROFILING_ENABLE},
    context::Context,
    device::{Device, CL_DEVICE_TYPE_ALL},
    kernel::Kernel,
    platform::get_platforms,
    program::Program,
    types::cl_device_id,
};

use crate::{
    platform::{DeviceInfo, KernelInfo},
    ClError,
};

/// Which platform/device to run on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    pub platform: usize,
    pub device: usize,
    /// Enables `CL_QUEUE_PROFILING_ENABLE` so kernel events carry device timestamps.
    pub profiling: bool,
}

/// Reads a kernel source file.
pub fn load_program(path: impl AsRef<Path>) -> Result<String, ClError> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|source| ClError::Source { path: path.to_path_buf(), source })
}

pub struct ClSession {
    context: Context,
    devices: Vec<Device>,
    device_index: usize,
    queue: CommandQueue,
}

impl ClSession {
    /// Creates a context over every device of the selected platform and a
    /// queue on the selected device.
    pub fn open(config: &SessionConfig) -> Result<Self, ClError> {
        let platforms = get_platforms().map_err(|_| ClError::NoPlatform)?;
        if platforms.is_empty() {
            return Err(ClError::NoPlatform);
        }
        let platform = platforms.get(config.platform).ok_or(ClError::PlatformIndex {
            index: config.platform,
            count: platforms.len(),
        })?;

        log::info!("Initialising OpenCL context on platform {}...", config.platform);
        let ids: Vec<cl_device_id> = platform
            .get_devices(CL_DEVICE_TYPE_ALL)
            .map_err(|_| ClError::NoDevice { platform: config.platform })?;
        if ids.is_empty() {
            return Err(ClError::NoDevice { platform: config.platform });
        }
        let context = Context::from_devices(&ids, &[], None, ptr::null_mut())?;
        log::info!("OK");

        let devices: Vec<Device> = ids.iter().copied().map(Device::new).collect();
        for (i, device) in devices.iter().enumerate() {
            log::info!("--------------- Context Device[{i}] ---------------");
            log::info!("\n{}", DeviceInfo::query(device)?);
        }

        let device = devices.get(config.device).ok_or(ClError::DeviceIndex {
            index: config.device,
            count: devices.len(),
        })?;

        log::info!("Initialising command queue for device {}...", config.device);
        let props = if config.profiling { CL_QUEUE_PROFILING_ENABLE } else { 0 };
        #[allow(deprecated)]
        let queue = CommandQueue::create(&context, device.id(), props)?;
        log::info!("OK");

        Ok(Self { context, devices, device_index: config.device, queue })
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    /// The device the queue runs on.
    pub fn device(&self) -> &Device {
        &self.devices[self.device_index]
    }

    /// Loads and builds a program for the queue device.
    ///
    /// A compiler failure comes back as [`ClError::Build`] carrying the
    /// vendor build log.
    pub fn build_program(&self, path: impl AsRef<Path>, options: &str) -> Result<Program, ClError> {
        let path = path.as_ref();
        log::info!("Loading program '{}'...", path.display());

        let src = load_program(path)?;
        let mut program = Program::create_from_source(&self.context, &src)?;
        let device_id = self.device().id();

        if let Err(err) = program.build(&[device_id], options) {
            let log = program.get_build_log(device_id).unwrap_or_default();
            return Err(ClError::Build { path: PathBuf::from(path), code: err.0, log });
        }

        log::info!("OK");
        Ok(program)
    }

    /// Creates `name` from `program` and logs its work-group limits.
    pub fn kernel(&self, program: &Program, name: &str) -> Result<(Kernel, KernelInfo), ClError> {
        let kernel = Kernel::create(program, name)?;
        let info = KernelInfo::query(&kernel, self.device().id())?;
        log::info!("\n{info}");
        Ok((kernel, info))
    }

    pub fn finish(&self) -> Result<(), ClError> {
        self.queue.finish()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_file_is_a_source_error() {
        let err = load_program("does/not/exist.cl").unwrap_err();
        match err {
            ClError::Source { path, source } => {
                assert_eq!(path, PathBuf::from("does/not/exist.cl"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn shipped_kernels_load() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("kernels");
        for file in ["vadd.cl", "mmul.cl", "pi.cl"] {
            let src = load_program(dir.join(file)).unwrap();
            assert!(src.contains("__kernel"), "{file} has no kernel");
        }
    }
}
