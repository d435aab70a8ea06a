// 2025 Thomas Bicanic – MIT License

//! Platform, device and kernel diagnostics.

use std::fmt;

use opencl3::{
    device::{
        Device, CL_DEVICE_TYPE_ACCELERATOR, CL_DEVICE_TYPE_ALL, CL_DEVICE_TYPE_CPU,
        CL_DEVICE_TYPE_DEFAULT, CL_DEVICE_TYPE_GPU,
    },
    error_codes::{ClError as ApiError, CL_DEVICE_NOT_FOUND},
    kernel::Kernel,
    platform::{get_platforms, Platform},
    types::{cl_device_id, cl_device_type},
};

use crate::ClError;

/// Human-readable name of a device type bitfield.
pub fn device_type_name(ty: cl_device_type) -> &'static str {
    if ty & CL_DEVICE_TYPE_CPU != 0 {
        "CPU"
    } else if ty & CL_DEVICE_TYPE_GPU != 0 {
        "GPU"
    } else if ty & CL_DEVICE_TYPE_ACCELERATOR != 0 {
        "ACCELERATOR"
    } else if ty & CL_DEVICE_TYPE_DEFAULT != 0 {
        "DEFAULT"
    } else {
        "N/A"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformInfo {
    pub name: String,
    pub vendor: String,
    pub profile: String,
    pub version: String,
    pub extensions: String,
}

impl PlatformInfo {
    pub fn query(platform: &Platform) -> Result<Self, ClError> {
        Ok(Self {
            name: platform.name()?,
            vendor: platform.vendor()?,
            profile: platform.profile()?,
            version: platform.version()?,
            extensions: platform.extensions()?,
        })
    }
}

impl fmt::Display for PlatformInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Vendor: {}", self.vendor)?;
        writeln!(f, "Profile: {}", self.profile)?;
        writeln!(f, "Version: {}", self.version)?;
        write!(f, "Extensions: {}", self.extensions)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub device_type: cl_device_type,
    pub version: String,
    /// One work group runs on one compute unit.
    pub max_compute_units: u32,
    pub max_work_item_dimensions: u32,
    pub max_work_item_sizes: Vec<usize>,
    pub max_work_group_size: usize,
    /// Memory shared by the work items of a work group, in bytes.
    pub local_mem_size: u64,
    /// Memory shared by all work groups, in bytes.
    pub global_mem_size: u64,
}

impl DeviceInfo {
    pub fn query(device: &Device) -> Result<Self, ClError> {
        Ok(Self {
            name: device.name()?.trim().to_string(),
            device_type: device.dev_type()?,
            version: device.version()?,
            max_compute_units: device.max_compute_units()?,
            max_work_item_dimensions: device.max_work_item_dimensions()?,
            max_work_item_sizes: device.max_work_item_sizes()?,
            max_work_group_size: device.max_work_group_size()?,
            local_mem_size: device.local_mem_size()?,
            global_mem_size: device.global_mem_size()?,
        })
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Device name: {}", self.name)?;
        writeln!(f, "Device type: {}", device_type_name(self.device_type))?;
        writeln!(f, "Device version: {}", self.version)?;
        writeln!(f, "Device max compute units: {}", self.max_compute_units)?;
        writeln!(f, "Device max work-item dimensions: {}", self.max_work_item_dimensions)?;
        write!(f, "Device max work-item sizes:")?;
        for (dim, size) in self.max_work_item_sizes.iter().enumerate() {
            let sep = if dim == 0 { " " } else { ", " };
            write!(f, "{sep}[{dim}]={size}")?;
        }
        writeln!(f)?;
        writeln!(f, "Device max work-group size: {}", self.max_work_group_size)?;
        writeln!(f, "Device local memory size: {} bytes", self.local_mem_size)?;
        write!(f, "Device global memory size: {} bytes", self.global_mem_size)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KernelInfo {
    pub work_group_size: usize,
    pub preferred_work_group_size_multiple: usize,
    pub private_mem_size: u64,
    pub local_mem_size: u64,
}

impl KernelInfo {
    pub fn query(kernel: &Kernel, device: cl_device_id) -> Result<Self, ClError> {
        Ok(Self {
            work_group_size: kernel.get_work_group_size(device)?,
            preferred_work_group_size_multiple: kernel.get_work_group_size_multiple(device)?,
            private_mem_size: kernel.get_private_mem_size(device)?,
            local_mem_size: kernel.get_local_mem_size(device)?,
        })
    }
}

impl fmt::Display for KernelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Kernel work group size: {}", self.work_group_size)?;
        writeln!(
            f,
            "Kernel preferred work group size multiple: {}",
            self.preferred_work_group_size_multiple
        )?;
        writeln!(f, "Kernel private memory size: {} bytes", self.private_mem_size)?;
        write!(f, "Kernel local memory size: {} bytes", self.local_mem_size)
    }
}

/// A platform together with all of its devices.
pub struct PlatformReport {
    pub info: PlatformInfo,
    pub devices: Vec<DeviceInfo>,
}

/// A platform without devices answers `CL_DEVICE_NOT_FOUND`; that is an empty
/// list, every other status is an error.
pub(crate) fn devices_or_empty(
    result: Result<Vec<cl_device_id>, ApiError>,
) -> Result<Vec<cl_device_id>, ClError> {
    match result {
        Ok(ids) => Ok(ids),
        Err(err) if err.0 == CL_DEVICE_NOT_FOUND => Ok(Vec::new()),
        Err(err) => Err(err.into()),
    }
}

/// Lists every platform and every device it exposes.
pub fn enumerate_platforms() -> Result<Vec<PlatformReport>, ClError> {
    let platforms = get_platforms().map_err(|_| ClError::NoPlatform)?;
    if platforms.is_empty() {
        return Err(ClError::NoPlatform);
    }

    let mut reports = Vec::with_capacity(platforms.len());
    for platform in platforms {
        let info = PlatformInfo::query(&platform)?;
        let ids = devices_or_empty(platform.get_devices(CL_DEVICE_TYPE_ALL))?;
        let devices = ids
            .into_iter()
            .map(|id| DeviceInfo::query(&Device::new(id)))
            .collect::<Result<Vec<_>, _>>()?;
        reports.push(PlatformReport { info, devices });
    }
    Ok(reports)
}

/// Logs the output of [`enumerate_platforms`].
pub fn log_all_platforms(reports: &[PlatformReport]) {
    for (i, report) in reports.iter().enumerate() {
        log::info!("-------------------- Platform[{i}] --------------------");
        log::info!("\n{}", report.info);
        for (j, device) in report.devices.iter().enumerate() {
            log::info!("---------- Platform[{i}] Device[{j}] ----------");
            log::info!("\n{device}");
        }
    }
    log::info!("------------------------------------------------------");
}
