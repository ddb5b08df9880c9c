/// Vulkan Debug Messenger - Routes validation layer messages into the engine logger
///
/// Compiled only with the `vulkan-validation` feature. Messages are counted
/// per severity so a session can end with a validation report.

use ash::vk;
use colored::*;
use mirage3d_engine::mirage3d::{DebugSeverity, Engine, Error, Result};
use mirage3d_engine::mirage3d::log::LogSeverity;
use mirage3d_engine::engine_error;
use std::ffi::CStr;
use std::sync::atomic::{AtomicU32, Ordering};

/// Khronos validation layer name
pub(crate) const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Message counts, indexed by `SeverityBucket`
static MESSAGE_COUNTS: [AtomicU32; 4] = [
    AtomicU32::new(0),
    AtomicU32::new(0),
    AtomicU32::new(0),
    AtomicU32::new(0),
];

#[derive(Clone, Copy)]
enum SeverityBucket {
    Error = 0,
    Warning = 1,
    Info = 2,
    Verbose = 3,
}

impl SeverityBucket {
    fn from_vk(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> Self {
        if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
            SeverityBucket::Error
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
            SeverityBucket::Warning
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
            SeverityBucket::Info
        } else {
            SeverityBucket::Verbose
        }
    }

    fn log_severity(self) -> LogSeverity {
        match self {
            SeverityBucket::Error => LogSeverity::Error,
            SeverityBucket::Warning => LogSeverity::Warn,
            SeverityBucket::Info => LogSeverity::Info,
            SeverityBucket::Verbose => LogSeverity::Trace,
        }
    }

    fn record(self) {
        MESSAGE_COUNTS[self as usize].fetch_add(1, Ordering::Relaxed);
    }
}

fn reset_message_counts() {
    for count in &MESSAGE_COUNTS {
        count.store(0, Ordering::Relaxed);
    }
}

/// Validation message counts since the device was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }
}

/// Counts of validation messages received so far
pub fn get_validation_stats() -> ValidationStats {
    let count = |bucket: SeverityBucket| MESSAGE_COUNTS[bucket as usize].load(Ordering::Relaxed);
    ValidationStats {
        errors: count(SeverityBucket::Error),
        warnings: count(SeverityBucket::Warning),
        info: count(SeverityBucket::Info),
        verbose: count(SeverityBucket::Verbose),
    }
}

/// Print a colored summary of the validation messages to stdout
pub fn print_validation_stats_report() {
    let stats = get_validation_stats();

    if stats.total() == 0 {
        println!("{}", "Vulkan validation: clean".green().bold());
        return;
    }

    let rows = [
        ("errors", stats.errors, Color::Red),
        ("warnings", stats.warnings, Color::Yellow),
        ("info", stats.info, Color::Cyan),
        ("verbose", stats.verbose, Color::BrightBlack),
    ];

    println!("{}", format!("Vulkan validation: {} message(s)", stats.total()).bright_blue().bold());
    for (label, count, color) in rows.iter().filter(|(_, count, _)| *count > 0) {
        println!("  {:<10}{}", label.color(*color), count);
    }
}

/// True when the Khronos validation layer is installed
pub(crate) fn validation_layer_available(entry: &ash::Entry) -> bool {
    unsafe {
        entry
            .enumerate_instance_layer_properties()
            .map(|layers| {
                layers.iter().any(|layer| {
                    layer.layer_name_as_c_str().map_or(false, |name| name == VALIDATION_LAYER)
                })
            })
            .unwrap_or(false)
    }
}

/// Severity flags the messenger subscribes to
pub(crate) fn severity_flags(severity: DebugSeverity) -> vk::DebugUtilsMessageSeverityFlagsEXT {
    match severity {
        DebugSeverity::ErrorsOnly => vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        DebugSeverity::ErrorsAndWarnings => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
        }
        DebugSeverity::All => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
        }
    }
}

/// Create the debug messenger and reset the statistics
pub(crate) fn create_debug_messenger(
    entry: &ash::Entry,
    instance: &ash::Instance,
    severity: DebugSeverity,
) -> Result<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)> {
    reset_message_counts();

    let debug_utils = ash::ext::debug_utils::Instance::new(entry, instance);

    let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(severity_flags(severity))
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
        )
        .pfn_user_callback(Some(vulkan_debug_callback));

    let messenger = unsafe {
        debug_utils
            .create_debug_utils_messenger(&debug_info, None)
            .map_err(|e| {
                engine_error!("mirage3d::vulkan", "Failed to create debug messenger: {:?}", e);
                Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e))
            })?
    };

    Ok((debug_utils, messenger))
}

/// Vulkan debug messenger callback
///
/// Called by the validation layers; forwards every message to `Engine::log`.
pub unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }
    let callback_data = *p_callback_data;
    let message_id_name = if callback_data.p_message_id_name.is_null() {
        "Unknown"
    } else {
        CStr::from_ptr(callback_data.p_message_id_name)
            .to_str()
            .unwrap_or("Invalid UTF-8")
    };
    let message = if callback_data.p_message.is_null() {
        "No message"
    } else {
        CStr::from_ptr(callback_data.p_message)
            .to_str()
            .unwrap_or("Invalid UTF-8")
    };

    let bucket = SeverityBucket::from_vk(message_severity);
    bucket.record();

    let type_str = if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    };

    Engine::log(
        bucket.log_severity(),
        "mirage3d::vulkan::validation",
        format!("[{}] {}: {}", type_str, message_id_name, message),
    );

    // Never abort the call that triggered the message
    vk::FALSE
}
