//! Idle time for macOS from IOKit's HIDIdleTime property.

use anyhow::Result;
use core_foundation::base::TCFType;
use core_foundation::number::CFNumber;
use core_foundation::string::CFString;
use std::time::Duration;

#[link(name = "IOKit", kind = "framework")]
extern "C" {
    fn IOServiceGetMatchingService(
        main_port: u32,
        matching: core_foundation::base::CFTypeRef,
    ) -> u32;
    fn IOServiceMatching(name: *const std::os::raw::c_char) -> core_foundation::base::CFTypeRef;
    fn IORegistryEntryCreateCFProperty(
        entry: u32,
        key: core_foundation::string::CFStringRef,
        allocator: core_foundation::base::CFAllocatorRef,
        options: u32,
    ) -> core_foundation::base::CFTypeRef;
    fn IOObjectRelease(object: u32) -> i32;
}

/// Stateless; each query looks up the IOHIDSystem service.
pub(super) struct PlatformIdle;

impl PlatformIdle {
    pub(super) const BACKEND: &'static str = "IOKit HIDIdleTime";

    pub(super) fn connect() -> Result<Self> {
        let idle = Self;
        if idle.idle_time().is_none() {
            anyhow::bail!("IOHIDSystem did not report HIDIdleTime");
        }
        Ok(idle)
    }

    pub(super) fn idle_time(&self) -> Option<Duration> {
        // SAFETY: every IOKit object obtained here is released before
        // returning, and the property is wrapped under the create rule.
        unsafe {
            let service_name = std::ffi::CString::new("IOHIDSystem").ok()?;
            let matching = IOServiceMatching(service_name.as_ptr());
            if matching.is_null() {
                return None;
            }

            let service = IOServiceGetMatchingService(0, matching);
            if service == 0 {
                return None;
            }

            let key = CFString::new("HIDIdleTime");
            let property = IORegistryEntryCreateCFProperty(
                service,
                key.as_concrete_TypeRef(),
                std::ptr::null(),
                0,
            );
            IOObjectRelease(service);

            if property.is_null() {
                return None;
            }

            // Nanoseconds since the last HID event.
            let number: CFNumber = CFNumber::wrap_under_create_rule(property as *mut _);
            let nanoseconds = number.to_i64()?;
            Some(Duration::from_nanos(nanoseconds.max(0) as u64))
        }
    }
}
