//! Idle time for Windows using GetLastInputInfo.

use anyhow::Result;
use std::time::Duration;
use windows::Win32::System::SystemInformation::GetTickCount;
use windows::Win32::UI::Input::KeyboardAndMouse::{GetLastInputInfo, LASTINPUTINFO};

pub(super) struct PlatformIdle;

impl PlatformIdle {
    pub(super) const BACKEND: &'static str = "Win32 GetLastInputInfo";

    pub(super) fn connect() -> Result<Self> {
        let idle = Self;
        if idle.idle_time().is_none() {
            anyhow::bail!("GetLastInputInfo failed");
        }
        Ok(idle)
    }

    pub(super) fn idle_time(&self) -> Option<Duration> {
        let mut last_input = LASTINPUTINFO {
            cbSize: std::mem::size_of::<LASTINPUTINFO>() as u32,
            dwTime: 0,
        };

        // SAFETY: `last_input` is a correctly sized, writable LASTINPUTINFO.
        unsafe {
            if !GetLastInputInfo(&mut last_input).as_bool() {
                return None;
            }
            // Tick counts wrap every ~49 days.
            let idle_ms = GetTickCount().wrapping_sub(last_input.dwTime);
            Some(Duration::from_millis(idle_ms as u64))
        }
    }
}
