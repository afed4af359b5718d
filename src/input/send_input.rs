// Windows keyboard injection via SendInput
// Scan codes are sent instead of virtual keys since games reading raw input ignore VK-only events

use super::{ActuatorError, InputActuator};
use crate::keymap::PhysicalKey;
use windows_sys::Win32::UI::Input::KeyboardAndMouse::{
    MapVirtualKeyW, SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYEVENTF_KEYUP,
    KEYEVENTF_SCANCODE, MAPVK_VK_TO_VSC,
};

/// Injects key events into the foreground window
#[derive(Debug, Default)]
pub struct SendInputActuator;

impl SendInputActuator {
    pub fn new() -> Self {
        Self
    }

    fn send(&self, key: PhysicalKey, key_up: bool) -> Result<(), ActuatorError> {
        let vk = key.virtual_key_code();
        let scan = unsafe { MapVirtualKeyW(vk as u32, MAPVK_VK_TO_VSC) } as u16;
        if scan == 0 {
            return Err(ActuatorError::Rejected {
                key,
                reason: format!("no scan code for virtual key {:#04x}", vk),
            });
        }

        let mut flags = KEYEVENTF_SCANCODE;
        if key_up {
            flags |= KEYEVENTF_KEYUP;
        }

        let input = INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: 0,
                    wScan: scan,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        };

        let sent = unsafe { SendInput(1, &input, std::mem::size_of::<INPUT>() as i32) };
        if sent != 1 {
            // Blocked by UIPI when the target runs elevated
            return Err(ActuatorError::Rejected {
                key,
                reason: std::io::Error::last_os_error().to_string(),
            });
        }

        Ok(())
    }
}

impl InputActuator for SendInputActuator {
    async fn press(&self, key: PhysicalKey) -> Result<(), ActuatorError> {
        self.send(key, false)
    }

    async fn release(&self, key: PhysicalKey) -> Result<(), ActuatorError> {
        self.send(key, true)
    }
}
