//! System tray icon.
//!
//! One icon, one context menu entry ("Exit"), one double-click action
//! (toggle the overlay). The tray never touches overlay state directly:
//! it queues [`TrayEvent`]s that the main loop drains and acts on.
//!
//! On Windows the icon hangs off a hidden message-only window whose queue
//! is pumped with `PeekMessageW`, same as the overlay window. Other
//! targets get an inert handle that yields no events.

use crate::platform::PlatformError;

/// Events from the tray to the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayEvent {
    /// Tray icon double-clicked: toggle overlay visibility.
    ToggleOverlay,
    /// "Exit" chosen from the context menu.
    Exit,
}

#[cfg(target_os = "windows")]
mod imp {
    use std::mem;

    use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, POINT, WPARAM};
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::UI::Shell::{
        NIF_ICON, NIF_MESSAGE, NIF_TIP, NIM_ADD, NIM_DELETE, NOTIFYICONDATAW, Shell_NotifyIconW,
    };
    use windows::Win32::UI::WindowsAndMessaging::{
        AppendMenuW, CreatePopupMenu, CreateWindowExW, DefWindowProcW, DestroyMenu, DestroyWindow,
        DispatchMessageW, GetCursorPos, HWND_MESSAGE, IDI_INFORMATION, LoadIconW, MF_STRING, MSG,
        PM_REMOVE, PeekMessageW, RegisterClassExW, SetForegroundWindow, TPM_BOTTOMALIGN,
        TPM_NONOTIFY, TPM_RETURNCMD, TrackPopupMenu, TranslateMessage, WINDOW_EX_STYLE,
        WINDOW_STYLE, WM_APP, WM_LBUTTONDBLCLK, WM_RBUTTONUP, WNDCLASSEXW,
    };
    use windows::core::{PCWSTR, w};

    use super::TrayEvent;
    use crate::platform::PlatformError;

    const TRAY_CLASS: &str = "NetpulseTrayClass";
    /// Callback message the shell posts for icon interactions.
    const WM_TRAY_CALLBACK: u32 = WM_APP + 1;
    const TRAY_ICON_ID: u32 = 1;
    const MENU_EXIT_ID: u32 = 1;

    pub struct TrayIcon {
        hwnd: HWND,
    }

    impl TrayIcon {
        pub fn new(tooltip: &str) -> Result<Self, PlatformError> {
            let hwnd = create_message_window()?;

            let mut nid = NOTIFYICONDATAW {
                cbSize: mem::size_of::<NOTIFYICONDATAW>() as u32,
                hWnd: hwnd,
                uID: TRAY_ICON_ID,
                uFlags: NIF_MESSAGE | NIF_ICON | NIF_TIP,
                uCallbackMessage: WM_TRAY_CALLBACK,
                ..Default::default()
            };

            unsafe {
                nid.hIcon = LoadIconW(None, IDI_INFORMATION).unwrap_or_default();
            }

            // szTip is a fixed 128-wide-char field; truncate to fit.
            for (dst, src) in nid.szTip.iter_mut().zip(tooltip.encode_utf16()) {
                *dst = src;
            }
            if let Some(last) = nid.szTip.last_mut() {
                *last = 0;
            }

            let added = unsafe { Shell_NotifyIconW(NIM_ADD, &nid) };
            if !added.as_bool() {
                unsafe {
                    let _ = DestroyWindow(hwnd);
                }
                return Err(PlatformError::Tray("Shell_NotifyIconW failed".to_string()));
            }

            tracing::debug!("tray icon registered");
            Ok(Self { hwnd })
        }

        /// Tray events queued since the last call.
        pub fn drain_events(&mut self) -> Vec<TrayEvent> {
            let mut events = Vec::new();

            unsafe {
                let mut msg = MSG::default();
                while PeekMessageW(&mut msg, self.hwnd, 0, 0, PM_REMOVE).as_bool() {
                    if msg.message == WM_TRAY_CALLBACK {
                        match msg.lParam.0 as u32 {
                            WM_LBUTTONDBLCLK => events.push(TrayEvent::ToggleOverlay),
                            WM_RBUTTONUP => {
                                if let Some(event) = self.show_context_menu() {
                                    events.push(event);
                                }
                            }
                            _ => {}
                        }
                    } else {
                        let _ = TranslateMessage(&msg);
                        DispatchMessageW(&msg);
                    }
                }
            }

            events
        }

        /// Show the context menu at the cursor; blocks until dismissed.
        fn show_context_menu(&self) -> Option<TrayEvent> {
            unsafe {
                let menu = CreatePopupMenu().ok()?;
                if AppendMenuW(menu, MF_STRING, MENU_EXIT_ID as usize, w!("Exit")).is_err() {
                    let _ = DestroyMenu(menu);
                    return None;
                }

                let mut cursor = POINT::default();
                let _ = GetCursorPos(&mut cursor);

                // The menu only dismisses on an outside click while this
                // window is foreground.
                let _ = SetForegroundWindow(self.hwnd);

                let selected = TrackPopupMenu(
                    menu,
                    TPM_BOTTOMALIGN | TPM_RETURNCMD | TPM_NONOTIFY,
                    cursor.x,
                    cursor.y,
                    0,
                    self.hwnd,
                    None,
                );
                let _ = DestroyMenu(menu);

                (selected.0 as u32 == MENU_EXIT_ID).then_some(TrayEvent::Exit)
            }
        }
    }

    impl Drop for TrayIcon {
        fn drop(&mut self) {
            let nid = NOTIFYICONDATAW {
                cbSize: mem::size_of::<NOTIFYICONDATAW>() as u32,
                hWnd: self.hwnd,
                uID: TRAY_ICON_ID,
                ..Default::default()
            };
            unsafe {
                let _ = Shell_NotifyIconW(NIM_DELETE, &nid);
                if !self.hwnd.is_invalid() {
                    let _ = DestroyWindow(self.hwnd);
                }
            }
        }
    }

    fn create_message_window() -> Result<HWND, PlatformError> {
        unsafe {
            let class_name = wide_string(TRAY_CLASS);
            let hinstance = GetModuleHandleW(None)
                .map_err(|e| PlatformError::Tray(format!("GetModuleHandleW: {e}")))?;

            let wc = WNDCLASSEXW {
                cbSize: mem::size_of::<WNDCLASSEXW>() as u32,
                lpfnWndProc: Some(tray_proc),
                hInstance: hinstance.into(),
                lpszClassName: PCWSTR(class_name.as_ptr()),
                ..Default::default()
            };

            let atom = RegisterClassExW(&wc);
            if atom == 0 {
                let err = std::io::Error::last_os_error();
                if err.raw_os_error() != Some(1410) {
                    return Err(PlatformError::Tray(format!("RegisterClassExW: {err}")));
                }
            }

            CreateWindowExW(
                WINDOW_EX_STYLE(0),
                PCWSTR(class_name.as_ptr()),
                PCWSTR::null(),
                WINDOW_STYLE(0),
                0,
                0,
                0,
                0,
                HWND_MESSAGE,
                None,
                hinstance,
                None,
            )
            .map_err(|e| PlatformError::Tray(format!("CreateWindowExW: {e}")))
        }
    }

    unsafe extern "system" fn tray_proc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
    }

    fn wide_string(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }
}

#[cfg(not(target_os = "windows"))]
mod imp {
    use super::TrayEvent;
    use crate::platform::PlatformError;

    /// Inert tray handle for targets without a tray backend.
    pub struct TrayIcon;

    impl TrayIcon {
        pub fn new(_tooltip: &str) -> Result<Self, PlatformError> {
            Ok(Self)
        }

        pub fn drain_events(&mut self) -> Vec<TrayEvent> {
            Vec::new()
        }
    }
}

pub use imp::TrayIcon;
