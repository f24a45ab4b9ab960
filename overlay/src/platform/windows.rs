//! Windows backend: a transparent, always-on-top layered window.
//!
//! The window is a WS_POPUP tool window with per-pixel alpha committed
//! through `UpdateLayeredWindow`. Mouse messages are translated into
//! [`PointerEvent`]s with absolute cursor coordinates and queued for the
//! overlay loop; the backend itself never repositions the window.

use std::mem;
use std::ptr;

use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, POINT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BI_RGB, BITMAPINFO, BITMAPINFOHEADER, CreateCompatibleDC, CreateDIBSection, DIB_RGB_COLORS,
    DeleteDC, EnumDisplayMonitors, GetCurrentObject, GetDC, GetMonitorInfoW, HBITMAP, HDC,
    HMONITOR, MONITORINFOEXW, OBJ_BITMAP, ReleaseDC, SelectObject, SetDIBits,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{ReleaseCapture, SetCapture};
use windows::Win32::UI::WindowsAndMessaging::{
    CS_HREDRAW, CS_VREDRAW, CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW,
    GetCursorPos, HWND_TOPMOST, IDC_ARROW, LoadCursorW, MSG, PM_REMOVE, PeekMessageW,
    RegisterClassExW, SW_HIDE, SW_SHOWNOACTIVATE, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE,
    SetWindowPos, ShowWindow, TranslateMessage, ULW_ALPHA, UpdateLayeredWindow, WM_DESTROY,
    WM_ERASEBKGND, WM_LBUTTONDOWN, WM_LBUTTONUP, WM_MOUSEMOVE, WM_QUIT, WNDCLASSEXW,
    WS_EX_LAYERED, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_POPUP,
};
use windows::core::PCWSTR;

use netpulse_core::geometry::{Point, Rect};

use super::{MonitorInfo, OverlayPlatform, OverlayWindowConfig, PlatformError, PointerEvent};

const WINDOW_CLASS: &str = "NetpulseOverlayClass";

pub struct WindowsOverlay {
    hwnd: HWND,
    hdc_mem: HDC,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    visible: bool,
    pixel_data: Vec<u8>,
    /// Pre-allocated scratch buffer for the RGBA -> BGRA conversion.
    bgra_buffer: Vec<u8>,
    content_dirty: bool,
    pointer_down: bool,
    pointer_events: Vec<PointerEvent>,
    running: bool,
}

// NOTE: WindowsOverlay intentionally does NOT implement Send. Win32 HWNDs
// are bound to the thread that created them; the single-threaded event
// loop creates and drives the window on the same thread.

impl WindowsOverlay {
    fn register_class() -> Result<(), PlatformError> {
        unsafe {
            let class_name = wide_string(WINDOW_CLASS);
            let hinstance = GetModuleHandleW(None)
                .map_err(|e| PlatformError::RegisterClass(format!("GetModuleHandleW: {e}")))?;

            let wc = WNDCLASSEXW {
                cbSize: mem::size_of::<WNDCLASSEXW>() as u32,
                style: CS_HREDRAW | CS_VREDRAW,
                lpfnWndProc: Some(window_proc),
                hInstance: hinstance.into(),
                hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
                lpszClassName: PCWSTR(class_name.as_ptr()),
                ..Default::default()
            };

            let atom = RegisterClassExW(&wc);
            if atom == 0 {
                let err = std::io::Error::last_os_error();
                // ERROR_CLASS_ALREADY_EXISTS is fine
                if err.raw_os_error() != Some(1410) {
                    return Err(PlatformError::RegisterClass(err.to_string()));
                }
            }
        }
        Ok(())
    }

    fn create_dib_section(&mut self) -> Result<(), PlatformError> {
        unsafe {
            let hdc_screen = GetDC(HWND::default());

            if !self.hdc_mem.is_invalid() {
                let _ = DeleteDC(self.hdc_mem);
            }

            self.hdc_mem = CreateCompatibleDC(hdc_screen);
            if self.hdc_mem.is_invalid() {
                ReleaseDC(HWND::default(), hdc_screen);
                return Err(PlatformError::Buffer("CreateCompatibleDC failed".to_string()));
            }

            let bmi = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: self.width as i32,
                    biHeight: -(self.height as i32), // Top-down DIB
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };

            let mut bits: *mut std::ffi::c_void = ptr::null_mut();
            let hbitmap = CreateDIBSection(hdc_screen, &bmi, DIB_RGB_COLORS, &mut bits, None, 0)
                .map_err(|e| PlatformError::Buffer(format!("CreateDIBSection: {e}")))?;

            SelectObject(self.hdc_mem, hbitmap);
            ReleaseDC(HWND::default(), hdc_screen);

            let size = (self.width * self.height * 4) as usize;
            self.pixel_data.resize(size, 0);
            self.bgra_buffer.resize(size, 0);
            self.content_dirty = true;
        }
        Ok(())
    }

    fn update_layered_window(&mut self) {
        if !self.content_dirty {
            return;
        }
        self.content_dirty = false;

        unsafe {
            let hdc_screen = GetDC(HWND::default());

            let bmi = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: self.width as i32,
                    biHeight: -(self.height as i32),
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };

            for (i, chunk) in self.pixel_data.chunks(4).enumerate() {
                let offset = i * 4;
                if chunk.len() == 4 && offset + 3 < self.bgra_buffer.len() {
                    self.bgra_buffer[offset] = chunk[2]; // B
                    self.bgra_buffer[offset + 1] = chunk[1]; // G
                    self.bgra_buffer[offset + 2] = chunk[0]; // R
                    self.bgra_buffer[offset + 3] = chunk[3]; // A
                }
            }

            let hgdiobj = GetCurrentObject(self.hdc_mem, OBJ_BITMAP);
            let hbitmap = HBITMAP(hgdiobj.0);
            SetDIBits(
                self.hdc_mem,
                hbitmap,
                0,
                self.height,
                self.bgra_buffer.as_ptr() as *const _,
                &bmi,
                DIB_RGB_COLORS,
            );

            let pt_src = POINT { x: 0, y: 0 };
            let pt_dst = POINT {
                x: self.x,
                y: self.y,
            };
            let size = windows::Win32::Foundation::SIZE {
                cx: self.width as i32,
                cy: self.height as i32,
            };
            let blend = windows::Win32::Graphics::Gdi::BLENDFUNCTION {
                BlendOp: 0, // AC_SRC_OVER
                BlendFlags: 0,
                SourceConstantAlpha: 255,
                AlphaFormat: 1, // AC_SRC_ALPHA
            };

            let _ = UpdateLayeredWindow(
                self.hwnd,
                hdc_screen,
                Some(&pt_dst),
                Some(&size),
                self.hdc_mem,
                Some(&pt_src),
                windows::Win32::Foundation::COLORREF(0),
                Some(&blend),
                ULW_ALPHA,
            );

            ReleaseDC(HWND::default(), hdc_screen);
        }
    }

    fn cursor_position() -> Point {
        let mut pt = POINT::default();
        unsafe {
            let _ = GetCursorPos(&mut pt);
        }
        Point { x: pt.x, y: pt.y }
    }
}

impl OverlayPlatform for WindowsOverlay {
    fn new(config: OverlayWindowConfig) -> Result<Self, PlatformError> {
        Self::register_class()?;

        let hwnd = unsafe {
            let class_name = wide_string(WINDOW_CLASS);
            let window_name = wide_string(&config.title);
            let hinstance = GetModuleHandleW(None)
                .map_err(|e| PlatformError::CreateWindow(format!("GetModuleHandleW: {e}")))?;

            // Topmost tool window: stays above everything, never takes
            // focus, never shows in the taskbar.
            let ex_style = WS_EX_LAYERED | WS_EX_TOPMOST | WS_EX_TOOLWINDOW | WS_EX_NOACTIVATE;

            CreateWindowExW(
                ex_style,
                PCWSTR(class_name.as_ptr()),
                PCWSTR(window_name.as_ptr()),
                WS_POPUP,
                config.x,
                config.y,
                config.width as i32,
                config.height as i32,
                None,
                None,
                hinstance,
                None,
            )
            .map_err(|e| PlatformError::CreateWindow(e.to_string()))?
        };

        let mut overlay = Self {
            hwnd,
            hdc_mem: HDC::default(),
            x: config.x,
            y: config.y,
            width: config.width,
            height: config.height,
            visible: true,
            pixel_data: vec![0u8; (config.width * config.height * 4) as usize],
            bgra_buffer: vec![0u8; (config.width * config.height * 4) as usize],
            content_dirty: true,
            pointer_down: false,
            pointer_events: Vec::new(),
            running: true,
        };

        overlay.create_dib_section()?;

        unsafe {
            let _ = ShowWindow(hwnd, SW_SHOWNOACTIVATE);
        }
        tracing::debug!(hwnd = ?overlay.hwnd, "overlay window created");

        Ok(overlay)
    }

    fn x(&self) -> i32 {
        self.x
    }

    fn y(&self) -> i32 {
        self.y
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set_position(&mut self, x: i32, y: i32) {
        if x == self.x && y == self.y {
            return;
        }
        self.x = x;
        self.y = y;
        unsafe {
            let _ = SetWindowPos(
                self.hwnd,
                HWND_TOPMOST,
                x,
                y,
                0,
                0,
                SWP_NOSIZE | SWP_NOACTIVATE,
            );
        }
    }

    fn set_size(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;

        let _ = self.create_dib_section();

        unsafe {
            let _ = SetWindowPos(
                self.hwnd,
                HWND_TOPMOST,
                0,
                0,
                width as i32,
                height as i32,
                SWP_NOMOVE | SWP_NOACTIVATE,
            );
        }
    }

    fn set_visible(&mut self, visible: bool) {
        if visible == self.visible {
            return;
        }
        self.visible = visible;
        unsafe {
            let _ = ShowWindow(self.hwnd, if visible { SW_SHOWNOACTIVATE } else { SW_HIDE });
        }
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn pixel_buffer(&mut self) -> Option<&mut [u8]> {
        self.content_dirty = true;
        Some(&mut self.pixel_data)
    }

    fn commit(&mut self) {
        self.update_layered_window();
    }

    fn poll_events(&mut self) -> bool {
        unsafe {
            let mut msg = MSG::default();
            while PeekMessageW(&mut msg, self.hwnd, 0, 0, PM_REMOVE).as_bool() {
                match msg.message {
                    WM_QUIT | WM_DESTROY => {
                        self.running = false;
                        return false;
                    }
                    WM_LBUTTONDOWN => {
                        // Capture so move/up events keep arriving while the
                        // cursor is outside the window mid-drag.
                        let _ = SetCapture(self.hwnd);
                        self.pointer_down = true;
                        self.pointer_events
                            .push(PointerEvent::Down(Self::cursor_position()));
                    }
                    WM_MOUSEMOVE => {
                        if self.pointer_down {
                            self.pointer_events
                                .push(PointerEvent::Move(Self::cursor_position()));
                        }
                    }
                    WM_LBUTTONUP => {
                        if self.pointer_down {
                            self.pointer_down = false;
                            let _ = ReleaseCapture();
                            self.pointer_events.push(PointerEvent::Up);
                        }
                    }
                    _ => {
                        let _ = TranslateMessage(&msg);
                        DispatchMessageW(&msg);
                    }
                }
            }
        }
        self.running
    }

    fn drain_pointer_events(&mut self) -> Vec<PointerEvent> {
        mem::take(&mut self.pointer_events)
    }

    fn monitors(&self) -> Vec<MonitorInfo> {
        get_all_monitors()
    }
}

impl Drop for WindowsOverlay {
    fn drop(&mut self) {
        unsafe {
            if !self.hdc_mem.is_invalid() {
                let _ = DeleteDC(self.hdc_mem);
            }
            if !self.hwnd.is_invalid() {
                let _ = DestroyWindow(self.hwnd);
            }
        }
    }
}

/// Window procedure for the overlay window.
unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_ERASEBKGND => LRESULT(1), // Layered window, never erase
        _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Monitor enumeration
// ─────────────────────────────────────────────────────────────────────────────

/// Callback for EnumDisplayMonitors - collects into a Vec<MonitorInfo>
unsafe extern "system" fn enum_monitors_callback(
    hmonitor: HMONITOR,
    _hdc: HDC,
    _rect: *mut RECT,
    lparam: LPARAM,
) -> windows::Win32::Foundation::BOOL {
    unsafe {
        let monitors = &mut *(lparam.0 as *mut Vec<MonitorInfo>);

        let mut info = MONITORINFOEXW::default();
        info.monitorInfo.cbSize = mem::size_of::<MONITORINFOEXW>() as u32;

        if GetMonitorInfoW(hmonitor, &mut info.monitorInfo).as_bool() {
            let name_len = info
                .szDevice
                .iter()
                .position(|&c| c == 0)
                .unwrap_or(info.szDevice.len());

            monitors.push(MonitorInfo {
                name: String::from_utf16_lossy(&info.szDevice[..name_len]),
                bounds: rect_from_win32(info.monitorInfo.rcMonitor),
                work_area: rect_from_win32(info.monitorInfo.rcWork),
                is_primary: info.monitorInfo.dwFlags & 1 != 0,
            });
        }

        windows::Win32::Foundation::BOOL::from(true)
    }
}

fn rect_from_win32(rc: RECT) -> Rect {
    Rect {
        left: rc.left,
        top: rc.top,
        right: rc.right,
        bottom: rc.bottom,
    }
}

/// Get all connected monitors, with their work areas.
pub fn get_all_monitors() -> Vec<MonitorInfo> {
    let mut monitors: Vec<MonitorInfo> = Vec::new();

    unsafe {
        let raw_ptr = &mut monitors as *mut Vec<MonitorInfo>;
        let _ = EnumDisplayMonitors(
            None,
            None,
            Some(enum_monitors_callback),
            LPARAM(raw_ptr as isize),
        );
    }

    monitors
}

/// Convert a &str to a null-terminated wide string
fn wide_string(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}
