use crate::settings::WindowSize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tauri::{PhysicalSize, WindowEvent};

/// Set once a relaunch has been requested; later requests are dropped.
#[derive(Debug, Default)]
pub struct RestartGuard {
    restarting: AtomicBool,
}

impl RestartGuard {
    /// True for the caller that gets to restart, false while one is already pending.
    pub fn try_begin(&self) -> bool {
        !self.restarting.swap(true, Ordering::SeqCst)
    }

    /// Lets a failed restart be retried.
    pub fn cancel(&self) {
        self.restarting.store(false, Ordering::SeqCst);
    }

    pub fn is_pending(&self) -> bool {
        self.restarting.load(Ordering::SeqCst)
    }
}

/// Generation counter for debounced saves: a delayed save only runs if nothing
/// newer was scheduled in the meantime.
#[derive(Debug, Default)]
pub struct SaveDebounce {
    generation: AtomicU64,
}

impl SaveDebounce {
    pub fn schedule(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_latest(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Drops any pending save, used when saving immediately.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

/// What the main window's events mean for the app.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MainWindowAction {
    /// Record the size and schedule a debounced save.
    RememberSize(WindowSize),
    /// Save now, skipping the debounce.
    Flush,
    /// The main window is gone, so the app quits with it.
    Exit,
    Ignore,
}

pub fn main_window_action(event: &WindowEvent, scale_factor: f64) -> MainWindowAction {
    match event {
        WindowEvent::Resized(size) => match logical_window_size(*size, scale_factor) {
            Some(size) => MainWindowAction::RememberSize(size),
            None => MainWindowAction::Ignore,
        },
        WindowEvent::CloseRequested { .. } => MainWindowAction::Flush,
        WindowEvent::Destroyed => MainWindowAction::Exit,
        _ => MainWindowAction::Ignore,
    }
}

/// Window size to persist for a resize report, or `None` for the 0x0 some
/// platforms report while minimised.
pub fn logical_window_size(size: PhysicalSize<u32>, scale_factor: f64) -> Option<WindowSize> {
    if size.width == 0 || size.height == 0 {
        return None;
    }
    let scale = if scale_factor.is_finite() && scale_factor > 0.0 {
        scale_factor
    } else {
        1.0
    };
    let logical = size.to_logical::<f64>(scale);
    Some(
        WindowSize {
            width: logical.width,
            height: logical.height,
        }
        .clamped(),
    )
}
