//! C ABI surface for driving the update manager from native shells.
//!
//! Provides an opaque manager handle behind `extern "C"` functions that
//! Swift (or any C-compatible language) can call directly from a statically
//! linked `libfae_updater.a`.
//!
//! # Lifecycle
//!
//! ```text
//! fae_updater_create(prefs_path, cb, user_data) → handle
//! fae_updater_init(handle, feed_url, key) → 0 initialized, 1 already, -1 failed
//! fae_updater_check_interactive(handle) → 0 forwarded, 1 skipped
//! fae_updater_check_background(handle) → 0 forwarded, 1 skipped
//! fae_updater_set_automatic_checks(handle, enabled) → 0 forwarded, 1 skipped
//! fae_updater_status_json(handle) → json   (caller frees via fae_updater_string_free)
//! fae_updater_shutdown(handle)
//! fae_updater_destroy(handle)
//! ```
//!
//! # Thread safety
//!
//! All functions may be called from any thread; the manager serializes them
//! internally. Sparkle only accepts init and requests on the main thread:
//! elsewhere `fae_updater_init` fails and requests return 1 (skipped) with
//! the checker untouched.

use std::ffi::{CStr, CString, c_char, c_void};
use std::sync::Arc;

use crate::events::{LoggingEvents, UpdateEvent, UpdateEvents, VersionInfo};
use crate::update::{InitStatus, PreferenceStore, RequestStatus, UpdateManager};

// ── Types ──────────────────────────────────────────────────────────────────

/// Callback signature for checker event notifications.
///
/// # Safety
///
/// The `event_json` pointer is valid only for the duration of the callback
/// invocation. `user_data` is the pointer passed to `fae_updater_create`.
/// The callback may be invoked from whichever thread the checker reports on.
pub type FaeUpdateEventCallback =
    unsafe extern "C" fn(event_json: *const c_char, user_data: *mut c_void);

/// Forwards checker events to a C callback as JSON.
struct CallbackEvents {
    callback: FaeUpdateEventCallback,
    user_data: *mut c_void,
}

// SAFETY: the callback and `user_data` are caller-managed; the caller
// guarantees they stay valid, and are callable from any thread, for the
// lifetime of the handle.
unsafe impl Send for CallbackEvents {}
unsafe impl Sync for CallbackEvents {}

impl CallbackEvents {
    fn deliver(&self, event: &UpdateEvent) {
        let json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, ?event, "cannot encode update event; callback skipped");
                return;
            }
        };
        let cstr = match CString::new(json) {
            Ok(cstr) => cstr,
            Err(e) => {
                tracing::warn!(error = %e, ?event, "update event JSON contains NUL; callback skipped");
                return;
            }
        };
        // SAFETY: callback and user_data were provided by the caller via
        // fae_updater_create. The CString pointer is valid for this scope.
        unsafe {
            (self.callback)(cstr.as_ptr(), self.user_data);
        }
    }
}

impl UpdateEvents for CallbackEvents {
    fn on_check_aborted(&self, error: &str) {
        LoggingEvents.on_check_aborted(error);
        self.deliver(&UpdateEvent::CheckAborted {
            error: error.to_owned(),
        });
    }

    fn on_update_found(&self, version: &VersionInfo) {
        LoggingEvents.on_update_found(version);
        self.deliver(&UpdateEvent::UpdateFound {
            version: version.clone(),
        });
    }

    fn on_no_update_found(&self) {
        LoggingEvents.on_no_update_found();
        self.deliver(&UpdateEvent::NoUpdateFound);
    }
}

// ── Helpers ────────────────────────────────────────────────────────────────

/// Convert a nullable C string pointer to a `&str`.
///
/// Returns `None` if `ptr` is null or if the bytes are not valid UTF-8.
///
/// # Safety
///
/// `ptr` must be null or point to a valid null-terminated C string.
unsafe fn cstr_to_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: caller guarantees ptr is null or a valid C string.
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Convert a Rust `String` to a C-owned `*mut c_char`.
///
/// The caller must free the returned pointer via `fae_updater_string_free`.
/// Returns null if the string contains an interior NUL byte.
fn string_to_c(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(cs) => cs.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Recover a `&UpdateManager` from an opaque handle.
///
/// # Safety
///
/// `handle` must be null or a pointer returned by `fae_updater_create` (or
/// [`handle_from_manager`]) that has not yet been passed to
/// `fae_updater_destroy`.
unsafe fn borrow_manager<'a>(handle: *mut c_void) -> Option<&'a UpdateManager> {
    if handle.is_null() {
        return None;
    }
    // SAFETY: handle was created by Box::into_raw in handle_from_manager.
    Some(unsafe { &*(handle as *const UpdateManager) })
}

fn request_code(status: RequestStatus) -> i32 {
    match status {
        RequestStatus::Forwarded => 0,
        RequestStatus::Skipped(_) => 1,
    }
}

/// Hand a Rust-built manager to native code as an opaque handle.
///
/// The handle must eventually be passed to `fae_updater_destroy`.
pub fn handle_from_manager(manager: UpdateManager) -> *mut c_void {
    Box::into_raw(Box::new(manager)) as *mut c_void
}

// ── Extern "C" functions ──────────────────────────────────────────────────

/// Create an update manager for the current platform.
///
/// `preferences_path` may be null to disable preference persistence.
/// `callback` may be null to only log checker events.
///
/// Returns an opaque handle. It is never null.
///
/// # Safety
///
/// `preferences_path` must be null or a valid null-terminated C string.
/// `user_data` must remain valid for as long as the handle lives, and the
/// callback must be safe to call from any thread.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fae_updater_create(
    preferences_path: *const c_char,
    callback: Option<FaeUpdateEventCallback>,
    user_data: *mut c_void,
) -> *mut c_void {
    let mut manager = UpdateManager::for_current_platform();

    // SAFETY: caller guarantees preferences_path is null or a valid C string.
    if let Some(path) = unsafe { cstr_to_str(preferences_path) } {
        manager = manager.with_preferences(PreferenceStore::new(path));
    }
    if let Some(callback) = callback {
        manager = manager.with_events(Arc::new(CallbackEvents {
            callback,
            user_data,
        }));
    }

    handle_from_manager(manager)
}

/// Initialize the manager with a feed URL and verification key.
///
/// Returns 0 when initialized by this call, 1 when it was already
/// initialized, and -1 on failure (null handle, invalid strings, or checker
/// construction failure). After -1 the call may be retried.
///
/// # Safety
///
/// `handle` must be a valid handle. `feed_url` and `verification_key` must be
/// null or valid null-terminated C strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fae_updater_init(
    handle: *mut c_void,
    feed_url: *const c_char,
    verification_key: *const c_char,
) -> i32 {
    // SAFETY: handle is from fae_updater_create and not yet destroyed.
    let manager = match unsafe { borrow_manager(handle) } {
        Some(m) => m,
        None => return -1,
    };
    // SAFETY: caller guarantees both pointers are null or valid C strings.
    let (feed_url, verification_key) =
        match unsafe { (cstr_to_str(feed_url), cstr_to_str(verification_key)) } {
            (Some(f), Some(k)) => (f, k),
            _ => return -1,
        };

    match manager.init(feed_url, verification_key) {
        Ok(InitStatus::Initialized) => 0,
        Ok(InitStatus::AlreadyInitialized) => 1,
        Err(_) => -1,
    }
}

/// Request a user-visible update check.
///
/// Returns 0 if forwarded to the checker, 1 if skipped, -1 for a null handle.
///
/// # Safety
///
/// `handle` must be a valid handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fae_updater_check_interactive(handle: *mut c_void) -> i32 {
    // SAFETY: handle is from fae_updater_create.
    match unsafe { borrow_manager(handle) } {
        Some(m) => request_code(m.check_interactive()),
        None => -1,
    }
}

/// Request a silent update check.
///
/// Returns 0 if forwarded to the checker, 1 if skipped, -1 for a null handle.
///
/// # Safety
///
/// `handle` must be a valid handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fae_updater_check_background(handle: *mut c_void) -> i32 {
    // SAFETY: handle is from fae_updater_create.
    match unsafe { borrow_manager(handle) } {
        Some(m) => request_code(m.check_background()),
        None => -1,
    }
}

/// Enable or disable scheduled automatic checks.
///
/// Returns 0 if forwarded to the checker, 1 if skipped, -1 for a null handle.
///
/// # Safety
///
/// `handle` must be a valid handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fae_updater_set_automatic_checks(
    handle: *mut c_void,
    enabled: bool,
) -> i32 {
    // SAFETY: handle is from fae_updater_create.
    match unsafe { borrow_manager(handle) } {
        Some(m) => request_code(m.set_automatic_check_enabled(enabled)),
        None => -1,
    }
}

/// Return the manager state as JSON.
///
/// The returned string is owned by the caller and **must** be freed via
/// `fae_updater_string_free`. Returns null for a null handle.
///
/// # Safety
///
/// `handle` must be a valid handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fae_updater_status_json(handle: *mut c_void) -> *mut c_char {
    // SAFETY: handle is from fae_updater_create.
    let manager = match unsafe { borrow_manager(handle) } {
        Some(m) => m,
        None => return std::ptr::null_mut(),
    };

    match serde_json::to_string(&manager.snapshot()) {
        Ok(json) => string_to_c(json),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Release the checker and return to the uninitialized state.
///
/// The handle stays valid; `fae_updater_init` may be called again.
///
/// # Safety
///
/// `handle` must be a valid handle (null is a no-op).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fae_updater_shutdown(handle: *mut c_void) {
    // SAFETY: handle is from fae_updater_create.
    if let Some(manager) = unsafe { borrow_manager(handle) } {
        manager.shutdown();
    }
}

/// Destroy the handle, shutting the manager down first if needed.
///
/// # Safety
///
/// `handle` must be a valid handle (or null, which is a no-op). Must not be
/// called more than once for the same handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fae_updater_destroy(handle: *mut c_void) {
    if handle.is_null() {
        return;
    }
    // SAFETY: handle was created by Box::into_raw in handle_from_manager.
    // Dropping the manager releases any live checker.
    let _ = unsafe { Box::from_raw(handle as *mut UpdateManager) };
}

/// Free a string returned by `fae_updater_status_json`.
///
/// Passing null is a safe no-op.
///
/// # Safety
///
/// `s` must be null or a pointer previously returned by this module. Must
/// not be freed more than once.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fae_updater_string_free(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    // SAFETY: s was created by CString::into_raw in string_to_c.
    let _ = unsafe { CString::from_raw(s) };
}
