//! Sparkle 2 update backend for macOS.
//!
//! Sparkle is linked by the app bundle, not by this crate, so every class is
//! looked up through the Objective-C runtime. When the framework is absent
//! the backend reports [`Capability::Unavailable`] and the manager degrades
//! to no-ops.
//!
//! Sparkle objects are main-thread-only. Creation and requests off the main
//! thread fail with [`UpdaterError::Backend`] without touching the updater;
//! a release off the main thread is deferred to the main dispatch queue.

use std::ffi::CStr;
use std::sync::Arc;

use dispatch2::DispatchQueue;
use objc2::rc::{Allocated, Retained};
use objc2::runtime::{AnyClass, AnyObject, NSObject, NSObjectProtocol};
use objc2::{AllocAnyThread, DefinedClass, MainThreadMarker, define_class, msg_send};
use objc2_foundation::{NSBundle, NSError, NSString, NSURL, ns_string};

use super::{Capability, CheckerHandle, FeedSettings, UpdateBackend};
use crate::error::{Result, UpdaterError};
use crate::events::{UpdateEvents, VersionInfo};

const CONTROLLER_CLASS: &CStr = c"SPUStandardUpdaterController";

/// Backend driving `SPUStandardUpdaterController`.
#[derive(Debug, Default)]
pub struct SparkleBackend;

impl SparkleBackend {
    /// Create a new Sparkle backend.
    pub fn new() -> Self {
        Self
    }
}

impl UpdateBackend for SparkleBackend {
    fn name(&self) -> &'static str {
        "sparkle"
    }

    fn capability(&self) -> Capability {
        if AnyClass::get(CONTROLLER_CLASS).is_some() {
            Capability::Available
        } else {
            Capability::Unavailable
        }
    }

    fn create_checker(
        &self,
        feed: &FeedSettings,
        events: Arc<dyn UpdateEvents>,
    ) -> Result<Box<dyn CheckerHandle>> {
        require_main_thread("updater creation")?;

        let class = AnyClass::get(CONTROLLER_CLASS).ok_or_else(|| {
            UpdaterError::Backend("Sparkle.framework is not loaded in this process".to_owned())
        })?;

        verify_bundle_key(&feed.verification_key)?;

        let delegate = UpdaterDelegate::new(&feed.feed_url, events);

        // SAFETY: `alloc` on a class object returns an uninitialized instance
        // that is immediately passed to the designated initializer below.
        let allocated: Allocated<AnyObject> = unsafe { msg_send![class, alloc] };
        // SAFETY: -initWithStartingUpdater:updaterDelegate:userDriverDelegate:
        // is the designated initializer; the delegate is held weakly by
        // Sparkle and kept alive by the returned checker.
        let controller: Option<Retained<AnyObject>> = unsafe {
            msg_send![
                allocated,
                initWithStartingUpdater: false,
                updaterDelegate: &*delegate,
                userDriverDelegate: None::<&AnyObject>
            ]
        };
        let controller = controller.ok_or_else(|| {
            UpdaterError::Backend("SPUStandardUpdaterController init returned nil".to_owned())
        })?;

        tracing::debug!(feed_url = %feed.feed_url, "created Sparkle updater controller");

        Ok(Box::new(SparkleChecker {
            controller,
            _delegate: delegate,
            started: false,
        }))
    }
}

/// Sparkle 2 reads the EdDSA key from `Info.plist`; it cannot be injected at
/// runtime, so the configured key must match what the bundle ships.
fn verify_bundle_key(expected: &str) -> Result<()> {
    let bundle = NSBundle::mainBundle();
    // SAFETY: the returned object is only inspected through `downcast`.
    let value = unsafe { bundle.objectForInfoDictionaryKey(ns_string!("SUPublicEDKey")) }
        .ok_or_else(|| {
            UpdaterError::Backend(
                "app bundle has no SUPublicEDKey; Sparkle cannot verify the feed".to_owned(),
            )
        })?;
    let bundle_key = value
        .downcast::<NSString>()
        .map_err(|_| UpdaterError::Backend("SUPublicEDKey is not a string".to_owned()))?;

    if bundle_key.to_string().trim() != expected.trim() {
        return Err(UpdaterError::Backend(
            "SUPublicEDKey does not match the configured verification key".to_owned(),
        ));
    }
    Ok(())
}

struct DelegateIvars {
    feed_url: Retained<NSString>,
    events: Arc<dyn UpdateEvents>,
}

define_class!(
    // SAFETY: NSObject has no subclassing requirements and the delegate does
    // not implement Drop.
    #[unsafe(super(NSObject))]
    #[name = "FaeUpdaterDelegate"]
    #[ivars = DelegateIvars]
    struct UpdaterDelegate;

    unsafe impl NSObjectProtocol for UpdaterDelegate {}

    impl UpdaterDelegate {
        #[unsafe(method(feedURLStringForUpdater:))]
        fn feed_url_string(&self, _updater: &AnyObject) -> Retained<NSString> {
            self.ivars().feed_url.clone()
        }

        #[unsafe(method(updater:didAbortWithError:))]
        fn did_abort(&self, _updater: &AnyObject, error: &NSError) {
            let description = error.localizedDescription().to_string();
            self.ivars().events.on_check_aborted(&description);
        }

        #[unsafe(method(updater:didFindValidUpdate:))]
        fn did_find_valid_update(&self, _updater: &AnyObject, item: &AnyObject) {
            let version = appcast_version(item);
            self.ivars().events.on_update_found(&version);
        }

        #[unsafe(method(updaterDidNotFindUpdate:))]
        fn did_not_find_update(&self, _updater: &AnyObject) {
            self.ivars().events.on_no_update_found();
        }
    }
);

impl UpdaterDelegate {
    fn new(feed_url: &str, events: Arc<dyn UpdateEvents>) -> Retained<Self> {
        let this = Self::alloc().set_ivars(DelegateIvars {
            feed_url: NSString::from_str(feed_url),
            events,
        });
        // SAFETY: NSObject's designated initializer.
        unsafe { msg_send![super(this), init] }
    }
}

/// Read version fields off an `SUAppcastItem`.
fn appcast_version(item: &AnyObject) -> VersionInfo {
    // SAFETY: SUAppcastItem declares versionString and displayVersionString
    // as nonnull NSString properties, releaseNotesURL as a nullable NSURL.
    let version: Retained<NSString> = unsafe { msg_send![item, versionString] };
    let display: Retained<NSString> = unsafe { msg_send![item, displayVersionString] };
    let notes: Option<Retained<NSURL>> = unsafe { msg_send![item, releaseNotesURL] };

    VersionInfo {
        version: version.to_string(),
        display_version: display.to_string(),
        release_notes_url: notes
            .and_then(|url| url.absoluteString())
            .map(|s| s.to_string()),
    }
}

fn require_main_thread(action: &'static str) -> Result<MainThreadMarker> {
    MainThreadMarker::new().ok_or_else(|| {
        UpdaterError::Backend(format!("Sparkle {action} must be requested on the main thread"))
    })
}

struct SparkleChecker {
    controller: Retained<AnyObject>,
    _delegate: Retained<UpdaterDelegate>,
    started: bool,
}

// SAFETY: the Objective-C objects are only messaged on the main thread. Every
// request obtains a `MainThreadMarker` first, and `release` drops the retained
// pointers on the main queue. Moving the pointers between threads does not
// message them.
unsafe impl Send for SparkleChecker {}

impl SparkleChecker {
    fn updater(&self, _mtm: MainThreadMarker) -> Retained<AnyObject> {
        // SAFETY: `updater` is a nonnull readonly property of the controller.
        unsafe { msg_send![&self.controller, updater] }
    }
}

impl CheckerHandle for SparkleChecker {
    fn start_in_background(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        let mtm = require_main_thread("start")?;

        let updater = self.updater(mtm);
        // SAFETY: -[SPUUpdater startUpdater:] returns NO and fills the error
        // out-parameter on failure.
        let started: std::result::Result<(), Retained<NSError>> =
            unsafe { msg_send![&updater, startUpdater: _] };
        started.map_err(|e| {
            UpdaterError::Backend(format!(
                "Sparkle updater failed to start: {}",
                e.localizedDescription()
            ))
        })?;

        self.started = true;
        Ok(())
    }

    fn request_interactive_check(&mut self) -> Result<()> {
        require_main_thread("interactive check")?;
        // SAFETY: -checkForUpdates: is an IBAction taking a nullable sender.
        unsafe {
            let _: () = msg_send![&self.controller, checkForUpdates: None::<&AnyObject>];
        }
        Ok(())
    }

    fn request_background_check(&mut self) -> Result<()> {
        let mtm = require_main_thread("background check")?;
        let updater = self.updater(mtm);
        // SAFETY: -checkForUpdatesInBackground takes no arguments and never
        // presents modal UI.
        unsafe {
            let _: () = msg_send![&updater, checkForUpdatesInBackground];
        }
        Ok(())
    }

    fn set_automatic_checking(&mut self, enabled: bool) -> Result<()> {
        let mtm = require_main_thread("automatic-check toggle")?;
        let updater = self.updater(mtm);
        // SAFETY: automaticallyChecksForUpdates is a read-write BOOL property.
        unsafe {
            let _: () = msg_send![&updater, setAutomaticallyChecksForUpdates: enabled];
        }
        Ok(())
    }

    fn release(self: Box<Self>) {
        if MainThreadMarker::new().is_some() {
            drop(self);
        } else {
            // Runs once the host's main run loop drains the queue.
            tracing::debug!("deferring Sparkle updater release to the main queue");
            DispatchQueue::main().exec_async(move || drop(self));
        }
    }
}
