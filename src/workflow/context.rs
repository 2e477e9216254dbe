use crate::capture::capture::CaptureOptions;
use crate::fill::fill_model::FillConfig;
use crate::fill::schedule::Clock;
use crate::store::SnapshotStore;
use crate::store::site_record::site_in;
use crate::store::store_model::SiteList;
use crate::workflow::dialog::SaveDialog;

/// Collaborators and settings for the page currently being handled.
pub struct PageContext<'a> {
    pub hostname: String,
    pub store: &'a mut dyn SnapshotStore,
    pub dialog: &'a mut dyn SaveDialog,
    pub clock: &'a mut dyn Clock,
    pub capture: CaptureOptions,
    pub fill: FillConfig,
    /// Only act on hostnames in the whitelist.
    pub require_whitelist: bool,
}

impl<'a> PageContext<'a> {
    pub fn new(
        hostname: &str,
        store: &'a mut dyn SnapshotStore,
        dialog: &'a mut dyn SaveDialog,
        clock: &'a mut dyn Clock,
    ) -> Self {
        PageContext {
            hostname: hostname.to_string(),
            store,
            dialog,
            clock,
            capture: CaptureOptions::default(),
            fill: FillConfig::default(),
            require_whitelist: false,
        }
    }

    pub fn with_capture(mut self, capture: CaptureOptions) -> Self {
        self.capture = capture;
        self
    }

    pub fn with_fill(mut self, fill: FillConfig) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_require_whitelist(mut self, require: bool) -> Self {
        self.require_whitelist = require;
        self
    }

    /// Whether capture and fill run on this page at all.
    pub fn is_active(&self) -> bool {
        !self.require_whitelist || site_in(&*self.store, SiteList::Whitelisted, &self.hostname)
    }
}
