use log::info;

use crate::catalog::ContentItem;

/// Feature-policy grants and sandbox posture for an embedded frame.
///
/// The defaults match what interactive embeds generally need: motion
/// sensors, media autoplay, DRM, and picture-in-picture, with fullscreen
/// delegated to the frame.
#[derive(Debug, Clone)]
pub struct FramePolicy {
    pub allowed_features: Vec<String>,
    pub allow_fullscreen: bool,
    pub sandboxed: bool,
}

impl Default for FramePolicy {
    fn default() -> Self {
        Self {
            allowed_features: [
                "accelerometer",
                "autoplay",
                "encrypted-media",
                "gyroscope",
                "picture-in-picture",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            allow_fullscreen: true,
            sandboxed: true,
        }
    }
}

impl FramePolicy {
    /// The value for the frame's `allow` attribute.
    pub fn allow_attribute(&self) -> String {
        self.allowed_features.join("; ")
    }
}

/// Rendering and scrolling surface the engine drives.
///
/// Implementations must be cheap to call from scroll-frequency code paths:
/// label/overlay updates should be batched to the next paint opportunity,
/// and nothing here may force a synchronous layout read/write pair.
pub trait FrameHost: Send + Sync {
    /// Show the lightweight preview (title, description, call to action)
    /// for a slot that holds no live frame. No network activity.
    fn render_facade(&self, index: usize, item: &ContentItem);

    /// Instantiate the embedded frame for `item`. Completion is reported
    /// back asynchronously through the controller's `frame_loaded` /
    /// `frame_failed` edges.
    fn mount_frame(&self, index: usize, item: &ContentItem, policy: &FramePolicy);

    /// Tear down a previously mounted frame.
    fn unmount_frame(&self, index: usize, item: &ContentItem);

    /// Show the static failure notice naming the item.
    fn render_error(&self, index: usize, item: &ContentItem);

    /// Update the feed overlay (current title, description, position).
    fn set_overlay(&self, index: usize, item: &ContentItem);

    /// Scroll the feed so the section at `offset_px` fills the viewport.
    fn scroll_to(&self, offset_px: f64, smooth: bool);
}

/// Host that renders to the log. Used by the demo binary and anywhere a
/// real surface is not wired up yet.
#[derive(Debug, Default, Clone)]
pub struct LogHost;

impl FrameHost for LogHost {
    fn render_facade(&self, index: usize, item: &ContentItem) {
        info!("[host] facade {} ({})", index, item.title);
    }

    fn mount_frame(&self, index: usize, item: &ContentItem, policy: &FramePolicy) {
        info!(
            "[host] mount {} ({}) allow=\"{}\" fullscreen={}",
            index,
            item.url,
            policy.allow_attribute(),
            policy.allow_fullscreen
        );
    }

    fn unmount_frame(&self, index: usize, item: &ContentItem) {
        info!("[host] unmount {} ({})", index, item.title);
    }

    fn render_error(&self, index: usize, item: &ContentItem) {
        info!("[host] unable to load {} ({})", index, item.title);
    }

    fn set_overlay(&self, index: usize, item: &ContentItem) {
        info!("[host] overlay -> {} ({})", index, item.title);
    }

    fn scroll_to(&self, offset_px: f64, smooth: bool) {
        info!("[host] scroll to {offset_px}px smooth={smooth}");
    }
}
