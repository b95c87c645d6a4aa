//! Tracking resource configuration.

/// Diagnostic settings for a [`TrackingResource`](crate::TrackingResource).
///
/// Only affects what gets logged; the block recycling policy is fixed.
#[derive(Clone, Debug)]
pub struct ResourceConfig {
  /// Prefix for every log line emitted by the resource.
  pub label: String,

  /// Log the stats summary right before teardown releases the blocks.
  pub report_on_drop: bool,
}

impl ResourceConfig {
  /// Label used when none is given.
  pub const DEFAULT_LABEL: &'static str = "TrackingResource";

  pub fn new(label: impl Into<String>) -> Self {
    Self {
      label: label.into(),
      report_on_drop: false,
    }
  }

  pub fn report_on_drop(
    mut self,
    enabled: bool,
  ) -> Self {
    self.report_on_drop = enabled;
    self
  }
}

impl Default for ResourceConfig {
  fn default() -> Self {
    Self::new(Self::DEFAULT_LABEL)
  }
}
