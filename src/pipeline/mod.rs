//! Pipeline components.
//!
//! Each component reads and extends the annotation graph of one
//! [`Image`] datapoint. The analyzer runs them in sequence.

mod layout;
mod matching;
mod options;
mod order;
mod segment;
mod text;
mod token_class;

pub use layout::{ImageLayoutService, SubImageLayoutService};
pub use matching::MatchingService;
pub use options::{
    MatchingConfig, MatchingRule, OrderConfig, PageParsingConfig, SegmentationConfig,
};
pub use order::TextOrderService;
pub use segment::TableSegmentationService;
pub use text::TextExtractionService;
pub use token_class::LmTokenClassService;

use crate::datapoint::Image;
use crate::error::Result;

/// A step of the analysis pipeline.
pub trait PipelineComponent: Send + Sync {
    /// Component name, used in logs and errors.
    fn name(&self) -> &str;

    /// Process one datapoint in place.
    fn serve(&self, image: &mut Image) -> Result<()>;
}
