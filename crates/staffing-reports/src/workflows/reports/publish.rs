use async_trait::async_trait;
use std::fmt;

use super::render::RenderedImage;
use super::ReportKind;
use crate::workflows::board::BoardError;

/// Everything written to a destination card for one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub kind: ReportKind,
    pub card_id: String,
    pub image: RenderedImage,
    pub description: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStep {
    Upload,
    ListAttachments,
    DeleteAttachment,
    UpdateCard,
}

impl PublishStep {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Upload => "upload attachment",
            Self::ListAttachments => "list attachments",
            Self::DeleteAttachment => "delete attachment",
            Self::UpdateCard => "update card",
        }
    }
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("{step} failed for card {card_id}: {source}")]
    Board {
        step: PublishStep,
        card_id: String,
        #[source]
        source: BoardError,
    },
    #[error("publisher rejected card {card_id}: {reason}")]
    Rejected { card_id: String, reason: String },
}

/// Writes a rendered report onto its destination card. Returns only once
/// every sub-step has completed.
#[async_trait]
pub trait ReportPublisher: Send + Sync {
    async fn publish(&self, publication: &Publication) -> Result<(), PublishError>;
}
