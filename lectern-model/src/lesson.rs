use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::asset::AssetRef;
use crate::block::ContentBlock;
use crate::ids::{LessonId, UserId};

/// One question/answer thread attached to a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaThread {
    pub author: UserId,
    pub question: String,
    pub answers: Vec<String>,
    pub asked_on: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

/// A lesson document.
///
/// Content-block ordering is significant and preserved across edits;
/// block ids are unique within the lesson and immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    pub emoji: String,
    pub title: String,
    pub content: Vec<ContentBlock>,
    pub video: Option<AssetRef>,
    pub content_duration_secs: u32,
    pub video_duration_secs: u32,
    pub free: bool,
    pub qa_threads: Vec<QaThread>,
    pub attachments: Vec<Attachment>,
    pub last_edited_on: DateTime<Utc>,
}

impl Lesson {
    pub fn new(emoji: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: LessonId::new(),
            emoji: emoji.into(),
            title: title.into(),
            content: Vec::new(),
            video: None,
            content_duration_secs: 0,
            video_duration_secs: 0,
            free: false,
            qa_threads: Vec::new(),
            attachments: Vec::new(),
            last_edited_on: Utc::now(),
        }
    }

    pub fn apply_meta(&mut self, patch: &LessonMetaPatch) {
        if let Some(emoji) = &patch.emoji {
            self.emoji = emoji.clone();
        }
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(free) = patch.free {
            self.free = free;
        }
        if let Some(secs) = patch.content_duration_secs {
            self.content_duration_secs = secs;
        }
        if let Some(secs) = patch.video_duration_secs {
            self.video_duration_secs = secs;
        }
    }

    /// All asset references this lesson owns: the optional video plus
    /// every image block's asset. Used for cascade cleanup on removal.
    pub fn owned_assets(&self) -> Vec<&AssetRef> {
        self.video
            .iter()
            .chain(self.content.iter().filter_map(|b| b.owned_asset()))
            .collect()
    }
}

/// Partial update to lesson metadata; absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LessonMetaPatch {
    pub emoji: Option<String>,
    pub title: Option<String>,
    pub free: Option<bool>,
    pub content_duration_secs: Option<u32>,
    pub video_duration_secs: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetId, AssetRef};
    use crate::ids::BlockId;

    #[test]
    fn owned_assets_collects_video_and_image_blocks() {
        let mut lesson = Lesson::new("🎸", "Fretwork");
        lesson.video = Some(AssetRef {
            asset_id: AssetId::new("vid-1"),
            url: "https://cdn.example/vid-1".into(),
        });
        lesson.content.push(ContentBlock::Paragraph {
            id: BlockId::new(),
            text: "hello".into(),
        });
        lesson.content.push(ContentBlock::Image {
            id: BlockId::new(),
            asset: Some(AssetRef {
                asset_id: AssetId::new("img-1"),
                url: "https://cdn.example/img-1".into(),
            }),
            caption: String::new(),
        });

        let assets = lesson.owned_assets();
        assert_eq!(assets.len(), 2);
    }
}
