//! Legacy client-facing wire shapes.
//!
//! Clients still consume lesson content as a loosely typed record bag:
//! `[{id, type, data: [{key, value}]}]`. Internally blocks are the closed
//! [`ContentBlock`] sum type; this module converts between the two and
//! rejects unknown type tags at the boundary.

use serde::{Deserialize, Serialize};

use crate::asset::{AssetId, AssetRef};
use crate::block::{BlockKind, ContentBlock};
use crate::course::{Course, CourseStage, Difficulty, Faq, Group};
use crate::error::{ModelError, Result};
use crate::ids::BlockId;
use crate::lesson::Lesson;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub key: String,
    pub value: String,
}

impl Field {
    fn new(key: &str, value: impl Into<String>) -> Self {
        Field { key: key.into(), value: value.into() }
    }
}

/// One content block in the client wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Vec<Field>,
}

impl BlockRecord {
    fn field(&self, key: &str) -> Option<&str> {
        self.data
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.value.as_str())
    }

    fn required(&self, kind: &'static str, key: &'static str) -> Result<String> {
        self.field(key)
            .map(str::to_owned)
            .ok_or(ModelError::MissingField { kind, field: key })
    }
}

impl From<&ContentBlock> for BlockRecord {
    fn from(block: &ContentBlock) -> Self {
        let (kind, data) = match block {
            ContentBlock::Paragraph { text, .. }
            | ContentBlock::H1 { text, .. }
            | ContentBlock::H2 { text, .. }
            | ContentBlock::H3 { text, .. }
            | ContentBlock::Quote { text, .. } => {
                (block.kind(), vec![Field::new("text", text.clone())])
            }
            ContentBlock::Divider { .. } => (BlockKind::Divider, Vec::new()),
            ContentBlock::Code { text, caption, .. } => (
                BlockKind::Code,
                vec![
                    Field::new("text", text.clone()),
                    Field::new("caption", caption.clone()),
                ],
            ),
            ContentBlock::Image { asset, caption, .. } => {
                let mut data = Vec::new();
                if let Some(asset) = asset {
                    data.push(Field::new("URL", asset.url.clone()));
                    data.push(Field::new("assetId", asset.asset_id.as_str()));
                }
                data.push(Field::new("caption", caption.clone()));
                (BlockKind::Image, data)
            }
        };

        BlockRecord { id: block.id(), kind: kind.as_str().into(), data }
    }
}

impl TryFrom<&BlockRecord> for ContentBlock {
    type Error = ModelError;

    fn try_from(record: &BlockRecord) -> Result<Self> {
        let kind = BlockKind::from_str(&record.kind)
            .ok_or_else(|| ModelError::UnknownBlockKind(record.kind.clone()))?;
        let id = record.id;

        Ok(match kind {
            BlockKind::Paragraph => ContentBlock::Paragraph {
                id,
                text: record.required("paragraph", "text")?,
            },
            BlockKind::H1 => ContentBlock::H1 { id, text: record.required("h1", "text")? },
            BlockKind::H2 => ContentBlock::H2 { id, text: record.required("h2", "text")? },
            BlockKind::H3 => ContentBlock::H3 { id, text: record.required("h3", "text")? },
            BlockKind::Divider => ContentBlock::Divider { id },
            BlockKind::Quote => ContentBlock::Quote {
                id,
                text: record.required("quote", "text")?,
            },
            BlockKind::Code => ContentBlock::Code {
                id,
                text: record.required("code", "text")?,
                caption: record.field("caption").unwrap_or_default().to_owned(),
            },
            BlockKind::Image => {
                // Both asset fields present or neither; a half-written
                // asset reference is corrupt.
                let asset = match (record.field("assetId"), record.field("URL")) {
                    (Some(asset_id), Some(url)) => Some(AssetRef {
                        asset_id: AssetId::new(asset_id),
                        url: url.to_owned(),
                    }),
                    (None, None) => None,
                    _ => {
                        return Err(ModelError::MissingField {
                            kind: "image",
                            field: "assetId/URL",
                        });
                    }
                };
                ContentBlock::Image {
                    id,
                    asset,
                    caption: record.field("caption").unwrap_or_default().to_owned(),
                }
            }
        })
    }
}

/// Lesson as exposed to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonView {
    pub id: crate::ids::LessonId,
    pub title: String,
    pub content: Vec<BlockRecord>,
    pub video: Option<AssetRef>,
    pub last_edited_on: chrono::DateTime<chrono::Utc>,
}

impl From<&Lesson> for LessonView {
    fn from(lesson: &Lesson) -> Self {
        LessonView {
            id: lesson.id,
            title: lesson.title.clone(),
            content: lesson.content.iter().map(BlockRecord::from).collect(),
            video: lesson.video.clone(),
            last_edited_on: lesson.last_edited_on,
        }
    }
}

/// Group as embedded in the client course shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupView {
    pub id: crate::ids::GroupId,
    pub emoji: String,
    pub title: String,
    pub description: String,
    pub lessons: Vec<crate::ids::LessonId>,
    pub content_duration_secs: u32,
    pub video_duration_secs: u32,
    pub last_edited_on: chrono::DateTime<chrono::Utc>,
}

impl From<&Group> for GroupView {
    fn from(group: &Group) -> Self {
        GroupView {
            id: group.id,
            emoji: group.emoji.clone(),
            title: group.title.clone(),
            description: group.description.clone(),
            lessons: group.lessons.clone(),
            content_duration_secs: group.content_duration_secs,
            video_duration_secs: group.video_duration_secs,
            last_edited_on: group.last_edited_on,
        }
    }
}

/// Course as exposed to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseView {
    pub id: crate::ids::CourseId,
    pub emoji: String,
    pub title: String,
    pub description: String,
    pub stage: CourseStage,
    pub difficulty: Difficulty,
    pub instructors: Vec<crate::ids::UserId>,
    pub tags: Vec<String>,
    pub groups: Vec<GroupView>,
    pub faqs: Vec<Faq>,
    pub enrolled: u32,
    /// Clients read the aggregate rating under a plural key.
    #[serde(rename = "ratings")]
    pub rating: f32,
    pub last_edited_on: chrono::DateTime<chrono::Utc>,
}

impl From<&Course> for CourseView {
    fn from(course: &Course) -> Self {
        CourseView {
            id: course.id,
            emoji: course.emoji.clone(),
            title: course.title.clone(),
            description: course.description.clone(),
            stage: course.stage,
            difficulty: course.difficulty,
            instructors: course.instructors.clone(),
            tags: course.tags.clone(),
            groups: course.groups.iter().map(GroupView::from).collect(),
            faqs: course.faqs.clone(),
            enrolled: course.enrolled,
            rating: course.rating,
            last_edited_on: course.last_edited_on,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type_tag_is_rejected() {
        let record = BlockRecord {
            id: BlockId::new(),
            kind: "embed".into(),
            data: Vec::new(),
        };
        assert!(matches!(
            ContentBlock::try_from(&record),
            Err(ModelError::UnknownBlockKind(_))
        ));
    }

    #[test]
    fn image_block_round_trips_through_the_record_bag() {
        let block = ContentBlock::Image {
            id: BlockId::new(),
            asset: Some(AssetRef {
                asset_id: AssetId::new("asset-9"),
                url: "https://cdn.example/asset-9.png".into(),
            }),
            caption: "diagram".into(),
        };

        let record = BlockRecord::from(&block);
        assert_eq!(record.kind, "image");
        let back = ContentBlock::try_from(&record).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn code_block_keeps_text_and_caption() {
        let block = ContentBlock::Code {
            id: BlockId::new(),
            text: "fn main() {}".into(),
            caption: "hello".into(),
        };
        let back = ContentBlock::try_from(&BlockRecord::from(&block)).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn course_view_exposes_camel_case_keys_and_plural_ratings() {
        let mut course = Course::new(crate::ids::UserId::new(), "📚", "Course");
        course.groups.push(Group::new("🧩", "Basics"));
        course.rating = 4.5;

        let value = serde_json::to_value(CourseView::from(&course)).unwrap();
        let object = value.as_object().unwrap();

        assert!(object.contains_key("lastEditedOn"));
        assert!(object.contains_key("ratings"));
        assert!(!object.contains_key("rating"));
        assert_eq!(object["stage"], "draft");
        assert!(object["groups"][0]
            .as_object()
            .unwrap()
            .contains_key("contentDurationSecs"));
    }

    #[test]
    fn half_written_asset_reference_is_corrupt() {
        let record = BlockRecord {
            id: BlockId::new(),
            kind: "image".into(),
            data: vec![Field::new("URL", "https://cdn.example/x.png")],
        };
        assert!(ContentBlock::try_from(&record).is_err());
    }
}
