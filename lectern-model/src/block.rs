use serde::{Deserialize, Serialize};

use crate::asset::AssetRef;
use crate::ids::BlockId;

/// Variant tag for [`ContentBlock`], used where only the shape matters
/// (block creation requests, wire decoding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Paragraph,
    H1,
    H2,
    H3,
    Divider,
    Quote,
    Code,
    Image,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Paragraph => "paragraph",
            BlockKind::H1 => "h1",
            BlockKind::H2 => "h2",
            BlockKind::H3 => "h3",
            BlockKind::Divider => "divider",
            BlockKind::Quote => "quote",
            BlockKind::Code => "code",
            BlockKind::Image => "image",
        }
    }

    /// Parses a wire-level type tag. Unknown tags are rejected rather
    /// than silently ignored so corrupt authoring state cannot enter.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "paragraph" => Some(BlockKind::Paragraph),
            "h1" => Some(BlockKind::H1),
            "h2" => Some(BlockKind::H2),
            "h3" => Some(BlockKind::H3),
            "divider" => Some(BlockKind::Divider),
            "quote" => Some(BlockKind::Quote),
            "code" => Some(BlockKind::Code),
            "image" => Some(BlockKind::Image),
            _ => None,
        }
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One typed unit of lesson content.
///
/// A closed sum type: invalid variant/field combinations are
/// unrepresentable. Only `Image` owns an external asset; every other
/// variant is pure data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Paragraph { id: BlockId, text: String },
    H1 { id: BlockId, text: String },
    H2 { id: BlockId, text: String },
    H3 { id: BlockId, text: String },
    Divider { id: BlockId },
    Quote { id: BlockId, text: String },
    Code { id: BlockId, text: String, caption: String },
    Image { id: BlockId, asset: Option<AssetRef>, caption: String },
}

impl ContentBlock {
    /// Block ids are immutable once created; a block re-created after a
    /// delete is a distinct instance with a distinct id.
    pub fn id(&self) -> BlockId {
        match self {
            ContentBlock::Paragraph { id, .. }
            | ContentBlock::H1 { id, .. }
            | ContentBlock::H2 { id, .. }
            | ContentBlock::H3 { id, .. }
            | ContentBlock::Divider { id }
            | ContentBlock::Quote { id, .. }
            | ContentBlock::Code { id, .. }
            | ContentBlock::Image { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            ContentBlock::Paragraph { .. } => BlockKind::Paragraph,
            ContentBlock::H1 { .. } => BlockKind::H1,
            ContentBlock::H2 { .. } => BlockKind::H2,
            ContentBlock::H3 { .. } => BlockKind::H3,
            ContentBlock::Divider { .. } => BlockKind::Divider,
            ContentBlock::Quote { .. } => BlockKind::Quote,
            ContentBlock::Code { .. } => BlockKind::Code,
            ContentBlock::Image { .. } => BlockKind::Image,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            ContentBlock::Paragraph { text, .. }
            | ContentBlock::H1 { text, .. }
            | ContentBlock::H2 { text, .. }
            | ContentBlock::H3 { text, .. }
            | ContentBlock::Quote { text, .. }
            | ContentBlock::Code { text, .. } => Some(text),
            ContentBlock::Divider { .. } | ContentBlock::Image { .. } => None,
        }
    }

    /// The external asset this block owns, if any.
    pub fn owned_asset(&self) -> Option<&AssetRef> {
        match self {
            ContentBlock::Image { asset, .. } => asset.as_ref(),
            _ => None,
        }
    }
}

/// Field-level patch applied to an existing block.
///
/// Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockPatch {
    pub text: Option<String>,
    pub caption: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_round_trip() {
        for kind in [
            BlockKind::Paragraph,
            BlockKind::H1,
            BlockKind::H2,
            BlockKind::H3,
            BlockKind::Divider,
            BlockKind::Quote,
            BlockKind::Code,
            BlockKind::Image,
        ] {
            assert_eq!(BlockKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(BlockKind::from_str("video-embed"), None);
    }

    #[test]
    fn only_image_owns_an_asset() {
        let para = ContentBlock::Paragraph { id: BlockId::new(), text: "hi".into() };
        assert!(para.owned_asset().is_none());

        let image = ContentBlock::Image {
            id: BlockId::new(),
            asset: Some(AssetRef {
                asset_id: crate::asset::AssetId::new("abc"),
                url: "https://cdn.example/abc.png".into(),
            }),
            caption: String::new(),
        };
        assert!(image.owned_asset().is_some());
    }
}
