//! Content-block lifecycle: `generate`, `update`, `delete` per variant.
//!
//! Every variant except `Image` is pure data; `Image` owns an external
//! asset, so updating it replaces the stored object and deleting it
//! issues a best-effort store delete.

use lectern_model::{
    AssetKind, BlockId, BlockKind, BlockPatch, ContentBlock, CourseId, LessonId,
};

use crate::assets::{delete_best_effort, AssetStore, UploadFile};
use crate::error::{AuthoringError, Result};

/// Course/lesson pair an edit is scoped to; determines the store folder
/// uploaded assets land in.
#[derive(Debug, Clone, Copy)]
pub struct LessonScope {
    pub course: CourseId,
    pub lesson: LessonId,
}

impl LessonScope {
    pub fn folder(&self) -> String {
        format!("courses/{}/lessons/{}", self.course, self.lesson)
    }
}

/// Produces a new block with a fresh id and variant-appropriate empty
/// payload. Never allocates an asset.
pub fn generate(kind: BlockKind) -> ContentBlock {
    let id = BlockId::new();
    match kind {
        BlockKind::Paragraph => ContentBlock::Paragraph { id, text: String::new() },
        BlockKind::H1 => ContentBlock::H1 { id, text: String::new() },
        BlockKind::H2 => ContentBlock::H2 { id, text: String::new() },
        BlockKind::H3 => ContentBlock::H3 { id, text: String::new() },
        BlockKind::Divider => ContentBlock::Divider { id },
        BlockKind::Quote => ContentBlock::Quote { id, text: String::new() },
        BlockKind::Code => ContentBlock::Code {
            id,
            text: String::new(),
            caption: String::new(),
        },
        BlockKind::Image => ContentBlock::Image {
            id,
            asset: None,
            caption: String::new(),
        },
    }
}

/// Applies `patch` (and, for images, `file`) to `existing`, returning
/// the new block state. The id is preserved.
///
/// Image updates replace the owned asset: the superseded object is
/// deleted best-effort first, then the new file is uploaded under the
/// lesson's folder. A missing file on an image update is invalid input.
/// A file supplied alongside any other variant is ignored; only text
/// fields are touched.
pub async fn update(
    store: &dyn AssetStore,
    existing: &ContentBlock,
    patch: &BlockPatch,
    file: Option<UploadFile>,
    scope: LessonScope,
) -> Result<ContentBlock> {
    let id = existing.id();

    match existing {
        ContentBlock::Paragraph { text, .. } => Ok(ContentBlock::Paragraph {
            id,
            text: patched(&patch.text, text),
        }),
        ContentBlock::H1 { text, .. } => Ok(ContentBlock::H1 {
            id,
            text: patched(&patch.text, text),
        }),
        ContentBlock::H2 { text, .. } => Ok(ContentBlock::H2 {
            id,
            text: patched(&patch.text, text),
        }),
        ContentBlock::H3 { text, .. } => Ok(ContentBlock::H3 {
            id,
            text: patched(&patch.text, text),
        }),
        ContentBlock::Divider { .. } => Ok(ContentBlock::Divider { id }),
        ContentBlock::Quote { text, .. } => Ok(ContentBlock::Quote {
            id,
            text: patched(&patch.text, text),
        }),
        ContentBlock::Code { text, caption, .. } => Ok(ContentBlock::Code {
            id,
            text: patched(&patch.text, text),
            caption: patched(&patch.caption, caption),
        }),
        ContentBlock::Image { asset, caption, .. } => {
            let Some(file) = file else {
                return Err(AuthoringError::InvalidInput(
                    "image block update requires an uploaded file".into(),
                ));
            };

            // Old object first, then the replacement; a reader can never
            // observe a committed block pointing at an unfinished upload.
            if let Some(old) = asset {
                delete_best_effort(store, &old.asset_id, AssetKind::Image).await;
            }
            let uploaded = store.upload(file, &scope.folder()).await?;

            Ok(ContentBlock::Image {
                id,
                asset: Some(uploaded),
                caption: patched(&patch.caption, caption),
            })
        }
    }
}

/// Releases any external state the block owns. Pure variants are a
/// no-op; image asset deletion is best-effort.
pub async fn delete(store: &dyn AssetStore, block: &ContentBlock) {
    if let ContentBlock::Image { asset: Some(asset), .. } = block {
        delete_best_effort(store, &asset.asset_id, AssetKind::Image).await;
    }
}

fn patched(new: &Option<String>, current: &str) -> String {
    new.clone().unwrap_or_else(|| current.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MockAssetStore;
    use lectern_model::{AssetId, AssetRef};
    use mockall::predicate::*;
    use mockall::Sequence;

    fn scope() -> LessonScope {
        LessonScope {
            course: CourseId::new(),
            lesson: LessonId::new(),
        }
    }

    fn upload_file() -> UploadFile {
        UploadFile {
            filename: "figure.png".into(),
            content_type: "image/png".into(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        }
    }

    #[test]
    fn generate_produces_empty_defaults() {
        let block = generate(BlockKind::Paragraph);
        assert_eq!(block.text(), Some(""));

        let image = generate(BlockKind::Image);
        assert!(image.owned_asset().is_none());
    }

    #[test]
    fn generate_allocates_unique_ids() {
        let a = generate(BlockKind::Quote);
        let b = generate(BlockKind::Quote);
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn generate_then_delete_image_touches_the_store_zero_times() {
        // No expectations set: any store call would panic.
        let store = MockAssetStore::new();
        let block = generate(BlockKind::Image);
        delete(&store, &block).await;
    }

    #[tokio::test]
    async fn text_update_is_pure() {
        let store = MockAssetStore::new();
        let existing = generate(BlockKind::Paragraph);
        let patch = BlockPatch {
            text: Some("updated".into()),
            caption: None,
        };

        let updated = update(&store, &existing, &patch, None, scope())
            .await
            .unwrap();
        assert_eq!(updated.text(), Some("updated"));
        assert_eq!(updated.id(), existing.id());
    }

    #[tokio::test]
    async fn image_update_without_file_is_invalid() {
        let store = MockAssetStore::new();
        let existing = generate(BlockKind::Image);

        let err = update(&store, &existing, &BlockPatch::default(), None, scope())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthoringError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn replacing_an_image_deletes_old_then_uploads_new() {
        let mut store = MockAssetStore::new();
        let mut seq = Sequence::new();

        store
            .expect_delete()
            .with(eq(AssetId::new("old-asset")), eq(AssetKind::Image))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        store
            .expect_upload()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(AssetRef {
                    asset_id: AssetId::new("new-asset"),
                    url: "https://cdn.example/new-asset.png".into(),
                })
            });

        let existing = ContentBlock::Image {
            id: BlockId::new(),
            asset: Some(AssetRef {
                asset_id: AssetId::new("old-asset"),
                url: "https://cdn.example/old-asset.png".into(),
            }),
            caption: "before".into(),
        };

        let updated = update(
            &store,
            &existing,
            &BlockPatch { text: None, caption: Some("after".into()) },
            Some(upload_file()),
            scope(),
        )
        .await
        .unwrap();

        let asset = updated.owned_asset().unwrap();
        assert_eq!(asset.asset_id, AssetId::new("new-asset"));
        assert_eq!(updated.id(), existing.id());
    }

    #[tokio::test]
    async fn failed_cleanup_does_not_fail_the_replacement() {
        let mut store = MockAssetStore::new();
        store.expect_delete().times(1).returning(|_, _| {
            Err(AuthoringError::ExternalService("store down".into()))
        });
        store.expect_upload().times(1).returning(|_, _| {
            Ok(AssetRef {
                asset_id: AssetId::new("new-asset"),
                url: "https://cdn.example/new-asset.png".into(),
            })
        });

        let existing = ContentBlock::Image {
            id: BlockId::new(),
            asset: Some(AssetRef {
                asset_id: AssetId::new("old-asset"),
                url: "https://cdn.example/old-asset.png".into(),
            }),
            caption: String::new(),
        };

        let updated = update(
            &store,
            &existing,
            &BlockPatch::default(),
            Some(upload_file()),
            scope(),
        )
        .await
        .unwrap();
        assert!(updated.owned_asset().is_some());
    }

    #[tokio::test]
    async fn file_with_non_image_variant_updates_text_only() {
        let store = MockAssetStore::new();
        let existing = generate(BlockKind::Quote);

        let updated = update(
            &store,
            &existing,
            &BlockPatch { text: Some("quoted".into()), caption: None },
            Some(upload_file()),
            scope(),
        )
        .await
        .unwrap();
        assert_eq!(updated.text(), Some("quoted"));
        assert!(updated.owned_asset().is_none());
    }

    #[tokio::test]
    async fn deleting_an_image_with_asset_issues_one_store_delete() {
        let mut store = MockAssetStore::new();
        store
            .expect_delete()
            .with(eq(AssetId::new("img-7")), eq(AssetKind::Image))
            .times(1)
            .returning(|_, _| Ok(()));

        let block = ContentBlock::Image {
            id: BlockId::new(),
            asset: Some(AssetRef {
                asset_id: AssetId::new("img-7"),
                url: "https://cdn.example/img-7.png".into(),
            }),
            caption: String::new(),
        };
        delete(&store, &block).await;
    }
}
