//! Slide/block authoring session for one training.
//!
//! The editor owns an in-memory copy of the slide sequence. Only the
//! active slide has structured blocks; its `content` is re-rendered after
//! every block mutation, so the slide sequence is always ready to save.
//! Nothing here touches the store except [`TrainingEditor::save`].

use uuid::Uuid;

use crate::content::{blocks_from_markup, serialize, Block, BlockId, BlockKind, BlockType};
use crate::error::{CoreError, CoreResult};
use crate::models::{Slide, SlideKind, Training};
use crate::store::Store;
use crate::trainings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideMeta {
    pub title: String,
    pub kind: SlideKind,
    pub duration: String,
}

#[derive(Debug, Clone)]
pub struct TrainingEditor {
    training_id: Uuid,
    slides: Vec<Slide>,
    active: usize,
    blocks: Vec<Block>,
    next_block_id: u64,
    dirty: bool,
}

impl TrainingEditor {
    pub fn open(training: &Training) -> CoreResult<Self> {
        Self::from_slides(training.id, training.slides.clone())
    }

    pub fn from_slides(training_id: Uuid, slides: Vec<Slide>) -> CoreResult<Self> {
        if slides.is_empty() {
            return Err(CoreError::validation("a training needs at least one slide"));
        }

        let mut editor = Self {
            training_id,
            slides,
            active: 0,
            blocks: Vec::new(),
            next_block_id: 1,
            dirty: false,
        };
        editor.load_active_blocks();
        Ok(editor)
    }

    pub fn training_id(&self) -> Uuid {
        self.training_id
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_slide(&self) -> &Slide {
        &self.slides[self.active]
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// Whether there are edits not yet written back.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// For callers that persisted [`Self::slides`] through their own channel.
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    pub fn select_slide(&mut self, index: usize) -> CoreResult<()> {
        if index >= self.slides.len() {
            return Err(CoreError::not_found(format!("slide {index}")));
        }
        self.active = index;
        self.load_active_blocks();
        Ok(())
    }

    /// Append a slide holding one empty paragraph and make it active.
    pub fn add_slide(&mut self) -> usize {
        let mut slide = Slide::new(format!("Slide {}", self.slides.len() + 1));
        let placeholder = vec![Block::new(
            self.allocate_id(),
            BlockKind::default_for(BlockType::Paragraph),
        )];
        slide.content = serialize(&placeholder);

        self.slides.push(slide);
        self.active = self.slides.len() - 1;
        self.blocks = placeholder;
        self.dirty = true;
        self.active
    }

    pub fn delete_slide(&mut self, index: usize) -> CoreResult<()> {
        if index >= self.slides.len() {
            return Err(CoreError::not_found(format!("slide {index}")));
        }
        if self.slides.len() == 1 {
            return Err(CoreError::validation("the last slide cannot be deleted"));
        }

        self.slides.remove(index);
        self.dirty = true;

        if index < self.active {
            self.active -= 1;
        } else if index == self.active {
            self.active = self.active.min(self.slides.len() - 1);
            self.load_active_blocks();
        }
        Ok(())
    }

    pub fn update_slide_meta(&mut self, index: usize, meta: SlideMeta) -> CoreResult<()> {
        let title = meta.title.trim();
        if title.is_empty() {
            return Err(CoreError::validation("slide title is required"));
        }
        let slide = self
            .slides
            .get_mut(index)
            .ok_or_else(|| CoreError::not_found(format!("slide {index}")))?;

        slide.title = title.to_string();
        slide.kind = meta.kind;
        slide.duration = meta.duration.trim().to_string();
        self.dirty = true;
        Ok(())
    }

    pub fn add_block(&mut self, block_type: BlockType) -> CoreResult<BlockId> {
        if block_type == BlockType::RawMarkup {
            return Err(CoreError::validation("markup blocks cannot be authored"));
        }
        let id = self.allocate_id();
        self.blocks
            .push(Block::new(id, BlockKind::default_for(block_type)));
        self.sync_active_content();
        Ok(id)
    }

    pub fn update_block(&mut self, id: BlockId, kind: BlockKind) -> CoreResult<()> {
        let block = self
            .blocks
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| CoreError::not_found(format!("block {}", id.0)))?;

        if block.block_type() == BlockType::RawMarkup {
            return Err(CoreError::validation("markup blocks are read-only"));
        }
        if block.block_type() != kind.block_type() {
            return Err(CoreError::validation(format!(
                "block {} is a {}, not a {}",
                id.0,
                block.block_type().label(),
                kind.block_type().label()
            )));
        }

        block.kind = kind.normalized();
        self.sync_active_content();
        Ok(())
    }

    pub fn remove_block(&mut self, id: BlockId) -> CoreResult<()> {
        let position = self
            .blocks
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| CoreError::not_found(format!("block {}", id.0)))?;

        self.blocks.remove(position);
        self.sync_active_content();
        Ok(())
    }

    /// Swap the block at `index` with its neighbour. Returns false, and
    /// changes nothing, at either end of the list.
    pub fn move_block(&mut self, index: usize, direction: MoveDirection) -> bool {
        let target = match direction {
            MoveDirection::Up => index.checked_sub(1),
            MoveDirection::Down => index.checked_add(1),
        };
        let Some(target) = target.filter(|t| *t < self.blocks.len()) else {
            return false;
        };
        if index >= self.blocks.len() {
            return false;
        }

        self.blocks.swap(index, target);
        self.sync_active_content();
        true
    }

    /// Write the whole slide sequence back in one update. On failure the
    /// editor keeps every edit so the caller can retry.
    pub async fn save(&mut self, store: &dyn Store) -> CoreResult<()> {
        trainings::save_slides(store, self.training_id, &self.slides).await?;
        self.dirty = false;
        tracing::info!(
            training_id = %self.training_id,
            slides = self.slides.len(),
            "training slides saved"
        );
        Ok(())
    }

    fn allocate_id(&mut self) -> BlockId {
        let id = BlockId(self.next_block_id);
        self.next_block_id += 1;
        id
    }

    fn load_active_blocks(&mut self) {
        let id = self.allocate_id();
        self.blocks = blocks_from_markup(&self.slides[self.active].content, id);
    }

    fn sync_active_content(&mut self) {
        self.slides[self.active].content = serialize(&self.blocks);
        self.dirty = true;
    }
}
