//! # Chunked Conversion
//!
//! Converts a long top-level block list a chunk at a time so that peak memory
//! is bounded by the chunk size and the buffered-chunk limit rather than by
//! the whole document.
//!
//! The pipeline is pull-based. [`ChunkedConversion::produce`] converts one
//! chunk into a bounded buffer and reports [`Backpressure::Paused`] once the
//! buffer is full; consumers drain it through [`Iterator::next`]. Nothing is
//! converted until asked for.
//!
//! ```
//! use std::sync::Arc;
//! use blockweave_engine::{Block, ConversionOptions, Converter, HandlerRegistry};
//!
//! let blocks: Vec<Block> = (0..5)
//!     .map(|i| Block::new("core/paragraph").with_inner(format!("<p>{i}</p>")))
//!     .collect();
//! let options = ConversionOptions::builder().chunk_size(2).build();
//! let converter = Converter::new(Arc::new(HandlerRegistry::with_builtins()), options).unwrap();
//!
//! let chunks: Vec<String> = converter
//!     .chunked(&blocks)
//!     .map(|chunk| chunk.markup().unwrap_or_default().to_string())
//!     .collect();
//! assert_eq!(chunks, ["<p>0</p><p>1</p>", "<p>2</p><p>3</p>", "<p>4</p>"]);
//! ```
//!
//! ## Cancellation
//!
//! A [`CancelHandle`] can be cloned and triggered from anywhere. It is only
//! observed between chunks: a chunk is either complete or never emitted.
//! Chunks produced but not yet consumed are dropped on cancellation.

use std::collections::VecDeque;
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::block::Block;
use crate::convert::{Converter, Output, Session};
use crate::error::Diagnostic;
use crate::ssr::ResourceHint;

/// One completed unit of output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of this chunk in the output sequence.
    pub index: usize,
    /// Indices of the top-level blocks it covers.
    pub blocks: Range<usize>,
    pub output: Output,
    pub diagnostics: Vec<Diagnostic>,
    pub resource_hints: Vec<ResourceHint>,
}

impl Chunk {
    pub fn markup(&self) -> Option<&str> {
        self.output.markup()
    }
}

/// Outcome of one [`ChunkedConversion::produce`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backpressure {
    /// A chunk was converted and buffered.
    Produced,
    /// The buffer is full; consume before producing more.
    Paused,
    /// Every block has been converted.
    Exhausted,
    Cancelled,
}

/// Shareable cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A lazily produced, ordered sequence of [`Chunk`]s.
///
/// Single use: once exhausted or cancelled it yields nothing more.
pub struct ChunkedConversion<'a> {
    session: Session<'a>,
    blocks: &'a [Block],
    chunk_size: usize,
    max_buffered: usize,
    next_block: usize,
    next_index: usize,
    buffer: VecDeque<Chunk>,
    cancel: CancelHandle,
    cancelled: bool,
}

impl<'a> ChunkedConversion<'a> {
    pub(crate) fn new(converter: &'a Converter, blocks: &'a [Block]) -> Self {
        let streaming = converter.options().streaming;
        Self {
            session: Session::new(converter),
            blocks,
            chunk_size: streaming.chunk_size.max(1),
            max_buffered: streaming.max_buffered_chunks.max(1),
            next_block: 0,
            next_index: 0,
            buffer: VecDeque::with_capacity(streaming.max_buffered_chunks),
            cancel: CancelHandle::new(),
            cancelled: false,
        }
    }

    /// Uses `handle` for cancellation instead of the pipeline's own flag.
    pub fn with_cancel_handle(mut self, handle: CancelHandle) -> Self {
        self.cancel = handle;
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Completed chunks waiting to be consumed.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Top-level blocks not yet converted.
    pub fn remaining_blocks(&self) -> usize {
        self.blocks.len() - self.next_block
    }

    /// Converts the next chunk into the buffer, unless the buffer is full,
    /// the input is exhausted or the pipeline was cancelled.
    pub fn produce(&mut self) -> Backpressure {
        if self.observe_cancel() {
            return Backpressure::Cancelled;
        }
        if self.next_block >= self.blocks.len() {
            return Backpressure::Exhausted;
        }
        if self.buffer.len() >= self.max_buffered {
            return Backpressure::Paused;
        }

        let start = self.next_block;
        let end = (start + self.chunk_size).min(self.blocks.len());
        let blocks = self.blocks;
        let mut markup = String::new();
        for (offset, block) in blocks[start..end].iter().enumerate() {
            markup.push_str(&self.session.top_level(start + offset, block));
        }

        let chunk = Chunk {
            index: self.next_index,
            blocks: start..end,
            output: self.session.output(markup),
            diagnostics: self.session.take_diagnostics(),
            resource_hints: self.session.take_resource_hints(),
        };
        log::debug!(
            "Produced chunk {} (blocks {start}..{end}, {} buffered)",
            chunk.index,
            self.buffer.len() + 1
        );
        self.next_block = end;
        self.next_index += 1;
        self.buffer.push_back(chunk);
        Backpressure::Produced
    }

    /// Produces until the buffer is full, the input runs out or the
    /// pipeline is cancelled.
    pub fn fill(&mut self) -> Backpressure {
        loop {
            match self.produce() {
                Backpressure::Produced => continue,
                other => return other,
            }
        }
    }

    /// Concatenated markup of every remaining chunk.
    pub fn into_markup(self) -> String {
        self.filter_map(|chunk| chunk.markup().map(str::to_string))
            .collect()
    }

    fn observe_cancel(&mut self) -> bool {
        if self.cancelled {
            return true;
        }
        if !self.cancel.is_cancelled() {
            return false;
        }
        log::debug!(
            "Chunked conversion cancelled after {} chunks, discarding {} buffered",
            self.next_index,
            self.buffer.len()
        );
        self.cancelled = true;
        self.buffer.clear();
        true
    }
}

impl Iterator for ChunkedConversion<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.observe_cancel() {
            return None;
        }
        if self.buffer.is_empty() {
            self.produce();
        }
        self.buffer.pop_front()
    }
}
