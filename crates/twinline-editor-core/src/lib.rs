//! twinline-editor-core: dual-representation line editor logic without DOM dependencies.
//!
//! This crate provides:
//! - `BlockStore` - the document as blocks holding raw source and a cached presentation
//! - `SurfaceLayout` - flat offset <-> surface position mapping over materialized text runs
//! - `SelectionController` and `FocusScope` - selection capture/restore and raw/rendered toggling
//! - `edit` and `paste` - Enter, Backspace, Delete, Cut, Copy and multi-line paste
//! - `EditorSession<S>` - the per-instance state machine, generic over a `Surface`
//! - `HeadlessSurface` - in-memory surface for tests and the CLI

pub mod actions;
pub mod block;
pub mod config;
pub mod direction;
pub mod edit;
pub mod error;
pub mod focus;
pub mod headless;
pub mod offset;
pub mod paste;
pub mod platform;
pub mod render;
pub mod selection;
pub mod session;
pub mod store;
pub mod syntax;
pub mod text;
pub mod types;

pub use actions::{EditorAction, Key, KeydownResult, Modifiers};
pub use block::{Block, make_block_id};
pub use config::{Attribute, EditorConfig};
pub use edit::EditOutcome;
pub use error::{ConfigError, PlatformError, RenderError};
pub use focus::FocusScope;
pub use headless::{HeadlessSurface, MaterializedBlock, MemoryClipboard};
pub use offset::{
    Bias, BlockLayout, BlockPosition, SurfaceLayout, to_block_position, to_flat_offset,
};
pub use paste::{PasteGroup, group_lines};
pub use platform::{ClipboardPlatform, SelectionState, Surface, SurfacePoint, SurfaceRange};
pub use render::{MarkdownRenderer, Presentation, RenderAdapter};
pub use selection::SelectionController;
pub use session::EditorSession;
pub use smol_str::SmolStr;
pub use store::BlockStore;
pub use syntax::Construct;
pub use types::{BlockMode, ChangeEvent, Direction, EditKind, PLACEHOLDER, Selection};
