//! DOM implementation of the editor surface.
//!
//! Every block is one `<span>` child of the editable root, carrying `dir`,
//! `data-original` (the raw source) and `data-block-id`. Text runs are the
//! text nodes under that span in document order, which is exactly how the
//! renderer reports them. Offsets cross this boundary as chars; the DOM
//! speaks UTF-16, so conversion happens here and nowhere else.

use smol_str::SmolStr;
use twinline_editor_core::text::strip_placeholder;
use twinline_editor_core::{
    Block, PLACEHOLDER, PlatformError, SelectionState, Surface, SurfacePoint, SurfaceRange,
};
use web_sys::{Document, HtmlElement, Node};

/// Class toggled on the root while the placeholder should show.
pub const EMPTY_CLASS: &str = "twinline-empty";

/// Attribute on the root holding the placeholder text, for CSS `attr()`.
pub const PLACEHOLDER_ATTR: &str = "data-placeholder";

pub struct DomSurface {
    root: HtmlElement,
    /// `(id, fingerprint)` of what each block child currently shows.
    materialized: Vec<(SmolStr, u64)>,
}

impl DomSurface {
    /// Wrap an editable element. Existing children are replaced on the first sync.
    pub fn new(root: HtmlElement) -> Self {
        Self {
            root,
            materialized: Vec::new(),
        }
    }

    pub fn root(&self) -> &HtmlElement {
        &self.root
    }

    fn document(&self) -> Result<Document, PlatformError> {
        Ok(self.root.owner_document().ok_or("root is not in a document")?)
    }

    fn block_node(&self, index: usize) -> Option<Node> {
        self.root.child_nodes().get(index as u32)
    }

    /// The block child holding `node`, with its index.
    fn block_of(&self, node: &Node) -> Option<(usize, Node)> {
        let root: &Node = &self.root;
        let mut current = node.clone();
        loop {
            let parent = current.parent_node()?;
            if parent.is_same_node(Some(root)) {
                break;
            }
            current = parent;
        }
        let children = root.child_nodes();
        (0..children.length())
            .find(|&i| {
                children
                    .get(i)
                    .is_some_and(|child| child.is_same_node(Some(&current)))
            })
            .map(|i| (i as usize, current))
    }

    /// Convert a DOM boundary point to a surface point.
    fn locate(&self, node: &Node, offset: u32) -> Option<SurfacePoint> {
        let root: &Node = &self.root;
        if node.is_same_node(Some(root)) {
            // boundary between block children
            let count = self.block_count();
            if count == 0 {
                return None;
            }
            let block = (offset as usize).min(count - 1);
            if (offset as usize) < count {
                return Some(SurfacePoint::new(block, 0, 0));
            }
            return Some(self.end_of_block(block));
        }

        let (block, element) = self.block_of(node)?;
        let texts = text_nodes(&element);
        if texts.is_empty() {
            return Some(SurfacePoint::new(block, 0, 0));
        }

        if node.node_type() == Node::TEXT_NODE {
            let run = texts.iter().position(|t| t.is_same_node(Some(node)))?;
            let text = node.text_content().unwrap_or_default();
            return Some(SurfacePoint::new(
                block,
                run,
                visible_offset(&text, offset as usize),
            ));
        }

        // An element boundary sits before the first text node at or after
        // the child it points at.
        let following = match node.child_nodes().get(offset) {
            Some(child) => texts.iter().position(|t| {
                t.is_same_node(Some(&child))
                    || child.compare_document_position(t) & Node::DOCUMENT_POSITION_FOLLOWING != 0
            }),
            None => texts.iter().position(|t| {
                !node.contains(Some(t))
                    && node.compare_document_position(t) & Node::DOCUMENT_POSITION_FOLLOWING != 0
            }),
        };
        match following {
            Some(run) => Some(SurfacePoint::new(block, run, 0)),
            None => Some(self.end_of_block(block)),
        }
    }

    fn end_of_block(&self, block: usize) -> SurfacePoint {
        let runs = self.runs(block);
        let last = runs.len().saturating_sub(1);
        let len = runs.last().map(|r| r.chars().count()).unwrap_or(0);
        SurfacePoint::new(block, last, len)
    }

    /// Convert a surface point to a DOM boundary point.
    fn dom_position(&self, point: SurfacePoint) -> Result<(Node, u32), PlatformError> {
        let element = self
            .block_node(point.block)
            .ok_or_else(|| format!("block {} is not materialized", point.block))?;
        let texts = text_nodes(&element);
        let Some(node) = texts.get(point.run).or(texts.last()) else {
            return Ok((element, 0));
        };
        let text = node.text_content().unwrap_or_default();
        Ok((node.clone(), dom_offset(&text, point.offset) as u32))
    }

    fn materialize(&self, document: &Document, block: &Block) -> Result<Node, PlatformError> {
        let span = document
            .create_element("span")
            .map_err(|e| format!("create_element failed: {:?}", e))?;
        span.set_attribute("dir", block.direction().as_str())
            .map_err(|e| format!("set dir failed: {:?}", e))?;
        span.set_attribute("data-original", block.raw())
            .map_err(|e| format!("set data-original failed: {:?}", e))?;
        span.set_attribute("data-block-id", block.id())
            .map_err(|e| format!("set data-block-id failed: {:?}", e))?;
        span.set_inner_html(&block.content_markup());
        Ok(span.into())
    }
}

impl Surface for DomSurface {
    fn selection(&self) -> SelectionState {
        let Some(selection) = web_sys::window().and_then(|w| w.get_selection().ok().flatten())
        else {
            return SelectionState::None;
        };
        if selection.range_count() == 0 {
            return SelectionState::None;
        }
        let Ok(range) = selection.get_range_at(0) else {
            return SelectionState::None;
        };
        let (Ok(start), Ok(start_offset), Ok(end), Ok(end_offset)) = (
            range.start_container(),
            range.start_offset(),
            range.end_container(),
            range.end_offset(),
        ) else {
            return SelectionState::None;
        };
        if !self.root.contains(Some(&start)) || !self.root.contains(Some(&end)) {
            return SelectionState::Outside;
        }

        match (self.locate(&start, start_offset), self.locate(&end, end_offset)) {
            (Some(start), Some(end)) => SelectionState::Inside(SurfaceRange::new(start, end)),
            _ => {
                tracing::trace!(target: "twinline::cursor", "selection not inside a block");
                SelectionState::Outside
            }
        }
    }

    fn set_selection(&mut self, range: SurfaceRange) -> Result<(), PlatformError> {
        let window = web_sys::window().ok_or("no window")?;
        let document = self.document()?;
        let selection = window
            .get_selection()
            .map_err(|e| format!("get_selection failed: {:?}", e))?
            .ok_or("no selection object")?;

        let (start_node, start_offset) = self.dom_position(range.start)?;
        let (end_node, end_offset) = if range.is_collapsed() {
            (start_node.clone(), start_offset)
        } else {
            self.dom_position(range.end)?
        };

        let dom_range = document
            .create_range()
            .map_err(|e| format!("create_range failed: {:?}", e))?;
        dom_range
            .set_start(&start_node, start_offset)
            .map_err(|e| format!("set_start failed: {:?}", e))?;
        dom_range
            .set_end(&end_node, end_offset)
            .map_err(|e| format!("set_end failed: {:?}", e))?;

        selection
            .remove_all_ranges()
            .map_err(|e| format!("remove_all_ranges failed: {:?}", e))?;
        selection
            .add_range(&dom_range)
            .map_err(|e| format!("add_range failed: {:?}", e))?;

        tracing::trace!(
            target: "twinline::cursor",
            start_offset,
            end_offset,
            "selection applied"
        );
        Ok(())
    }

    fn block_count(&self) -> usize {
        self.root.child_nodes().length() as usize
    }

    fn runs(&self, block: usize) -> Vec<String> {
        let Some(element) = self.block_node(block) else {
            return vec![String::new()];
        };
        let runs: Vec<String> = text_nodes(&element)
            .iter()
            .map(|node| strip_placeholder(&node.text_content().unwrap_or_default()))
            .collect();
        if runs.is_empty() {
            vec![String::new()]
        } else {
            runs
        }
    }

    fn sync(&mut self, blocks: &[Block]) -> Result<(), PlatformError> {
        let document = self.document()?;
        let root: &Node = &self.root;
        let mut touched = 0;

        for (index, block) in blocks.iter().enumerate() {
            let key = (block.id().clone(), block.fingerprint());
            let current = self.block_node(index);
            if current.is_some() && self.materialized.get(index) == Some(&key) {
                continue;
            }

            let fresh = self.materialize(&document, block)?;
            match current {
                Some(old) => root
                    .replace_child(&fresh, &old)
                    .map_err(|e| format!("replace_child failed: {:?}", e))?,
                None => root
                    .append_child(&fresh)
                    .map_err(|e| format!("append_child failed: {:?}", e))?,
            };
            if index < self.materialized.len() {
                self.materialized[index] = key;
            } else {
                self.materialized.push(key);
            }
            touched += 1;
        }

        while self.block_count() > blocks.len() {
            let Some(extra) = root.last_child() else {
                break;
            };
            root.remove_child(&extra)
                .map_err(|e| format!("remove_child failed: {:?}", e))?;
        }
        self.materialized.truncate(blocks.len());

        tracing::trace!(touched, blocks = blocks.len(), "surface synced");
        Ok(())
    }

    fn update_placeholder(&mut self, text: &str, visible: bool) {
        if let Err(e) = self.root.set_attribute(PLACEHOLDER_ATTR, text) {
            tracing::warn!("placeholder attribute failed: {:?}", e);
        }
        if let Err(e) = self
            .root
            .class_list()
            .toggle_with_force(EMPTY_CLASS, visible)
        {
            tracing::warn!("placeholder class toggle failed: {:?}", e);
        }
    }
}

/// Text nodes under `container`, in document order.
pub fn text_nodes(container: &Node) -> Vec<Node> {
    let Some(document) = container.owner_document() else {
        return Vec::new();
    };
    let Ok(walker) = document.create_tree_walker_with_what_to_show(container, 0xFFFFFFFF) else {
        return Vec::new();
    };
    let mut nodes = Vec::new();
    while let Ok(Some(node)) = walker.next_node() {
        if node.node_type() == Node::TEXT_NODE {
            nodes.push(node);
        }
    }
    nodes
}

/// Char offset, ignoring placeholder glyphs, of a UTF-16 offset into `text`.
pub fn visible_offset(text: &str, utf16_offset: usize) -> usize {
    let mut utf16 = 0;
    let mut visible = 0;
    for c in text.chars() {
        if utf16 >= utf16_offset {
            break;
        }
        utf16 += c.len_utf16();
        if c != PLACEHOLDER {
            visible += 1;
        }
    }
    visible
}

/// UTF-16 offset into `text` of a char offset that ignores placeholder glyphs.
///
/// A position in front of a placeholder lands after it, where typed text goes.
pub fn dom_offset(text: &str, visible_offset: usize) -> usize {
    let mut utf16 = 0;
    let mut visible = 0;
    for c in text.chars() {
        if c != PLACEHOLDER {
            if visible == visible_offset {
                return utf16;
            }
            visible += 1;
        }
        utf16 += c.len_utf16();
    }
    utf16
}
