//! Edit scripts: a KDL document with one editor operation per node.
//!
//! ```kdl
//! click 5          // caret at flat offset 5, selection-change pipeline runs
//! select 2 7       // select a flat range without running the pipeline
//! enter
//! backspace
//! delete
//! select-all
//! copy
//! cut
//! paste "text"     // paste text; with no argument, paste the clipboard
//! type "text"      // replace the selection, as a programmatic insert
//! input "text"     // native typing inside the caret's text run
//! leave            // focus moves outside the editor
//! attr "placeholder" "Write here"
//! ```

use kdl::{KdlDocument, KdlNode};
use miette::Diagnostic;
use thiserror::Error;

use twinline_editor_core::{EditorSession, HeadlessSurface, MemoryClipboard};

#[derive(Debug, Error, Diagnostic)]
pub enum ScriptError {
    #[error("unknown script operation `{name}` (step {step})")]
    #[diagnostic(
        code(twinline::script::unknown),
        help("expected one of: click, select, enter, backspace, delete, select-all, copy, cut, paste, type, input, leave, attr")
    )]
    Unknown { name: String, step: usize },

    #[error("`{name}` (step {step}) expects {expected}")]
    #[diagnostic(code(twinline::script::argument))]
    Argument {
        name: String,
        step: usize,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Click(usize),
    Select(usize, usize),
    Enter,
    Backspace,
    Delete,
    SelectAll,
    Copy,
    Cut,
    Paste(Option<String>),
    Type(String),
    Input(String),
    Leave,
    Attr(String, Option<String>),
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::Click(_) => "click",
            Step::Select(..) => "select",
            Step::Enter => "enter",
            Step::Backspace => "backspace",
            Step::Delete => "delete",
            Step::SelectAll => "select-all",
            Step::Copy => "copy",
            Step::Cut => "cut",
            Step::Paste(_) => "paste",
            Step::Type(_) => "type",
            Step::Input(_) => "input",
            Step::Leave => "leave",
            Step::Attr(..) => "attr",
        }
    }
}

fn offset_arg(node: &KdlNode, index: usize) -> Option<usize> {
    let value = node.entries().get(index)?.value().as_i64()?;
    usize::try_from(value).ok()
}

fn string_arg(node: &KdlNode, index: usize) -> Option<String> {
    node.entries()
        .get(index)?
        .value()
        .as_string()
        .map(str::to_string)
}

fn parse_step(node: &KdlNode, step: usize) -> Result<Step, ScriptError> {
    let name = node.name().value();
    let argument = |expected: &'static str| ScriptError::Argument {
        name: name.to_string(),
        step,
        expected,
    };
    let parsed = match name {
        "click" => Step::Click(offset_arg(node, 0).ok_or_else(|| argument("an offset"))?),
        "select" => {
            let start = offset_arg(node, 0).ok_or_else(|| argument("one or two offsets"))?;
            Step::Select(start, offset_arg(node, 1).unwrap_or(start))
        }
        "enter" => Step::Enter,
        "backspace" => Step::Backspace,
        "delete" => Step::Delete,
        "select-all" => Step::SelectAll,
        "copy" => Step::Copy,
        "cut" => Step::Cut,
        "paste" => Step::Paste(string_arg(node, 0)),
        "type" => Step::Type(string_arg(node, 0).ok_or_else(|| argument("a string"))?),
        "input" => Step::Input(string_arg(node, 0).ok_or_else(|| argument("a string"))?),
        "leave" => Step::Leave,
        "attr" => Step::Attr(
            string_arg(node, 0).ok_or_else(|| argument("an attribute name"))?,
            string_arg(node, 1),
        ),
        other => {
            return Err(ScriptError::Unknown {
                name: other.to_string(),
                step,
            });
        }
    };
    Ok(parsed)
}

/// Read every step of a parsed script, in order.
pub fn parse(doc: &KdlDocument) -> Result<Vec<Step>, ScriptError> {
    doc.nodes()
        .iter()
        .enumerate()
        .map(|(index, node)| parse_step(node, index + 1))
        .collect()
}

/// Apply one step. Returns whether it changed anything.
pub fn apply(
    session: &mut EditorSession<HeadlessSurface>,
    clipboard: &MemoryClipboard,
    step: &Step,
) -> bool {
    let changed = match step {
        Step::Click(offset) => {
            let placed = session.set_selection_range(*offset, *offset);
            if placed {
                session.on_selection_change();
            }
            placed
        }
        Step::Select(start, end) => session.set_selection_range(*start, *end),
        Step::Enter => session.enter(),
        Step::Backspace => session.backspace(),
        Step::Delete => session.delete(),
        Step::SelectAll => session.select_all(),
        Step::Copy => session.copy(clipboard),
        Step::Cut => session.cut(clipboard),
        Step::Paste(Some(text)) => session.paste_text(text),
        Step::Paste(None) => session.paste(clipboard),
        Step::Type(text) => session.insert_text(text),
        Step::Input(text) => {
            let typed = session
                .surface_mut()
                .and_then(|surface| surface.type_text(text))
                .is_some();
            typed && session.on_input()
        }
        Step::Leave => {
            if let Some(surface) = session.surface_mut() {
                surface.select_outside();
            }
            session.on_selection_change()
        }
        Step::Attr(name, value) => session.apply_attribute(name, value.as_deref()),
    };
    tracing::debug!(step = step.name(), changed, "step applied");
    changed
}

/// Apply every step in order.
pub fn run(
    session: &mut EditorSession<HeadlessSurface>,
    clipboard: &MemoryClipboard,
    steps: &[Step],
) {
    for (index, step) in steps.iter().enumerate() {
        if !apply(session, clipboard, step) {
            tracing::info!(step = index + 1, op = step.name(), "step had no effect");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twinline_editor_core::{Direction, EditorConfig};

    fn steps(script: &str) -> Result<Vec<Step>, ScriptError> {
        let doc: KdlDocument = script.parse().expect("valid kdl");
        parse(&doc)
    }

    fn session(text: &str) -> EditorSession<HeadlessSurface> {
        let mut session =
            EditorSession::new(EditorConfig::new().with_default_direction(Direction::Ltr));
        session.set_content(text);
        session.attach(HeadlessSurface::new());
        session
    }

    #[test]
    fn test_parse_steps() {
        let parsed = steps("click 3\nselect 1 4\nselect 2\npaste\npaste \"x\"\nattr \"placeholder\"")
            .expect("parses");
        assert_eq!(
            parsed,
            vec![
                Step::Click(3),
                Step::Select(1, 4),
                Step::Select(2, 2),
                Step::Paste(None),
                Step::Paste(Some("x".to_string())),
                Step::Attr("placeholder".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            steps("enter\nfrobnicate"),
            Err(ScriptError::Unknown { step: 2, .. })
        ));
        assert!(matches!(
            steps("click \"here\""),
            Err(ScriptError::Argument { step: 1, .. })
        ));
        assert!(matches!(
            steps("select -1"),
            Err(ScriptError::Argument { .. })
        ));
    }

    #[test]
    fn test_run_script() {
        let clipboard = MemoryClipboard::new();
        let mut s = session("hello world");
        let script = steps("click 5\nenter\ninput \"!\"\nselect 0 5\ncut\nclick 0\npaste").expect("parses");
        run(&mut s, &clipboard, &script);
        // the cut empties the first block, which is dropped
        assert_eq!(s.content(), "hello! world");
        assert_eq!(clipboard.contents().as_deref(), Some("hello"));
    }

    #[test]
    fn test_leave_renders_blocks() {
        let clipboard = MemoryClipboard::new();
        let mut s = session("**x**");
        assert!(apply(&mut s, &clipboard, &Step::Click(1)));
        assert_eq!(s.surface().map(|surface| surface.runs(0).concat()).as_deref(), Some("**x**"));
        assert!(apply(&mut s, &clipboard, &Step::Leave));
        assert_eq!(s.surface().map(|surface| surface.runs(0).concat()).as_deref(), Some("x"));
    }
}
