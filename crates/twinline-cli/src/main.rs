use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use kdl::KdlDocument;
use miette::{Context, IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use twinline_editor_core::{
    BlockMode, ConfigError, Direction, EditorConfig, EditorSession, HeadlessSurface,
    MemoryClipboard,
};

mod script;

#[derive(Parser)]
#[command(version, about = "Twinline - replay edits against a dual-representation line editor", long_about = None)]
struct Cli {
    /// Document to load, `-` for stdin
    source: Option<PathBuf>,

    /// Load this text instead of a file
    #[arg(long, conflicts_with = "source")]
    text: Option<String>,

    /// KDL edit script to replay
    #[arg(long, short)]
    script: Option<PathBuf>,

    /// KDL config file (`placeholder`, `default-direction`)
    #[arg(long, env = "TWINLINE_CONFIG")]
    config: Option<PathBuf>,

    /// Direction fallback for lines without strong characters
    #[arg(long)]
    default_direction: Option<Direction>,

    /// Placeholder shown while the document is empty
    #[arg(long)]
    placeholder: Option<String>,

    /// What to print once the script has run
    #[arg(long, short, value_enum, default_value_t = Output::Blocks)]
    output: Output,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Output {
    /// One line per block: index, mode, direction, raw source
    Blocks,
    /// The document's raw source
    Content,
    /// The surface as serialized markup
    Markup,
}

fn main() -> Result<()> {
    init_miette();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    let text = load_source(&cli)?;

    let mut session: EditorSession<HeadlessSurface> = EditorSession::new(config);
    session.set_content(&text);
    session.attach(HeadlessSurface::new());

    let clipboard = MemoryClipboard::new();
    if let Some(path) = &cli.script {
        let steps = load_script(path)?;
        tracing::debug!(steps = steps.len(), "replaying script");
        script::run(&mut session, &clipboard, &steps);
    }

    match cli.output {
        Output::Blocks => print!("{}", render_blocks(&session)),
        Output::Content => println!("{}", session.content()),
        Output::Markup => println!("{}", session.to_markup()),
    }
    if let Some(copied) = clipboard.contents() {
        eprintln!("clipboard: {copied:?}");
    }

    Ok(())
}

fn load_source(cli: &Cli) -> Result<String> {
    if let Some(text) = &cli.text {
        return Ok(text.clone());
    }
    match cli.source.as_deref() {
        None => Ok(String::new()),
        Some(path) if path == Path::new("-") => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .into_diagnostic()
                .wrap_err("reading stdin")?;
            Ok(text)
        }
        Some(path) => std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("reading {}", path.display())),
    }
}

/// Config file values, overridden by command-line flags.
fn load_config(cli: &Cli) -> Result<EditorConfig> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => EditorConfig::new(),
    };
    if let Some(direction) = cli.default_direction {
        config.default_direction = direction;
    }
    if let Some(placeholder) = &cli.placeholder {
        config.placeholder = placeholder.clone();
    }
    Ok(config)
}

fn read_config(path: &Path) -> Result<EditorConfig> {
    let content = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading config {}", path.display()))?;
    let doc: KdlDocument = content
        .parse()
        .into_diagnostic()
        .wrap_err_with(|| format!("parsing config {}", path.display()))?;
    config_from_kdl(&doc)
}

fn config_from_kdl(doc: &KdlDocument) -> Result<EditorConfig> {
    let mut config = EditorConfig::new();
    if let Some(placeholder) = kdl_string(doc, "placeholder")? {
        config.placeholder = placeholder.to_string();
    }
    if let Some(direction) = kdl_string(doc, "default-direction")? {
        config.default_direction = direction.parse()?;
    }
    Ok(config)
}

/// First argument of the `name` node. Absent nodes are `None`, non-string
/// arguments are an error.
fn kdl_string<'a>(doc: &'a KdlDocument, name: &str) -> Result<Option<&'a str>, ConfigError> {
    let Some(entry) = doc.get(name).and_then(|node| node.entries().first()) else {
        return Ok(None);
    };
    match entry.value().as_string() {
        Some(value) => Ok(Some(value)),
        None => Err(ConfigError::InvalidValue {
            key: name.to_string(),
            reason: format!("expected a string, found {}", entry.value()),
        }),
    }
}

fn load_script(path: &Path) -> Result<Vec<script::Step>> {
    let content = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading script {}", path.display()))?;
    let doc: KdlDocument = content
        .parse()
        .into_diagnostic()
        .wrap_err_with(|| format!("parsing script {}", path.display()))?;
    Ok(script::parse(&doc)?)
}

fn render_blocks(session: &EditorSession<HeadlessSurface>) -> String {
    let mut out = String::new();
    for (index, block) in session.blocks().iter().enumerate() {
        let mode = match block.mode() {
            BlockMode::Raw => "raw",
            BlockMode::Rendered => "rendered",
        };
        out.push_str(&format!(
            "{index:>3} {mode:<8} {} {:?}\n",
            block.direction(),
            block.raw()
        ));
    }
    if let Some(selection) = session.selection() {
        out.push_str(&format!(
            "selection {}..{}\n",
            selection.start(),
            selection.end()
        ));
    }
    out
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}

fn init_miette() {
    let hook = miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }));
    if hook.is_err() {
        eprintln!("couldn't set the miette hook");
    }
    miette::set_panic_hook();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_kdl() {
        let doc: KdlDocument = "placeholder \"Write here\"\ndefault-direction \"LTR\""
            .parse()
            .expect("valid kdl");
        let config = config_from_kdl(&doc).expect("valid config");
        assert_eq!(config.placeholder, "Write here");
        assert_eq!(config.default_direction, Direction::Ltr);

        let empty: KdlDocument = "".parse().expect("valid kdl");
        assert_eq!(config_from_kdl(&empty).expect("defaults"), EditorConfig::new());
    }

    #[test]
    fn test_bad_direction_is_an_error() {
        let doc: KdlDocument = "default-direction \"up\"".parse().expect("valid kdl");
        assert!(config_from_kdl(&doc).is_err());
    }

    #[test]
    fn test_non_string_config_value_is_an_error() {
        let doc: KdlDocument = "placeholder 5".parse().expect("valid kdl");
        let err = kdl_string(&doc, "placeholder").expect_err("number is rejected");
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "placeholder"));
        assert!(config_from_kdl(&doc).is_err());
        assert_eq!(kdl_string(&doc, "default-direction").expect("absent"), None);
    }

    #[test]
    fn test_render_blocks() {
        let mut session: EditorSession<HeadlessSurface> =
            EditorSession::new(EditorConfig::new().with_default_direction(Direction::Ltr));
        session.set_content("# Title\nשלום\n*em*");
        session.attach(HeadlessSurface::new());
        session.set_selection_range(0, 0);
        session.on_selection_change();
        insta::assert_snapshot!(render_blocks(&session), @r#"
          0 raw      ltr "# Title"
          1 rendered rtl "שלום"
          2 rendered ltr "*em*"
        selection 0..0
        "#);
    }
}
