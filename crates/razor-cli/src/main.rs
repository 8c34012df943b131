use clap::{Args, Parser, Subcommand};
use razor_parser::{Document, Node, ParseOptions, DEFAULT_MAX_DEPTH};
use std::path::Path;
use std::str::FromStr;

mod logging;

use logging::{init_logging, LogLevel, LOG_ENV};

#[derive(Parser)]
#[command(name = "razor")]
#[command(about = "Inspect the document tree of a Razor template")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error) [default: warn]
    #[arg(long, global = true, env = LOG_ENV, value_parser = LogLevel::from_str)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the document tree of a template
    Tree {
        /// Input template file
        path: String,

        #[command(flatten)]
        limits: Limits,
    },

    /// Check a template for syntax errors without printing it
    Check {
        /// Input template file
        path: String,

        #[command(flatten)]
        limits: Limits,
    },

    /// Print the `@` expressions found in one HTML tag
    Attrs {
        /// Tag text, e.g. '<a href="@url">'
        tag: String,
    },
}

#[derive(Args)]
struct Limits {
    /// Maximum nesting depth before parsing gives up
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Treat elements left open at end of input as errors
    #[arg(long)]
    strict: bool,
}

impl Limits {
    fn options(&self) -> ParseOptions {
        let options = ParseOptions::default().with_max_depth(self.max_depth);
        if self.strict {
            options.strict()
        } else {
            options
        }
    }
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.log_level.unwrap_or_default());

    match cli.command {
        Command::Tree { path, limits } => cmd_tree(&path, &limits),
        Command::Check { path, limits } => cmd_check(&path, &limits),
        Command::Attrs { tag } => cmd_attrs(&tag),
    }
}

fn read_source(path: &str) -> String {
    let p = Path::new(path);
    if !p.exists() {
        eprintln!("Error: file not found: {path}");
        std::process::exit(1);
    }
    match std::fs::read_to_string(p) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading {path}: {e}");
            std::process::exit(1);
        }
    }
}

fn parse_file(path: &str, limits: &Limits) -> Document {
    let source = read_source(path);
    tracing::info!(path, chars = source.chars().count(), "parsing template");

    match razor_parser::parse_with_options(&source, limits.options()) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("{path}: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_tree(path: &str, limits: &Limits) {
    let doc = parse_file(path, limits);
    print!("{}", render(&doc));
}

fn cmd_check(path: &str, limits: &Limits) {
    parse_file(path, limits);
    eprintln!("OK: {path}");
}

fn cmd_attrs(tag: &str) {
    match razor_parser::extract_attribute_expressions(tag) {
        Ok(expressions) => {
            for expr in expressions {
                println!("{expr}");
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

/// Depth-first dump: `Kind begin`, each child fenced by ` ___ ` lines,
/// then `Kind end`.
fn render(doc: &Document) -> String {
    let mut out = String::new();
    for node in &doc.nodes {
        render_node(node, &mut out);
    }
    out
}

fn render_node(node: &Node, out: &mut String) {
    out.push_str(&format!("{} {}\n", node.kind, node.begin));
    for child in &node.children {
        out.push_str(" ___ \n");
        render_node(child, out);
        out.push_str(" ___ \n");
    }
    out.push_str(&format!("{} {}\n", node.kind, node.end.as_deref().unwrap_or("")));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_leaf() {
        let doc = razor_parser::parse("@x").unwrap();
        assert_eq!(render(&doc), "Razor x\nRazor \n");
    }

    #[test]
    fn test_render_nested() {
        let doc = razor_parser::parse("<a>hi</a>").unwrap();
        assert_eq!(
            render(&doc),
            "Html <a>\n ___ \nText hi\nText \n ___ \nHtml </a>\n"
        );
    }

    #[test]
    fn test_limits_to_options() {
        let limits = Limits {
            max_depth: 8,
            strict: true,
        };
        let options = limits.options();
        assert_eq!(options.max_depth, 8);
        assert!(!options.allow_unclosed_elements);
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_tree_flags() {
        let cli = Cli::try_parse_from([
            "razor",
            "tree",
            "page.cshtml",
            "--strict",
            "--max-depth",
            "9",
        ])
        .unwrap();
        match cli.command {
            Command::Tree { path, limits } => {
                assert_eq!(path, "page.cshtml");
                assert!(limits.strict);
                assert_eq!(limits.max_depth, 9);
            }
            _ => panic!("Expected tree command"),
        }
    }

    #[test]
    fn test_cli_parses_log_level() {
        let cli = Cli::try_parse_from(["razor", "check", "page.cshtml", "--log-level", "DEBUG"])
            .unwrap();
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
    }

    #[test]
    fn test_cli_rejects_unknown_log_level() {
        let err = Cli::try_parse_from(["razor", "--log-level", "loud", "attrs", "<a>"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        assert!(err.to_string().contains("unknown log level 'loud'"));
    }
}
