use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use resyntax_core::{CaptureId, RegexOptions, RegexTree, parse};

#[derive(Parser)]
#[command(name = "resyntax")]
#[command(about = "Resyntax - A syntax analyzer for .NET-style regex patterns")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the syntax tree of a pattern
    Tree {
        /// The regex pattern
        pattern: String,
        #[command(flatten)]
        parse: ParseArgs,
    },
    /// Report the diagnostics of a pattern
    Check {
        /// The regex pattern
        pattern: String,
        #[command(flatten)]
        parse: ParseArgs,
    },
    /// List the capture groups a pattern defines
    Captures {
        /// The regex pattern
        pattern: String,
        #[command(flatten)]
        parse: ParseArgs,
    },
}

#[derive(Args)]
struct ParseArgs {
    /// Option letters in effect from the start (any of "imnsx")
    #[arg(short, long, default_value = "")]
    options: String,
    /// Use ECMAScript backreference and octal rules
    #[arg(long)]
    ecma: bool,
    /// Parse as a right-to-left pattern
    #[arg(long)]
    right_to_left: bool,
    /// Offset added to every reported position
    #[arg(long, default_value_t = 0)]
    base: usize,
}

impl ParseArgs {
    fn parse_pattern(&self, pattern: &str) -> RegexTree {
        let mut options = match RegexOptions::from_inline(&self.options) {
            Ok(options) => options,
            Err(e) => {
                eprintln!("{} {}", "Error:".red().bold(), e);
                std::process::exit(2);
            }
        };
        options.set(RegexOptions::ECMA_SCRIPT, self.ecma);
        options.set(RegexOptions::RIGHT_TO_LEFT, self.right_to_left);
        parse(pattern, self.base, options)
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Tree { pattern, parse } => cmd_tree(&parse.parse_pattern(&pattern)),
        Commands::Check { pattern, parse } => cmd_check(&parse.parse_pattern(&pattern)),
        Commands::Captures { pattern, parse } => cmd_captures(&parse.parse_pattern(&pattern)),
    }
}

fn cmd_tree(tree: &RegexTree) {
    println!("{}", "Syntax tree:".bold());
    println!("  Pattern: {}", tree.text.cyan());
    println!();
    print!("{}", tree.dump());
}

fn cmd_check(tree: &RegexTree) {
    println!("{}", "Checking pattern...".bold());
    println!("  Pattern: {}", tree.text.cyan());
    println!();

    if tree.diagnostics().is_empty() {
        println!("{}", "✓ No problems found".green().bold());
        return;
    }

    println!(
        "{} {}",
        "Found".bold(),
        format!("{} problem(s)", tree.diagnostics().len()).red()
    );
    println!();
    for (i, diagnostic) in tree.diagnostics().iter().enumerate() {
        println!(
            "  {}. {} at {} {}",
            i + 1,
            diagnostic.kind.to_string().red(),
            diagnostic.span,
            format!("{:?}", diagnostic.text).yellow()
        );
    }
    std::process::exit(1);
}

fn cmd_captures(tree: &RegexTree) {
    println!("{}", "Capture groups:".bold());
    println!("  Pattern: {}", tree.text.cyan());
    println!();

    for (id, entry) in tree.captures.entries() {
        let label = match &id {
            CaptureId::Number(n) => format!("Group {n}"),
            CaptureId::Name(name) => format!("Group '{}' ({})", name, entry.number),
        };
        println!("  {}: {} = {}", label, entry.span, entry.text.green());
    }
}
