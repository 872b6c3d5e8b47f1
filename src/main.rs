use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use indicatif::ProgressBar;
use miette::{Context, IntoDiagnostic, Result};

use vigil_core::{AnchorMode, OutputFormat, Strategy, VigilConfig};
use vigil_review::analyze::Analyzer;
use vigil_review::event::pr_number_from_event;
use vigil_review::github::{parse_repo_slug, GitHubClient};
use vigil_review::pipeline::Pipeline;

#[derive(Parser)]
#[command(
    name = "vigil",
    version,
    about = "Pull request review bot",
    long_about = "Vigil fetches the files changed by a GitHub pull request, runs an analyzer\n\
                   over each one, and posts review comments back to the PR.\n\n\
                   Examples:\n  \
                     vigil review --repo owner/name --pr 42       Review a PR with the heuristic\n  \
                     vigil review --strategy generative --pr 42   Review with a chat model\n  \
                     vigil review --pr 42 --dry-run               Print findings, post nothing\n  \
                     vigil init                                   Create a .vigil.toml config file\n  \
                     vigil doctor                                 Check setup and environment"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .vigil.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable summary (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Review a pull request and post comments
    #[command(long_about = "Review a pull request and post comments.\n\n\
        Lists the PR's changed files, analyzes each one with the configured strategy,\n\
        and posts one comment per finding (or a single batched review with --batch).\n\
        Requires GITHUB_TOKEN. The PR number can come from --pr, the PR_NUMBER env\n\
        var, or a webhook event payload at GITHUB_EVENT_PATH.\n\n\
        Examples:\n  vigil review --repo owner/name --pr 42\n  \
        vigil review --pr 42 --strategy classifier --anchor position\n  \
        PR_NUMBER=42 vigil review --dry-run")]
    Review {
        /// Pull request number (falls back to PR_NUMBER, then GITHUB_EVENT_PATH)
        #[arg(long)]
        pr: Option<u64>,
        /// Repository (format: owner/name; falls back to config, then GITHUB_REPOSITORY)
        #[arg(long)]
        repo: Option<String>,
        /// Analysis strategy: heuristic, classifier, or generative
        #[arg(long)]
        strategy: Option<Strategy>,
        /// Comment anchoring: line or position
        #[arg(
            long,
            long_help = "Comment anchoring convention.\n\nGitHub accepts either an absolute \
                file line with a side, or a diff-relative\nposition; the two are mutually \
                exclusive, so pick the one your workflow\nexpects: line (default) or position."
        )]
        anchor: Option<AnchorMode>,
        /// Post all findings as one review submission instead of per-comment calls
        #[arg(long)]
        batch: bool,
        /// Fetch and decode full file blobs instead of analyzing patches
        #[arg(long)]
        fetch_contents: bool,
        /// Print findings without posting anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Create a default .vigil.toml configuration file
    #[command(long_about = "Create a default .vigil.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .vigil.toml already exists.")]
    Init,
    /// Check your Vigil setup and environment
    #[command(long_about = "Check your Vigil setup and environment.\n\n\
        Runs diagnostics for the config file, GitHub token, model API key,\n\
        repository resolution, and PR number sources. Use --format json for\n\
        machine-readable output.")]
    Doctor,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1mvigil\x1b[0m v{version} — pull request review bot\n");
        println!("Quick start:");
        println!("  \x1b[36mvigil init\x1b[0m                         Create a .vigil.toml config file");
        println!("  \x1b[36mvigil review --repo o/r --pr 42\x1b[0m    Review a pull request\n");
        println!("All commands:");
        println!("  \x1b[32mreview\x1b[0m   Analyze a PR's changed files and post comments");
        println!("  \x1b[32mdoctor\x1b[0m   Check your setup and environment");
        println!("  \x1b[32minit\x1b[0m     Create default configuration\n");
    } else {
        println!("vigil v{version} — pull request review bot\n");
        println!("Quick start:");
        println!("  vigil init                         Create a .vigil.toml config file");
        println!("  vigil review --repo o/r --pr 42    Review a pull request\n");
        println!("All commands:");
        println!("  review   Analyze a PR's changed files and post comments");
        println!("  doctor   Check your setup and environment");
        println!("  init     Create default configuration\n");
    }

    println!("Run 'vigil <command> --help' for details.");
}

fn model_api_key_from_env() -> Option<String> {
    std::env::var("MODEL_API_KEY")
        .or_else(|_| std::env::var("OPENAI_API_KEY"))
        .ok()
}

fn resolve_repo(flag: &Option<String>, config: &VigilConfig) -> Result<(String, String)> {
    if let Some(slug) = flag {
        return parse_repo_slug(slug).into_diagnostic();
    }
    if let (Some(owner), Some(repo)) = (&config.github.owner, &config.github.repo) {
        return Ok((owner.clone(), repo.clone()));
    }
    if let Ok(slug) = std::env::var("GITHUB_REPOSITORY") {
        return parse_repo_slug(&slug).into_diagnostic();
    }
    miette::bail!(
        "no repository configured. Pass --repo owner/name, set [github] owner/repo \
         in .vigil.toml, or set GITHUB_REPOSITORY"
    );
}

fn resolve_pr_number(flag: Option<u64>) -> Result<u64> {
    if let Some(number) = flag {
        return Ok(number);
    }
    if let Ok(raw) = std::env::var("PR_NUMBER") {
        return raw
            .parse()
            .into_diagnostic()
            .wrap_err(format!("invalid PR_NUMBER '{raw}'"));
    }
    if let Ok(event_path) = std::env::var("GITHUB_EVENT_PATH") {
        return pr_number_from_event(Path::new(&event_path))
            .into_diagnostic()
            .wrap_err(format!("reading event payload {event_path}"));
    }
    miette::bail!(
        "no pull request number. Pass --pr, set PR_NUMBER, or run from a workflow \
         with GITHUB_EVENT_PATH"
    );
}

#[allow(clippy::too_many_arguments)]
async fn run_review(
    mut config: VigilConfig,
    format: OutputFormat,
    verbose: bool,
    pr: Option<u64>,
    repo: &Option<String>,
    strategy: Option<Strategy>,
    anchor: Option<AnchorMode>,
    batch: bool,
    fetch_contents: bool,
    dry_run: bool,
) -> Result<()> {
    if let Some(s) = strategy {
        config.review.strategy = s;
    }
    if let Some(a) = anchor {
        config.review.anchor = a;
    }
    if batch {
        config.review.batch = true;
    }
    if fetch_contents {
        config.review.fetch_contents = true;
    }
    if config.model.api_key.is_none() {
        config.model.api_key = model_api_key_from_env();
    }

    let (owner, repo) = resolve_repo(repo, &config)?;
    let pr_number = resolve_pr_number(pr)?;

    // Credential check happens here, before any network call
    let github = GitHubClient::new(&config.github.api_base, config.github.token.as_deref())
        .into_diagnostic()?;
    let analyzer =
        Analyzer::from_strategy(config.review.strategy, &config.model).into_diagnostic()?;

    if verbose {
        eprintln!(
            "reviewing {owner}/{repo}#{pr_number} with the {} strategy ({} anchoring)",
            config.review.strategy, config.review.anchor,
        );
    }

    let mut pipeline = Pipeline::new(github, analyzer, config.review.clone());
    if dry_run {
        pipeline = pipeline.dry_run();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Reviewing {owner}/{repo}#{pr_number}"));
    spinner.enable_steady_tick(Duration::from_millis(120));
    let report = pipeline.run(&owner, &repo, pr_number).await;
    spinner.finish_and_clear();
    let report = report.into_diagnostic()?;

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).into_diagnostic()?
            );
        }
        OutputFormat::Markdown => print!("{}", report.to_markdown()),
        OutputFormat::Text => print!("{report}"),
    }

    Ok(())
}

#[derive(serde::Serialize)]
struct CheckResult {
    name: &'static str,
    status: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "pass",
            detail: detail.into(),
            hint: None,
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name,
            status: "fail",
            detail: detail.into(),
            hint: Some(hint.into()),
        }
    }

    fn info(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "info",
            detail: detail.into(),
            hint: None,
        }
    }

    fn symbol(&self) -> &'static str {
        match self.status {
            "pass" => "\u{2713}",
            "fail" => "\u{2717}",
            _ => "~",
        }
    }

    fn colored_symbol(&self) -> String {
        match self.status {
            "pass" => "\x1b[32m\u{2713}\x1b[0m".into(),
            "fail" => "\x1b[31m\u{2717}\x1b[0m".into(),
            _ => "\x1b[33m~\x1b[0m".into(),
        }
    }
}

fn run_doctor(config: &VigilConfig, format: OutputFormat, use_color: bool) -> Result<()> {
    let mut checks: Vec<CheckResult> = Vec::new();

    // 1. Config file
    if Path::new(".vigil.toml").exists() {
        checks.push(CheckResult::pass("config_file", ".vigil.toml found"));
    } else {
        checks.push(CheckResult::fail(
            "config_file",
            ".vigil.toml not found",
            "run 'vigil init' to create a default config",
        ));
    }

    // 2. GitHub token
    if config.github.token.is_some() || std::env::var("GITHUB_TOKEN").is_ok() {
        checks.push(CheckResult::pass("github_token", "GITHUB_TOKEN set"));
    } else {
        checks.push(CheckResult::fail(
            "github_token",
            "GITHUB_TOKEN not set",
            "export GITHUB_TOKEN=... (required for every review run)",
        ));
    }

    // 3. Model API key (only needed by the model-backed strategies)
    let has_model_key = config.model.api_key.is_some() || model_api_key_from_env().is_some();
    if config.review.strategy == Strategy::Heuristic {
        checks.push(CheckResult::info(
            "model_api_key",
            "not needed for the heuristic strategy",
        ));
    } else if has_model_key {
        checks.push(CheckResult::pass("model_api_key", "MODEL_API_KEY set"));
    } else {
        checks.push(CheckResult::fail(
            "model_api_key",
            "MODEL_API_KEY not set",
            format!(
                "export MODEL_API_KEY=... (required for the {} strategy)",
                config.review.strategy
            ),
        ));
    }

    // 4. Repository resolution
    match resolve_repo(&None, config) {
        Ok((owner, repo)) => {
            checks.push(CheckResult::pass("repository", format!("{owner}/{repo}")));
        }
        Err(_) => checks.push(CheckResult::fail(
            "repository",
            "not configured",
            "set [github] owner/repo in .vigil.toml or export GITHUB_REPOSITORY",
        )),
    }

    // 5. PR number sources
    if std::env::var("PR_NUMBER").is_ok() {
        checks.push(CheckResult::pass("pr_number", "PR_NUMBER set"));
    } else if let Ok(event_path) = std::env::var("GITHUB_EVENT_PATH") {
        match pr_number_from_event(Path::new(&event_path)) {
            Ok(number) => checks.push(CheckResult::pass(
                "pr_number",
                format!("#{number} from event payload"),
            )),
            Err(e) => checks.push(CheckResult::fail(
                "pr_number",
                format!("event payload unusable: {e}"),
                "pass --pr or set PR_NUMBER",
            )),
        }
    } else {
        checks.push(CheckResult::info(
            "pr_number",
            "no PR_NUMBER or GITHUB_EVENT_PATH (pass --pr at run time)",
        ));
    }

    match format {
        OutputFormat::Json => {
            let version = env!("CARGO_PKG_VERSION");
            let json = serde_json::json!({
                "version": version,
                "checks": checks,
            });
            println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        }
        _ => {
            let version = env!("CARGO_PKG_VERSION");
            println!("Vigil v{version} — Environment Check\n");

            for check in &checks {
                let sym = if use_color {
                    check.colored_symbol()
                } else {
                    check.symbol().to_string()
                };
                let label = check.name.replace('_', " ");
                println!("  {sym} {label:<16} {}", check.detail);
                if let Some(hint) = &check.hint {
                    println!("    hint: {hint}");
                }
            }

            let passed = checks.iter().filter(|c| c.status == "pass").count();
            let failed = checks.iter().filter(|c| c.status == "fail").count();
            let info = checks.iter().filter(|c| c.status == "info").count();
            println!("\n{passed} checks passed, {failed} failed, {info} info");
        }
    }

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# Vigil Configuration

[github]
# api_base = "https://api.github.com"
# owner = "octocat"
# repo = "hello-world"
# Prefer the GITHUB_TOKEN env var over storing a token here
# token = "ghp_..."

[model]
# Endpoint for the classifier and generative strategies
# base_url = "https://api.openai.com"
# model = "gpt-4o-mini"
# max_input_chars = 4000

[review]
# strategy = "heuristic"    # heuristic | classifier | generative
# anchor = "line"           # line | position
# extensions = ["py", "rs"]
# fetch_contents = false
# batch = false
"#;

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => VigilConfig::from_file(path).into_diagnostic()?,
        None => {
            let default_path = Path::new(".vigil.toml");
            if default_path.exists() {
                VigilConfig::from_file(default_path).into_diagnostic()?
            } else {
                VigilConfig::default()
            }
        }
    };

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    if cli.verbose {
        eprintln!("format: {}", cli.format);
    }

    match cli.command {
        None => {
            print_welcome(use_color);
        }
        Some(Command::Review {
            pr,
            ref repo,
            strategy,
            anchor,
            batch,
            fetch_contents,
            dry_run,
        }) => {
            run_review(
                config,
                cli.format,
                cli.verbose,
                pr,
                repo,
                strategy,
                anchor,
                batch,
                fetch_contents,
                dry_run,
            )
            .await?;
        }
        Some(Command::Init) => {
            let path = Path::new(".vigil.toml");
            if path.exists() {
                miette::bail!(".vigil.toml already exists; delete it first to regenerate");
            }
            std::fs::write(path, DEFAULT_CONFIG)
                .into_diagnostic()
                .wrap_err("writing .vigil.toml")?;
            println!("Created .vigil.toml");
        }
        Some(Command::Doctor) => {
            run_doctor(&config, cli.format, use_color)?;
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
        }
    }

    Ok(())
}
