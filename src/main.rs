use std::io::IsTerminal;
use std::path::PathBuf;

use clap::Parser;
use miette::{Context, IntoDiagnostic, Result};

use kestrel_core::{parse_exclude_patterns, Credentials, RunConfig};
use kestrel_review::github::{self, GithubClient};
use kestrel_review::pipeline::ReviewPipeline;
use kestrel_review::provider::resolve_provider;
use kestrel_review::select::{select_files, SelectOptions};

#[derive(Parser)]
#[command(
    name = "kestrel",
    version,
    about = "AI code review for pull requests",
    long_about = "Kestrel reviews the files changed by a pull request with a language model\n\
                   and posts the findings as inline review comments.\n\n\
                   The target PR comes from --pr, or from the CI event context\n\
                   (GITHUB_REPOSITORY + GITHUB_EVENT_PATH) when running as a workflow step.\n\
                   Configuration layers: defaults < .kestrel.toml < INPUT_* env vars < flags.\n\n\
                   Examples:\n  \
                     kestrel --pr octocat/hello-world#42            Review a PR and post the result\n  \
                     kestrel --pr octocat/hello-world#42 --dry-run  Print the review without posting\n  \
                     kestrel --model claude-3-5-sonnet-latest       Review the PR from the CI event"
)]
struct Cli {
    /// Pull request to review (format: owner/repo#123)
    #[arg(
        long,
        long_help = "Pull request to review.\n\nFormat: owner/repo#123\nWhen omitted, the PR is taken from the CI event context:\nGITHUB_REPOSITORY and the payload at GITHUB_EVENT_PATH."
    )]
    pr: Option<String>,

    /// Model identifier (claude* routes to Anthropic, anything else to OpenAI)
    #[arg(long)]
    model: Option<String>,

    /// Maximum number of files to review
    #[arg(long)]
    max_files: Option<usize>,

    /// Comma-separated glob patterns to exclude (e.g. "*.lock,dist/**")
    #[arg(long)]
    exclude_patterns: Option<String>,

    /// Extra instructions appended to every review prompt
    #[arg(long)]
    custom_instructions: Option<String>,

    /// Path to configuration file (default: .kestrel.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the review instead of posting it
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

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

    let mut config = match &cli.config {
        Some(path) => RunConfig::from_file(path)?,
        None => {
            let default_path = std::path::Path::new(".kestrel.toml");
            if default_path.exists() {
                RunConfig::from_file(default_path)?
            } else {
                RunConfig::default()
            }
        }
    };
    config.apply_env()?;

    // CLI flags win over file and environment
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    if let Some(max_files) = cli.max_files {
        config.max_files = max_files;
    }
    if let Some(raw) = &cli.exclude_patterns {
        config.exclude_patterns = parse_exclude_patterns(raw);
    }
    if let Some(instructions) = &cli.custom_instructions {
        config.custom_instructions = Some(instructions.clone());
    }

    let target = match &cli.pr {
        Some(pr_ref) => Some(github::parse_pr_reference(pr_ref)?),
        None => pull_request_from_event()?,
    };
    let Some((owner, repo, pr_number)) = target else {
        eprintln!("Not a pull request event, skipping.");
        return Ok(());
    };

    // Credential checks happen before any network call
    let credentials = Credentials::from_env();
    let provider = resolve_provider(&config.model, &credentials).map_err(|e| {
        miette::miette!(
            help = "Set OPENAI_API_KEY (or ANTHROPIC_API_KEY for claude* models), \
                    or the INPUT_-prefixed variant in CI",
            "{e}"
        )
    })?;
    let Some(token) = credentials.github_token.as_deref() else {
        miette::bail!(miette::miette!(
            help = "Set GITHUB_TOKEN or INPUT_GITHUB_TOKEN",
            "No GitHub token configured"
        ));
    };
    let client = GithubClient::new(token)?;

    eprintln!(
        "Reviewing {owner}/{repo}#{pr_number} with {} ({})",
        config.model,
        provider.name(),
    );

    let raw_files = client.list_changed_files(&owner, &repo, pr_number).await?;
    let files = select_files(
        raw_files,
        &SelectOptions {
            max_files: config.max_files,
            exclude_patterns: config.exclude_patterns.clone(),
        },
    );

    if files.is_empty() {
        eprintln!("No reviewable files found.");
        return Ok(());
    }

    eprintln!("Reviewing {} file(s)...", files.len());
    if cli.verbose {
        for file in &files {
            eprintln!("  {} ({})", file.filename, file.status);
        }
    }

    let is_tty = std::io::stderr().is_terminal();
    let spinner = if is_tty {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})").unwrap(),
        );
        pb.set_message("Waiting for the model...");
        pb.enable_steady_tick(std::time::Duration::from_millis(120));
        Some(pb)
    } else {
        None
    };

    let pipeline = ReviewPipeline::new(
        provider,
        config.model.clone(),
        config.custom_instructions.clone().unwrap_or_default(),
    );
    let result = pipeline.review(&files).await.inspect_err(|_e| {
        if let Some(pb) = &spinner {
            pb.finish_with_message("Failed");
        }
    })?;

    if let Some(pb) = spinner {
        pb.finish_with_message("Done");
    }

    if cli.verbose {
        eprintln!("--- Review Stats ---");
        eprintln!(
            "Model: {} | Files reviewed: {} | Comments: {}",
            result.stats.model_used, result.stats.files_reviewed, result.stats.comments_total,
        );
        eprintln!("--------------------");
    }

    if cli.dry_run {
        print!("{result}");
        return Ok(());
    }

    let (verdict, summary) = github::decide_verdict(&result.comments);
    client
        .submit_review(&owner, &repo, pr_number, verdict, &summary, &result.comments)
        .await?;

    if result.comments.is_empty() {
        eprintln!("No issues found. LGTM!");
    } else {
        eprintln!(
            "Posted {} comment(s) to {owner}/{repo}#{pr_number}",
            result.comments.len(),
        );
    }

    Ok(())
}

/// Resolve the target PR from the CI event context.
///
/// Needs `GITHUB_REPOSITORY` and a payload file at `GITHUB_EVENT_PATH`;
/// returns `None` when either is absent or the payload is not a
/// pull-request event.
fn pull_request_from_event() -> Result<Option<(String, String, u64)>> {
    let Ok(repository) = std::env::var("GITHUB_REPOSITORY") else {
        return Ok(None);
    };
    let Ok(event_path) = std::env::var("GITHUB_EVENT_PATH") else {
        return Ok(None);
    };

    let Some((owner, repo)) = repository.split_once('/') else {
        miette::bail!("invalid GITHUB_REPOSITORY '{repository}', expected owner/repo");
    };

    let raw = std::fs::read_to_string(&event_path)
        .into_diagnostic()
        .wrap_err(format!("failed to read event payload at {event_path}"))?;
    let event: serde_json::Value = serde_json::from_str(&raw)
        .into_diagnostic()
        .wrap_err("event payload is not valid JSON")?;

    Ok(github::pull_request_number(&event).map(|n| (owner.to_string(), repo.to_string(), n)))
}
