//! Command-line interface definitions for News Digest.
//!
//! Every option can also come from an environment variable, so the same
//! binary runs unchanged from cron, a container or a shell.

use crate::outputs::OutputOptions;
use crate::perspective::DEFAULT_MAX_ITEMS;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the News Digest application.
///
/// # Examples
///
/// ```sh
/// # One digest into ./archive, no counter perspectives
/// news_digest run --no-llm
///
/// # Custom tuning file and a "today" copy for a static site
/// news_digest --config digest.yaml run --today-news-path ./site/today.md
///
/// # HTTP API on port 8080
/// PORT=8080 news_digest serve
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML file with similarity threshold and quotas
    #[arg(short, long, global = true, env = "DIGEST_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Collect, rank and write one digest, then exit
    Run(RunArgs),
    /// Serve the latest digest and the archive over HTTP
    Serve(ServeArgs),
}

/// Where the renderings of a digest go.
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Directory for JSON snapshots, Markdown, email HTML and the feed
    #[arg(short, long, env = "ARCHIVE_DIR", default_value = "archive")]
    pub archive_dir: PathBuf,

    /// Extra copy of the Markdown digest, overwritten on every run
    #[arg(long, env = "TODAY_NEWS_PATH")]
    pub today_news_path: Option<PathBuf>,

    /// Target of the refresh button in the email body
    #[arg(long, env = "REFRESH_URL")]
    pub refresh_url: Option<String>,

    /// Public URL of the digest, used as the feed's channel link
    #[arg(long, env = "SITE_URL")]
    pub site_url: Option<String>,
}

impl OutputArgs {
    pub fn options(&self) -> OutputOptions<'_> {
        OutputOptions {
            archive_dir: &self.archive_dir,
            today_path: self.today_news_path.as_deref(),
            refresh_url: self.refresh_url.as_deref(),
            site_url: self.site_url.as_deref(),
        }
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub outputs: OutputArgs,

    /// Skip the counter-perspective pass
    #[arg(long, env = "NO_LLM")]
    pub no_llm: bool,

    /// awful_aj chat template used for counter perspectives
    #[arg(long, default_value = "counter_perspective")]
    pub template: String,

    /// Number of stories sent for counter perspectives
    #[arg(long, default_value_t = DEFAULT_MAX_ITEMS)]
    pub perspectives: usize,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub outputs: OutputArgs,

    /// Port to listen on (all interfaces)
    #[arg(short, long, env = "PORT", default_value_t = 3100)]
    pub port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_defaults() {
        let cli = Cli::parse_from(["news_digest", "run"]);

        assert_eq!(cli.config, None);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.outputs.archive_dir, PathBuf::from("archive"));
        assert!(!args.no_llm);
        assert_eq!(args.template, "counter_perspective");
        assert_eq!(args.perspectives, 3);
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::parse_from([
            "news_digest",
            "run",
            "-a",
            "/tmp/archive",
            "--today-news-path",
            "/tmp/today.md",
            "--no-llm",
            "--perspectives",
            "5",
            "--config",
            "digest.yaml",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("digest.yaml")));
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        let opts = args.outputs.options();
        assert_eq!(opts.archive_dir, std::path::Path::new("/tmp/archive"));
        assert_eq!(opts.today_path, Some(std::path::Path::new("/tmp/today.md")));
        assert!(args.no_llm);
        assert_eq!(args.perspectives, 5);
    }

    #[test]
    fn test_serve_port() {
        let cli = Cli::parse_from(["news_digest", "-c", "digest.yaml", "serve", "-p", "8080"]);

        assert_eq!(cli.config, Some(PathBuf::from("digest.yaml")));
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.port, 8080);
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["news_digest"]).is_err());
    }
}
