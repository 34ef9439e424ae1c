use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use colored::Colorize;

use kakao_client::{FileTokenStore, NotificationOutcome, Notifier, TokenIssuer, TokenRefresher};
use notify_core::Config;
use site_check::SiteChecker;

#[derive(Parser)]
#[command(name = "check-cli")]
#[command(about = "Site availability check with KakaoTalk notification")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive authorization flow and persist the token record
    Authorize,
    /// Send a single text message to yourself
    Send {
        /// Message content
        text: String,
    },
    /// Probe the configured URLs; the exit code reflects the verdict
    Check {
        /// Send the summary as a KakaoTalk message afterwards
        #[arg(long)]
        notify: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cli = Cli::parse();
    let config = Config::new();

    match run(cli.command, config).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            std::process::exit(1);
        }
    }
}

async fn run(command: Commands, config: Config) -> anyhow::Result<i32> {
    match command {
        Commands::Authorize => authorize(&config).await,
        Commands::Send { text } => {
            let outcome = build_notifier(&config)?.send(&text).await;
            print_outcome(&outcome);
            Ok(if outcome.delivered { 0 } else { 1 })
        }
        Commands::Check { notify } => check(&config, notify).await,
    }
}

async fn authorize(config: &Config) -> anyhow::Result<i32> {
    let client = kakao_client::http::build_retry_client()?;
    let store = Arc::new(FileTokenStore::new(config.token_path.clone()));
    let api_key = require_api_key(config)?;
    let issuer = TokenIssuer::new(client, store.clone(), api_key, config);

    println!("Open this URL in a browser, log in, and approve:");
    println!("{}", issuer.login_url().cyan());
    println!("You will land on an unreachable localhost page; copy its full URL.");
    print!("Paste the redirect URL here: ");
    io::stdout().flush()?;

    let mut redirect_url = String::new();
    io::stdin().lock().read_line(&mut redirect_url)?;

    let record = issuer.issue(redirect_url.trim()).await?;
    println!(
        "{} token record saved to {}",
        "ok:".green().bold(),
        store.path().display()
    );
    if record.refresh_token().is_none() {
        println!(
            "{} provider returned no refresh token; expiry will require re-authorization",
            "warning:".yellow().bold()
        );
    }
    Ok(0)
}

async fn check(config: &Config, notify: bool) -> anyhow::Result<i32> {
    let client = kakao_client::http::build_retry_client()?;
    let checker = SiteChecker::new(client);
    let report = checker.run(&config.check_urls).await;

    let summary = report.summary();
    if report.success {
        println!("{}", summary.as_str().green());
    } else {
        println!("{}", summary.as_str().red());
    }

    if notify {
        // Delivery failure is reported but never changes the exit code; the
        // verdict below is the only thing the invoking pipeline keys on.
        match build_notifier(config) {
            Ok(notifier) => print_outcome(&notifier.send(&summary).await),
            Err(e) => println!(
                "{} notification skipped: {e:#}",
                "warning:".yellow().bold()
            ),
        }
    }

    Ok(if report.success { 0 } else { 1 })
}

fn build_notifier(config: &Config) -> anyhow::Result<Notifier> {
    let client = kakao_client::http::build_retry_client()?;
    let store = Arc::new(FileTokenStore::new(config.token_path.clone()));
    let api_key = require_api_key(config)?;
    let refresher = TokenRefresher::new(Arc::clone(&client), store.clone(), api_key, config);
    Ok(Notifier::new(client, store, refresher, config))
}

fn require_api_key(config: &Config) -> anyhow::Result<String> {
    config
        .require_api_key()
        .map(str::to_string)
        .map_err(|e| anyhow!(e))
}

fn print_outcome(outcome: &NotificationOutcome) {
    match (&outcome.final_error, outcome.retried) {
        (None, false) => println!("{} notification delivered", "ok:".green().bold()),
        (None, true) => println!(
            "{} notification delivered after token refresh",
            "ok:".green().bold()
        ),
        (Some(e), _) => println!(
            "{} notification not delivered: {e}",
            "warning:".yellow().bold()
        ),
    }
}
