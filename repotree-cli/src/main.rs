mod args;

use std::fs::File;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::LevelFilter;
use repotree_lib::model::RepoRef;
use repotree_lib::redirect::BrowserRedirect;
use repotree_lib::redirect::LogRedirect;
use repotree_lib::redirect::LoginRedirect;
use repotree_lib::render::render_text;
use repotree_lib::DashboardClient;
use repotree_lib::RepoTree;
use simplelog::ColorChoice;
use simplelog::Config;
use simplelog::TermLogger;
use simplelog::TerminalMode;
use simplelog::WriteLogger;

use crate::args::Cli;
use crate::args::Command;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("Error: failed to initialize logger: {}", e);
        return ExitCode::FAILURE;
    }

    let client = build_client(&cli);
    let redirect: Arc<dyn LoginRedirect> = if cli.no_browser {
        Arc::new(LogRedirect)
    } else {
        Arc::new(BrowserRedirect)
    };

    let result = match cli.command {
        Command::Repos => list_repos(&client, redirect.as_ref()).await,
        Command::Tree { repo, expand } => show_tree(client, repo, &expand, redirect).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    match &cli.log_file {
        Some(path) => WriteLogger::init(level, Config::default(), File::create(path)?)?,
        None => TermLogger::init(
            level,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        )?,
    }
    Ok(())
}

fn build_client(cli: &Cli) -> DashboardClient {
    let mut builder = DashboardClient::builder()
        .url(&cli.url)
        .connect_timeout(Duration::from_secs(10));
    if let Some(session) = &cli.session {
        builder = builder.session_cookie(session);
    }
    if let Some(secs) = cli.timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build()
}

async fn list_repos(
    client: &DashboardClient,
    redirect: &dyn LoginRedirect,
) -> Result<(), repotree_lib::error::Error> {
    let repos = client.list_repositories().await.inspect_err(|e| {
        if let repotree_lib::error::Error::NotAuthenticated { login_url } = e {
            redirect.redirect(login_url);
        }
    })?;

    for repo in repos {
        let visibility = if repo.private { " (private)" } else { "" };
        match repo.description.as_deref().filter(|d| !d.is_empty()) {
            Some(description) => println!("{}{} - {}", repo.full_name, visibility, description),
            None => println!("{}{}", repo.full_name, visibility),
        }
    }
    Ok(())
}

async fn show_tree(
    client: DashboardClient,
    repo: RepoRef,
    expand: &[String],
    redirect: Arc<dyn LoginRedirect>,
) -> Result<(), repotree_lib::error::Error> {
    let tree = RepoTree::mount(Arc::new(client), repo, redirect).await?;

    for path in expand {
        open_path(&tree, path).await;
    }

    print!("{}", render_text(&tree.snapshot()));
    tree.unmount();
    Ok(())
}

/// Expands every ancestor of `path`, then `path` itself.
async fn open_path(tree: &RepoTree, path: &str) {
    let path = path.trim_matches('/');
    let mut end = 0;
    loop {
        end = path[end..].find('/').map_or(path.len(), |i| end + i);
        let prefix = &path[..end];

        let Some(node) = tree.node(prefix) else {
            log::warn!("{} not found in {}", prefix, tree.repo());
            return;
        };
        tree.expand(&node).await;

        if end == path.len() {
            return;
        }
        end += 1;
    }
}
