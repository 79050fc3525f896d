use clap::{Parser, Subcommand};
use rock_git::api::{Bridge, Request};
use rock_git::config::{Config, ConfigError};
use rock_git::{AppResult, GitApi, JsonDocumentStore, RepositoryCoordinator, logging};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::BufReader;

#[derive(Debug, Parser)]
#[command(name = "rock-git", version, about = "Status, history and sync for local git repositories")]
struct Cli {
    /// Config file [default: ~/.config/rock/config.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data file, overrides [data].path
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check that a path is inside a git working tree
    Verify { path: PathBuf },
    /// Branch, ahead/behind and changed files
    Status { path: PathBuf },
    /// Recent commits, newest first
    Log {
        path: PathBuf,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Local and remote-tracking branches
    Branches { path: PathBuf },
    /// Checked-out branch name (empty when detached)
    CurrentBranch { path: PathBuf },
    /// Stage the given files (if any) and commit
    Commit {
        path: PathBuf,
        #[arg(short, long)]
        message: String,
        files: Vec<String>,
    },
    Push { path: PathBuf },
    Pull { path: PathBuf },
    Fetch { path: PathBuf },
    /// Check out an existing branch
    SwitchBranch { path: PathBuf, branch: String },
    /// Create a branch and check it out
    CreateBranch { path: PathBuf, branch: String },
    /// Clone a repository into a new directory
    Clone { url: String, destination: PathBuf },
    /// URL of the origin remote (empty if there is none)
    RemoteUrl { path: PathBuf },
    /// Manage tracked repositories
    Repos {
        #[command(subcommand)]
        command: RepoCommands,
    },
    /// Answer JSON requests on stdin, one per line
    Serve,
    /// Write a config file with default values
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Subcommand)]
enum RepoCommands {
    /// Show tracked repositories
    List,
    /// Track the working tree at PATH
    Add { path: PathBuf },
    /// Stop tracking a repository
    Remove { id: String },
    /// Status of every tracked repository
    Refresh,
    /// Fetch every tracked repository
    Fetch,
}

impl Commands {
    fn into_request(self) -> Option<Request> {
        let request = match self {
            Commands::Verify { path } => Request::VerifyRepo { repo_path: path },
            Commands::Status { path } => Request::Status { repo_path: path },
            Commands::Log { path, limit } => Request::Log {
                repo_path: path,
                limit,
            },
            Commands::Branches { path } => Request::Branches { repo_path: path },
            Commands::CurrentBranch { path } => Request::CurrentBranch { repo_path: path },
            Commands::Commit {
                path,
                message,
                files,
            } => Request::Commit {
                repo_path: path,
                message,
                files,
            },
            Commands::Push { path } => Request::Push { repo_path: path },
            Commands::Pull { path } => Request::Pull { repo_path: path },
            Commands::Fetch { path } => Request::Fetch { repo_path: path },
            Commands::SwitchBranch { path, branch } => Request::SwitchBranch {
                repo_path: path,
                branch,
            },
            Commands::CreateBranch { path, branch } => Request::CreateBranch {
                repo_path: path,
                branch_name: branch,
            },
            Commands::Clone { url, destination } => Request::CloneRepository {
                url,
                destination_path: destination,
            },
            Commands::RemoteUrl { path } => Request::RemoteUrl { repo_path: path },
            Commands::Repos { .. } | Commands::Serve | Commands::InitConfig { .. } => {
                return None;
            }
        };
        Some(request)
    }
}

fn load_config(path: Option<&PathBuf>) -> AppResult<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => match Config::load() {
            Ok(config) => config,
            Err(ConfigError::DirectoryNotFound) => Config::default_config(),
            Err(e) => return Err(e.into()),
        },
    };
    Ok(config)
}

fn init_config(path: Option<&PathBuf>, force: bool) -> AppResult<()> {
    let target = match path {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };

    if target.exists() && !force {
        eprintln!("{} already exists (use --force to overwrite)", target.display());
        return Ok(());
    }

    let config = Config::default_config();
    match path {
        Some(path) => config.save_to(path)?,
        None => config.save()?,
    }
    println!("Wrote {}", target.display());
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_repos(
    command: RepoCommands,
    coordinator: RepositoryCoordinator,
    store: &JsonDocumentStore,
) -> AppResult<()> {
    match command {
        RepoCommands::List => print_json(&store.list_repositories().await),
        RepoCommands::Add { path } => {
            let path = std::path::absolute(&path)?;
            let repo = coordinator.register(&path).await?;
            if !store.add_repository(repo.clone()).await? {
                eprintln!("Already tracking {}", path.display());
                return Ok(());
            }
            print_json(&repo)
        }
        RepoCommands::Remove { id } => {
            if !store.remove_repository(&id).await? {
                eprintln!("No tracked repository with id {}", id);
            }
            Ok(())
        }
        RepoCommands::Refresh => {
            let repos = store.list_repositories().await;
            print_json(&coordinator.refresh_all(&repos).await)
        }
        RepoCommands::Fetch => {
            let repos = store.list_repositories().await;
            let fetched = coordinator.fetch_all(&repos).await;
            store.record_fetched(&fetched).await?;
            print_json(&fetched)
        }
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    if let Commands::InitConfig { force } = cli.command {
        return init_config(cli.config.as_ref(), force);
    }

    let config = load_config(cli.config.as_ref())?;
    logging::init(&config.logging.level);

    let git = GitApi::new(Arc::new(config.executor())).with_log_limit(config.git.log_limit);
    let data_path = match cli.data {
        Some(path) => path,
        None => config.data_path()?,
    };
    let store = Arc::new(JsonDocumentStore::new(data_path));

    match cli.command {
        Commands::Serve => {
            let bridge = Bridge::new(git, store);
            bridge
                .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
                .await
        }
        Commands::Repos { command } => {
            run_repos(command, RepositoryCoordinator::new(git), &store).await
        }
        command => {
            let Some(request) = command.into_request() else {
                return Ok(());
            };
            let value = Bridge::new(git, store).handle(request).await?;
            if value.is_null() {
                return Ok(());
            }
            print_json(&value)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
