//! yag - command-line interface
//!
//! Parses arguments, maps them onto a `RepositoryConfig`, runs one verb and
//! renders the result. All repository behavior lives in the library.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use yag::repository::{Repository, RepositoryConfig, RepositoryStatus, StagedChange};

/// yag - a small content-addressed version control tool
#[derive(Parser)]
#[command(name = "yag")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Run as if started in this directory
    #[arg(short = 'C', global = true, value_name = "DIR", default_value = ".")]
    dir: PathBuf,

    /// Author recorded on new commits
    #[arg(long, global = true, env = "YAG_AUTHOR")]
    author: Option<String>,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty repository
    Init {
        /// Directory to initialize (default: -C directory)
        path: Option<PathBuf>,
    },
    /// Stage files or directories
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Record staged files as a new commit
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,
    },
    /// List branches, or create one at HEAD
    Branch {
        /// Name of the branch to create
        name: Option<String>,
    },
    /// Switch HEAD to a branch
    Checkout {
        branch: String,
        /// Also write the branch's files into the working directory
        #[arg(long)]
        materialize: bool,
    },
    /// Show staged, modified and untracked files
    Status,
    /// Remove paths from the staging index
    Restore {
        /// Unstage rather than touch the working copy
        #[arg(long)]
        staged: bool,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Show commit history from HEAD
    Log {
        /// Number of commits to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "yag=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn config_for(cli: &Cli, root: PathBuf) -> RepositoryConfig {
    let mut config = RepositoryConfig::new(root);
    if let Some(author) = &cli.author {
        config = config.author(author.clone());
    }
    config
}

/// only `restore --staged` is supported
fn check_restore_mode(staged: bool) -> Result<(), Box<dyn Error>> {
    if staged {
        Ok(())
    } else {
        Err("restoring working tree changes is not yet implemented".into())
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match &cli.command {
        Commands::Init { path } => {
            let root = match path {
                Some(path) => cli.dir.join(path),
                None => cli.dir.clone(),
            };
            let repo = Repository::init(config_for(&cli, root))?;
            println!(
                "Initialized empty yag repository in {}",
                repo.config().meta_path().display()
            );
        }
        Commands::Add { paths } => {
            let repo = Repository::open(config_for(&cli, cli.dir.clone()))?;
            for path in paths {
                for staged in repo.add(path)? {
                    println!("add '{}'", staged);
                }
            }
        }
        Commands::Commit { message } => {
            let repo = Repository::open(config_for(&cli, cli.dir.clone()))?;
            let id = repo.commit(message)?;
            let commit = repo.read_commit(id)?;
            let location = match repo.current_branch()? {
                Some(branch) => branch.to_string(),
                None => "detached HEAD".to_string(),
            };
            let root = if commit.parent().is_none() { " (root-commit)" } else { "" };
            println!("[{}{} {}] {}", location, root, id.short(), commit.summary());
        }
        Commands::Branch { name } => {
            let repo = Repository::open(config_for(&cli, cli.dir.clone()))?;
            match name {
                Some(name) => {
                    let at = repo.create_branch(name)?;
                    println!("Created branch '{}' at {}", name, at.short());
                }
                None => {
                    let current = repo.current_branch()?;
                    for branch in repo.list_branches()? {
                        let marker = if Some(&branch) == current.as_ref() { '*' } else { ' ' };
                        println!("{} {}", marker, branch);
                    }
                }
            }
        }
        Commands::Checkout { branch, materialize } => {
            let config = config_for(&cli, cli.dir.clone()).materialize_on_checkout(*materialize);
            let repo = Repository::open(config)?;
            repo.checkout(branch)?;
            println!("Switched to branch '{}'", branch);
        }
        Commands::Status => {
            let repo = Repository::open(config_for(&cli, cli.dir.clone()))?;
            let status = repo.status()?;
            match repo.current_branch()? {
                Some(branch) => println!("On branch {}", branch),
                None => match repo.head()? {
                    Some(id) => println!("HEAD detached at {}", id.short()),
                    None => println!("HEAD detached"),
                },
            }
            print_status(&status);
        }
        Commands::Restore { staged, paths } => {
            check_restore_mode(*staged)?;
            let repo = Repository::open(config_for(&cli, cli.dir.clone()))?;
            for path in paths {
                repo.unstage(path)?;
                println!("unstaged '{}'", path.display());
            }
        }
        Commands::Log { limit } => {
            let repo = Repository::open(config_for(&cli, cli.dir.clone()))?;
            for (i, info) in repo.log(*limit)?.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                println!("commit {}", info.id);
                println!("Author: {}", info.author);
                println!("Date:   {}", info.timestamp.to_rfc2822());
                println!();
                for line in info.message.lines() {
                    println!("    {}", line);
                }
            }
        }
    }
    Ok(())
}

fn print_status(status: &RepositoryStatus) {
    if status.is_clean() {
        println!("nothing to commit, working tree clean");
        return;
    }

    if !status.staged.is_empty() {
        println!();
        println!("Changes to be committed:");
        for (path, change) in &status.staged {
            let label = match change {
                StagedChange::New => "new file:",
                StagedChange::Modified => "modified:",
                StagedChange::Unchanged => "staged:",
            };
            println!("\t{:<12}{}", label, path);
        }
    }

    if !status.unstaged.is_empty() {
        println!();
        println!("Changes not staged for commit:");
        for (path, change) in &status.unstaged {
            println!("\t{:<12}{}", format!("{}:", change), path);
        }
    }

    if !status.untracked.is_empty() {
        println!();
        println!("Untracked files:");
        for path in &status.untracked {
            println!("\t{}", path);
        }
    }
}
