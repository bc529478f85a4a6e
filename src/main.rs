use gitpipe::config::Config;
use gitpipe::git::{Repository, parse_path};
use std::path::PathBuf;
use std::process;

#[tokio::main]
async fn main() {
    let Some(file) = std::env::args_os().nth(1).map(PathBuf::from) else {
        eprintln!("Usage: gitpipe <file>");
        process::exit(2);
    };

    let config = match Config::load_or_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let executor = match config.executor() {
        Ok(executor) => executor,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let file = std::path::absolute(&file).unwrap_or(file);
    let (root, inner_path) = match parse_path(&file) {
        Ok(split) => split,
        Err(e) => {
            eprintln!("Error: {}: {}", file.display(), e);
            process::exit(1);
        }
    };

    let repo = Repository::with_executor(&root, executor);

    if let Err(e) = repo.version_check(config.min_version()).run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    let inner = inner_path.to_string_lossy();
    let file_filter = (!inner.is_empty()).then_some(&*inner);
    let mut log = repo.log(file_filter);
    let mut branches = repo.branches();
    let (commits, branch_list) = tokio::join!(log.run(), branches.run());

    let mut failed = false;

    println!("History of {}:", file.display());
    match commits {
        Ok(commits) => {
            for commit in &commits {
                println!("  {} -- {}", commit.short_hash(), commit.summary());
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            failed = true;
        }
    }

    println!("Branches:");
    match branch_list {
        Ok(list) => {
            for branch in &list.branches {
                let marker = if branch.is_current { '*' } else { ' ' };
                println!("  {} {}", marker, branch.name);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            failed = true;
        }
    }

    if failed {
        process::exit(1);
    }
}
