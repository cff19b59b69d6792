// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `owb` — manual operation and smoke-testing CLI for the build
//! orchestration service. Reads and writes the same durable files the
//! runner and core operate on; there is no socket protocol to a daemon.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use owb_cli::color;
use owb_cli::env::CliEnv;
use owb_cli::table::{Column, Table};
use owb_core::{BuildId, BuildOptions, BuildRequest, ListBody, ListId, OutputImage, ProfileBody};
use owb_profile::{ListStore, ProfileStore};
use owb_storage::BuildRegistry;

#[derive(Parser)]
#[command(name = "owb", version, about = "OpenWrt build orchestration CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a new build request.
    Submit(SubmitArgs),
    /// List all build records.
    List,
    /// Show a single build's record.
    Show { build_id: String },
    /// Request cancellation of a queued or running build.
    Cancel { build_id: String },
    /// Delete a build's record and artifacts.
    Delete { build_id: String },
    /// List a finished build's artifacts.
    Artifacts { build_id: String },
    /// Download a build artifact to a local path.
    Download {
        build_id: String,
        artifact_id: String,
        #[arg(long, value_name = "PATH")]
        out: PathBuf,
    },
    /// Show a build's tailed stdout/stderr logs.
    Logs {
        build_id: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Profile collaborator management (for local seeding/testing).
    Profile(ProfileArgs),
    /// Package-list collaborator management (for local seeding/testing).
    Pkglist(PkglistArgs),
}

#[derive(clap::Args)]
struct SubmitArgs {
    profile_id: String,
    platform: String,
    target: String,
    subtarget: String,
    version: String,
    /// Output image kind; repeatable. Defaults to `sysupgrade`.
    #[arg(long = "image", value_name = "sysupgrade|factory")]
    images: Vec<String>,
    #[arg(long)]
    force: bool,
    #[arg(long)]
    debug: bool,
}

#[derive(clap::Args)]
struct ProfileArgs {
    #[command(subcommand)]
    command: ProfileCommand,
}

#[derive(Subcommand)]
enum ProfileCommand {
    List,
    Get { profile_id: String },
    Create {
        profile_id: String,
        #[arg(long = "list", value_name = "LIST_ID")]
        lists: Vec<String>,
        #[arg(long = "include", value_name = "PKG")]
        extra_include: Vec<String>,
        #[arg(long = "exclude", value_name = "PKG")]
        extra_exclude: Vec<String>,
        #[arg(long = "file", value_name = "REL_PATH")]
        files: Vec<String>,
        #[arg(long)]
        force: bool,
    },
    Delete { profile_id: String },
}

#[derive(clap::Args)]
struct PkglistArgs {
    #[command(subcommand)]
    command: PkglistCommand,
}

#[derive(Subcommand)]
enum PkglistCommand {
    List,
    Get { list_id: String },
    Create {
        list_id: String,
        #[arg(long = "include", value_name = "PKG")]
        include: Vec<String>,
        #[arg(long = "exclude", value_name = "PKG")]
        exclude: Vec<String>,
        #[arg(long)]
        force: bool,
    },
    Delete { list_id: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let env = CliEnv::load().context("loading OPENWRT_BUILDER_* environment")?;

    match cli.command {
        Commands::Submit(args) => submit(&env, args),
        Commands::List => list(&env),
        Commands::Show { build_id } => show(&env, &build_id),
        Commands::Cancel { build_id } => cancel(&env, &build_id),
        Commands::Delete { build_id } => delete(&env, &build_id),
        Commands::Artifacts { build_id } => artifacts(&env, &build_id),
        Commands::Download {
            build_id,
            artifact_id,
            out,
        } => download(&env, &build_id, &artifact_id, &out),
        Commands::Logs { build_id, limit } => logs(&env, &build_id, limit),
        Commands::Profile(args) => profile_command(&env, args.command),
        Commands::Pkglist(args) => pkglist_command(&env, args.command),
    }
}

fn registry(env: &CliEnv) -> BuildRegistry {
    BuildRegistry::new(&env.builds_dir, Arc::new(ProfileStore::new(&env.profiles_dir)))
}

fn parse_output_image(s: &str) -> Result<OutputImage> {
    match s {
        "sysupgrade" => Ok(OutputImage::Sysupgrade),
        "factory" => Ok(OutputImage::Factory),
        other => bail!("unknown output image: {other} (expected sysupgrade or factory)"),
    }
}

fn submit(env: &CliEnv, args: SubmitArgs) -> Result<()> {
    let reg = registry(env);
    let output_images = if args.images.is_empty() {
        vec![OutputImage::Sysupgrade]
    } else {
        args.images
            .iter()
            .map(|s| parse_output_image(s))
            .collect::<Result<Vec<_>>>()?
    };
    let request = BuildRequest {
        profile_id: args.profile_id,
        platform: args.platform,
        target: args.target,
        subtarget: args.subtarget,
        version: args.version,
        options: BuildOptions {
            force_rebuild: args.force,
            debug: args.debug,
            output_images,
        },
    };
    let (record, created) = reg.create_build(request)?;
    if created {
        println!("submitted {}", record.build_id);
    } else {
        println!("{}", color::muted(&format!("reused cached build {}", record.build_id)));
    }
    Ok(())
}

fn list(env: &CliEnv) -> Result<()> {
    let reg = registry(env);
    let builds = reg.list_builds()?;
    let mut table = Table::new(vec![
        Column::left("BUILD_ID"),
        Column::status("STATE"),
        Column::right("PROGRESS"),
        Column::left("PROFILE"),
        Column::muted("UPDATED_AT"),
    ]);
    for build in &builds {
        table.row(vec![
            build.build_id.to_string(),
            format!("{:?}", build.state).to_lowercase(),
            format!("{}%", build.progress),
            build.request.profile_id.clone(),
            build.updated_at.clone(),
        ]);
    }
    let mut stdout = std::io::stdout();
    table.render(&mut stdout);
    if builds.is_empty() {
        println!("{}", color::muted("no builds"));
    }
    Ok(())
}

fn show(env: &CliEnv, build_id: &str) -> Result<()> {
    let reg = registry(env);
    let build = reg.get_build(&BuildId::new(build_id))?;
    println!("{}", serde_json::to_string_pretty(&build)?);
    Ok(())
}

fn cancel(env: &CliEnv, build_id: &str) -> Result<()> {
    let reg = registry(env);
    let changed = reg.cancel_build(&BuildId::new(build_id))?;
    if changed {
        println!("cancel requested for {build_id}");
    } else {
        println!("{}", color::muted(&format!("{build_id} already terminal")));
    }
    Ok(())
}

fn delete(env: &CliEnv, build_id: &str) -> Result<()> {
    let reg = registry(env);
    reg.delete_build(&BuildId::new(build_id))?;
    println!("deleted {build_id}");
    Ok(())
}

fn artifacts(env: &CliEnv, build_id: &str) -> Result<()> {
    let reg = registry(env);
    let artifacts = reg.list_build_artifacts(&BuildId::new(build_id))?;
    let mut table = Table::new(vec![
        Column::left("ID"),
        Column::left("ROLE"),
        Column::right("SIZE"),
        Column::left("PATH"),
    ]);
    for artifact in &artifacts {
        table.row(vec![
            artifact.id.clone(),
            format!("{:?}", artifact.role).to_lowercase(),
            artifact.size.to_string(),
            artifact.path.clone(),
        ]);
    }
    let mut stdout = std::io::stdout();
    table.render(&mut stdout);
    Ok(())
}

fn download(env: &CliEnv, build_id: &str, artifact_id: &str, out: &std::path::Path) -> Result<()> {
    let reg = registry(env);
    let src = reg.get_build_download(&BuildId::new(build_id), artifact_id)?;
    std::fs::copy(&src, out).with_context(|| format!("copying {} to {}", src.display(), out.display()))?;
    println!("downloaded to {}", out.display());
    Ok(())
}

fn logs(env: &CliEnv, build_id: &str, limit: Option<usize>) -> Result<()> {
    let reg = registry(env);
    let view = reg.get_build_logs(&BuildId::new(build_id), limit)?;
    println!("--- stdout{} ---", if view.stdout_truncated { " (truncated)" } else { "" });
    println!("{}", view.stdout);
    println!("--- stderr{} ---", if view.stderr_truncated { " (truncated)" } else { "" });
    println!("{}", view.stderr);
    Ok(())
}

fn profile_command(env: &CliEnv, command: ProfileCommand) -> Result<()> {
    let store = ProfileStore::new(&env.profiles_dir);
    match command {
        ProfileCommand::List => {
            let profiles = store.list()?;
            let mut table = Table::new(vec![
                Column::left("PROFILE_ID"),
                Column::right("LISTS"),
                Column::muted("UPDATED_AT"),
            ]);
            for p in &profiles {
                table.row(vec![
                    p.profile_id.as_ref().map(|id| id.to_string()).unwrap_or_default(),
                    p.profile.lists.len().to_string(),
                    p.updated_at.clone().unwrap_or_default(),
                ]);
            }
            let mut stdout = std::io::stdout();
            table.render(&mut stdout);
        }
        ProfileCommand::Get { profile_id } => {
            let record = store.get(&profile_id)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        ProfileCommand::Create {
            profile_id,
            lists,
            extra_include,
            extra_exclude,
            files,
            force,
        } => {
            let body = ProfileBody {
                lists: lists.into_iter().map(ListId::new).collect(),
                extra_include,
                extra_exclude,
                files,
            };
            store.create(&profile_id, body, force)?;
            println!("created {profile_id}");
        }
        ProfileCommand::Delete { profile_id } => {
            store.delete(&profile_id)?;
            println!("deleted {profile_id}");
        }
    }
    Ok(())
}

fn pkglist_command(env: &CliEnv, command: PkglistCommand) -> Result<()> {
    let store = ListStore::new(&env.lists_dir);
    match command {
        PkglistCommand::List => {
            let lists = store.list()?;
            let mut table = Table::new(vec![
                Column::left("LIST_ID"),
                Column::right("INCLUDE"),
                Column::right("EXCLUDE"),
                Column::muted("UPDATED_AT"),
            ]);
            for l in &lists {
                table.row(vec![
                    l.list_id.as_ref().map(|id| id.to_string()).unwrap_or_default(),
                    l.list.include.len().to_string(),
                    l.list.exclude.len().to_string(),
                    l.updated_at.clone().unwrap_or_default(),
                ]);
            }
            let mut stdout = std::io::stdout();
            table.render(&mut stdout);
        }
        PkglistCommand::Get { list_id } => {
            let record = store.get(&list_id)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        PkglistCommand::Create {
            list_id,
            include,
            exclude,
            force,
        } => {
            let body = ListBody { include, exclude };
            store.create(&list_id, body, force)?;
            println!("created {list_id}");
        }
        PkglistCommand::Delete { list_id } => {
            store.delete(&list_id)?;
            println!("deleted {list_id}");
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
