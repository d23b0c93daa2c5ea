// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # chargemesh Node CLI
//!
//! Entry point for the `chargemesh-node` binary. Parses CLI arguments,
//! initializes logging and runs one subcommand:
//!
//! - `keygen`    generate a key pair
//! - `parse-key` canonicalize a public key in any supported format
//! - `derive`    rebuild a key pair from a private scalar
//! - `routes`    load a config file and dump or resolve its routes
//! - `version`   print build version information
//!
//! Results go to stdout as JSON; logs go to stderr.

mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;

use chargemesh_protocol::config::OverlayConfig;
use chargemesh_protocol::crypto::{KeyPair, ParseOptions, PublicKey};
use chargemesh_protocol::network::{NodeId, RoutingTable};

use cli::{ChargemeshCli, Commands};

fn main() -> Result<()> {
    let cli = ChargemeshCli::parse();
    logging::init_logging(logging::DEFAULT_FILTER, cli.log_format);

    let output = match cli.command {
        Commands::Keygen(args) => keygen(args)?,
        Commands::ParseKey(args) => parse_key(args)?,
        Commands::Derive(args) => derive(args)?,
        Commands::Routes(args) => routes(args)?,
        Commands::Version => {
            print_version();
            return Ok(());
        }
    };

    let rendered = serde_json::to_string_pretty(&output).context("failed to render output")?;
    println!("{}", rendered);
    Ok(())
}

fn keygen(args: cli::KeygenArgs) -> Result<Value> {
    let pair = KeyPair::generate(args.algorithm)
        .with_context(|| format!("cannot generate a {} key pair", args.algorithm))?
        .with_serialization(args.serialization)
        .with_encoding(args.encoding);

    tracing::info!(
        algorithm = %pair.algorithm(),
        serialization = %pair.serialization(),
        encoding = %pair.encoding(),
        "generated key pair"
    );
    Ok(pair.to_json())
}

fn parse_key(args: cli::ParseKeyArgs) -> Result<Value> {
    let options = ParseOptions {
        algorithm: args.algorithm,
        serialization: args.serialization,
        encoding: args.encoding,
        auto_detect_algorithm: args.auto_detect,
    };
    let key = PublicKey::try_parse(&args.key, options).context("failed to parse public key")?;

    match key.algorithm() {
        Some(alg) => {
            tracing::info!(algorithm = %alg, encoding = %key.encoding(), "parsed public key")
        }
        None => tracing::warn!(
            encoding = %key.encoding(),
            "key is not bound to a curve; pass --algorithm or --auto-detect"
        ),
    }
    Ok(key.to_json())
}

fn derive(args: cli::DeriveArgs) -> Result<Value> {
    let pair = KeyPair::try_parse_private_key(&args.private, args.algorithm, args.encoding)
        .context("failed to parse private key")?
        .with_serialization(args.serialization);

    tracing::info!(algorithm = %pair.algorithm(), "derived key pair");
    Ok(pair.to_json())
}

fn routes(args: cli::RoutesArgs) -> Result<Value> {
    let config = OverlayConfig::load(&args.config)
        .with_context(|| format!("failed to load config {}", args.config.display()))?;
    if let Some(node_id) = &config.node_id {
        tracing::info!(%node_id, "config belongs to node");
    }

    let (pairs, key_report) = config.load_keys();
    let (public_keys, public_report) = config.load_public_keys();
    let table = RoutingTable::new();
    let route_report = config.load_routes(&table);

    tracing::info!(
        keys = pairs.len(),
        public_keys = public_keys.len(),
        routes = route_report.loaded,
        skipped = key_report.skipped.len()
            + public_report.skipped.len()
            + route_report.skipped.len(),
        "applied config"
    );

    match args.lookup {
        Some(destination) => {
            let entry = table
                .lookup_networking_node(&NodeId::from(destination.as_str()))
                .with_context(|| format!("cannot resolve {}", destination))?;
            serde_json::to_value(&entry).context("failed to render route")
        }
        None => Ok(table.to_json()),
    }
}

/// Prints version information to stdout.
fn print_version() {
    println!("chargemesh-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol        {}", chargemesh_protocol::config::PROTOCOL_VERSION);
}
