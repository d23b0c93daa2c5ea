//! # CLI Interface
//!
//! Defines the command-line argument structure for `chargemesh-node` using
//! `clap` derive. Subcommands: `keygen`, `parse-key`, `derive`, `routes`
//! and `version`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use chargemesh_protocol::crypto::{Algorithm, Encoding, Serialization};

use crate::logging::LogFormat;

/// chargemesh node tooling.
///
/// Generates and inspects EC keys in the formats charging-network peers
/// exchange, and resolves overlay routes from a node configuration file.
#[derive(Parser, Debug)]
#[command(
    name = "chargemesh-node",
    about = "chargemesh key tooling and overlay route inspection",
    version,
    propagate_version = true
)]
pub struct ChargemeshCli {
    /// Log output format. `RUST_LOG` controls the filter.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a key pair and print it as JSON.
    Keygen(KeygenArgs),
    /// Parse a public key in any supported format and print its canonical JSON.
    ParseKey(ParseKeyArgs),
    /// Derive a key pair from a private scalar.
    Derive(DeriveArgs),
    /// Load routes from a config file and dump or resolve them.
    Routes(RoutesArgs),
    /// Print version information and exit.
    Version,
}

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Curve name (secp192r1, secp256r1, secp256k1, secp384r1, secp521r1).
    #[arg(long, short = 'a', default_value = "secp256r1")]
    pub algorithm: Algorithm,

    /// Public key structure: raw, asn1_der or ecc_x_y.
    #[arg(long, short = 's', default_value = "raw")]
    pub serialization: Serialization,

    /// Text encoding: hex, base32 or base64.
    #[arg(long, short = 'e', default_value = "base64")]
    pub encoding: Encoding,
}

#[derive(Args, Debug)]
pub struct ParseKeyArgs {
    /// The encoded public key.
    pub key: String,

    /// Expected curve. Without it the key stays unbound unless it is ASN.1
    /// or `--auto-detect` is given.
    #[arg(long, short = 'a')]
    pub algorithm: Option<Algorithm>,

    #[arg(long, short = 's')]
    pub serialization: Option<Serialization>,

    /// Text encoding. Auto-detected when omitted.
    #[arg(long, short = 'e')]
    pub encoding: Option<Encoding>,

    /// Try every supported curve when no algorithm is given.
    #[arg(long)]
    pub auto_detect: bool,
}

#[derive(Args, Debug)]
pub struct DeriveArgs {
    /// The encoded private scalar (big-endian).
    ///
    /// **Never paste production keys into a shell history.**
    pub private: String,

    /// Curve. Inferred from the scalar length when omitted.
    #[arg(long, short = 'a')]
    pub algorithm: Option<Algorithm>,

    /// Text encoding of the scalar. Auto-detected when omitted.
    #[arg(long, short = 'e')]
    pub encoding: Option<Encoding>,

    /// Public key structure in the output.
    #[arg(long, short = 's', default_value = "raw")]
    pub serialization: Serialization,
}

#[derive(Args, Debug)]
pub struct RoutesArgs {
    /// Path to the node configuration file (JSON).
    #[arg(long, short = 'c', env = "CHARGEMESH_CONFIG")]
    pub config: PathBuf,

    /// Resolve this destination instead of dumping the whole table.
    #[arg(long)]
    pub lookup: Option<String>,
}
