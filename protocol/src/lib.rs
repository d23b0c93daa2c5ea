// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # chargemesh Protocol Library
//!
//! The pieces of a charging-network overlay node that do not touch a
//! socket:
//!
//! - **crypto**: EC key pairs and public keys in every shape peers send
//!   them (SEC1, ASN.1 DER, X/Y; hex, Base32, Base64), with encoding
//!   auto-detection and one canonical JSON form.
//! - **network**: the static routing table that picks a path to a node,
//!   directly or through hubs.
//! - **config**: shared defaults and the JSON document a node boots from.
//!
//! Everything here is synchronous and safe to call from any thread.

pub mod config;
pub mod crypto;
pub mod network;
