//! SEDA Core Library.
//!
//! An in-memory implementation of the SEDA core: requests are posted with escrowed fees, results
//! are proven against batches signed by a quorum of the validator set, and the fees of resolved or
//! timed out requests are credited to a pull-based fee manager.

#![warn(clippy::pedantic)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::bool_to_int_with_if)]
#![allow(clippy::field_reassign_with_default)]
#![allow(clippy::manual_assert)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::explicit_iter_loop)]
#![allow(clippy::struct_excessive_bools)]
#![warn(missing_docs)]

pub mod access;
pub mod config;
pub mod errors;
pub mod events;
pub mod fee;
pub mod fee_manager;
pub mod hashing;
pub mod input;
pub mod ledger;
pub mod merkle;
pub mod pending;
pub mod prover;
pub mod receipts;
pub mod signing;
pub mod sol;
pub mod state;
pub mod transactions;
pub mod u256;
pub mod utils;
pub mod verifier;
