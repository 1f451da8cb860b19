//! Integration tests for the ClawPrint agent worker

mod card_parsing;
mod cli_contracts;
mod memory_store;
mod support;
