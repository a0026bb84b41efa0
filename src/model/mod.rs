//! Core data model: accounts, messages, body trees and addresses.

pub mod account;
pub mod address;
pub mod body;
pub mod message;
