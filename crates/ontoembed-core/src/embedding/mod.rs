//! Embedding strategies and the trained-model cache
//!
//! The embedding algorithms themselves are external. This module only knows
//! their names ([`Algorithm`]), how to reach them ([`Embedder`],
//! [`EmbedderRegistry`]) and whether a model already exists ([`ModelCache`]).

mod algorithm;
mod cache;
mod command;
mod embedder;

pub use self::{algorithm::*, cache::*, embedder::*};

pub(crate) use self::command::ExternalCommand;
