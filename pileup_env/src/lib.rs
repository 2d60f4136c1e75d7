//! Pileup Digitization Boundary Layer
//!
//! This crate holds everything the timeframe digitization stage exchanges
//! with the outside world:
//! - **Inputs**: the run context (collisions and their event parts)
//! - **Collaborators**: hit stores and the digitization engine
//! - **Outputs**: tagged data products and the ready-to-quit signal
//!
//! Collaborators are traits so the same stage runs against persistent
//! stores in production and seeded in-memory stores in simulation.
//!
//! # Example
//!
//! ```ignore
//! use pileup_env::{EventPart, HitKind, HitRetriever, SledHitStore, SourceChain};
//!
//! let mut chain = SourceChain::new();
//! chain.add(SledHitStore::<TofHit>::open("bkg.db")?);
//!
//! let mut hits = Vec::new();
//! chain.get_hits(EventPart::new(0, 5), &HitKind::new("TOFHit"), &mut hits)?;
//! ```

mod digitizer;
mod error;
mod labels;
mod output;
mod retriever;
mod sled_impl;
mod types;

pub use digitizer::DigitizerEngine;
pub use error::EnvError;
pub use labels::LabelContainer;
pub use output::{ControlService, OutputSink};
pub use retriever::{HitRetriever, HitStore, SourceChain};
pub use sled_impl::SledHitStore;
pub use types::{
    DataHeader, EventPart, HitKind, InteractionRecord, Lifetime, Output, RunContext, TruthLabel,
};
