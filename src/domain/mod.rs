//! Domain types exchanged with the backend.
//!
//! This module defines:
//!
//! - materials and the selection placeholder (`Material`)
//! - price history and forecast points (`PricePrediction`)
//! - vendor scoring results (`RecommendationResult`, `Vendor`)
//! - upload inputs and receipts (`DatasetFiles`, `UploadRole`)

pub mod types;

pub use types::*;
