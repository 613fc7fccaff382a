//! # hrp-rs
//!
//! $$
//! \mathbf w^{\text{HRP}} = \operatorname{Bisect}\big(\pi(\mathcal T(d(\Sigma))),\ \Sigma\big)
//! $$
//!
//! Hierarchical Risk Parity portfolio construction without inverting the
//! covariance matrix.

pub mod config;
pub mod error;
pub mod market_data;
pub mod portfolio;
pub mod report;

pub use error::HrpError;
pub use error::Result;
