//! # Portfolio
//!
//! $$
//! \sigma_p^2 = \mathbf{w}^\top \Sigma \mathbf{w}
//! $$
//!
//! Hierarchical Risk Parity: correlation clustering, quasi-diagonalization
//! and recursive bisection, plus the metrics and share allocation that
//! consume the resulting weights.

pub mod allocation;
pub mod bisection;
pub mod distance;
pub mod engine;
pub mod estimator;
pub mod linkage;
pub mod metrics;
pub mod prices;
pub mod quasi_diag;
pub mod types;

pub use allocation::Allocation;
pub use allocation::ShareRounding;
pub use allocation::allocate_capital;
pub use bisection::BisectionSplit;
pub use bisection::cluster_variance;
pub use bisection::recursive_bisection;
pub use distance::DistanceMatrix;
pub use distance::correlation_from_covariance;
pub use engine::HrpEngine;
pub use engine::HrpEngineConfig;
pub use engine::HrpPortfolio;
pub use engine::HrpRun;
pub use engine::HrpWeights;
pub use estimator::EstimatorConfig;
pub use estimator::ReturnEstimates;
pub use estimator::ReturnKind;
pub use estimator::estimate;
pub use linkage::LinkageMethod;
pub use linkage::LinkageTree;
pub use linkage::Merge;
pub use linkage::cluster;
pub use metrics::PortfolioPerformance;
pub use metrics::portfolio_performance;
pub use prices::PriceTable;
pub use quasi_diag::AssetOrdering;
pub use quasi_diag::quasi_diagonalize;
pub use quasi_diag::seriate;
pub use types::CovarianceMatrix;
pub use types::WeightVector;
