pub mod call_linkage;
pub mod carrier_service;
pub mod extraction_normalizer;
pub mod identity_resolver;
pub mod merge_policy;
pub mod pattern_extractor;
pub mod risk_assessor;
pub mod statistics_engine;
pub mod verification_service;

pub use call_linkage::{CallLinkageCoordinator, CallLinkageResult, ReplayItem, ReplaySummary};
pub use carrier_service::CarrierService;
pub use extraction_normalizer::{confidence_score, ExtractionNormalizer};
pub use identity_resolver::{IdentityResolver, MatchStrategy, ResolvedCarrier};
pub use merge_policy::{IgnoredAuthority, MergeKind, MergeOutcome, MergePolicy};
pub use pattern_extractor::RegexCandidateExtractor;
pub use risk_assessor::{RiskAssessor, DEFAULT_LIABILITY_REQUIRED};
pub use statistics_engine::{compute_statistics, StatisticsEngine};
pub use verification_service::{RefreshSummary, VerificationService};
