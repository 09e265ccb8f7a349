pub mod candidate;
pub mod carrier;
pub mod config;
pub mod extraction;
pub mod interaction;
pub mod load;
pub mod statistics;
pub mod verification;

pub use candidate::{CallContext, CandidateField, CarrierCandidate, FieldOrigin};
pub use carrier::{
    is_state_code, normalize_authority_number, phone_digits, CarrierEntity, CarrierStats,
    CarrierStatus, EquipmentType, Lane, EQUIPMENT_SYNONYMS,
};
pub use config::{
    Config, DatabaseConfig, IdentityConfig, LinkageConfig, LoggingConfig, PhoneMatchMode,
    ReprocessConfig, VerificationConfig,
};
pub use extraction::{
    parse_calendar_date, CallExtraction, CarrierInformation, LooseScalar, Pricing, ReferenceNumbers, RouteDetails,
    TextList,
};
pub use interaction::{CarrierCallInteraction, InteractionKind};
pub use load::{LoadCarrierLink, LoadRecord, LoadStatus};
pub use statistics::{
    performance_score, CarrierStatisticsSnapshot, FrequencyCount, ZERO_HISTORY_PERFORMANCE_SCORE,
};
pub use verification::{
    AuthorityQuery, AuthoritySnapshot, OperatingStatus, RiskAssessment, RiskLevel, RiskWarning,
    SafetyRating, Severity, VerificationFailure, VerificationOutcome, VerificationRecord,
};
