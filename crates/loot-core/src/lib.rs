//! Loot export model and the pipeline from raw export to display rows.

pub mod error;
pub mod filter;
pub mod model;
pub mod normalize;
pub mod options;
pub mod profiles;
pub mod quality;
pub mod rows;
pub mod signature;
pub mod view;

pub use error::LootError;
pub use filter::{apply_filters, FilterCriteria};
pub use model::{
    Boss, CanonicalPayload, EventsPayload, Loot, LootEvent, Run, RunsPayload, SchemaTag,
    DEFAULT_RECORDER,
};
pub use normalize::{normalize, parse_payload};
pub use options::{build_options, option_label, retain_selection, OptionField, ANY_OPTION};
pub use profiles::{profile_id, profiles, Profile};
pub use quality::{quality_class, quality_label, MAX_QUALITY, QUALITY_LABELS};
pub use rows::{extract_all, extract_rows, DisplayRow, NO_ROLL};
pub use signature::PayloadSignature;
pub use view::LootView;
