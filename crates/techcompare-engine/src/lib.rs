pub mod orchestrator;

pub use orchestrator::*;
pub use techcompare_core::*;
pub use techcompare_insight::{
    build_narrative_provider, GeminiConfig, NarrativeProvider, NarrativeProviderConfig,
    NarrativeRequest, NarrativeResponse, NarrativeSubject, OpenAiCompatibleConfig,
    ProviderError as NarrativeProviderError,
};
pub use techcompare_storage::{
    shared as shared_catalog, CatalogBackend, NewCriterion, NewTechnology,
    PersistentCatalogStore, SharedCatalog, StorageError,
};
