//! Four-category Knowledge Store with segmented persistence.
//!
//! ## Categories
//!
//! | Index | Category    | Payload                     | Usage tracked |
//! |-------|-------------|-----------------------------|---------------|
//! | 1     | Vocabulary  | definition, POS, examples   | yes           |
//! | 2     | Mathematics | calculation or constant     | no            |
//! | 3     | Facts       | text, related topics        | no            |
//! | 4     | Personal    | value                       | no            |
//!
//! Each category persists as its own segment (`{namespace}/{category}` sled tree), so a
//! corrupt segment never blocks the others from loading.

mod document;
mod entry;
mod seed;
mod store;
mod vault;

pub use document::{ImportReport, KnowledgeDocument, DOCUMENT_FORMAT, DOCUMENT_VERSION};
pub use entry::{
    format_number, normalize_key, Category, Enrichment, EntryPayload, KnowledgeEntry, Source,
    Usage, CATEGORY_LABELS,
};
pub use seed::{initialize_seed_knowledge, seed_entries};
pub use store::{CategoryStatus, KnowledgeStore, MergeOutcome, RankedEntry};
pub use vault::{MemoryVault, PersistentStore, SledVault};
