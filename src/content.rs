mod baseline;
mod chapter;
mod levels;
mod store;
mod sync;

pub use baseline::{baseline_questions, BaselineQuestion};
pub use chapter::{parse_chapter, parse_manifest, Chapter, ChapterContent, QuizItem, RawBaselineItem};
pub use levels::{Level, LevelBuckets, BUCKET_CAPACITY, POOL_LIMIT};
pub use store::{
    ChapterContentStore, DirContentStore, HttpContentStore, ManifestStore, MANIFEST_FILE,
};
pub use sync::sync_directory;
