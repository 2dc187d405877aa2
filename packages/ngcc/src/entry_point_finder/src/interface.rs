use crate::dependencies::SortedEntryPointsInfo;
use crate::error::NgccResult;

pub trait EntryPointFinder {
    /// Search for entry-points that need to be processed, sorted by dependency.
    fn find_entry_points(&self) -> NgccResult<SortedEntryPointsInfo>;
}
