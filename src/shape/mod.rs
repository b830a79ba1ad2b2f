pub(crate) mod owned;
pub(crate) mod ref_;

use alloc::format;

use rootcause::Report;

use crate::storage::AllocationError;

/// Wraps an allocation failure of the storage `St` in a report.
#[cold]
#[track_caller]
fn allocation_report<St>(error: AllocationError) -> Report<AllocationError> {
    Report::new(error).attach(format!("storage: {}", core::any::type_name::<St>()))
}
