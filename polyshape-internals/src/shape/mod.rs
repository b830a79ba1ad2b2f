//! The adapter layer: type-erased shapes and the handles that own or borrow
//! them.

mod borrowed;
pub(crate) mod data;
mod raw;
pub(crate) mod vtable;

pub use self::{
    borrowed::RawShapeBorrow,
    raw::{RawShape, RawShapeRef},
};
