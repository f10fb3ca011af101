//! Reading tests - the reader against hand-built packages.

mod package;
mod worksheet;
