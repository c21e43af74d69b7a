pub mod build;
pub mod documents;
pub mod lookup;
pub mod search;
pub mod set_index;
pub mod validate;

pub use build::*;
pub use documents::*;
pub use lookup::*;
pub use search::*;
pub use set_index::*;
pub use validate::*;
