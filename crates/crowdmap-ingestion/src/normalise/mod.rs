//! Normalisation of free-text asset attributes.
//!
//! - `AliasTable`: maps drug code-names/aliases → canonical names
//! - `normalise_phase`: maps phase strings → [`Phase`](crowdmap_common::Phase)
//! - `Vocabulary`: maps modality / mechanism text → controlled terms
//! - `Lexicon`: the immutable bundle of all three, built once per process

pub mod alias;
pub mod lexicon;
pub mod phase;
pub mod vocab;

pub use alias::{name_key, AliasTable};
pub use lexicon::Lexicon;
pub use phase::normalise_phase;
pub use vocab::{Vocabulary, VocabRule};
