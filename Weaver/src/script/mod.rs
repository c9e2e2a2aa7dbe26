//! Text and script touch-up
//!
//! - [`markup`] converts authored rich text into display text
//! - [`content`] lexes content into text and code and splits inline conditionals
//! - [`transpile`] translates Arcscript into the runtime's script dialect

pub mod content;
pub mod markup;
pub mod transpile;

pub use content::{Arm, ArmKind, Piece, Region, SplitContent, UnterminatedCode, split_content};
pub use markup::{
    code_line, display_name, extract_sequence, plain_line, strip_code_markup, strip_markup, touch_up,
};
pub use transpile::{ACTOR_INDEX_VARIABLE, RESERVED_WORDS, Transpiler};
