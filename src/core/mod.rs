/*!
# Core Module

Location types, error taxonomy and file helpers shared by the decoder,
the reconstructor and the command line tool.
*/

pub mod errors;
pub mod position;
pub mod fs_utils;

pub use errors::{AstError, Diagnostic, ErrorCollector, ErrorLevel, PayloadError, ReconstructError};
pub use position::{LineIndex, Loc, Pos};
pub use fs_utils::{is_payload_file, read_payload_file};
