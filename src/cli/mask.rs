//! Mask command implementation

use crate::cli::MaskArgs;
use crate::redact::mask;

/// Handle `veil mask` command
pub fn handle_mask(args: &MaskArgs) -> String {
    mask(&args.value)
}
