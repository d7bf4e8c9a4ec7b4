// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — page ranges, merging, splitting, compression and passwords.

pub mod compress;
pub(crate) mod loader;
pub mod ranges;
pub mod reader;
pub mod security;

#[cfg(test)]
pub(crate) mod testing;

pub use compress::compress;
pub use ranges::{PageSelection, parse_page_ranges};
pub use reader::{PdfReader, merge, page_count, split};
pub use security::{EncryptionSpec, protect, protect_with, unlock};
