// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF password protection — add or remove the standard security handler.
//
// Protection always uses AES-256 (security handler revision 6) with the
// same secret as owner and user password.

use std::collections::BTreeMap;
use std::sync::Arc;

use lopdf::encryption::crypt_filters::{Aes256CryptFilter, CryptFilter};
use lopdf::{EncryptionState, EncryptionVersion, Permissions};
use pdfworks_core::error::{PdfworksError, Result};
use ring::rand::{SecureRandom, SystemRandom};
use tracing::{info, instrument};

use super::loader::{clear_encryption, is_locked, load, load_with_password};
use super::reader::save_to_vec;

/// Name of the single crypt filter used for strings and streams.
const CRYPT_FILTER_NAME: &[u8] = b"StdCF";

/// Owner/user password pair and cipher choice applied by [`protect`].
pub struct EncryptionSpec<'a> {
    pub owner_password: &'a str,
    pub user_password: &'a str,
}

impl<'a> EncryptionSpec<'a> {
    /// Owner and user password both set to `password`.
    pub fn single(password: &'a str) -> Self {
        Self {
            owner_password: password,
            user_password: password,
        }
    }
}

/// Open an encrypted document with `password` and return it without
/// encryption. Unencrypted input is simply re-serialised, as is input whose
/// user password is empty.
#[instrument(skip_all, fields(bytes_len = input.len()))]
pub fn unlock(input: &[u8], password: &str) -> Result<Vec<u8>> {
    let mut document = load_with_password(input, password)?;
    let output = save_to_vec(&mut document)?;
    info!(
        pages = document.get_pages().len(),
        output_bytes = output.len(),
        "PDF unlocked"
    );
    Ok(output)
}

/// Encrypt `input` so that `password` is required to open it.
#[instrument(skip_all, fields(bytes_len = input.len()))]
pub fn protect(input: &[u8], password: &str) -> Result<Vec<u8>> {
    protect_with(input, &EncryptionSpec::single(password))
}

/// Encrypt `input` according to `spec` with AES-256.
///
/// Input that opens without a password (including input protected by an
/// owner password only) is re-protected; anything else must be unlocked
/// first.
pub fn protect_with(input: &[u8], spec: &EncryptionSpec<'_>) -> Result<Vec<u8>> {
    let mut document = load(input)?;
    if is_locked(&document) {
        return Err(PdfworksError::Validation(
            "Document is already password protected; unlock it first".into(),
        ));
    }
    clear_encryption(&mut document);

    let mut file_key = [0u8; 32];
    SystemRandom::new()
        .fill(&mut file_key)
        .map_err(|_| PdfworksError::Internal("system random source unavailable".into()))?;

    let crypt_filter: Arc<dyn CryptFilter> = Arc::new(Aes256CryptFilter);
    let version = EncryptionVersion::V5 {
        encrypt_metadata: true,
        crypt_filters: BTreeMap::from([(CRYPT_FILTER_NAME.to_vec(), crypt_filter)]),
        file_encryption_key: &file_key,
        stream_filter: CRYPT_FILTER_NAME.to_vec(),
        string_filter: CRYPT_FILTER_NAME.to_vec(),
        owner_password: spec.owner_password,
        user_password: spec.user_password,
        permissions: Permissions::all(),
    };

    let state = EncryptionState::try_from(version)
        .map_err(|err| PdfworksError::Internal(format!("cannot build encryption state: {err}")))?;
    document
        .encrypt(&state)
        .map_err(|err| PdfworksError::Format(format!("failed to encrypt PDF: {err}")))?;

    let output = save_to_vec(&mut document)?;
    info!(output_bytes = output.len(), "PDF encrypted with AES-256");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use lopdf::Document;

    use super::*;
    use crate::pdf::testing::{labelled_pdf, labels_of, owner_only_pdf, page_labels};

    #[test]
    fn protected_output_is_encrypted() {
        let protected = protect(&labelled_pdf("L", 2), "hunter2").unwrap();
        let doc = Document::load_mem(&protected).unwrap();
        assert!(doc.is_encrypted());
    }

    #[test]
    fn protect_then_unlock_round_trips() {
        let original = labelled_pdf("L", 3);
        let protected = protect(&original, "hunter2").unwrap();
        let unlocked = unlock(&protected, "hunter2").unwrap();

        let doc = Document::load_mem(&unlocked).unwrap();
        assert!(!doc.is_encrypted());
        assert_eq!(doc.get_pages().len(), 3);
        assert_eq!(labels_of(&doc), page_labels(&original));
    }

    #[test]
    fn owner_only_document_can_be_protected_again() {
        let reprotected = protect(&owner_only_pdf("O", 2), "new").unwrap();
        assert!(matches!(unlock(&reprotected, "owner"), Err(PdfworksError::Auth(_))));
        let unlocked = unlock(&reprotected, "new").unwrap();
        assert_eq!(page_labels(&unlocked), vec!["O1", "O2"]);
    }

    #[test]
    fn unlocking_owner_only_document_drops_encryption() {
        let unlocked = unlock(&owner_only_pdf("O", 2), "").unwrap();
        let doc = Document::load_mem(&unlocked).unwrap();
        assert!(!doc.is_encrypted());
        assert_eq!(labels_of(&doc), vec!["O1", "O2"]);
    }

    #[test]
    fn wrong_password_is_an_auth_error() {
        let protected = protect(&labelled_pdf("L", 1), "right").unwrap();
        match unlock(&protected, "wrong") {
            Err(PdfworksError::Auth(msg)) => assert_eq!(msg, "Incorrect password"),
            other => panic!("expected auth error, got {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn unlocking_plain_document_keeps_content() {
        let original = labelled_pdf("U", 2);
        let output = unlock(&original, "anything").unwrap();
        assert_eq!(page_labels(&output), vec!["U1", "U2"]);
    }

    #[test]
    fn protecting_a_protected_document_is_rejected() {
        let protected = protect(&labelled_pdf("L", 1), "first").unwrap();
        assert!(matches!(
            protect(&protected, "second"),
            Err(PdfworksError::Validation(_))
        ));
    }

    #[test]
    fn garbage_is_a_format_error() {
        assert!(matches!(unlock(b"junk", "pw"), Err(PdfworksError::Format(_))));
        assert!(matches!(protect(b"junk", "pw"), Err(PdfworksError::Format(_))));
    }
}
