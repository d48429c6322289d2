//! Validation of batched part authorizations.

use std::collections::{BTreeMap, BTreeSet};

use reelcast_core::models::PartAuthorization;
use reelcast_core::UploadError;

/// Re-index authorizations by part number.
///
/// Every requested part must have exactly one authorization and no other part
/// may appear; a partial batch is unusable.
pub fn index_authorizations(
    requested: &[u32],
    authorizations: Vec<PartAuthorization>,
) -> Result<BTreeMap<u32, PartAuthorization>, UploadError> {
    let wanted: BTreeSet<u32> = requested.iter().copied().collect();

    if authorizations.len() < wanted.len() {
        return Err(UploadError::Authorization(format!(
            "Received {} part authorizations for {} parts",
            authorizations.len(),
            wanted.len()
        )));
    }

    let mut indexed = BTreeMap::new();
    for authorization in authorizations {
        let part_number = authorization.part_number;
        if !wanted.contains(&part_number) {
            return Err(UploadError::Authorization(format!(
                "Received authorization for unrequested part {}",
                part_number
            )));
        }
        if authorization.target_url.is_empty() {
            return Err(UploadError::Authorization(format!(
                "Empty target URL for part {}",
                part_number
            )));
        }
        if indexed.insert(part_number, authorization).is_some() {
            return Err(UploadError::Authorization(format!(
                "Duplicate authorization for part {}",
                part_number
            )));
        }
    }

    if let Some(missing) = wanted.iter().find(|n| !indexed.contains_key(n)) {
        return Err(UploadError::Authorization(format!(
            "Missing authorization for part {}",
            missing
        )));
    }

    Ok(indexed)
}
