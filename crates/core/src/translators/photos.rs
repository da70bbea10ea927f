use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::defaults::RegistrationDefaults;
use crate::dto::{PhotoInput, UploadInput};
use crate::error::{ClinicalError, Result};
use crate::model::{Attachment, FhirDateTime};

use super::MediaUploader;

/// Upload each photo and describe it as an Attachment.
///
/// The upload response is authoritative for hash, size and URL. `data` keeps
/// the base64 payload the caller supplied.
pub async fn photos_to_attachments(
    photos: &[PhotoInput],
    uploader: &dyn MediaUploader,
    defaults: &RegistrationDefaults,
    at: &FhirDateTime,
) -> Result<Vec<Attachment>> {
    let mut output = Vec::with_capacity(photos.len());

    for photo in photos {
        let input = UploadInput {
            title: defaults.photo_title.clone(),
            content_type: photo.photo_content_type.to_string(),
            language: defaults.language.to_string(),
            base64data: photo.photo_base64data.clone(),
            filename: photo
                .photo_filename
                .clone()
                .unwrap_or_else(|| defaults.photo_filename.clone()),
        };

        let upload = uploader.upload(input).await?;
        let decoded = STANDARD
            .decode(upload.base64data.as_bytes())
            .map_err(|e| ClinicalError::upstream("media", "upload base64 decode", e))?;

        output.push(Attachment {
            content_type: Some(photo.photo_content_type.to_string()),
            language: Some(defaults.language.to_string()),
            data: Some(photo.photo_base64data.clone()),
            url: Some(upload.url),
            size: Some(decoded.len() as u64),
            hash: Some(upload.hash),
            title: Some(defaults.photo_title.clone()),
            creation: Some(at.clone()),
        });
    }

    Ok(output)
}
